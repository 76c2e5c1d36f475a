//! Identity module: user management and authentication
//!
//! Contains the `UserService` which orchestrates all user-related
//! use-cases: sign-up, sign-in, token authentication, profile updates,
//! credential changes and soft deletion.

pub mod service;

pub use service::{AuthResult, NewAccount, UserService};
