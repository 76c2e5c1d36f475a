//! Application layer: use cases orchestrated over the domain ports.

pub mod identity;

pub use identity::{AuthResult, NewAccount, UserService};
