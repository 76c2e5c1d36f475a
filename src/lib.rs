//! # User Authentication Service
//!
//! User registration, JWT sign-in and role-based user management over a
//! relational database.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: the `User` aggregate, DTOs and the repository trait
//! - **application**: `UserService`, every use case and access rule
//! - **infrastructure**: sea-orm persistence, migrations, bcrypt and JWT
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: error types, pagination and shutdown coordination
//! - **server**: lifecycle used by the CLI binary

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::create_api_router;
