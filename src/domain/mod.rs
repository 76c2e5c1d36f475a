//! Domain layer: the user aggregate and its repository port.

pub mod user;

pub use user::{
    CreateUserDto, GetUserDto, UpdateCredentialsDto, UpdateUserDto, User, UserRepositoryInterface,
    UserRole,
};

pub use crate::shared::{DomainError, SortOrder};

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;
