//! Authentication module: sign-up, sign-in, current user, credential change

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
