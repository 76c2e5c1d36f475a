//! Shared HTTP building blocks

pub mod response;
pub mod validated_json;
pub mod validated_query;

pub use response::*;
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;
