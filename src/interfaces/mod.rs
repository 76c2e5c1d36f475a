//! Interface adapters (HTTP REST API)

pub mod http;
