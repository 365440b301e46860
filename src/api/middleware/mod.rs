//! HTTP middleware

pub mod auth;
pub mod logging;

pub use auth::{credential_gateway, PUBLIC_PATHS};
pub use logging::logging_middleware;
