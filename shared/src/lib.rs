//! Shared configuration and common types for the session-guard workspace
//!
//! This crate provides functionality used by both the core and the
//! infrastructure crates:
//! - Configuration types (JWT, database, environment, logging)
//! - The transport-neutral error response structure

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{AppConfig, DatabaseConfig, Environment, JwtConfig, LogFormat, LoggingConfig};
pub use errors::{error_codes, ApiResult, ErrorResponse, IntoErrorResponse};
