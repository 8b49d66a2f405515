//! # Infrastructure Layer
//!
//! Concrete implementations behind the session-guard core:
//!
//! - **Database**: MySQL refresh-token store using SQLx
//! - **Configuration**: `.env`, optional TOML file and environment layering
//! - **Telemetry**: `tracing` subscriber installation
//!
//! ## Features
//!
//! - `mysql`: Enable MySQL database support (default)

/// Database module - MySQL implementations using SQLx
#[cfg(feature = "mysql")]
pub mod database;

/// Configuration loading
pub mod settings;

/// Tracing subscriber setup
pub mod telemetry;

pub use settings::{load_config, load_config_from};
pub use telemetry::init_tracing;

#[cfg(feature = "mysql")]
pub use database::{DatabasePool, MySqlRefreshTokenRepository, PoolStatistics};

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}

impl From<::config::ConfigError> for InfrastructureError {
    fn from(err: ::config::ConfigError) -> Self {
        InfrastructureError::Config(err.to_string())
    }
}

impl From<InfrastructureError> for sg_core::errors::DomainError {
    fn from(err: InfrastructureError) -> Self {
        match err {
            InfrastructureError::Config(message) => {
                sg_core::errors::DomainError::Configuration { message }
            }
            other => sg_core::errors::DomainError::StoreUnavailable {
                message: other.to_string(),
            },
        }
    }
}
