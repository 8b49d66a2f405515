//! Configuration loading
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults and the flat variables read by
//!    [`AppConfig::from_env`] (`JWT_SECRET`, `DATABASE_URL`, `LOG_LEVEL`, ...),
//!    after `.env` has been loaded
//! 2. An optional TOML file, `config/session-guard.toml` by default
//! 3. `SG__`-prefixed variables with `__` as the section separator,
//!    e.g. `SG__JWT__ISSUER`

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use sg_shared::config::AppConfig;

use crate::InfrastructureError;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_FILE: &str = "config/session-guard";

/// Prefix of layered environment overrides
pub const ENV_PREFIX: &str = "SG";

/// Load the application configuration from the default locations
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    dotenvy::dotenv().ok(); // Load .env file if present
    load_config_from(Some(Path::new(DEFAULT_CONFIG_FILE)))
}

/// Load the application configuration, layering `file` (if it exists) and
/// `SG__*` variables over the environment-derived defaults
pub fn load_config_from(file: Option<&Path>) -> Result<AppConfig, InfrastructureError> {
    let base = AppConfig::from_env();

    let mut builder = Config::builder().add_source(Config::try_from(&base)?);

    if let Some(path) = file {
        let name = path.to_string_lossy();
        builder = builder.add_source(File::new(&name, FileFormat::Toml).required(false));
    }

    let config: AppConfig = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    if config.jwt.is_using_default_secret() {
        tracing::warn!(
            event = "default_jwt_secret",
            "JWT secret is the built-in development default; set JWT_SECRET"
        );
    }

    tracing::debug!(
        environment = %config.environment,
        issuer = %config.jwt.issuer,
        algorithm = %config.jwt.algorithm,
        "Configuration loaded"
    );

    Ok(config)
}
