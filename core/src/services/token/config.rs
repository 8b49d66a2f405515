//! Configuration for the token service

use chrono::Duration;
use jsonwebtoken::Algorithm;
use sg_shared::config::{AppConfig, JwtConfig};

use crate::errors::{DomainError, DomainResult};

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// JWT signing secret, fixed for the lifetime of the process
    pub jwt_secret: String,
    /// JWT signing algorithm; only HMAC variants are accepted
    pub algorithm: Algorithm,
    /// `iss` claim written and required
    pub issuer: String,
    /// `aud` claim written and required
    pub audience: String,
    /// Access token lifetime
    pub access_token_expiry: Duration,
    /// Refresh token lifetime
    pub refresh_token_expiry: Duration,
    /// Upper bound on every store and collaborator call
    pub store_timeout: std::time::Duration,
    /// How many fresh refresh-token strings to try before giving up on collisions
    pub max_generation_attempts: u32,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-please-change-in-production".to_string(),
            algorithm: Algorithm::HS256,
            issuer: "session-guard".to_string(),
            audience: "session-guard-api".to_string(),
            access_token_expiry: Duration::minutes(15),
            refresh_token_expiry: Duration::days(7),
            store_timeout: std::time::Duration::from_secs(5),
            max_generation_attempts: 5,
        }
    }
}

impl TokenServiceConfig {
    /// Builds the service configuration from the shared JWT settings
    pub fn from_jwt_config(jwt: &JwtConfig) -> DomainResult<Self> {
        let algorithm = jwt
            .algorithm
            .parse::<Algorithm>()
            .map_err(|_| DomainError::Configuration {
                message: format!("Unknown JWT algorithm: {}", jwt.algorithm),
            })?;

        let config = Self {
            jwt_secret: jwt.secret.clone(),
            algorithm,
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_token_expiry: Duration::seconds(jwt.access_token_expiry),
            refresh_token_expiry: Duration::seconds(jwt.refresh_token_expiry),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Builds the service configuration from the complete application config
    pub fn from_app_config(app: &AppConfig) -> DomainResult<Self> {
        Ok(Self::from_jwt_config(&app.jwt)?.with_store_timeout(
            std::time::Duration::from_millis(app.database.statement_timeout_ms),
        ))
    }

    pub fn with_store_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Rejects settings the signer or the service cannot honour
    pub fn validate(&self) -> DomainResult<()> {
        if !matches!(
            self.algorithm,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(DomainError::Configuration {
                message: format!("{:?} is not a symmetric signing algorithm", self.algorithm),
            });
        }
        if self.jwt_secret.is_empty() {
            return Err(DomainError::Configuration {
                message: "JWT secret must not be empty".to_string(),
            });
        }
        if self.access_token_expiry <= Duration::zero()
            || self.refresh_token_expiry <= Duration::zero()
        {
            return Err(DomainError::Configuration {
                message: "Token lifetimes must be positive".to_string(),
            });
        }
        if self.max_generation_attempts == 0 {
            return Err(DomainError::Configuration {
                message: "max_generation_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
