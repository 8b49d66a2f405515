//! Access-token minting and stateless validation

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::collections::BTreeSet;

use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, DomainResult, TokenError};

use super::config::TokenServiceConfig;

/// Signs and verifies access tokens with a process-wide symmetric key
///
/// Holds no mutable state, so a single instance can be shared across
/// threads without locking. Validation never touches the store.
pub struct TokenSigner {
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenSigner {
    /// Creates a signer from the service configuration
    ///
    /// # Returns
    ///
    /// * `Err(DomainError::Configuration)` - Non-HMAC algorithm or empty secret
    pub fn new(config: &TokenServiceConfig) -> DomainResult<Self> {
        config.validate()?;

        let secret = config.jwt_secret.as_bytes();

        // Only the configured algorithm is accepted, with no clock skew.
        let mut validation = Validation::new(config.algorithm);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);

        Ok(Self {
            algorithm: config.algorithm,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Mints a signed access token
    ///
    /// # Arguments
    ///
    /// * `subject_id` - User id written to `sub`
    /// * `roles` - Every role name the subject currently holds
    /// * `jti` - Identifier tying the token to its refresh-token record
    /// * `expires_at` - Value of `exp`
    pub fn issue_access_token(
        &self,
        subject_id: &str,
        roles: &BTreeSet<String>,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> DomainResult<String> {
        let claims = Claims {
            sub: subject_id.to_string(),
            jti: jti.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            roles: roles.iter().cloned().collect(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!(error = %e, "Failed to sign access token");
            DomainError::Token(TokenError::TokenGenerationFailed)
        })
    }

    /// Verifies signature, algorithm, issuer, audience and expiry
    ///
    /// # Returns
    ///
    /// * `Ok(Claims)` - The decoded claims if valid
    /// * `Err(TokenError::InvalidToken)` - Any check failed
    pub fn validate_access_token(&self, token: &str) -> DomainResult<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(reason = ?e.kind(), "Access token rejected");
                DomainError::Token(TokenError::InvalidToken)
            })
    }
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}
