//! Domain-specific error types and error handling.

mod types;

#[cfg(test)]
mod tests;

pub use types::{AuthError, TokenError};

use sg_shared::errors::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The refresh-token store or an identity collaborator could not be reached
    #[error("Store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Stable identifier of the failure kind, used as a structured log field
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Token(TokenError::InvalidToken) => "token_invalid",
            DomainError::Token(TokenError::TokenExpired) => "token_expired",
            DomainError::Token(TokenError::TokenRevoked) => "token_revoked",
            DomainError::Token(TokenError::TokenGenerationFailed) => "token_generation_failed",
            DomainError::Auth(AuthError::UserNotFound) => "user_not_found",
            DomainError::Auth(AuthError::RefreshFailed) => "refresh_failed",
            DomainError::StoreUnavailable { .. } => "store_unavailable",
            DomainError::Configuration { .. } => "configuration",
            DomainError::Internal { .. } => "internal",
        }
    }

    /// Whether this is one of the domain outcomes a refresh may be rejected with
    pub fn is_refresh_rejection(&self) -> bool {
        matches!(
            self,
            DomainError::Token(TokenError::InvalidToken)
                | DomainError::Token(TokenError::TokenExpired)
                | DomainError::Token(TokenError::TokenRevoked)
                | DomainError::Auth(AuthError::UserNotFound)
                | DomainError::Auth(AuthError::RefreshFailed)
        )
    }

    /// Collapses refresh rejections into a single opaque `RefreshFailed`.
    /// Infrastructure errors are returned unchanged.
    pub fn into_refresh_failure(self) -> Self {
        if self.is_refresh_rejection() {
            DomainError::Auth(AuthError::RefreshFailed)
        } else {
            self
        }
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            // One response for every refresh rejection; the kind is only logged
            DomainError::Token(TokenError::InvalidToken)
            | DomainError::Token(TokenError::TokenExpired)
            | DomainError::Token(TokenError::TokenRevoked)
            | DomainError::Auth(AuthError::UserNotFound)
            | DomainError::Auth(AuthError::RefreshFailed) => {
                ErrorResponse::new(error_codes::REFRESH_FAILED, "Refresh failed")
            }
            DomainError::StoreUnavailable { .. } => ErrorResponse::new(
                error_codes::SERVICE_UNAVAILABLE,
                "Service temporarily unavailable",
            ),
            DomainError::Token(TokenError::TokenGenerationFailed)
            | DomainError::Configuration { .. }
            | DomainError::Internal { .. } => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error")
            }
        }
    }
}
