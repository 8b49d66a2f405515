use sg_shared::errors::{error_codes, IntoErrorResponse};

use super::*;

#[test]
fn test_refresh_rejections_collapse_to_one_error() {
    let rejections = vec![
        DomainError::Token(TokenError::InvalidToken),
        DomainError::Token(TokenError::TokenExpired),
        DomainError::Token(TokenError::TokenRevoked),
        DomainError::Auth(AuthError::UserNotFound),
    ];

    for error in rejections {
        let collapsed = error.into_refresh_failure();
        assert!(matches!(collapsed, DomainError::Auth(AuthError::RefreshFailed)));
        assert_eq!(collapsed.to_string(), "Refresh failed");
    }
}

#[test]
fn test_store_failures_are_not_collapsed() {
    let error = DomainError::StoreUnavailable {
        message: "connection refused".to_string(),
    };
    let passed = error.into_refresh_failure();
    assert!(matches!(passed, DomainError::StoreUnavailable { .. }));
    assert_eq!(passed.kind(), "store_unavailable");
}

#[test]
fn test_error_kinds_are_distinct_for_logging() {
    assert_eq!(DomainError::from(TokenError::TokenExpired).kind(), "token_expired");
    assert_eq!(DomainError::from(TokenError::TokenRevoked).kind(), "token_revoked");
    assert_eq!(DomainError::from(AuthError::UserNotFound).kind(), "user_not_found");
}

#[test]
fn test_error_response_hides_refresh_detail() {
    let rejections = vec![
        DomainError::Token(TokenError::InvalidToken),
        DomainError::Token(TokenError::TokenExpired),
        DomainError::Token(TokenError::TokenRevoked),
        DomainError::Auth(AuthError::UserNotFound),
        DomainError::Auth(AuthError::RefreshFailed),
    ];

    let responses: Vec<_> = rejections.iter().map(|e| e.to_error_response()).collect();
    for response in &responses {
        assert_eq!(response.error, error_codes::REFRESH_FAILED);
        assert_eq!(response.message, "Refresh failed");
    }

    let response = DomainError::Internal {
        message: "secret detail".to_string(),
    }
    .to_error_response();
    assert_eq!(response.error, error_codes::INTERNAL_ERROR);
    assert!(!response.message.contains("secret"));
}
