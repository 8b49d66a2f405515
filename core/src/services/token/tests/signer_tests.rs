//! Unit tests for access-token signing and validation

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::collections::BTreeSet;

use crate::domain::entities::token::Claims;
use crate::errors::{DomainError, TokenError};
use crate::services::token::{TokenServiceConfig, TokenSigner};

use super::test_config;

fn roles(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn signer() -> TokenSigner {
    TokenSigner::new(&test_config()).unwrap()
}

fn assert_invalid(result: Result<Claims, DomainError>) {
    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::InvalidToken))
    ));
}

#[test]
fn test_issue_and_validate_round_trip() {
    let signer = signer();
    let expires_at = Utc::now() + Duration::minutes(15);

    let token = signer
        .issue_access_token("u1", &roles(&["Admin", "User"]), "j1", expires_at)
        .unwrap();
    let claims = signer.validate_access_token(&token).unwrap();

    assert_eq!(claims.sub, "u1");
    assert_eq!(claims.jti, "j1");
    assert_eq!(claims.iss, "session-guard");
    assert_eq!(claims.aud, "session-guard-api");
    assert_eq!(claims.exp, expires_at.timestamp());
    assert_eq!(claims.roles, vec!["Admin".to_string(), "User".to_string()]);
    assert!(claims.iat <= Utc::now().timestamp());
}

#[test]
fn test_token_has_three_base64url_segments() {
    let token = signer()
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() + Duration::minutes(1))
        .unwrap();

    let segments: Vec<&str> = token.split('.').collect();
    assert_eq!(segments.len(), 3);

    let payload = URL_SAFE_NO_PAD.decode(segments[1]).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&payload).unwrap();
    for claim in ["sub", "jti", "iss", "aud", "iat", "exp", "roles"] {
        assert!(payload.get(claim).is_some(), "missing claim {}", claim);
    }
}

#[test]
fn test_expired_by_one_second_is_rejected() {
    let signer = signer();
    let token = signer
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() - Duration::seconds(1))
        .unwrap();

    assert_invalid(signer.validate_access_token(&token));
}

#[test]
fn test_tampered_signature_is_rejected() {
    let signer = signer();
    let token = signer
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() + Duration::minutes(5))
        .unwrap();

    let (unsigned, signature) = token.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { "B" } else { "A" };
    let forged = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

    assert_invalid(signer.validate_access_token(&forged));
}

#[test]
fn test_foreign_secret_is_rejected() {
    let other = TokenSigner::new(&TokenServiceConfig {
        jwt_secret: "another-secret".to_string(),
        ..test_config()
    })
    .unwrap();
    let token = other
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() + Duration::minutes(5))
        .unwrap();

    assert_invalid(signer().validate_access_token(&token));
}

#[test]
fn test_mismatched_algorithm_is_rejected() {
    let config = test_config();
    let claims = Claims {
        sub: "u1".to_string(),
        jti: "j1".to_string(),
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        iat: Utc::now().timestamp(),
        exp: (Utc::now() + Duration::minutes(5)).timestamp(),
        roles: vec![],
    };
    // Same secret, different HMAC variant
    let token = encode(
        &Header::new(Algorithm::HS512),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .unwrap();

    assert_invalid(signer().validate_access_token(&token));
}

#[test]
fn test_unsigned_token_is_rejected() {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
    let exp = (Utc::now() + Duration::minutes(5)).timestamp();
    let payload = URL_SAFE_NO_PAD.encode(format!(
        r#"{{"sub":"u1","jti":"j1","iss":"session-guard","aud":"session-guard-api","iat":0,"exp":{},"roles":["Admin"]}}"#,
        exp
    ));

    assert_invalid(signer().validate_access_token(&format!("{}.{}.", header, payload)));
}

#[test]
fn test_wrong_audience_and_issuer_are_rejected() {
    let foreign = TokenSigner::new(&TokenServiceConfig {
        audience: "another-api".to_string(),
        ..test_config()
    })
    .unwrap();
    let token = foreign
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() + Duration::minutes(5))
        .unwrap();
    assert_invalid(signer().validate_access_token(&token));

    let foreign = TokenSigner::new(&TokenServiceConfig {
        issuer: "someone-else".to_string(),
        ..test_config()
    })
    .unwrap();
    let token = foreign
        .issue_access_token("u1", &roles(&[]), "j1", Utc::now() + Duration::minutes(5))
        .unwrap();
    assert_invalid(signer().validate_access_token(&token));
}

#[test]
fn test_garbage_is_rejected() {
    assert_invalid(signer().validate_access_token("invalid_token"));
    assert_invalid(signer().validate_access_token(""));
}

#[test]
fn test_asymmetric_algorithm_is_refused_at_startup() {
    let result = TokenSigner::new(&TokenServiceConfig {
        algorithm: Algorithm::RS256,
        ..test_config()
    });
    assert!(matches!(result, Err(DomainError::Configuration { .. })));

    let result = TokenSigner::new(&TokenServiceConfig {
        jwt_secret: String::new(),
        ..test_config()
    });
    assert!(matches!(result, Err(DomainError::Configuration { .. })));
}

#[test]
fn test_config_from_jwt_settings() {
    let jwt = sg_shared::config::JwtConfig {
        algorithm: "HS384".to_string(),
        ..sg_shared::config::JwtConfig::new("secret").with_access_expiry_minutes(5)
    };
    let config = TokenServiceConfig::from_jwt_config(&jwt).unwrap();
    assert_eq!(config.algorithm, Algorithm::HS384);
    assert_eq!(config.access_token_expiry, Duration::minutes(5));

    let jwt = sg_shared::config::JwtConfig {
        algorithm: "RS256".to_string(),
        ..sg_shared::config::JwtConfig::new("secret")
    };
    assert!(TokenServiceConfig::from_jwt_config(&jwt).is_err());

    let jwt = sg_shared::config::JwtConfig {
        algorithm: "HS999".to_string(),
        ..sg_shared::config::JwtConfig::new("secret")
    };
    assert!(TokenServiceConfig::from_jwt_config(&jwt).is_err());
}
