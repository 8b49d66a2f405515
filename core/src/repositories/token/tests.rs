//! Contract tests for the in-memory refresh-token store

use chrono::{DateTime, Duration, Utc};

use crate::domain::entities::device::DeviceInfo;
use crate::domain::entities::token::{RefreshToken, RevocationReason};
use crate::errors::{DomainError, TokenError};

use super::{InMemoryRefreshTokenRepository, RefreshTokenRepository};

fn record(token: &str, user_id: &str, jti: &str, now: DateTime<Utc>) -> RefreshToken {
    RefreshToken::new(
        token.to_string(),
        user_id,
        jti,
        Duration::days(7),
        DeviceInfo::default(),
        now,
    )
}

#[tokio::test]
async fn test_insert_current_moves_current_flag() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();
    repo.insert_current(record("T2", "u1", "j2", now)).await.unwrap();
    repo.insert_current(record("X1", "u2", "k1", now)).await.unwrap();

    let t1 = repo.find_by_token("T1").await.unwrap().unwrap();
    let t2 = repo.find_by_token("T2").await.unwrap().unwrap();
    let x1 = repo.find_by_token("X1").await.unwrap().unwrap();

    assert!(!t1.is_current);
    assert!(!t1.is_revoked, "clearing the current flag must not revoke");
    assert!(t2.is_current);
    assert!(x1.is_current, "other users are unaffected");
}

#[tokio::test]
async fn test_insert_rejects_duplicate_token() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();
    let result = repo.insert_current(record("T1", "u2", "j2", now)).await;

    assert!(matches!(
        result,
        Err(DomainError::Token(TokenError::TokenGenerationFailed))
    ));
    let stored = repo.find_by_token("T1").await.unwrap().unwrap();
    assert_eq!(stored.user_id, "u1");
}

#[tokio::test]
async fn test_rotate_is_single_use() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();
    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();

    let first = repo.rotate("T1", record("T2", "u1", "j2", now), now).await.unwrap();
    let second = repo.rotate("T1", record("T3", "u1", "j3", now), now).await.unwrap();

    assert!(first);
    assert!(!second);

    let old = repo.find_by_token("T1").await.unwrap().unwrap();
    assert!(old.is_revoked);
    assert!(!old.is_current);
    assert_eq!(old.revoked_reason.as_deref(), Some("Replaced by new token"));
    assert_eq!(old.replaced_by_token.as_deref(), Some("T2"));

    assert!(repo.find_by_token("T2").await.unwrap().unwrap().is_current);
    assert!(repo.find_by_token("T3").await.unwrap().is_none(), "loser writes nothing");
}

#[tokio::test]
async fn test_rotate_unknown_token_writes_nothing() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    let won = repo.rotate("missing", record("T2", "u1", "j2", now), now).await.unwrap();

    assert!(!won);
    assert!(repo.all().await.is_empty());
}

#[tokio::test]
async fn test_revoke_keeps_first_reason() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();
    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();

    assert!(repo.revoke("T1", RevocationReason::Manual, now).await.unwrap());
    assert!(!repo.revoke("T1", RevocationReason::AllRevoked, now).await.unwrap());
    assert!(!repo.revoke("nope", RevocationReason::Manual, now).await.unwrap());

    let stored = repo.find_by_token("T1").await.unwrap().unwrap();
    assert_eq!(stored.revoked_reason.as_deref(), Some("Manually revoked"));
}

#[tokio::test]
async fn test_revoke_owned_checks_owner() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();
    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();

    assert!(!repo
        .revoke_owned("T1", "wrong-user", RevocationReason::Manual, now)
        .await
        .unwrap());
    assert!(!repo.find_by_token("T1").await.unwrap().unwrap().is_revoked);

    assert!(repo.revoke_owned("T1", "u1", RevocationReason::Manual, now).await.unwrap());
    assert!(!repo.revoke_owned("T1", "u1", RevocationReason::Manual, now).await.unwrap());
}

#[tokio::test]
async fn test_revoke_active_for_user_skips_expired_and_other_users() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();
    repo.insert_current(record("T2", "u1", "j2", now)).await.unwrap();
    let mut expired = record("T3", "u1", "j3", now - Duration::days(10));
    expired.is_current = false;
    repo.seed(expired).await;
    repo.insert_current(record("X1", "u2", "k1", now)).await.unwrap();

    let revoked = repo
        .revoke_active_for_user("u1", RevocationReason::AllRevoked, now)
        .await
        .unwrap();

    assert_eq!(revoked, 2);
    assert!(repo.find_by_token("T1").await.unwrap().unwrap().is_revoked);
    assert!(repo.find_by_token("T2").await.unwrap().unwrap().is_revoked);
    assert!(!repo.find_by_token("T3").await.unwrap().unwrap().is_revoked);
    assert!(!repo.find_by_token("X1").await.unwrap().unwrap().is_revoked);
}

#[tokio::test]
async fn test_find_active_filters() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    repo.insert_current(record("T1", "u1", "j1", now)).await.unwrap();
    repo.insert_current(record("T2", "u1", "j2", now)).await.unwrap();
    repo.seed(record("T3", "u1", "j3", now - Duration::days(8))).await;
    repo.revoke("T2", RevocationReason::Manual, now).await.unwrap();
    repo.insert_current(record("T4", "u1", "j4", now)).await.unwrap();

    let active = repo.find_active_by_user("u1", now).await.unwrap();
    let mut tokens: Vec<_> = active.iter().map(|t| t.token.as_str()).collect();
    tokens.sort();
    assert_eq!(tokens, vec!["T1", "T4"]);

    let others = repo.find_active_by_user_except("u1", "j4", now).await.unwrap();
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].token, "T1");
}

#[tokio::test]
async fn test_delete_stale() {
    let repo = InMemoryRefreshTokenRepository::new();
    let now = Utc::now();

    repo.seed(record("old", "u1", "j1", now - Duration::days(40))).await;
    repo.insert_current(record("fresh", "u1", "j2", now)).await.unwrap();
    repo.insert_current(record("revoked", "u1", "j3", now)).await.unwrap();
    repo.revoke("revoked", RevocationReason::Manual, now - Duration::days(31))
        .await
        .unwrap();

    let deleted = repo.delete_stale(now - Duration::days(30)).await.unwrap();

    assert_eq!(deleted, 2);
    assert!(repo.find_by_token("fresh").await.unwrap().is_some());
    assert!(!repo.token_exists("old").await.unwrap());
}
