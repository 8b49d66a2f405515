//! Unit tests for the MySQL refresh-token repository that need no database

use sg_core::errors::{DomainError, TokenError};

use crate::database::mysql::refresh_token_repository_impl::*;

const MIGRATION: &str =
    include_str!("../../../migrations/20240101000001_create_refresh_tokens.sql");

#[test]
fn test_every_column_exists_in_schema() {
    for column in COLUMNS.split(',').map(str::trim) {
        assert!(
            MIGRATION.contains(&format!("\n    {} ", column)),
            "column {} missing from migration",
            column
        );
    }
}

#[test]
fn test_device_columns_accept_unbounded_values() {
    for column in ["device_name", "user_agent", "ip_address", "platform", "browser"] {
        let line = MIGRATION
            .lines()
            .find(|l| l.trim_start().starts_with(&format!("{} ", column)))
            .unwrap();
        assert!(line.contains("TEXT"), "{} is length-capped: {}", column, line);
    }
}

#[test]
fn test_insert_placeholders_match_columns() {
    let columns = COLUMNS.split(',').count();
    let placeholders = INSERT.matches('?').count();
    assert_eq!(columns, placeholders);
}

#[test]
fn test_state_changes_are_conditional_on_active_row() {
    for statement in [MARK_REPLACED, REVOKE, REVOKE_OWNED, REVOKE_ACTIVE_FOR_USER] {
        assert!(statement.contains("is_revoked = FALSE"), "{}", statement);
        assert!(statement.contains("is_current = FALSE"), "{}", statement);
    }
    assert!(REVOKE_OWNED.contains("user_id = ?"));
    assert!(MARK_REPLACED.contains("replaced_by_token = ?"));
}

#[test]
fn test_active_queries_exclude_expired_and_revoked() {
    for statement in [SELECT_ACTIVE_BY_USER, SELECT_ACTIVE_BY_USER_EXCEPT] {
        assert!(statement.contains("is_revoked = FALSE"));
        assert!(statement.contains("expires_at > ?"));
        assert!(statement.contains("ORDER BY last_used_at DESC"));
    }
    assert!(SELECT_ACTIVE_BY_USER_EXCEPT.contains("access_token_jti <> ?"));
}

#[test]
fn test_driver_errors_map_to_store_unavailable() {
    let err = store_error("find_by_token", sqlx::Error::PoolTimedOut);
    match err {
        DomainError::StoreUnavailable { message } => assert!(message.contains("find_by_token")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_non_unique_insert_failure_is_store_error() {
    let err = insert_error(sqlx::Error::PoolClosed);
    assert!(matches!(err, DomainError::StoreUnavailable { .. }));
    assert!(!matches!(
        err,
        DomainError::Token(TokenError::TokenGenerationFailed)
    ));
}
