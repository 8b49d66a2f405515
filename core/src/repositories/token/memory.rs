//! In-memory implementation of RefreshTokenRepository
//!
//! Every operation runs under one `RwLock`, which gives the same
//! single-writer guarantees the SQL store gets from conditional updates
//! and transactions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::token::{RefreshToken, RevocationReason};
use crate::errors::{DomainResult, TokenError};

use super::r#trait::RefreshTokenRepository;

/// Process-local refresh-token store
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<RwLock<HashMap<String, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    /// Create a new, empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as-is, bypassing the `is_current` bookkeeping
    pub async fn seed(&self, record: RefreshToken) {
        self.tokens.write().await.insert(record.token.clone(), record);
    }

    /// Snapshot of every stored record
    pub async fn all(&self) -> Vec<RefreshToken> {
        self.tokens.read().await.values().cloned().collect()
    }

    fn clear_current(tokens: &mut HashMap<String, RefreshToken>, user_id: &str) {
        for token in tokens.values_mut() {
            if token.user_id == user_id && token.is_current {
                token.is_current = false;
            }
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(token).cloned())
    }

    async fn find_active_by_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn find_active_by_user_except(
        &self,
        user_id: &str,
        jti: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.user_id == user_id && t.access_token_jti != jti && t.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn insert_current(&self, record: RefreshToken) -> DomainResult<()> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&record.token) {
            return Err(TokenError::TokenGenerationFailed.into());
        }

        Self::clear_current(&mut tokens, &record.user_id);
        tokens.insert(record.token.clone(), record);
        Ok(())
    }

    async fn rotate(
        &self,
        presented: &str,
        replacement: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&replacement.token) {
            return Err(TokenError::TokenGenerationFailed.into());
        }

        let won = match tokens.get_mut(presented) {
            Some(old) => old.mark_replaced(&replacement.token, now),
            None => false,
        };
        if !won {
            return Ok(false);
        }

        Self::clear_current(&mut tokens, &replacement.user_id);
        tokens.insert(replacement.token.clone(), replacement);
        Ok(true)
    }

    async fn revoke(
        &self,
        token: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        Ok(tokens
            .get_mut(token)
            .map(|t| t.revoke(reason, now))
            .unwrap_or(false))
    }

    async fn revoke_owned(
        &self,
        token: &str,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token) {
            Some(t) if t.user_id == user_id => Ok(t.revoke(reason, now)),
            _ => Ok(false),
        }
    }

    async fn revoke_active_for_user(
        &self,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;

        for token in tokens.values_mut() {
            if token.user_id != user_id || !token.is_active_at(now) {
                continue;
            }
            if token.revoke(reason, now) {
                count += 1;
            }
        }

        Ok(count)
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let mut tokens = self.tokens.write().await;
        let initial_count = tokens.len();

        tokens.retain(|_, t| {
            let expired = t.expires_at < cutoff;
            let revoked_long_ago = t.revoked_at.map(|at| at < cutoff).unwrap_or(false);
            !(expired || revoked_long_ago)
        });

        Ok((initial_count - tokens.len()) as u64)
    }
}
