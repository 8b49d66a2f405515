//! Refresh-token store contract consumed by the token service.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::token::{RefreshToken, RevocationReason};
use crate::errors::DomainResult;

/// Persistence contract for refresh-token records
///
/// The token service is the only writer of state transitions and assumes
/// nothing about the storage technology beyond these operations.
///
/// # Consistency
/// - [`insert_current`](Self::insert_current) and [`rotate`](Self::rotate)
///   each run inside one consistency boundary (a transaction, or a single
///   lock for in-memory stores).
/// - [`rotate`](Self::rotate) is a conditional write keyed on the presented
///   token and `is_revoked = false`: of two concurrent callers presenting the
///   same token exactly one observes `true`.
/// - Every revocation is monotonic and never overwrites an existing
///   `revoked_reason`.
///
/// # Example
/// ```no_run
/// # use chrono::Utc;
/// # use sg_core::repositories::RefreshTokenRepository;
/// # async fn example(repo: &impl RefreshTokenRepository) -> sg_core::errors::DomainResult<()> {
/// let sessions = repo.find_active_by_user("user-1", Utc::now()).await?;
/// println!("user-1 is signed in on {} devices", sessions.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Find a record by its token string, whatever its state
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>>;

    /// Records owned by `user_id` that are neither revoked nor expired at `now`
    async fn find_active_by_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>>;

    /// Active records owned by `user_id` whose `access_token_jti` differs from `jti`
    async fn find_active_by_user_except(
        &self,
        user_id: &str,
        jti: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>>;

    /// Clears `is_current` on every record of the owner and inserts `record`
    ///
    /// # Returns
    /// * `Err(DomainError::Token(TokenGenerationFailed))` - A record with the same token exists
    async fn insert_current(&self, record: RefreshToken) -> DomainResult<()>;

    /// Single-use redemption of `presented`
    ///
    /// Revokes `presented` with reason `Replaced by new token` and
    /// `replaced_by_token = replacement.token` only while it is still
    /// unrevoked; on success clears `is_current` for the owner and inserts
    /// `replacement`, all in one consistency boundary.
    ///
    /// # Returns
    /// * `Ok(true)` - This caller won the rotation
    /// * `Ok(false)` - The token was missing or already revoked; nothing was written
    async fn rotate(
        &self,
        presented: &str,
        replacement: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Revokes one record if it is not revoked yet
    ///
    /// # Returns
    /// * `Ok(true)` - The record transitioned to revoked
    /// * `Ok(false)` - Unknown token or already revoked
    async fn revoke(
        &self,
        token: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Like [`revoke`](Self::revoke) but only when the record belongs to `user_id`
    async fn revoke_owned(
        &self,
        token: &str,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool>;

    /// Revokes every record of `user_id` that is active at `now`
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records revoked
    async fn revoke_active_for_user(
        &self,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64>;

    /// Deletes records that expired, or were revoked, before `cutoff`
    ///
    /// # Returns
    /// * `Ok(u64)` - Number of records deleted
    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;

    /// Whether any record, in any state, already uses `token`
    async fn token_exists(&self, token: &str) -> DomainResult<bool> {
        Ok(self.find_by_token(token).await?.is_some())
    }
}
