//! MySQL implementation of the RefreshTokenRepository trait.
//!
//! Issuance and rotation each run in one transaction. Every state change is
//! an `UPDATE ... WHERE is_revoked = FALSE` whose `rows_affected()` decides
//! the outcome, so concurrent writers cannot both win and a revocation
//! reason is never overwritten.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySql, MySqlPool, Row, Transaction};

use sg_core::domain::entities::device::DeviceInfo;
use sg_core::domain::entities::token::{RefreshToken, RevocationReason};
use sg_core::errors::{DomainError, DomainResult, TokenError};
use sg_core::repositories::RefreshTokenRepository;

macro_rules! columns {
    () => {
        "token, user_id, access_token_jti, expires_at, created_at, last_used_at, \
         is_revoked, revoked_reason, revoked_at, replaced_by_token, is_current, \
         device_name, user_agent, ip_address, platform, browser"
    };
}

/// Every column of `refresh_tokens`, in insert order
pub const COLUMNS: &str = columns!();

pub(crate) const SELECT_BY_TOKEN: &str =
    concat!("SELECT ", columns!(), " FROM refresh_tokens WHERE token = ? LIMIT 1");

pub(crate) const SELECT_ACTIVE_BY_USER: &str = concat!(
    "SELECT ",
    columns!(),
    " FROM refresh_tokens WHERE user_id = ? AND is_revoked = FALSE AND expires_at > ? \
     ORDER BY last_used_at DESC"
);

pub(crate) const SELECT_ACTIVE_BY_USER_EXCEPT: &str = concat!(
    "SELECT ",
    columns!(),
    " FROM refresh_tokens WHERE user_id = ? AND access_token_jti <> ? \
     AND is_revoked = FALSE AND expires_at > ? ORDER BY last_used_at DESC"
);

pub(crate) const INSERT: &str = concat!(
    "INSERT INTO refresh_tokens (",
    columns!(),
    ") VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
);

pub(crate) const CLEAR_CURRENT: &str =
    "UPDATE refresh_tokens SET is_current = FALSE WHERE user_id = ? AND is_current = TRUE";

pub(crate) const MARK_REPLACED: &str = "UPDATE refresh_tokens \
     SET is_revoked = TRUE, revoked_reason = ?, revoked_at = ?, replaced_by_token = ?, \
     is_current = FALSE \
     WHERE token = ? AND is_revoked = FALSE";

pub(crate) const REVOKE: &str = "UPDATE refresh_tokens \
     SET is_revoked = TRUE, revoked_reason = ?, revoked_at = ?, is_current = FALSE \
     WHERE token = ? AND is_revoked = FALSE";

pub(crate) const REVOKE_OWNED: &str = "UPDATE refresh_tokens \
     SET is_revoked = TRUE, revoked_reason = ?, revoked_at = ?, is_current = FALSE \
     WHERE token = ? AND user_id = ? AND is_revoked = FALSE";

pub(crate) const REVOKE_ACTIVE_FOR_USER: &str = "UPDATE refresh_tokens \
     SET is_revoked = TRUE, revoked_reason = ?, revoked_at = ?, is_current = FALSE \
     WHERE user_id = ? AND is_revoked = FALSE AND expires_at > ?";

pub(crate) const DELETE_STALE: &str = "DELETE FROM refresh_tokens \
     WHERE expires_at < ? OR (revoked_at IS NOT NULL AND revoked_at < ?)";

pub(crate) const TOKEN_EXISTS: &str = "SELECT 1 FROM refresh_tokens WHERE token = ? LIMIT 1";

/// Maps a driver failure to the domain, logging it with the operation name
pub(crate) fn store_error(operation: &'static str, err: sqlx::Error) -> DomainError {
    tracing::error!(operation, error = %err, "Refresh-token store query failed");
    DomainError::StoreUnavailable {
        message: format!("{} failed: {}", operation, err),
    }
}

/// Like [`store_error`], but a primary-key clash means the generated token collided
pub(crate) fn insert_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            tracing::warn!(event = "refresh_token_collision", "Refresh token already stored");
            TokenError::TokenGenerationFailed.into()
        }
        _ => store_error("insert", err),
    }
}

/// MySQL implementation of RefreshTokenRepository
#[derive(Clone)]
pub struct MySqlRefreshTokenRepository {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlRefreshTokenRepository {
    /// Create a new MySQL refresh-token repository
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Convert database row to RefreshToken entity
    fn row_to_token(row: &MySqlRow) -> DomainResult<RefreshToken> {
        fn get<'r, T>(row: &'r MySqlRow, column: &str) -> DomainResult<T>
        where
            T: sqlx::Decode<'r, MySql> + sqlx::Type<MySql>,
        {
            row.try_get(column).map_err(|e| DomainError::Internal {
                message: format!("Failed to get {}: {}", column, e),
            })
        }

        Ok(RefreshToken {
            token: get(row, "token")?,
            user_id: get(row, "user_id")?,
            access_token_jti: get(row, "access_token_jti")?,
            expires_at: get(row, "expires_at")?,
            created_at: get(row, "created_at")?,
            last_used_at: get(row, "last_used_at")?,
            is_revoked: get(row, "is_revoked")?,
            revoked_reason: get(row, "revoked_reason")?,
            revoked_at: get(row, "revoked_at")?,
            replaced_by_token: get(row, "replaced_by_token")?,
            is_current: get(row, "is_current")?,
            device: DeviceInfo {
                device_name: get(row, "device_name")?,
                user_agent: get(row, "user_agent")?,
                ip_address: get(row, "ip_address")?,
                platform: get(row, "platform")?,
                browser: get(row, "browser")?,
            },
        })
    }

    async fn fetch_all(
        &self,
        query: sqlx::query::Query<'_, MySql, sqlx::mysql::MySqlArguments>,
        operation: &'static str,
    ) -> DomainResult<Vec<RefreshToken>> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| store_error(operation, e))?;

        rows.iter().map(Self::row_to_token).collect()
    }

    async fn begin(&self) -> DomainResult<Transaction<'static, MySql>> {
        self.pool.begin().await.map_err(|e| store_error("begin", e))
    }

    /// Clears the owner's current flag and inserts `record` inside `tx`
    async fn insert_in(tx: &mut Transaction<'static, MySql>, record: &RefreshToken) -> DomainResult<()> {
        sqlx::query(CLEAR_CURRENT)
            .bind(&record.user_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| store_error("clear_current", e))?;

        sqlx::query(INSERT)
            .bind(&record.token)
            .bind(&record.user_id)
            .bind(&record.access_token_jti)
            .bind(record.expires_at)
            .bind(record.created_at)
            .bind(record.last_used_at)
            .bind(record.is_revoked)
            .bind(&record.revoked_reason)
            .bind(record.revoked_at)
            .bind(&record.replaced_by_token)
            .bind(record.is_current)
            .bind(&record.device.device_name)
            .bind(&record.device.user_agent)
            .bind(&record.device.ip_address)
            .bind(&record.device.platform)
            .bind(&record.device.browser)
            .execute(&mut **tx)
            .await
            .map_err(insert_error)?;

        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for MySqlRefreshTokenRepository {
    async fn find_by_token(&self, token: &str) -> DomainResult<Option<RefreshToken>> {
        let row = sqlx::query(SELECT_BY_TOKEN)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("find_by_token", e))?;

        row.as_ref().map(Self::row_to_token).transpose()
    }

    async fn find_active_by_user(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        let query = sqlx::query(SELECT_ACTIVE_BY_USER).bind(user_id).bind(now);
        self.fetch_all(query, "find_active_by_user").await
    }

    async fn find_active_by_user_except(
        &self,
        user_id: &str,
        jti: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<RefreshToken>> {
        let query = sqlx::query(SELECT_ACTIVE_BY_USER_EXCEPT)
            .bind(user_id)
            .bind(jti)
            .bind(now);
        self.fetch_all(query, "find_active_by_user_except").await
    }

    async fn insert_current(&self, record: RefreshToken) -> DomainResult<()> {
        let mut tx = self.begin().await?;
        Self::insert_in(&mut tx, &record).await?;
        tx.commit().await.map_err(|e| store_error("commit", e))
    }

    async fn rotate(
        &self,
        presented: &str,
        replacement: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tx = self.begin().await?;

        let result = sqlx::query(MARK_REPLACED)
            .bind(RevocationReason::Replaced.as_str())
            .bind(now)
            .bind(&replacement.token)
            .bind(presented)
            .execute(&mut *tx)
            .await
            .map_err(|e| store_error("rotate", e))?;

        if result.rows_affected() == 0 {
            // Someone else redeemed or revoked it first; nothing to keep.
            tx.rollback().await.map_err(|e| store_error("rollback", e))?;
            return Ok(false);
        }

        Self::insert_in(&mut tx, &replacement).await?;
        tx.commit().await.map_err(|e| store_error("commit", e))?;
        Ok(true)
    }

    async fn revoke(
        &self,
        token: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(REVOKE)
            .bind(reason.as_str())
            .bind(now)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("revoke", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_owned(
        &self,
        token: &str,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let result = sqlx::query(REVOKE_OWNED)
            .bind(reason.as_str())
            .bind(now)
            .bind(token)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("revoke_owned", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_active_for_user(
        &self,
        user_id: &str,
        reason: RevocationReason,
        now: DateTime<Utc>,
    ) -> DomainResult<u64> {
        let result = sqlx::query(REVOKE_ACTIVE_FOR_USER)
            .bind(reason.as_str())
            .bind(now)
            .bind(user_id)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("revoke_active_for_user", e))?;

        Ok(result.rows_affected())
    }

    async fn delete_stale(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query(DELETE_STALE)
            .bind(cutoff)
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| store_error("delete_stale", e))?;

        Ok(result.rows_affected())
    }

    async fn token_exists(&self, token: &str) -> DomainResult<bool> {
        let row = sqlx::query(TOKEN_EXISTS)
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| store_error("token_exists", e))?;

        Ok(row.is_some())
    }
}
