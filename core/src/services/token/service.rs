//! Token lifecycle service: issuance, rotation, revocation and device sessions

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::domain::entities::device::{DeviceInfo, DeviceSession};
use crate::domain::entities::token::{Claims, RefreshToken, RevocationReason, TokenBundle};
use crate::domain::entities::user::User;
use crate::errors::{AuthError, DomainError, DomainResult, TokenError};
use crate::repositories::{RefreshTokenRepository, RoleRepository, UserRepository};

use super::config::TokenServiceConfig;
use super::generator::{generate_jti, generate_refresh_token};
use super::sessions::DeviceSessions;
use super::signer::TokenSigner;

/// Orchestrates the full life of a session credential pair
///
/// The service keeps no mutable state of its own; the refresh-token store is
/// the single shared resource, and every state transition goes through it.
pub struct TokenService<R, U, P>
where
    R: RefreshTokenRepository,
    U: UserRepository,
    P: RoleRepository,
{
    repository: Arc<R>,
    users: Arc<U>,
    roles: Arc<P>,
    signer: TokenSigner,
    config: TokenServiceConfig,
}

impl<R, U, P> TokenService<R, U, P>
where
    R: RefreshTokenRepository,
    U: UserRepository,
    P: RoleRepository,
{
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `repository` - Refresh-token store
    /// * `users` - Identity lookup
    /// * `roles` - Authoritative role assignments
    /// * `config` - Token service configuration
    ///
    /// # Returns
    ///
    /// A new `TokenService`, or `DomainError::Configuration` if the signing
    /// settings are unusable
    pub fn new(
        repository: Arc<R>,
        users: Arc<U>,
        roles: Arc<P>,
        config: TokenServiceConfig,
    ) -> DomainResult<Self> {
        let signer = TokenSigner::new(&config)?;
        Ok(Self {
            repository,
            users,
            roles,
            signer,
            config,
        })
    }

    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }

    pub fn config(&self) -> &TokenServiceConfig {
        &self.config
    }

    /// Issues a new access/refresh pair for a freshly authenticated user
    ///
    /// The new record becomes the user's only `is_current` record. Other
    /// records stay valid.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenBundle)` - The issued credentials
    /// * `Err(DomainError::StoreUnavailable)` - Store or role lookup failed
    pub async fn generate_tokens(
        &self,
        user: &User,
        device: Option<DeviceInfo>,
    ) -> DomainResult<TokenBundle> {
        let now = Utc::now();
        let roles = self
            .call("roles_for_user", self.roles.roles_for_user(&user.id))
            .await?;

        let mut attempt = 1;
        let (bundle, jti) = loop {
            let (bundle, record) = self.mint(&user.id, &roles, device.clone(), now).await?;
            let jti = record.access_token_jti.clone();

            match self
                .call("insert_current", self.repository.insert_current(record))
                .await
            {
                Ok(()) => break (bundle, jti),
                Err(e) if self.retry_on_collision(&e, attempt) => attempt += 1,
                Err(e) => return Err(e),
            }
        };

        info!(user_id = %user.id, jti = %jti, event = "tokens_issued", "Issued new token pair");
        Ok(bundle)
    }

    /// Redeems a refresh token for a new pair (single-use rotation)
    ///
    /// Roles are re-read from the role store, so a role removed since the
    /// last issuance is absent from the new access token.
    ///
    /// # Returns
    ///
    /// * `Ok(TokenBundle)` - New pair; the presented token is now revoked
    /// * `Err(TokenError::InvalidToken)` - Unknown token
    /// * `Err(TokenError::TokenRevoked)` - Already revoked, including losing a concurrent rotation
    /// * `Err(TokenError::TokenExpired)` - Past its expiry
    /// * `Err(AuthError::UserNotFound)` - Owner no longer exists
    ///
    /// Callers facing a client should pass failures through
    /// [`DomainError::into_refresh_failure`] so the specific case is not disclosed.
    pub async fn refresh_tokens(
        &self,
        presented: &str,
        device: Option<DeviceInfo>,
    ) -> DomainResult<TokenBundle> {
        match self.rotate(presented, device).await {
            Ok(bundle) => Ok(bundle),
            Err(e) if e.is_refresh_rejection() => {
                warn!(kind = e.kind(), event = "refresh_rejected", "Refresh token rejected");
                Err(e)
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, event = "refresh_failed", "Refresh failed");
                Err(e)
            }
        }
    }

    async fn rotate(
        &self,
        presented: &str,
        device: Option<DeviceInfo>,
    ) -> DomainResult<TokenBundle> {
        let now = Utc::now();

        let existing = self
            .call("find_by_token", self.repository.find_by_token(presented))
            .await?
            .ok_or(DomainError::Token(TokenError::InvalidToken))?;

        if existing.is_revoked {
            return Err(TokenError::TokenRevoked.into());
        }
        if existing.is_expired_at(now) {
            return Err(TokenError::TokenExpired.into());
        }

        let user = self
            .call("find_user", self.users.find_by_id(&existing.user_id))
            .await?
            .ok_or(DomainError::Auth(AuthError::UserNotFound))?;

        let roles = self
            .call("roles_for_user", self.roles.roles_for_user(&user.id))
            .await?;

        // Conditional on the presented token still being unrevoked; a
        // concurrent redeemer that got there first leaves us with `false`.
        let mut attempt = 1;
        let (bundle, jti) = loop {
            let (bundle, record) = self.mint(&user.id, &roles, device.clone(), now).await?;
            let jti = record.access_token_jti.clone();

            match self
                .call("rotate", self.repository.rotate(presented, record, now))
                .await
            {
                Ok(true) => break (bundle, jti),
                Ok(false) => return Err(TokenError::TokenRevoked.into()),
                Err(e) if self.retry_on_collision(&e, attempt) => attempt += 1,
                Err(e) => return Err(e),
            }
        };

        info!(
            user_id = %user.id,
            previous_jti = %existing.access_token_jti,
            jti = %jti,
            event = "tokens_rotated",
            "Rotated refresh token"
        );
        Ok(bundle)
    }

    /// Validates an access token without consulting the store
    pub fn validate_access_token(&self, token: &str) -> DomainResult<Claims> {
        self.signer.validate_access_token(token)
    }

    /// Revokes a single refresh token (logout)
    ///
    /// Unknown and already-revoked tokens are a silent no-op; only store
    /// failures are reported.
    pub async fn revoke_refresh_token(&self, token: &str) -> DomainResult<()> {
        let revoked = self
            .call(
                "revoke",
                self.repository
                    .revoke(token, RevocationReason::Manual, Utc::now()),
            )
            .await?;

        if revoked {
            info!(event = "token_revoked", "Refresh token revoked");
        } else {
            debug!(event = "token_revoke_noop", "Refresh token unknown or already revoked");
        }
        Ok(())
    }

    /// Revokes every active refresh token of `user_id`
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of tokens revoked, zero if none were active
    pub async fn revoke_all_user_refresh_tokens(&self, user_id: &str) -> DomainResult<u64> {
        let count = self
            .call(
                "revoke_active_for_user",
                self.repository.revoke_active_for_user(
                    user_id,
                    RevocationReason::AllRevoked,
                    Utc::now(),
                ),
            )
            .await?;

        info!(user_id = %user_id, count, event = "all_tokens_revoked", "Revoked all refresh tokens");
        Ok(count)
    }

    /// Revokes every active refresh token of `user_id` except the one issued
    /// with `keep_jti`
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of tokens revoked
    pub async fn revoke_other_user_refresh_tokens(
        &self,
        user_id: &str,
        keep_jti: &str,
    ) -> DomainResult<u64> {
        let now = Utc::now();
        let others = self
            .call(
                "find_active_by_user_except",
                self.repository
                    .find_active_by_user_except(user_id, keep_jti, now),
            )
            .await?;

        let mut count = 0;
        for other in others {
            // Rows revoked in the meantime keep their original reason.
            let revoked = self
                .call(
                    "revoke",
                    self.repository
                        .revoke(&other.token, RevocationReason::OthersRevoked, now),
                )
                .await?;
            if revoked {
                count += 1;
            }
        }

        info!(
            user_id = %user_id,
            kept_jti = %keep_jti,
            count,
            event = "other_tokens_revoked",
            "Revoked other refresh tokens"
        );
        Ok(count)
    }

    /// Revokes one of the caller's own device sessions
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The session existed, belonged to `requesting_user_id`, and was active
    /// * `Ok(false)` - Unknown token, someone else's token, or already revoked; nothing changed
    pub async fn revoke_device_session(
        &self,
        token: &str,
        requesting_user_id: &str,
    ) -> DomainResult<bool> {
        let revoked = self
            .call(
                "revoke_owned",
                self.repository.revoke_owned(
                    token,
                    requesting_user_id,
                    RevocationReason::Manual,
                    Utc::now(),
                ),
            )
            .await?;

        if revoked {
            info!(user_id = %requesting_user_id, event = "device_session_revoked", "Device session revoked");
        } else {
            warn!(
                user_id = %requesting_user_id,
                event = "device_session_revoke_refused",
                "Device session not found, not owned by caller, or already revoked"
            );
        }
        Ok(revoked)
    }

    /// Lists the active sessions of `user_id`, most recently used first
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner of the sessions
    /// * `current_jti` - `jti` of the caller's own access token; the session
    ///   carrying it is flagged as the requesting session
    pub async fn get_user_device_sessions(
        &self,
        user_id: &str,
        current_jti: Option<&str>,
    ) -> DomainResult<DeviceSessions> {
        let now = Utc::now();
        let records = self
            .call(
                "find_active_by_user",
                self.repository.find_active_by_user(user_id, now),
            )
            .await?;

        Ok(DeviceSessions::new(records, current_jti, now))
    }

    /// The active session issued together with the access token `jti`
    pub async fn find_session_by_jti(
        &self,
        user_id: &str,
        jti: &str,
    ) -> DomainResult<Option<DeviceSession>> {
        let sessions = self.get_user_device_sessions(user_id, Some(jti)).await?;
        Ok(sessions.current())
    }

    /// Deletes records that expired, or were revoked, more than `retention` ago
    ///
    /// # Returns
    ///
    /// * `Ok(u64)` - Number of records removed
    pub async fn cleanup_expired_tokens(&self, retention: Duration) -> DomainResult<u64> {
        let cutoff = Utc::now() - retention;
        let deleted = self
            .call("delete_stale", self.repository.delete_stale(cutoff))
            .await?;

        info!(deleted, cutoff = %cutoff, event = "token_cleanup", "Removed stale refresh tokens");
        Ok(deleted)
    }

    /// Mints a bundle and the record that has to be persisted for it
    async fn mint(
        &self,
        user_id: &str,
        roles: &BTreeSet<String>,
        device: Option<DeviceInfo>,
        now: DateTime<Utc>,
    ) -> DomainResult<(TokenBundle, RefreshToken)> {
        let jti = generate_jti();
        let access_expires_at = now + self.config.access_token_expiry;
        let access_token = self
            .signer
            .issue_access_token(user_id, roles, &jti, access_expires_at)?;

        let refresh_token = self.unique_refresh_token().await?;

        let record = RefreshToken::new(
            refresh_token.clone(),
            user_id,
            jti,
            self.config.refresh_token_expiry,
            device.unwrap_or_default(),
            now,
        );

        Ok((
            TokenBundle::new(access_token, refresh_token, access_expires_at),
            record,
        ))
    }

    async fn unique_refresh_token(&self) -> DomainResult<String> {
        for attempt in 1..=self.config.max_generation_attempts {
            let candidate = generate_refresh_token();
            let taken = self
                .call("token_exists", self.repository.token_exists(&candidate))
                .await?;
            if !taken {
                return Ok(candidate);
            }
            warn!(attempt, event = "refresh_token_collision", "Generated refresh token already exists");
        }

        error!(
            attempts = self.config.max_generation_attempts,
            event = "refresh_token_generation_exhausted",
            "Could not generate a unique refresh token"
        );
        Err(TokenError::TokenGenerationFailed.into())
    }

    /// Whether a store-side token collision on `attempt` leaves room to mint again
    fn retry_on_collision(&self, error: &DomainError, attempt: u32) -> bool {
        let collided = matches!(error, DomainError::Token(TokenError::TokenGenerationFailed));
        if collided && attempt < self.config.max_generation_attempts {
            warn!(attempt, event = "refresh_token_collision", "Store rejected duplicate refresh token");
            return true;
        }
        false
    }

    /// Runs a store or collaborator call under the configured timeout
    async fn call<T, F>(&self, operation: &'static str, fut: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        match tokio::time::timeout(self.config.store_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    operation,
                    timeout_ms = self.config.store_timeout.as_millis() as u64,
                    event = "store_timeout",
                    "Store call timed out"
                );
                Err(DomainError::StoreUnavailable {
                    message: format!("{} timed out", operation),
                })
            }
        }
    }
}
