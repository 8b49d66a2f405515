//! Token entities for JWT-based authentication with rotating refresh tokens.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceInfo;

/// Value of `tokenType` in every bundle handed to a client
pub const TOKEN_TYPE_BEARER: &str = "Bearer";

/// Claims structure for the access-token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,

    /// JWT ID, correlating the access token with its refresh-token record
    pub jti: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// Role names held by the subject at issuance
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Claims {
    /// Gets the user ID from the claims
    pub fn user_id(&self) -> &str {
        &self.sub
    }

    /// Checks whether the role set carried by the token contains `role`
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Expiry as a UTC timestamp
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.exp, 0).single()
    }
}

/// Why a refresh token was revoked. The string form is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    /// Redeemed during rotation
    Replaced,
    /// Explicit logout or device-session removal
    Manual,
    /// Sign-out everywhere
    AllRevoked,
    /// Sign-out everywhere else
    OthersRevoked,
}

impl RevocationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevocationReason::Replaced => "Replaced by new token",
            RevocationReason::Manual => "Manually revoked",
            RevocationReason::AllRevoked => "All tokens revoked",
            RevocationReason::OthersRevoked => "Other tokens revoked",
        }
    }
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refresh token record persisted by the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshToken {
    /// Opaque URL-safe token string, unique across all records
    pub token: String,

    /// User this token belongs to
    pub user_id: String,

    /// `jti` of the access token issued alongside this record
    pub access_token_jti: String,

    pub expires_at: DateTime<Utc>,

    pub created_at: DateTime<Utc>,

    pub last_used_at: DateTime<Utc>,

    /// Monotonic: once true it never goes back
    pub is_revoked: bool,

    /// Reason recorded at the first revocation
    pub revoked_reason: Option<String>,

    pub revoked_at: Option<DateTime<Utc>>,

    /// Set only when revoked by rotation
    pub replaced_by_token: Option<String>,

    /// Most recently issued record across all of the user's devices
    pub is_current: bool,

    #[serde(flatten)]
    pub device: DeviceInfo,
}

impl RefreshToken {
    /// Creates a fresh, active, current record
    ///
    /// # Arguments
    ///
    /// * `token` - The opaque refresh token string
    /// * `user_id` - Owner of the token
    /// * `access_token_jti` - `jti` of the companion access token
    /// * `lifetime` - How long the refresh token stays redeemable
    /// * `device` - Device metadata, copied verbatim
    /// * `now` - Issuance instant
    pub fn new(
        token: String,
        user_id: impl Into<String>,
        access_token_jti: impl Into<String>,
        lifetime: Duration,
        device: DeviceInfo,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token,
            user_id: user_id.into(),
            access_token_jti: access_token_jti.into(),
            expires_at: now + lifetime,
            created_at: now,
            last_used_at: now,
            is_revoked: false,
            revoked_reason: None,
            revoked_at: None,
            replaced_by_token: None,
            is_current: true,
            device,
        }
    }

    /// Expired at `now`; a token whose expiry equals `now` is already expired
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Not revoked and not expired at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked && !self.is_expired_at(now)
    }

    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    /// Revokes the record. Returns `false` without touching anything if it
    /// was already revoked, so the first reason is never overwritten.
    pub fn revoke(&mut self, reason: RevocationReason, at: DateTime<Utc>) -> bool {
        if self.is_revoked {
            return false;
        }
        self.is_revoked = true;
        self.revoked_reason = Some(reason.as_str().to_string());
        self.revoked_at = Some(at);
        self.is_current = false;
        true
    }

    /// Revokes the record as redeemed by rotation in favour of `replacement`
    pub fn mark_replaced(&mut self, replacement: &str, at: DateTime<Utc>) -> bool {
        if !self.revoke(RevocationReason::Replaced, at) {
            return false;
        }
        self.replaced_by_token = Some(replacement.to_string());
        true
    }
}

/// Credentials returned to the client after login or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBundle {
    /// Signed access token
    pub access_token: String,

    /// Opaque refresh token
    pub refresh_token: String,

    /// Expiry of the access token
    pub expires_at: DateTime<Utc>,

    /// Always `Bearer`
    pub token_type: String,
}

impl TokenBundle {
    pub fn new(access_token: String, refresh_token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
            token_type: TOKEN_TYPE_BEARER.to_string(),
        }
    }
}
