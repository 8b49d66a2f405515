//! Device metadata attached to refresh tokens and the session view built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::token::RefreshToken;

/// Per-request device metadata. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub platform: Option<String>,
    pub browser: Option<String>,
}

/// Read-only view of one active refresh token, as listed to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
    /// Refresh token identifying the session; pass back to revoke it
    pub token: String,
    pub device_name: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub platform: Option<String>,
    pub browser: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Whether this is the session making the request, derived from the caller's `jti`
    pub is_current_session: bool,
}

impl DeviceSession {
    /// Projects a stored record. `current_jti` is the `jti` of the caller's own
    /// access token; the stored `is_current` column is deliberately not consulted.
    pub fn from_record(record: &RefreshToken, current_jti: Option<&str>) -> Self {
        Self {
            token: record.token.clone(),
            device_name: record.device.device_name.clone(),
            user_agent: record.device.user_agent.clone(),
            ip_address: record.device.ip_address.clone(),
            platform: record.device.platform.clone(),
            browser: record.device.browser.clone(),
            created_at: record.created_at,
            last_used_at: record.last_used_at,
            expires_at: record.expires_at,
            is_current_session: current_jti == Some(record.access_token_jti.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_current_session_ignores_stored_flag() {
        let now = Utc::now();
        let mut record = RefreshToken::new(
            "T1".to_string(),
            "u1",
            "j1",
            Duration::days(1),
            DeviceInfo {
                browser: Some("Firefox 121".to_string()),
                ..Default::default()
            },
            now,
        );
        record.is_current = true;

        let other = DeviceSession::from_record(&record, Some("j2"));
        assert!(!other.is_current_session);

        let mine = DeviceSession::from_record(&record, Some("j1"));
        assert!(mine.is_current_session);
        assert_eq!(mine.browser.as_deref(), Some("Firefox 121"));

        let anonymous = DeviceSession::from_record(&record, None);
        assert!(!anonymous.is_current_session);
    }
}
