//! Device-session listing returned to a user

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::domain::entities::device::DeviceSession;
use crate::domain::entities::token::RefreshToken;

/// Active sessions of one user, most recently used first
///
/// Sessions are projected lazily from the underlying records each time
/// [`iter`](Self::iter) is called, so the listing can be walked any number
/// of times.
#[derive(Debug, Clone)]
pub struct DeviceSessions {
    records: Vec<RefreshToken>,
    current_jti: Option<String>,
}

impl DeviceSessions {
    pub(crate) fn new(
        mut records: Vec<RefreshToken>,
        current_jti: Option<&str>,
        now: DateTime<Utc>,
    ) -> Self {
        records.retain(|r| r.is_active_at(now));
        records.sort_by(|a, b| b.last_used_at.cmp(&a.last_used_at));
        Self {
            records,
            current_jti: current_jti.map(str::to_string),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = DeviceSession> + '_ {
        let current = self.current_jti.as_deref();
        self.records
            .iter()
            .map(move |record| DeviceSession::from_record(record, current))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The session belonging to the caller, if it is still active
    pub fn current(&self) -> Option<DeviceSession> {
        self.iter().find(|s| s.is_current_session)
    }

    pub fn to_vec(&self) -> Vec<DeviceSession> {
        self.iter().collect()
    }
}

impl Serialize for DeviceSessions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
