//! User entity as seen by the token service.

use serde::{Deserialize, Serialize};

/// Account resolved from the identity store. Credentials are never carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable user identifier, used as the token subject
    pub id: String,

    pub user_name: String,

    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            user_name: user_name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}
