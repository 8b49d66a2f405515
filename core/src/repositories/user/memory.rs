//! In-memory identity store implementing both collaborator contracts

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entities::user::User;
use crate::errors::DomainResult;

use super::r#trait::{RoleRepository, UserRepository};

#[derive(Default)]
struct Directory {
    users: HashMap<String, User>,
    roles: HashMap<String, BTreeSet<String>>,
}

/// Users and their role assignments held in process memory
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    inner: Arc<RwLock<Directory>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user together with its roles
    pub async fn insert<I, S>(&self, user: User, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dir = self.inner.write().await;
        dir.roles
            .insert(user.id.clone(), roles.into_iter().map(Into::into).collect());
        dir.users.insert(user.id.clone(), user);
    }

    /// Replaces the role assignment of an existing user
    pub async fn set_roles<I, S>(&self, user_id: &str, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dir = self.inner.write().await;
        dir.roles
            .insert(user_id.to_string(), roles.into_iter().map(Into::into).collect());
    }

    pub async fn remove(&self, user_id: &str) {
        let mut dir = self.inner.write().await;
        dir.users.remove(user_id);
        dir.roles.remove(user_id);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }
}

#[async_trait]
impl RoleRepository for InMemoryUserRepository {
    async fn roles_for_user(&self, user_id: &str) -> DomainResult<BTreeSet<String>> {
        Ok(self
            .inner
            .read()
            .await
            .roles
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }
}
