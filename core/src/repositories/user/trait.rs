//! Identity and role collaborator contracts.
//!
//! Both are owned by other subsystems; the token service only reads them.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::domain::entities::user::User;
use crate::errors::DomainResult;

/// Read access to the credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by id
    ///
    /// # Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - No such user (deleted, or never existed)
    /// * `Err(DomainError)` - The store could not be queried
    async fn find_by_id(&self, id: &str) -> DomainResult<Option<User>>;
}

/// Authoritative role assignments
///
/// Queried on every issuance and every refresh. Implementations must not
/// serve role sets cached from an earlier issuance.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Role names currently assigned to `user_id`
    async fn roles_for_user(&self, user_id: &str) -> DomainResult<BTreeSet<String>>;
}
