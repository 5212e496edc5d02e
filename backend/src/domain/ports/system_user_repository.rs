//! Port abstraction for system user persistence.
use async_trait::async_trait;
use pagination::ListPlan;

use crate::domain::{SystemUser, SystemUserId};

use super::RepositoryError;

/// Rows in other tables that refer to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserReferences {
    /// Settings owned by the user.
    pub settings: u64,
    /// Time entries recorded by the user.
    pub timings: u64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SystemUserRepository: Send + Sync {
    /// Store a new user and return it with its assigned identifier.
    async fn insert_user(&self, user: &SystemUser) -> Result<SystemUser, RepositoryError>;

    /// Overwrite an existing user; `None` when it does not exist.
    async fn update_user(&self, user: &SystemUser)
    -> Result<Option<SystemUser>, RepositoryError>;

    /// Remove a user; `false` when it did not exist.
    async fn delete_user(&self, id: &SystemUserId) -> Result<bool, RepositoryError>;

    /// Fetch a user by identifier.
    async fn find_user(&self, id: &SystemUserId) -> Result<Option<SystemUser>, RepositoryError>;

    /// Fetch a user by exact email.
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<SystemUser>, RepositoryError>;

    /// List users according to `plan`.
    async fn list_users(&self, plan: &ListPlan) -> Result<Vec<SystemUser>, RepositoryError>;

    /// Count rows referring to the user.
    async fn count_user_references(
        &self,
        id: &SystemUserId,
    ) -> Result<UserReferences, RepositoryError>;
}
