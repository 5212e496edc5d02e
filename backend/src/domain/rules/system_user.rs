//! Integrity and side-effect rules specific to system users.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use super::Rule;
use crate::domain::credential_cache::CredentialCache;
use crate::domain::error::{OperationError, OperationResult};
use crate::domain::ports::{CacheStore, SystemUserRepository};
use crate::domain::session::RequestContext;
use crate::domain::system_user::SystemUser;

/// Rejects a user whose email already belongs to a different user.
pub struct UniqueEmail<U> {
    users: Arc<U>,
}

impl<U> UniqueEmail<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> Rule<SystemUser> for UniqueEmail<U>
where
    U: SystemUserRepository,
{
    async fn check(&self, user: &SystemUser, _context: &RequestContext) -> OperationResult<()> {
        let existing = self
            .users
            .find_user_by_email(&user.email)
            .await
            .map_err(OperationError::failure_with)?;
        match existing {
            Some(other) if other.id != user.id => Err(OperationError::logic(
                "a user with this email address already exists",
            )),
            _ => Ok(()),
        }
    }
}

/// Blocks deletion of a user that settings or time entries still refer to.
pub struct NoDependents<U> {
    users: Arc<U>,
}

impl<U> NoDependents<U> {
    pub fn new(users: Arc<U>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl<U> Rule<SystemUser> for NoDependents<U>
where
    U: SystemUserRepository,
{
    async fn check(&self, user: &SystemUser, _context: &RequestContext) -> OperationResult<()> {
        let Some(id) = user.id.as_ref() else {
            return Ok(());
        };
        let references = self
            .users
            .count_user_references(id)
            .await
            .map_err(OperationError::failure_with)?;
        if references.settings > 0 {
            return Err(OperationError::logic_with_details(
                "user is still referenced by settings",
                json!({ "settings": references.settings }),
            ));
        }
        if references.timings > 0 {
            return Err(OperationError::logic_with_details(
                "user is still referenced by timings",
                json!({ "timings": references.timings }),
            ));
        }
        Ok(())
    }
}

/// A user record before and after a successful update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserTransition {
    pub before: SystemUser,
    pub after: SystemUser,
}

impl UserTransition {
    /// Whether the active flag changed.
    pub fn active_flag_changed(&self) -> bool {
        self.before.is_active != self.after.is_active
    }
}

/// Revokes every session of a user whose active flag changed.
pub struct RevokeSessionsOnStatusChange<C> {
    credentials: Arc<CredentialCache<C>>,
}

impl<C> RevokeSessionsOnStatusChange<C> {
    pub fn new(credentials: Arc<CredentialCache<C>>) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl<C> Rule<UserTransition> for RevokeSessionsOnStatusChange<C>
where
    C: CacheStore,
{
    async fn check(
        &self,
        transition: &UserTransition,
        _context: &RequestContext,
    ) -> OperationResult<()> {
        if !transition.active_flag_changed() {
            return Ok(());
        }
        let Some(id) = transition.after.id.as_ref() else {
            return Ok(());
        };
        let revoked = self.credentials.revoke_all(id).await?;
        info!(user = %id, revoked, active = transition.after.is_active, "active flag changed");
        Ok(())
    }
}
