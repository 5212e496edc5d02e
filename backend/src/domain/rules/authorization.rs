//! Permission checks as chain rules.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::Rule;
use crate::domain::error::{OperationError, OperationResult};
use crate::domain::permission_cache::PermissionSource;
use crate::domain::session::RequestContext;
use crate::domain::validation::Guarded;

/// Kind of access an [`Authorization`] rule demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// `add` for new entities, `update` for persisted ones.
    Alter,
    /// `view`.
    View,
    /// `delete`.
    Delete,
}

/// Rejects the request unless the caller holds the permission guarding
/// the entity type for the requested access.
#[derive(Clone)]
pub struct Authorization {
    permissions: Arc<dyn PermissionSource>,
    access: Access,
}

impl Authorization {
    pub fn new(permissions: Arc<dyn PermissionSource>, access: Access) -> Self {
        Self {
            permissions,
            access,
        }
    }

    pub fn alter(permissions: Arc<dyn PermissionSource>) -> Self {
        Self::new(permissions, Access::Alter)
    }

    pub fn view(permissions: Arc<dyn PermissionSource>) -> Self {
        Self::new(permissions, Access::View)
    }

    pub fn delete(permissions: Arc<dyn PermissionSource>) -> Self {
        Self::new(permissions, Access::Delete)
    }

    fn key_for<E: Guarded>(&self, entity: &E) -> &'static str {
        let keys = E::PERMISSIONS;
        match self.access {
            Access::Alter if entity.is_persisted() => keys.update,
            Access::Alter => keys.add,
            Access::View => keys.view,
            Access::Delete => keys.delete,
        }
    }
}

#[async_trait]
impl<E> Rule<E> for Authorization
where
    E: Guarded + Sync,
{
    async fn check(&self, entity: &E, context: &RequestContext) -> OperationResult<()> {
        let key = self.key_for(entity);
        require_permission(self.permissions.as_ref(), context, key).await
    }
}

/// Fail unless `key` resolves to a granted permission for the caller.
///
/// Infrastructure failures and missing sessions propagate unchanged.
pub async fn require_permission(
    permissions: &dyn PermissionSource,
    context: &RequestContext,
    key: &str,
) -> OperationResult<()> {
    let value = permissions.permission(context, key).await?;
    if value.is_granted() {
        return Ok(());
    }
    debug!(permission = key, ?value, "permission not granted");
    Err(OperationError::permission_denied(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission_cache::{MockPermissionSource, PermissionValue};
    use crate::domain::{Client, RequestContext, SessionToken};
    use rstest::rstest;

    fn source_answering(key: &'static str, value: PermissionValue) -> Arc<dyn PermissionSource> {
        let mut source = MockPermissionSource::new();
        source
            .expect_permission()
            .withf(move |_, requested| requested == key)
            .times(1)
            .return_once(move |_, _| Ok(value));
        Arc::new(source)
    }

    fn context() -> RequestContext {
        RequestContext::authenticated(SessionToken::generate())
    }

    #[rstest]
    #[case(Client::default(), "clients.add")]
    #[case(Client::with_id(3), "clients.update")]
    #[tokio::test]
    async fn alter_picks_key_from_persistence(#[case] client: Client, #[case] key: &'static str) {
        let rule = Authorization::alter(source_answering(key, PermissionValue::granted()));
        assert!(rule.check(&client, &context()).await.is_ok());
    }

    #[rstest]
    #[case(PermissionValue::Missing)]
    #[case(PermissionValue::Present("0".into()))]
    #[tokio::test]
    async fn anything_but_granted_is_denied(#[case] value: PermissionValue) {
        let rule = Authorization::delete(source_answering("clients.delete", value));
        let err = rule
            .check(&Client::with_id(1), &context())
            .await
            .expect_err("not granted");
        assert!(err.is_logic());
        assert_eq!(err.message(), "not authorised: clients.delete");
    }

    #[rstest]
    #[tokio::test]
    async fn lookup_failures_propagate() {
        let mut source = MockPermissionSource::new();
        source
            .expect_permission()
            .withf(|_, key| key == "clients.view")
            .return_once(|_, _| Err(OperationError::failure_with("cache down")));
        let rule = Authorization::view(Arc::new(source));
        let err = rule
            .check(&Client::default(), &context())
            .await
            .expect_err("failure");
        assert!(err.is_failure());
    }
}
