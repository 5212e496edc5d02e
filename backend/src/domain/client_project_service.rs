//! Client project use cases guarded by rule chains.

use std::sync::Arc;

use pagination::QuerySpec;
use tracing::debug;

use super::client_project::ClientProject;
use super::error::{OperationError, OperationResult};
use super::guards::{existing_id, positive_id};
use super::listing::plan_listing;
use super::permission_cache::PermissionSource;
use super::ports::ClientProjectRepository;
use super::rules::{Authorization, RuleChain, Validation};
use super::session::RequestContext;

const ENTITY: &str = "client project";

/// Create, update, delete and query client projects.
pub struct ClientProjectService<R> {
    projects: Arc<R>,
    create_rules: RuleChain<ClientProject>,
    update_rules: RuleChain<ClientProject>,
    delete_rules: RuleChain<ClientProject>,
    read_rules: RuleChain<ClientProject>,
}

impl<R> ClientProjectService<R>
where
    R: ClientProjectRepository,
{
    pub fn new(projects: Arc<R>, permissions: &Arc<dyn PermissionSource>) -> Self {
        Self {
            projects,
            create_rules: RuleChain::new()
                .then(Validation::full())
                .then(Authorization::alter(Arc::clone(permissions))),
            update_rules: RuleChain::new()
                .then(Validation::changes())
                .then(Authorization::alter(Arc::clone(permissions))),
            delete_rules: RuleChain::new().then(Authorization::delete(Arc::clone(permissions))),
            read_rules: RuleChain::new().then(Authorization::view(Arc::clone(permissions))),
        }
    }

    pub async fn create(
        &self,
        project: ClientProject,
        context: &RequestContext,
    ) -> OperationResult<ClientProject> {
        let candidate = ClientProject { id: None, ..project };
        self.create_rules.run(&candidate, context).await?;
        let created = self
            .projects
            .insert_project(&candidate)
            .await
            .map_err(OperationError::failure_with)?;
        debug!(id = ?created.id, client = created.client_id, "client project created");
        Ok(created)
    }

    /// Overwrite name and active flag; the owning client stays as stored.
    pub async fn update(
        &self,
        project: ClientProject,
        context: &RequestContext,
    ) -> OperationResult<ClientProject> {
        existing_id(project.id, ENTITY)?;
        self.update_rules.run(&project, context).await?;
        self.projects
            .update_project(&project)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    pub async fn delete(&self, id: i64, context: &RequestContext) -> OperationResult<()> {
        positive_id(id, ENTITY)?;
        self.delete_rules
            .run(&ClientProject::with_id(id), context)
            .await?;
        let removed = self
            .projects
            .delete_project(id)
            .await
            .map_err(OperationError::failure_with)?;
        if !removed {
            return Err(OperationError::not_found(ENTITY));
        }
        Ok(())
    }

    pub async fn get_by_id(
        &self,
        id: i64,
        context: &RequestContext,
    ) -> OperationResult<ClientProject> {
        positive_id(id, ENTITY)?;
        self.read_rules
            .run(&ClientProject::with_id(id), context)
            .await?;
        self.projects
            .find_project(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    pub async fn get_all(
        &self,
        query: &QuerySpec,
        context: &RequestContext,
    ) -> OperationResult<Vec<ClientProject>> {
        self.read_rules
            .run(&ClientProject::default(), context)
            .await?;
        let plan = plan_listing::<ClientProject>(query)?;
        self.projects
            .list_projects(&plan)
            .await
            .map_err(OperationError::failure_with)
    }

    /// Every project of one client.
    pub async fn get_by_client_id(
        &self,
        client_id: i64,
        context: &RequestContext,
    ) -> OperationResult<Vec<ClientProject>> {
        positive_id(client_id, "client")?;
        self.read_rules
            .run(&ClientProject::default(), context)
            .await?;
        self.projects
            .projects_for_client(client_id)
            .await
            .map_err(OperationError::failure_with)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission_cache::{MockPermissionSource, PermissionValue};
    use crate::domain::ports::MockClientProjectRepository;
    use crate::domain::SessionToken;
    use rstest::rstest;

    fn granting_everything() -> Arc<dyn PermissionSource> {
        let mut source = MockPermissionSource::new();
        source
            .expect_permission()
            .returning(|_, _| Ok(PermissionValue::granted()));
        Arc::new(source)
    }

    fn context() -> RequestContext {
        RequestContext::authenticated(SessionToken::generate())
    }

    #[rstest]
    #[tokio::test]
    async fn create_requires_an_owning_client() {
        let mut repo = MockClientProjectRepository::new();
        repo.expect_insert_project().never();
        let service = ClientProjectService::new(Arc::new(repo), &granting_everything());

        let err = service
            .create(
                ClientProject {
                    name: "Website".into(),
                    ..ClientProject::default()
                },
                &context(),
            )
            .await
            .expect_err("client missing");
        assert_eq!(err.message(), "client id is required");
    }

    #[rstest]
    #[tokio::test]
    async fn update_does_not_require_the_client_id() {
        let mut repo = MockClientProjectRepository::new();
        repo.expect_update_project()
            .times(1)
            .returning(|project| Ok(Some(project.clone())));
        let service = ClientProjectService::new(Arc::new(repo), &granting_everything());

        let updated = service
            .update(
                ClientProject {
                    id: Some(2),
                    name: "Mobile app".into(),
                    ..ClientProject::default()
                },
                &context(),
            )
            .await
            .expect("updated");
        assert_eq!(updated.name, "Mobile app");
    }

    #[rstest]
    #[tokio::test]
    async fn lists_projects_of_a_client() {
        let mut repo = MockClientProjectRepository::new();
        repo.expect_projects_for_client()
            .withf(|client_id| *client_id == 7)
            .return_once(|client_id| {
                Ok(vec![ClientProject {
                    id: Some(1),
                    client_id,
                    name: "Audit".into(),
                    is_active: true,
                }])
            });
        let service = ClientProjectService::new(Arc::new(repo), &granting_everything());

        let projects = service
            .get_by_client_id(7, &context())
            .await
            .expect("listed");
        assert_eq!(projects.len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn delete_of_unknown_project_is_reported() {
        let mut repo = MockClientProjectRepository::new();
        repo.expect_delete_project().return_once(|_| Ok(false));
        let service = ClientProjectService::new(Arc::new(repo), &granting_everything());

        let err = service.delete(99, &context()).await.expect_err("missing");
        assert_eq!(err.message(), "client project not found");
    }
}
