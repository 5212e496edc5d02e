//! Port abstraction for client project persistence.
use async_trait::async_trait;
use pagination::ListPlan;

use crate::domain::ClientProject;

use super::RepositoryError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientProjectRepository: Send + Sync {
    /// Store a new project and return it with its assigned identifier.
    async fn insert_project(
        &self,
        project: &ClientProject,
    ) -> Result<ClientProject, RepositoryError>;

    /// Overwrite the mutable fields of an existing project.
    ///
    /// The owning client is never changed. `None` when it does not exist.
    async fn update_project(
        &self,
        project: &ClientProject,
    ) -> Result<Option<ClientProject>, RepositoryError>;

    /// Remove a project; `false` when it did not exist.
    async fn delete_project(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Fetch a project by identifier.
    async fn find_project(&self, id: i64) -> Result<Option<ClientProject>, RepositoryError>;

    /// List projects according to `plan`.
    async fn list_projects(&self, plan: &ListPlan)
    -> Result<Vec<ClientProject>, RepositoryError>;

    /// Every project of one client.
    async fn projects_for_client(
        &self,
        client_id: i64,
    ) -> Result<Vec<ClientProject>, RepositoryError>;
}
