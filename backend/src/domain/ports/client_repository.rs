//! Port abstraction for client persistence.
use async_trait::async_trait;
use pagination::ListPlan;

use crate::domain::Client;

use super::RepositoryError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// Store a new client and return it with its assigned identifier.
    async fn insert_client(&self, client: &Client) -> Result<Client, RepositoryError>;

    /// Overwrite an existing client; `None` when it does not exist.
    async fn update_client(&self, client: &Client) -> Result<Option<Client>, RepositoryError>;

    /// Remove a client; `false` when it did not exist.
    async fn delete_client(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Fetch a client by identifier.
    async fn find_client(&self, id: i64) -> Result<Option<Client>, RepositoryError>;

    /// List clients according to `plan`.
    async fn list_clients(&self, plan: &ListPlan) -> Result<Vec<Client>, RepositoryError>;
}
