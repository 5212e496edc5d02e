//! Client use cases guarded by rule chains.

use std::sync::Arc;

use pagination::QuerySpec;
use tracing::debug;

use super::client::Client;
use super::error::{OperationError, OperationResult};
use super::guards::{existing_id, positive_id};
use super::listing::plan_listing;
use super::permission_cache::PermissionSource;
use super::ports::ClientRepository;
use super::rules::{Authorization, RuleChain, Validation};
use super::session::RequestContext;

const ENTITY: &str = "client";

/// Create, update, delete and query clients.
pub struct ClientService<R> {
    clients: Arc<R>,
    create_rules: RuleChain<Client>,
    update_rules: RuleChain<Client>,
    delete_rules: RuleChain<Client>,
    read_rules: RuleChain<Client>,
}

impl<R> ClientService<R>
where
    R: ClientRepository,
{
    pub fn new(clients: Arc<R>, permissions: &Arc<dyn PermissionSource>) -> Self {
        Self {
            clients,
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

    /// Store a new client. Any identifier on the input is ignored.
    pub async fn create(&self, client: Client, context: &RequestContext) -> OperationResult<Client> {
        let candidate = Client { id: None, ..client };
        self.create_rules.run(&candidate, context).await?;
        let created = self
            .clients
            .insert_client(&candidate)
            .await
            .map_err(OperationError::failure_with)?;
        debug!(id = ?created.id, "client created");
        Ok(created)
    }

    /// Overwrite an existing client.
    pub async fn update(&self, client: Client, context: &RequestContext) -> OperationResult<Client> {
        existing_id(client.id, ENTITY)?;
        self.update_rules.run(&client, context).await?;
        self.clients
            .update_client(&client)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    /// Remove a client.
    pub async fn delete(&self, id: i64, context: &RequestContext) -> OperationResult<()> {
        positive_id(id, ENTITY)?;
        self.delete_rules.run(&Client::with_id(id), context).await?;
        let removed = self
            .clients
            .delete_client(id)
            .await
            .map_err(OperationError::failure_with)?;
        if !removed {
            return Err(OperationError::not_found(ENTITY));
        }
        Ok(())
    }

    /// Fetch one client.
    pub async fn get_by_id(&self, id: i64, context: &RequestContext) -> OperationResult<Client> {
        positive_id(id, ENTITY)?;
        self.read_rules.run(&Client::with_id(id), context).await?;
        self.clients
            .find_client(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    /// List clients page by page.
    pub async fn get_all(
        &self,
        query: &QuerySpec,
        context: &RequestContext,
    ) -> OperationResult<Vec<Client>> {
        self.read_rules.run(&Client::default(), context).await?;
        let plan = plan_listing::<Client>(query)?;
        self.clients
            .list_clients(&plan)
            .await
            .map_err(OperationError::failure_with)
    }
}
