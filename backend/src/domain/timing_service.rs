//! Time entry use cases guarded by rule chains.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pagination::QuerySpec;
use tracing::debug;

use super::error::{OperationError, OperationResult};
use super::guards::{existing_id, positive_id};
use super::listing::plan_listing;
use super::permission_cache::PermissionSource;
use super::ports::TimingRepository;
use super::rules::{Authorization, RuleChain, Validation};
use super::session::RequestContext;
use super::timing::{Timing, TimingView};

const ENTITY: &str = "timing";

/// Create, update, delete and query time entries.
pub struct TimingService<R> {
    timings: Arc<R>,
    create_rules: RuleChain<Timing>,
    update_rules: RuleChain<Timing>,
    delete_rules: RuleChain<Timing>,
    read_rules: RuleChain<Timing>,
}

impl<R> TimingService<R>
where
    R: TimingRepository,
{
    pub fn new(timings: Arc<R>, permissions: &Arc<dyn PermissionSource>) -> Self {
        Self {
            timings,
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

    pub async fn create(&self, timing: Timing, context: &RequestContext) -> OperationResult<Timing> {
        let candidate = Timing { id: None, ..timing };
        self.create_rules.run(&candidate, context).await?;
        let created = self
            .timings
            .insert_timing(&candidate)
            .await
            .map_err(OperationError::failure_with)?;
        debug!(id = ?created.id, project = created.client_project_id, "timing created");
        Ok(created)
    }

    /// Overwrite title, description, bounds and status.
    pub async fn update(&self, timing: Timing, context: &RequestContext) -> OperationResult<Timing> {
        existing_id(timing.id, ENTITY)?;
        self.update_rules.run(&timing, context).await?;
        self.timings
            .update_timing(&timing)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    pub async fn delete(&self, id: i64, context: &RequestContext) -> OperationResult<()> {
        positive_id(id, ENTITY)?;
        self.delete_rules.run(&Timing::with_id(id), context).await?;
        let removed = self
            .timings
            .delete_timing(id)
            .await
            .map_err(OperationError::failure_with)?;
        if !removed {
            return Err(OperationError::not_found(ENTITY));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64, context: &RequestContext) -> OperationResult<Timing> {
        positive_id(id, ENTITY)?;
        self.read_rules.run(&Timing::with_id(id), context).await?;
        self.timings
            .find_timing(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))
    }

    /// List entries joined with their project and client names.
    pub async fn get_all(
        &self,
        query: &QuerySpec,
        context: &RequestContext,
    ) -> OperationResult<Vec<TimingView>> {
        self.read_rules.run(&Timing::default(), context).await?;
        let plan = plan_listing::<TimingView>(query)?;
        self.timings
            .list_timings(&plan)
            .await
            .map_err(OperationError::failure_with)
    }

    pub async fn get_by_client_project_id(
        &self,
        client_project_id: i64,
        context: &RequestContext,
    ) -> OperationResult<Vec<Timing>> {
        positive_id(client_project_id, "client project")?;
        self.read_rules.run(&Timing::default(), context).await?;
        self.timings
            .timings_for_project(client_project_id)
            .await
            .map_err(OperationError::failure_with)
    }

    /// Entries lying entirely within `[from, to]`.
    pub async fn get_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        context: &RequestContext,
    ) -> OperationResult<Vec<Timing>> {
        if to < from {
            return Err(OperationError::logic(
                "end of range must not be before its start",
            ));
        }
        self.read_rules.run(&Timing::default(), context).await?;
        self.timings
            .timings_between(from, to)
            .await
            .map_err(OperationError::failure_with)
    }
}
