//! Port abstraction for time entry persistence.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::ListPlan;

use crate::domain::{Timing, TimingView};

use super::RepositoryError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimingRepository: Send + Sync {
    /// Store a new entry and return it with its assigned identifier.
    async fn insert_timing(&self, timing: &Timing) -> Result<Timing, RepositoryError>;

    /// Overwrite the mutable fields of an existing entry.
    ///
    /// Project and owner are never changed. `None` when it does not exist.
    async fn update_timing(&self, timing: &Timing) -> Result<Option<Timing>, RepositoryError>;

    /// Remove an entry; `false` when it did not exist.
    async fn delete_timing(&self, id: i64) -> Result<bool, RepositoryError>;

    /// Fetch an entry by identifier.
    async fn find_timing(&self, id: i64) -> Result<Option<Timing>, RepositoryError>;

    /// List entries joined with project and client names.
    async fn list_timings(&self, plan: &ListPlan) -> Result<Vec<TimingView>, RepositoryError>;

    /// Every entry of one client project.
    async fn timings_for_project(
        &self,
        client_project_id: i64,
    ) -> Result<Vec<Timing>, RepositoryError>;

    /// Entries that start at or after `from` and end at or before `to`.
    async fn timings_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Timing>, RepositoryError>;
}
