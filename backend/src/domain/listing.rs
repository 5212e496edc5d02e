//! Per-entity listing defaults and query planning.

use pagination::{ListPlan, QuerySpec, SortOption};

use super::error::{OperationError, OperationResult};
use super::{Client, ClientProject, SystemUser, TimingView};

/// Entity type that can be listed through a [`QuerySpec`].
pub trait Listed {
    /// Columns a search term is matched against.
    const SEARCHABLE: &'static [&'static str];

    /// Ordering used when the caller supplies none.
    fn default_sort() -> SortOption;
}

impl Listed for Client {
    const SEARCHABLE: &'static [&'static str] = &["short_title", "title"];

    fn default_sort() -> SortOption {
        SortOption::asc("title")
    }
}

impl Listed for ClientProject {
    const SEARCHABLE: &'static [&'static str] = &["name"];

    fn default_sort() -> SortOption {
        SortOption::asc("name")
    }
}

impl Listed for TimingView {
    const SEARCHABLE: &'static [&'static str] = &["title", "description"];

    fn default_sort() -> SortOption {
        SortOption::asc("title")
    }
}

impl Listed for SystemUser {
    const SEARCHABLE: &'static [&'static str] = &["name", "surname", "email"];

    fn default_sort() -> SortOption {
        SortOption::asc("name")
    }
}

/// Validate `query` and resolve it against the defaults of `E`.
pub(crate) fn plan_listing<E: Listed>(query: &QuerySpec) -> OperationResult<ListPlan> {
    query
        .validate()
        .map_err(|err| OperationError::logic(err.to_string()))?;
    query
        .plan(&E::default_sort(), E::SEARCHABLE)
        .map_err(|err| OperationError::logic(err.to_string()))
}
