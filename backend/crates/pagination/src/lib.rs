//! Query specification and list planning primitives shared by LMS listing
//! operations.
//!
//! A caller describes the page it wants with a [`QuerySpec`]. Repositories
//! turn that description into a [`ListPlan`] using their own default
//! ordering and searchable columns, then either translate the plan into a
//! backend query or evaluate it directly over rows that implement
//! [`Record`].

mod filter;
mod plan;
mod query;

pub use filter::{FieldFilter, SearchClause};
pub use plan::{FieldValue, ListPlan, PageWindow, Record};
pub use query::{QueryError, QuerySpec, SortDirection, SortOption};
