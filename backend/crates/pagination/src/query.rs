//! Caller-facing query description and its validation rules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filter::{FieldFilter, SearchClause};
use crate::plan::{ListPlan, PageWindow};

/// Errors raised while validating or planning a [`QuerySpec`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The requested page number was zero.
    #[error("invalid page number; pages are numbered from 1")]
    InvalidPageNumber,
    /// The caller asked for zero records per page.
    #[error("no data to display")]
    NoRecordsRequested,
    /// The filter expression was not a single `field=value` pair.
    #[error("malformed filter '{filter}'; expected field=value")]
    MalformedFilter {
        /// Raw filter expression supplied by the caller.
        filter: String,
    },
}

/// Ordering applied to a single column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Smallest values first.
    #[default]
    Asc,
    /// Largest values first.
    Desc,
}

/// One ordering term of a list query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortOption {
    /// Column the rows are ordered by.
    pub column: String,
    /// Direction applied to the column.
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortOption {
    /// Ascending order on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    /// Descending order on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Caller-supplied description of a paged, sorted, filtered listing.
///
/// ```
/// use pagination::QuerySpec;
///
/// let spec = QuerySpec::new(3, 25);
/// assert_eq!(spec.skip(), 50);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    /// One-based page number.
    pub page_number: u32,
    /// Maximum number of rows on a page.
    pub records_per_page: u32,
    /// Ordering terms; the repository default applies when empty.
    #[serde(default)]
    pub sort: Vec<SortOption>,
    /// Optional `field=value` equality filter.
    #[serde(default)]
    pub filter: Option<String>,
    /// Optional case-insensitive substring search term.
    #[serde(default)]
    pub search_term: Option<String>,
    /// Columns the search is restricted to; all searchable columns when empty.
    #[serde(default)]
    pub search_fields: Vec<String>,
}

impl QuerySpec {
    /// Query for a page without ordering, filtering or search.
    #[must_use]
    pub const fn new(page_number: u32, records_per_page: u32) -> Self {
        Self {
            page_number,
            records_per_page,
            sort: Vec::new(),
            filter: None,
            search_term: None,
            search_fields: Vec::new(),
        }
    }

    /// Append an ordering term.
    #[must_use]
    pub fn with_sort(mut self, sort: SortOption) -> Self {
        self.sort.push(sort);
        self
    }

    /// Set the equality filter expression.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the search term and the columns it applies to.
    #[must_use]
    pub fn with_search<I, S>(mut self, term: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_term = Some(term.into());
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Check the paging parameters.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPageNumber`] when the page number is zero
    /// and [`QueryError::NoRecordsRequested`] when no rows were requested.
    pub const fn validate(&self) -> Result<(), QueryError> {
        if self.page_number < 1 {
            return Err(QueryError::InvalidPageNumber);
        }
        if self.records_per_page < 1 {
            return Err(QueryError::NoRecordsRequested);
        }
        Ok(())
    }

    /// Number of rows preceding the requested page.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        let preceding_pages = self.page_number.saturating_sub(1) as u64;
        preceding_pages.saturating_mul(self.records_per_page as u64)
    }

    /// Resolve this query against a repository's defaults.
    ///
    /// `default_sort` applies when the caller supplied no ordering.
    /// `searchable` lists the columns a search may touch; caller-provided
    /// search fields narrow that list but never extend it.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::MalformedFilter`] when the filter is not a
    /// single `field=value` pair.
    pub fn plan(
        &self,
        default_sort: &SortOption,
        searchable: &[&str],
    ) -> Result<ListPlan, QueryError> {
        let filter = self
            .filter
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<FieldFilter>)
            .transpose()?;

        let search = self
            .search_term
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(|term| SearchClause::new(term, self.search_columns(searchable)))
            .filter(|clause| !clause.columns().is_empty());

        let order = if self.sort.is_empty() {
            vec![default_sort.clone()]
        } else {
            self.sort.clone()
        };

        let window = (self.page_number > 0 && self.records_per_page > 0).then(|| PageWindow {
            offset: self.skip(),
            limit: u64::from(self.records_per_page),
        });

        Ok(ListPlan {
            window,
            order,
            filter,
            search,
        })
    }

    fn search_columns(&self, searchable: &[&str]) -> Vec<String> {
        searchable
            .iter()
            .filter(|column| {
                self.search_fields.is_empty()
                    || self
                        .search_fields
                        .iter()
                        .any(|field| field.eq_ignore_ascii_case(column))
            })
            .map(|column| (*column).to_owned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 10, Err(QueryError::InvalidPageNumber))]
    #[case(1, 0, Err(QueryError::NoRecordsRequested))]
    #[case(0, 0, Err(QueryError::InvalidPageNumber))]
    #[case(1, 1, Ok(()))]
    #[case(7, 50, Ok(()))]
    fn validate_checks_page_parameters(
        #[case] page: u32,
        #[case] per_page: u32,
        #[case] expected: Result<(), QueryError>,
    ) {
        assert_eq!(QuerySpec::new(page, per_page).validate(), expected);
    }

    #[rstest]
    #[case(1, 10, 0)]
    #[case(2, 10, 10)]
    #[case(3, 25, 50)]
    fn skip_counts_preceding_rows(#[case] page: u32, #[case] per_page: u32, #[case] skip: u64) {
        assert_eq!(QuerySpec::new(page, per_page).skip(), skip);
    }

    #[rstest]
    fn plan_falls_back_to_default_sort() {
        let plan = QuerySpec::new(1, 10)
            .plan(&SortOption::desc("id"), &["title"])
            .expect("plan");
        assert_eq!(plan.order, vec![SortOption::desc("id")]);
        assert_eq!(plan.window, Some(PageWindow { offset: 0, limit: 10 }));
    }

    #[rstest]
    fn plan_keeps_caller_sort() {
        let plan = QuerySpec::new(2, 5)
            .with_sort(SortOption::asc("title"))
            .plan(&SortOption::desc("id"), &[])
            .expect("plan");
        assert_eq!(plan.order, vec![SortOption::asc("title")]);
        assert_eq!(plan.window, Some(PageWindow { offset: 5, limit: 5 }));
    }

    #[rstest]
    fn plan_omits_window_for_unpaged_queries() {
        let plan = QuerySpec::new(0, 0)
            .plan(&SortOption::asc("id"), &[])
            .expect("plan");
        assert!(plan.window.is_none());
    }

    #[rstest]
    fn plan_narrows_search_to_requested_fields() {
        let plan = QuerySpec::new(1, 10)
            .with_search("acme", ["TITLE", "unknown"])
            .plan(&SortOption::asc("id"), &["short_title", "title"])
            .expect("plan");
        let search = plan.search.expect("search clause");
        assert_eq!(search.term(), "acme");
        assert_eq!(search.columns(), ["title".to_owned()]);
    }

    #[rstest]
    fn plan_uses_every_searchable_column_by_default() {
        let plan = QuerySpec::new(1, 10)
            .with_search("  acme ", Vec::<String>::new())
            .plan(&SortOption::asc("id"), &["short_title", "title"])
            .expect("plan");
        let search = plan.search.expect("search clause");
        assert_eq!(search.term(), "acme");
        assert_eq!(search.columns().len(), 2);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn plan_ignores_blank_search(#[case] term: &str) {
        let plan = QuerySpec::new(1, 10)
            .with_search(term, Vec::<String>::new())
            .plan(&SortOption::asc("id"), &["title"])
            .expect("plan");
        assert!(plan.search.is_none());
    }

    #[rstest]
    fn plan_rejects_malformed_filter() {
        let err = QuerySpec::new(1, 10)
            .with_filter("is_active")
            .plan(&SortOption::asc("id"), &[])
            .expect_err("filter without separator");
        assert_eq!(
            err,
            QueryError::MalformedFilter {
                filter: "is_active".to_owned()
            }
        );
    }

    #[rstest]
    fn deserialises_camel_case_payload() {
        let spec: QuerySpec = serde_json::from_str(
            r#"{"pageNumber":2,"recordsPerPage":20,"sort":[{"column":"title","direction":"desc"}],"filter":"is_active=true"}"#,
        )
        .expect("valid payload");
        assert_eq!(spec.skip(), 20);
        assert_eq!(spec.sort, vec![SortOption::desc("title")]);
        assert_eq!(spec.filter.as_deref(), Some("is_active=true"));
        assert!(spec.search_fields.is_empty());
    }
}
