//! Resolved list plans and their in-memory evaluation.

use std::cmp::Ordering;
use std::fmt;

use crate::filter::{FieldFilter, SearchClause};
use crate::query::{SortDirection, SortOption};

/// Offset and limit applied after filtering and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// Rows skipped before the page starts.
    pub offset: u64,
    /// Maximum number of rows returned.
    pub limit: u64,
}

/// A query resolved against a repository's defaults.
///
/// Produced by [`crate::QuerySpec::plan`]. Storage adapters either translate
/// it into their native query language or call [`ListPlan::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPlan {
    /// Paging window; absent when the caller asked for every row.
    pub window: Option<PageWindow>,
    /// Ordering terms, applied left to right.
    pub order: Vec<SortOption>,
    /// Equality filter.
    pub filter: Option<FieldFilter>,
    /// Substring search.
    pub search: Option<SearchClause>,
}

/// Column value exposed by a [`Record`] for filtering, search and ordering.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    /// Boolean flag.
    Bool(bool),
    /// Signed integer, also used for timestamps in epoch milliseconds.
    Integer(i64),
    /// Free text.
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Row type that can be evaluated by [`ListPlan::apply`].
pub trait Record {
    /// Value of `column`, or `None` when the row has no such column.
    fn field(&self, column: &str) -> Option<FieldValue>;
}

impl ListPlan {
    /// Evaluate the plan over `rows`.
    ///
    /// Rows are filtered, searched, stably ordered and finally windowed.
    /// Unknown filter columns match nothing; unknown sort columns leave the
    /// relative order untouched.
    pub fn apply<R, I>(&self, rows: I) -> Vec<R>
    where
        R: Record,
        I: IntoIterator<Item = R>,
    {
        let mut selected: Vec<R> = rows
            .into_iter()
            .filter(|row| self.admits(row))
            .collect();
        selected.sort_by(|left, right| self.compare(left, right));

        match self.window {
            Some(window) => selected
                .into_iter()
                .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
                .take(usize::try_from(window.limit).unwrap_or(usize::MAX))
                .collect(),
            None => selected,
        }
    }

    fn admits<R: Record>(&self, row: &R) -> bool {
        let filtered = self.filter.as_ref().is_none_or(|filter| {
            row.field(filter.field())
                .is_some_and(|value| value.to_string() == filter.value())
        });
        let searched = self.search.as_ref().is_none_or(|search| {
            search.columns().iter().any(|column| {
                row.field(column)
                    .is_some_and(|value| search.matches(&value.to_string()))
            })
        });
        filtered && searched
    }

    fn compare<R: Record>(&self, left: &R, right: &R) -> Ordering {
        self.order
            .iter()
            .map(|sort| {
                let ordering = left.field(&sort.column).cmp(&right.field(&sort.column));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuerySpec;
    use rstest::{fixture, rstest};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        title: &'static str,
        active: bool,
    }

    impl Record for Row {
        fn field(&self, column: &str) -> Option<FieldValue> {
            match column {
                "id" => Some(self.id.into()),
                "title" => Some(self.title.into()),
                "is_active" => Some(self.active.into()),
                _ => None,
            }
        }
    }

    #[fixture]
    fn rows() -> Vec<Row> {
        vec![
            Row { id: 1, title: "Beta", active: true },
            Row { id: 2, title: "alpha", active: false },
            Row { id: 3, title: "Gamma", active: true },
            Row { id: 4, title: "Alphabet", active: true },
        ]
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|row| row.id).collect()
    }

    fn plan(spec: &QuerySpec) -> ListPlan {
        spec.plan(&SortOption::asc("id"), &["title"]).expect("plan")
    }

    #[rstest]
    fn windows_after_ordering(rows: Vec<Row>) {
        let spec = QuerySpec::new(2, 2).with_sort(SortOption::desc("id"));
        assert_eq!(ids(&plan(&spec).apply(rows)), vec![2, 1]);
    }

    #[rstest]
    fn filters_on_display_value(rows: Vec<Row>) {
        let spec = QuerySpec::new(1, 10).with_filter("is_active = true");
        assert_eq!(ids(&plan(&spec).apply(rows)), vec![1, 3, 4]);
    }

    #[rstest]
    fn unknown_filter_column_matches_nothing(rows: Vec<Row>) {
        let spec = QuerySpec::new(1, 10).with_filter("colour=red");
        assert!(plan(&spec).apply(rows).is_empty());
    }

    #[rstest]
    fn searches_case_insensitively(rows: Vec<Row>) {
        let spec = QuerySpec::new(1, 10).with_search("ALPHA", Vec::<String>::new());
        assert_eq!(ids(&plan(&spec).apply(rows)), vec![2, 4]);
    }

    #[rstest]
    fn orders_by_several_columns(rows: Vec<Row>) {
        let spec = QuerySpec::new(1, 10)
            .with_sort(SortOption::desc("is_active"))
            .with_sort(SortOption::asc("title"));
        assert_eq!(ids(&plan(&spec).apply(rows)), vec![4, 1, 3, 2]);
    }

    #[rstest]
    fn page_past_the_end_is_empty(rows: Vec<Row>) {
        let spec = QuerySpec::new(5, 10);
        assert!(plan(&spec).apply(rows).is_empty());
    }
}
