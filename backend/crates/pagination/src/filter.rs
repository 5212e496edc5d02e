//! Equality filters and substring search clauses.

use std::str::FromStr;

use crate::query::QueryError;

/// Equality constraint parsed from a `field=value` expression.
///
/// Both sides are trimmed. The expression must contain exactly one `=`
/// and a non-empty field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    field: String,
    value: String,
}

impl FieldFilter {
    /// Column the filter applies to.
    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Value the column must equal.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl FromStr for FieldFilter {
    type Err = QueryError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || QueryError::MalformedFilter {
            filter: raw.to_owned(),
        };
        let (field, value) = raw.split_once('=').ok_or_else(malformed)?;
        if value.contains('=') {
            return Err(malformed());
        }
        let field = field.trim();
        if field.is_empty() {
            return Err(malformed());
        }
        Ok(Self {
            field: field.to_owned(),
            value: value.trim().to_owned(),
        })
    }
}

/// Case-insensitive substring search across a set of columns.
///
/// A row matches when any listed column contains the term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchClause {
    term: String,
    needle: String,
    columns: Vec<String>,
}

impl SearchClause {
    /// Build a clause searching `columns` for `term`.
    #[must_use]
    pub fn new(term: &str, columns: Vec<String>) -> Self {
        Self {
            term: term.to_owned(),
            needle: term.to_lowercase(),
            columns,
        }
    }

    /// Term as supplied by the caller.
    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Columns the term is matched against.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether `candidate` contains the term, ignoring case.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        candidate.to_lowercase().contains(&self.needle)
    }
}
