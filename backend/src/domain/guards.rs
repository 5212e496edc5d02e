//! Identifier guards applied before any rule runs.

use super::error::{OperationError, OperationResult};

/// Reject non-positive integer identifiers.
pub(crate) fn positive_id(id: i64, entity: &str) -> OperationResult<i64> {
    if id <= 0 {
        return Err(OperationError::logic(format!("invalid {entity} id")));
    }
    Ok(id)
}

/// Require the identifier of an entity that is being updated.
pub(crate) fn existing_id(id: Option<i64>, entity: &str) -> OperationResult<i64> {
    positive_id(id.unwrap_or_default(), entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some(0))]
    #[case(Some(-4))]
    #[case(None)]
    fn rejects_missing_or_non_positive_ids(#[case] id: Option<i64>) {
        let err = existing_id(id, "client").expect_err("invalid id");
        assert_eq!(err.message(), "invalid client id");
    }

    #[rstest]
    fn passes_positive_ids_through() {
        assert_eq!(positive_id(12, "timing").expect("valid"), 12);
    }
}
