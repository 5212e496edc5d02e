//! Field validation as a chain rule.

use async_trait::async_trait;

use super::Rule;
use crate::domain::error::{OperationError, OperationResult};
use crate::domain::session::RequestContext;
use crate::domain::validation::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Full,
    Changes,
}

/// Runs [`Validate`] and reports the first violation as a logic error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validation {
    mode: Mode,
}

impl Validation {
    /// Every constraint; used for creation.
    pub const fn full() -> Self {
        Self { mode: Mode::Full }
    }

    /// Constraints that apply to updates.
    pub const fn changes() -> Self {
        Self {
            mode: Mode::Changes,
        }
    }
}

#[async_trait]
impl<E> Rule<E> for Validation
where
    E: Validate + Sync,
{
    async fn check(&self, entity: &E, _context: &RequestContext) -> OperationResult<()> {
        let verdict = match self.mode {
            Mode::Full => entity.validate(),
            Mode::Changes => entity.validate_changes(),
        };
        verdict.map_err(|err| OperationError::logic(err.to_string()))
    }
}
