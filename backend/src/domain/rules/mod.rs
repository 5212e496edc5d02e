//! Ordered rule chains run before and after repository writes.
//!
//! Each service owns one chain per operation. A chain runs its rules in the
//! order they were added and stops at the first rejection, so later rules
//! (and the repository call that follows) never observe an entity an
//! earlier rule refused.

mod authorization;
mod system_user;
mod user_setting;
mod validation;

use std::sync::Arc;

use async_trait::async_trait;

use super::error::OperationResult;
use super::session::RequestContext;

pub use authorization::{Access, Authorization, require_permission};
pub use system_user::{NoDependents, RevokeSessionsOnStatusChange, UniqueEmail, UserTransition};
pub use user_setting::SettingIntegrity;
pub use validation::Validation;

/// Single check applied to an entity of type `E`.
#[async_trait]
pub trait Rule<E>: Send + Sync {
    /// Accept the entity or explain why it is rejected.
    async fn check(&self, entity: &E, context: &RequestContext) -> OperationResult<()>;
}

/// Ordered sequence of [`Rule`]s with first-failure-wins semantics.
pub struct RuleChain<E> {
    rules: Vec<Arc<dyn Rule<E>>>,
}

impl<E> Default for RuleChain<E> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<E: Sync> RuleChain<E> {
    /// Empty chain; running it always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `rule` after the rules already in the chain.
    #[must_use]
    pub fn then(mut self, rule: impl Rule<E> + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Append a shared rule instance.
    #[must_use]
    pub fn then_shared(mut self, rule: Arc<dyn Rule<E>>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Number of rules in the chain.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the chain has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule in order, returning the first rejection.
    pub async fn run(&self, entity: &E, context: &RequestContext) -> OperationResult<()> {
        for rule in &self.rules {
            rule.check(entity, context).await?;
        }
        Ok(())
    }
}
