//! Token-to-identity cache with a per-user reverse index.
//!
//! A credential lives in the hash `su:<token>`. Every token issued to a
//! user is also pushed onto the list `su:rev:<userId>` so all of that
//! user's sessions can be revoked at once. Both keys share one expiry,
//! written in the same atomic batch as the credential itself. Each
//! registration refreshes that expiry, so tokens whose credentials have
//! already expired are pruned from the list in the same batch.

use std::sync::Arc;

use tracing::{debug, info};

use super::error::{OperationError, OperationResult};
use super::ports::{CacheBatch, CacheStore};
use super::session::{Credential, RequestContext, SessionPolicy, SessionToken};
use super::system_user::SystemUserId;

const CREDENTIAL_PREFIX: &str = "su:";
const REVERSE_INDEX_PREFIX: &str = "su:rev:";

/// Cache key of the credential hash for `token`.
pub fn credential_key(token: &SessionToken) -> String {
    format!("{CREDENTIAL_PREFIX}{token}")
}

/// Cache key of the token list for `user`.
pub fn reverse_index_key(user: &SystemUserId) -> String {
    format!("{REVERSE_INDEX_PREFIX}{user}")
}

/// Credential cache over a [`CacheStore`].
pub struct CredentialCache<C> {
    store: Arc<C>,
    policy: SessionPolicy,
}

impl<C> CredentialCache<C>
where
    C: CacheStore,
{
    pub fn new(store: Arc<C>, policy: SessionPolicy) -> Self {
        Self { store, policy }
    }

    /// Session lifetime applied on registration.
    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Whether `token` currently has a cached credential.
    pub async fn authenticate(&self, token: &SessionToken) -> OperationResult<bool> {
        self.store
            .exists(&credential_key(token))
            .await
            .map_err(OperationError::failure_with)
    }

    /// Credential cached for `token`, or `None` when the session is unknown.
    pub async fn credential(&self, token: &SessionToken) -> OperationResult<Option<Credential>> {
        let fields = self
            .store
            .get_hash(&credential_key(token))
            .await
            .map_err(OperationError::failure_with)?;
        if fields.is_empty() {
            debug!("credential cache miss");
            return Ok(None);
        }
        Credential::from_fields(fields)
            .map(Some)
            .map_err(OperationError::failure_with)
    }

    /// Cache `credential` under `token` and index the token by user,
    /// dropping indexed tokens that no longer have a credential.
    pub async fn register(
        &self,
        token: &SessionToken,
        credential: &Credential,
    ) -> OperationResult<()> {
        let key = credential_key(token);
        let reverse = reverse_index_key(&credential.user_id);
        let ttl = self.policy.ttl();
        let stale = self.stale_tokens(&reverse).await?;
        let batch = stale
            .into_iter()
            .fold(CacheBatch::new(), |batch, stale| {
                batch.list_remove(reverse.clone(), stale)
            })
            .set_hash_fields(key.clone(), credential.to_fields())
            .expire(key, ttl)
            .list_push(reverse.clone(), token.as_str())
            .expire(reverse, ttl);
        self.store
            .execute(batch)
            .await
            .map_err(OperationError::failure_with)?;
        debug!(user = %credential.user_id, "credential registered");
        Ok(())
    }

    async fn stale_tokens(&self, reverse: &str) -> OperationResult<Vec<String>> {
        let indexed = self
            .store
            .list_range(reverse)
            .await
            .map_err(OperationError::failure_with)?;
        let mut stale = Vec::new();
        for token in indexed {
            let live = self
                .store
                .exists(&format!("{CREDENTIAL_PREFIX}{token}"))
                .await
                .map_err(OperationError::failure_with)?;
            if !live {
                stale.push(token);
            }
        }
        if !stale.is_empty() {
            debug!(pruned = stale.len(), "pruning expired tokens from reverse index");
        }
        Ok(stale)
    }

    /// Forget the credential cached for `token`. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &SessionToken) -> OperationResult<()> {
        self.store
            .delete(&credential_key(token))
            .await
            .map_err(OperationError::failure_with)
    }

    /// Forget every credential issued to `user`; returns how many tokens
    /// were indexed.
    pub async fn revoke_all(&self, user: &SystemUserId) -> OperationResult<usize> {
        let reverse = reverse_index_key(user);
        let tokens = self
            .store
            .list_range(&reverse)
            .await
            .map_err(OperationError::failure_with)?;
        let revoked = tokens.len();
        let batch = tokens
            .into_iter()
            .fold(CacheBatch::new(), |batch, token| {
                batch.delete(format!("{CREDENTIAL_PREFIX}{token}"))
            })
            .delete(reverse);
        self.store
            .execute(batch)
            .await
            .map_err(OperationError::failure_with)?;
        info!(user = %user, revoked, "sessions revoked");
        Ok(revoked)
    }

    /// Turn a raw token presented by a caller into a [`RequestContext`].
    ///
    /// Missing, malformed and unknown tokens are authentication errors;
    /// cache failures propagate as failures.
    pub async fn authorize_request(&self, raw_token: Option<&str>) -> OperationResult<RequestContext> {
        let token = raw_token
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
            .and_then(|raw| SessionToken::new(raw).ok())
            .ok_or_else(OperationError::auth)?;
        if self.authenticate(&token).await? {
            Ok(RequestContext::authenticated(token))
        } else {
            debug!("rejected unknown session token");
            Err(OperationError::auth())
        }
    }
}
