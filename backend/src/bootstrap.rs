//! Process-wide wiring of caches and services.
//!
//! Everything is built once at start-up and handed to the transport layer
//! by reference; rule chains are assembled here and never per request.

use std::sync::Arc;

use crate::config::LmsSettings;
use crate::domain::ports::{
    CacheStore, CacheStoreError, ClientProjectRepository, ClientRepository,
    SystemUserRepository, TimingRepository, UserSettingRepository,
};
use crate::domain::{
    ClientProjectService, ClientService, CredentialCache, PermissionCache, PermissionSource,
    SessionPolicy, SystemUserService, TimingService, UserSettingService,
};
use crate::outbound::cache::RedisCacheStore;

/// Durable store offering every repository port.
pub trait DurableStore:
    ClientRepository
    + ClientProjectRepository
    + TimingRepository
    + SystemUserRepository
    + UserSettingRepository
{
}

impl<T> DurableStore for T where
    T: ClientRepository
        + ClientProjectRepository
        + TimingRepository
        + SystemUserRepository
        + UserSettingRepository
{
}

/// Every service of the application sharing one cache and one store.
pub struct LmsServices<C, S> {
    pub credentials: Arc<CredentialCache<C>>,
    pub permissions: Arc<PermissionCache<C, S>>,
    pub clients: ClientService<S>,
    pub client_projects: ClientProjectService<S>,
    pub timings: TimingService<S>,
    pub settings: Arc<UserSettingService<S>>,
    pub users: SystemUserService<S, S, C>,
}

impl<C, S> LmsServices<C, S>
where
    C: CacheStore + 'static,
    S: DurableStore + 'static,
{
    pub fn new(cache: Arc<C>, store: Arc<S>, policy: SessionPolicy) -> Self {
        let credentials = Arc::new(CredentialCache::new(Arc::clone(&cache), policy));
        let permissions = Arc::new(PermissionCache::new(
            cache,
            Arc::clone(&credentials),
            Arc::clone(&store),
        ));
        let source = Arc::clone(&permissions) as Arc<dyn PermissionSource>;
        let settings = Arc::new(UserSettingService::new(Arc::clone(&store), &source));
        Self {
            clients: ClientService::new(Arc::clone(&store), &source),
            client_projects: ClientProjectService::new(Arc::clone(&store), &source),
            timings: TimingService::new(Arc::clone(&store), &source),
            users: SystemUserService::new(
                store,
                Arc::clone(&settings),
                Arc::clone(&credentials),
                &source,
            ),
            settings,
            credentials,
            permissions,
        }
    }
}

impl<S> LmsServices<RedisCacheStore, S>
where
    S: DurableStore + 'static,
{
    /// Connect to the configured Redis server and wire every service.
    ///
    /// # Errors
    ///
    /// Returns [`CacheStoreError::Unavailable`] when the cache cannot be
    /// reached.
    pub async fn connect(settings: &LmsSettings, store: Arc<S>) -> Result<Self, CacheStoreError> {
        let cache = RedisCacheStore::connect(settings.redis_config()).await?;
        Ok(Self::new(Arc::new(cache), store, settings.session_policy()))
    }
}
