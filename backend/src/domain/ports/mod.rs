//! Domain ports and supporting types for the hexagonal boundary.

mod cache_store;
mod client_project_repository;
mod client_repository;
mod repository_error;
mod system_user_repository;
mod timing_repository;
mod user_setting_repository;

pub use cache_store::{CacheBatch, CacheCommand, CacheStore, CacheStoreError};
#[cfg(test)]
pub use cache_store::MockCacheStore;
pub use client_project_repository::ClientProjectRepository;
#[cfg(test)]
pub use client_project_repository::MockClientProjectRepository;
pub use client_repository::ClientRepository;
#[cfg(test)]
pub use client_repository::MockClientRepository;
pub use repository_error::RepositoryError;
#[cfg(test)]
pub use system_user_repository::MockSystemUserRepository;
pub use system_user_repository::{SystemUserRepository, UserReferences};
#[cfg(test)]
pub use timing_repository::MockTimingRepository;
pub use timing_repository::TimingRepository;
#[cfg(test)]
pub use user_setting_repository::MockUserSettingRepository;
pub use user_setting_repository::UserSettingRepository;
