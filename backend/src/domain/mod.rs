//! Domain primitives, ports and services.
//!
//! Purpose: Define the strongly typed entities of the time-tracking
//! domain, the collaborator traits (ports) adapters implement, and the
//! services that guard every operation with a rule chain.
//!
//! Public surface:
//! - OperationResult / OperationError / ErrorKind: uniform result of every
//!   service call; Outcome is its serialisable envelope.
//! - Client, ClientProject, Timing, SystemUser, SystemUserSetting: entities.
//! - CredentialCache / PermissionCache: session and permission caches.
//! - *Service: per-entity use cases.

pub mod auth;
pub mod client;
pub mod client_project;
pub mod client_project_service;
pub mod client_service;
pub mod credential_cache;
pub mod error;
mod guards;
mod listing;
pub mod outcome;
pub mod password;
pub mod permission;
pub mod permission_cache;
pub mod ports;
pub mod rules;
pub mod session;
pub mod system_user;
pub mod system_user_service;
pub mod timing;
pub mod timing_service;
pub mod user_setting;
pub mod user_setting_service;
pub mod validation;

pub use self::auth::{LOGIN_REJECTED_MESSAGE, LoginRequest, LoginResponse, LoginValidationError};
pub use self::client::{Client, ClientValidationError};
pub use self::client_project::{ClientProject, ClientProjectValidationError};
pub use self::client_project_service::ClientProjectService;
pub use self::client_service::ClientService;
pub use self::credential_cache::CredentialCache;
pub use self::error::{ErrorKind, GENERIC_FAILURE_MESSAGE, OperationError, OperationResult};
pub use self::listing::Listed;
pub use self::outcome::Outcome;
pub use self::permission::{DefaultPermission, GRANTED, PermissionSet, Resource, WITHHELD};
pub use self::permission_cache::{PermissionCache, PermissionSource, PermissionValue};
pub use self::session::{
    Credential, DEFAULT_SESSION_TTL, RequestContext, SessionPolicy, SessionToken,
};
pub use self::system_user::{
    NewSystemUser, SystemUser, SystemUserChanges, SystemUserId, SystemUserProfile,
    SystemUserValidationError,
};
pub use self::system_user_service::SystemUserService;
pub use self::timing::{Timing, TimingStatus, TimingValidationError, TimingView};
pub use self::timing_service::TimingService;
pub use self::user_setting::{SystemUserSetting, UserSettingValidationError};
pub use self::user_setting_service::UserSettingService;
pub use self::validation::{Guarded, Validate};
