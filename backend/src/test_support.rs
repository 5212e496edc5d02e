//! Test utilities for the backend crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or with
//! the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::bootstrap::LmsServices;
use crate::domain::ports::{SystemUserRepository, UserSettingRepository};
use crate::domain::{
    LoginRequest, OperationError, OperationResult, RequestContext, SessionPolicy, SessionToken,
    SystemUser, SystemUserId, SystemUserSetting, password,
};
use crate::outbound::cache::InMemoryCacheStore;
use crate::outbound::persistence::InMemoryStore;

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}",)
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

/// Fully wired services over in-memory adapters with one administrator
/// holding every default permission.
pub struct TestApp {
    pub clock: Arc<MutableClock>,
    pub cache: Arc<InMemoryCacheStore>,
    pub store: Arc<InMemoryStore>,
    pub services: LmsServices<InMemoryCacheStore, InMemoryStore>,
    pub admin: SystemUserId,
}

impl TestApp {
    /// Wire the services and store the administrator directly.
    ///
    /// # Errors
    ///
    /// Fails when the in-memory store rejects the administrator rows.
    pub async fn start() -> OperationResult<Self> {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 8, 9, 0, 0)
            .single()
            .ok_or_else(|| OperationError::failure_with("invalid start instant"))?;
        let clock = Arc::new(MutableClock::new(start));
        let cache = Arc::new(InMemoryCacheStore::new(
            Arc::clone(&clock) as Arc<dyn Clock>
        ));
        let store = Arc::new(InMemoryStore::new());
        let services =
            LmsServices::new(Arc::clone(&cache), Arc::clone(&store), SessionPolicy::default());

        let salt = password::numeric_salt();
        let digest = password::digest(ADMIN_PASSWORD, &salt)?;
        let admin = store
            .insert_user(&SystemUser {
                id: None,
                name: "Admin".into(),
                surname: "User".into(),
                email: ADMIN_EMAIL.into(),
                password: digest,
                password_salt: salt,
                is_active: true,
            })
            .await
            .map_err(OperationError::failure_with)?
            .id
            .ok_or_else(|| OperationError::failure_with("administrator has no id"))?;
        for entry in crate::domain::permission::default_catalogue() {
            store
                .upsert_setting(&SystemUserSetting::new(
                    admin.clone(),
                    entry.key,
                    entry.value,
                    entry.description,
                ))
                .await
                .map_err(OperationError::failure_with)?;
        }

        Ok(Self {
            clock,
            cache,
            store,
            services,
            admin,
        })
    }

    /// Log in with `email` and `password` and return the request context.
    ///
    /// # Errors
    ///
    /// Propagates validation and login failures.
    pub async fn login(&self, email: &str, password: &str) -> OperationResult<RequestContext> {
        let request = LoginRequest::try_from_parts(email, password)
            .map_err(|err| OperationError::logic(err.to_string()))?;
        let response = self.services.users.login(&request).await?;
        let token = SessionToken::new(response.token).map_err(OperationError::failure_with)?;
        Ok(RequestContext::authenticated(token))
    }

    /// Log the administrator in.
    ///
    /// # Errors
    ///
    /// Propagates login failures.
    pub async fn admin_context(&self) -> OperationResult<RequestContext> {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }
}
