//! System user use cases and the session flow.
//!
//! Creating a user seeds the default permission catalogue through the
//! setting write path. Updating a user's active flag revokes every session
//! the user holds; deleting a user does the same unconditionally.

use std::sync::Arc;

use pagination::QuerySpec;
use tracing::{debug, info, warn};

use super::auth::{LOGIN_REJECTED_MESSAGE, LoginRequest, LoginResponse};
use super::credential_cache::CredentialCache;
use super::error::{OperationError, OperationResult};
use super::listing::plan_listing;
use super::password;
use super::permission::default_catalogue;
use super::permission_cache::PermissionSource;
use super::ports::{CacheStore, SystemUserRepository, UserSettingRepository};
use super::rules::{
    Authorization, NoDependents, RevokeSessionsOnStatusChange, RuleChain, UniqueEmail,
    UserTransition, Validation,
};
use super::session::{Credential, RequestContext, SessionToken};
use super::system_user::{
    NewSystemUser, SystemUser, SystemUserChanges, SystemUserId, SystemUserProfile,
};
use super::user_setting::SystemUserSetting;
use super::user_setting_service::UserSettingService;

const ENTITY: &str = "system user";

/// Manage system users and their sessions.
pub struct SystemUserService<U, S, C> {
    users: Arc<U>,
    settings: Arc<UserSettingService<S>>,
    credentials: Arc<CredentialCache<C>>,
    create_rules: RuleChain<SystemUser>,
    update_rules: RuleChain<SystemUser>,
    after_update_rules: RuleChain<UserTransition>,
    delete_rules: RuleChain<SystemUser>,
    read_rules: RuleChain<SystemUser>,
}

fn profile_of(user: &SystemUser) -> OperationResult<SystemUserProfile> {
    user.profile()
        .ok_or_else(|| OperationError::failure_with("stored user has no identifier"))
}

fn require_password(password: &str) -> OperationResult<()> {
    if password.is_empty() {
        return Err(OperationError::logic("password is required"));
    }
    Ok(())
}

impl<U, S, C> SystemUserService<U, S, C>
where
    U: SystemUserRepository + 'static,
    S: UserSettingRepository,
    C: CacheStore + 'static,
{
    pub fn new(
        users: Arc<U>,
        settings: Arc<UserSettingService<S>>,
        credentials: Arc<CredentialCache<C>>,
        permissions: &Arc<dyn PermissionSource>,
    ) -> Self {
        Self {
            create_rules: RuleChain::new()
                .then(Validation::full())
                .then(Authorization::alter(Arc::clone(permissions)))
                .then(UniqueEmail::new(Arc::clone(&users))),
            update_rules: RuleChain::new()
                .then(Validation::changes())
                .then(Authorization::alter(Arc::clone(permissions)))
                .then(UniqueEmail::new(Arc::clone(&users))),
            after_update_rules: RuleChain::new()
                .then(RevokeSessionsOnStatusChange::new(Arc::clone(&credentials))),
            delete_rules: RuleChain::new()
                .then(Authorization::delete(Arc::clone(permissions)))
                .then(NoDependents::new(Arc::clone(&users))),
            read_rules: RuleChain::new().then(Authorization::view(Arc::clone(permissions))),
            users,
            settings,
            credentials,
        }
    }

    /// Store a new user and grant it the default permission catalogue.
    ///
    /// Seeding is not transactional with the insert: when a seed write
    /// fails the error is returned and the user row stays in place.
    pub async fn create(
        &self,
        new_user: NewSystemUser,
        context: &RequestContext,
    ) -> OperationResult<SystemUserProfile> {
        require_password(&new_user.password)?;
        let salt = password::numeric_salt();
        let digest = password::digest(&new_user.password, &salt)?;
        let candidate = SystemUser {
            id: None,
            name: new_user.name,
            surname: new_user.surname,
            email: new_user.email,
            password: digest,
            password_salt: salt,
            is_active: new_user.is_active,
        };
        self.create_rules.run(&candidate, context).await?;
        let created = self
            .users
            .insert_user(&candidate)
            .await
            .map_err(OperationError::failure_with)?;
        let profile = profile_of(&created)?;
        self.seed_permissions(&profile.id, context).await?;
        info!(user = %profile.id, "system user created");
        Ok(profile)
    }

    async fn seed_permissions(
        &self,
        user: &SystemUserId,
        context: &RequestContext,
    ) -> OperationResult<()> {
        for entry in default_catalogue() {
            let setting =
                SystemUserSetting::new(user.clone(), entry.key, entry.value, entry.description);
            if let Err(err) = self.settings.set(setting, context).await {
                warn!(
                    user = %user,
                    permission = entry.key,
                    error = %err,
                    "seeding default permissions failed; user row kept"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    /// Overwrite a user's profile, re-hashing the password when one is given.
    ///
    /// An absent or empty password keeps the stored digest and salt.
    pub async fn update(
        &self,
        changes: SystemUserChanges,
        context: &RequestContext,
    ) -> OperationResult<SystemUserProfile> {
        let mut candidate = SystemUser {
            id: Some(changes.id.clone()),
            name: changes.name,
            surname: changes.surname,
            email: changes.email,
            password: String::new(),
            password_salt: String::new(),
            is_active: changes.is_active,
        };
        if let Some(plain) = changes.password.as_ref().filter(|plain| !plain.is_empty()) {
            let salt = password::alphanumeric_salt();
            candidate.password = password::digest(plain, &salt)?;
            candidate.password_salt = salt;
        }
        self.update_rules.run(&candidate, context).await?;

        let before = self
            .users
            .find_user(&changes.id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))?;
        if candidate.password.is_empty() {
            candidate.password.clone_from(&before.password);
            candidate.password_salt.clone_from(&before.password_salt);
        }
        let after = self
            .users
            .update_user(&candidate)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))?;
        let profile = profile_of(&after)?;

        self.after_update_rules
            .run(&UserTransition { before, after }, context)
            .await?;
        Ok(profile)
    }

    /// Remove a user nothing refers to any more and end its sessions.
    pub async fn delete(&self, id: &SystemUserId, context: &RequestContext) -> OperationResult<()> {
        self.delete_rules
            .run(&SystemUser::with_id(id.clone()), context)
            .await?;
        let removed = self
            .users
            .delete_user(id)
            .await
            .map_err(OperationError::failure_with)?;
        if !removed {
            return Err(OperationError::not_found(ENTITY));
        }
        self.credentials.revoke_all(id).await?;
        info!(user = %id, "system user deleted");
        Ok(())
    }

    pub async fn get_by_id(
        &self,
        id: &SystemUserId,
        context: &RequestContext,
    ) -> OperationResult<SystemUserProfile> {
        self.read_rules
            .run(&SystemUser::with_id(id.clone()), context)
            .await?;
        let user = self
            .users
            .find_user(id)
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))?;
        profile_of(&user)
    }

    /// Look a user up by email without any permission check.
    pub async fn get_by_email(&self, email: &str) -> OperationResult<SystemUserProfile> {
        let user = self
            .users
            .find_user_by_email(email.trim())
            .await
            .map_err(OperationError::failure_with)?
            .ok_or_else(|| OperationError::not_found(ENTITY))?;
        profile_of(&user)
    }

    pub async fn get_all(
        &self,
        query: &QuerySpec,
        context: &RequestContext,
    ) -> OperationResult<Vec<SystemUserProfile>> {
        self.read_rules.run(&SystemUser::default(), context).await?;
        let plan = plan_listing::<SystemUser>(query)?;
        let users = self
            .users
            .list_users(&plan)
            .await
            .map_err(OperationError::failure_with)?;
        Ok(users.iter().filter_map(SystemUser::profile).collect())
    }

    /// Exchange an email and password for a new session token.
    ///
    /// Unknown emails, wrong passwords and inactive users are rejected with
    /// one message. No token is handed out unless it was cached first.
    pub async fn login(&self, request: &LoginRequest) -> OperationResult<LoginResponse> {
        let user = self
            .users
            .find_user_by_email(request.email())
            .await
            .map_err(OperationError::failure_with)?;
        let Some(user) = user else {
            warn!("login rejected");
            debug!(reason = "unknown email", "login rejected");
            return Err(OperationError::logic(LOGIN_REJECTED_MESSAGE));
        };
        if !password::verify(request.password(), &user.password_salt, &user.password) {
            warn!("login rejected");
            debug!(reason = "password mismatch", "login rejected");
            return Err(OperationError::logic(LOGIN_REJECTED_MESSAGE));
        }
        if !user.is_active {
            warn!("login rejected");
            debug!(reason = "inactive user", "login rejected");
            return Err(OperationError::logic(LOGIN_REJECTED_MESSAGE));
        }

        let credential = Credential::for_user(&user)
            .ok_or_else(|| OperationError::failure_with("stored user has no identifier"))?;
        let token = SessionToken::generate();
        self.credentials.register(&token, &credential).await?;
        info!(user = %credential.user_id, "login succeeded");
        Ok(LoginResponse::for_user(&user, token.as_str()))
    }

    /// End the session identified by `raw_token`.
    ///
    /// Succeeds whether or not the session still exists.
    pub async fn logout(&self, raw_token: &str) -> OperationResult<()> {
        let Ok(token) = SessionToken::new(raw_token.trim()) else {
            debug!("logout with malformed token ignored");
            return Ok(());
        };
        self.credentials.revoke(&token).await?;
        info!("logout");
        Ok(())
    }

    /// Resolve the token presented with a request into its context.
    pub async fn authenticate(&self, raw_token: Option<&str>) -> OperationResult<RequestContext> {
        self.credentials.authorize_request(raw_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::permission_cache::{MockPermissionSource, PermissionValue};
    use crate::domain::ports::{MockSystemUserRepository, MockUserSettingRepository};
    use crate::domain::session::SessionPolicy;
    use crate::outbound::cache::InMemoryCacheStore;
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};
    use zeroize::Zeroizing;

    type Service =
        SystemUserService<MockSystemUserRepository, MockUserSettingRepository, InMemoryCacheStore>;

    const SALT: &str = "482019573621048";

    fn granting() -> Arc<dyn PermissionSource> {
        let mut source = MockPermissionSource::new();
        source
            .expect_permission()
            .returning(|_, _| Ok(PermissionValue::granted()));
        source.expect_invalidate().returning(|_, _| Ok(()));
        Arc::new(source)
    }

    fn stored_user(is_active: bool) -> SystemUser {
        SystemUser {
            id: Some(SystemUserId::random()),
            name: "Ada".into(),
            surname: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: password::digest("analytical", SALT).expect("digest"),
            password_salt: SALT.into(),
            is_active,
        }
    }

    struct Harness {
        credentials: Arc<CredentialCache<InMemoryCacheStore>>,
        service: Service,
    }

    fn harness_with(users: MockSystemUserRepository, settings: MockUserSettingRepository) -> Harness {
        let permissions = granting();
        let store = Arc::new(InMemoryCacheStore::new(Arc::new(DefaultClock)));
        let credentials = Arc::new(CredentialCache::new(store, SessionPolicy::default()));
        let settings = Arc::new(UserSettingService::new(Arc::new(settings), &permissions));
        let service = SystemUserService::new(
            Arc::new(users),
            settings,
            Arc::clone(&credentials),
            &permissions,
        );
        Harness {
            credentials,
            service,
        }
    }

    #[fixture]
    fn context() -> RequestContext {
        RequestContext::authenticated(SessionToken::generate())
    }

    fn users_returning(user: Option<SystemUser>) -> MockSystemUserRepository {
        let mut users = MockSystemUserRepository::new();
        users
            .expect_find_user_by_email()
            .returning(move |_| Ok(user.clone()));
        users
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest::try_from_parts("ada@example.com", password).expect("well-formed request")
    }

    #[rstest]
    #[case(None, "analytical")]
    #[case(Some(stored_user(true)), "engine")]
    #[case(Some(stored_user(false)), "analytical")]
    #[tokio::test]
    async fn rejected_logins_share_one_message(
        #[case] user: Option<SystemUser>,
        #[case] password: &str,
    ) {
        let harness = harness_with(users_returning(user), MockUserSettingRepository::new());

        let err = harness
            .service
            .login(&login_request(password))
            .await
            .expect_err("rejected");
        assert!(err.is_logic());
        assert_eq!(err.message(), LOGIN_REJECTED_MESSAGE);
    }

    #[rstest]
    #[tokio::test]
    async fn successful_login_caches_the_session() {
        let user = stored_user(true);
        let harness = harness_with(users_returning(Some(user)), MockUserSettingRepository::new());

        let response = harness
            .service
            .login(&login_request("analytical"))
            .await
            .expect("logged in");
        assert_eq!(response.email, "ada@example.com");
        let token = SessionToken::new(response.token).expect("token");
        assert!(harness.credentials.authenticate(&token).await.expect("cache"));
    }

    #[rstest]
    #[tokio::test]
    async fn create_hashes_and_seeds_every_default_permission(context: RequestContext) {
        let mut users = MockSystemUserRepository::new();
        users.expect_find_user_by_email().returning(|_| Ok(None));
        users
            .expect_insert_user()
            .withf(|user| {
                user.password != "analytical"
                    && user.password_salt.len() == 15
                    && user.password_salt.chars().all(|c| c.is_ascii_digit())
            })
            .times(1)
            .returning(|user| {
                Ok(SystemUser {
                    id: Some(SystemUserId::random()),
                    ..user.clone()
                })
            });
        let mut settings = MockUserSettingRepository::new();
        settings
            .expect_upsert_setting()
            .times(default_catalogue().len())
            .returning(|setting| Ok(setting.clone()));
        let harness = harness_with(users, settings);

        let profile = harness
            .service
            .create(
                NewSystemUser {
                    name: "Ada".into(),
                    surname: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    password: Zeroizing::new("analytical".into()),
                    is_active: true,
                },
                &context,
            )
            .await
            .expect("created");
        assert_eq!(profile.email, "ada@example.com");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(Zeroizing::new(String::new())))]
    #[tokio::test]
    async fn update_without_password_keeps_the_stored_digest(
        context: RequestContext,
        #[case] password: Option<Zeroizing<String>>,
    ) {
        let before = stored_user(true);
        let id = before.id.clone().expect("id");
        let digest = before.password.clone();
        let mut users = MockSystemUserRepository::new();
        let lookup = before.clone();
        users
            .expect_find_user_by_email()
            .returning(move |_| Ok(Some(lookup.clone())));
        users
            .expect_find_user()
            .return_once(move |_| Ok(Some(before)));
        users
            .expect_update_user()
            .withf(move |user| user.password == digest && user.password_salt == SALT)
            .times(1)
            .returning(|user| Ok(Some(user.clone())));
        let harness = harness_with(users, MockUserSettingRepository::new());

        let profile = harness
            .service
            .update(
                SystemUserChanges {
                    id,
                    name: "Augusta".into(),
                    surname: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    password,
                    is_active: true,
                },
                &context,
            )
            .await
            .expect("updated");
        assert_eq!(profile.name, "Augusta");
    }

    #[rstest]
    #[tokio::test]
    async fn email_lookup_returns_a_profile_without_secrets() {
        let user = stored_user(true);
        let id = user.id.clone().expect("id");
        let mut users = MockSystemUserRepository::new();
        users
            .expect_find_user_by_email()
            .withf(|email| email == "ada@example.com")
            .times(1)
            .return_once(move |_| Ok(Some(user)));
        let harness = harness_with(users, MockUserSettingRepository::new());

        let profile = harness
            .service
            .get_by_email(" ada@example.com ")
            .await
            .expect("found");

        assert_eq!(profile.id, id);
        assert_eq!(profile.email, "ada@example.com");
        let json = serde_json::to_value(&profile).expect("serialise profile");
        let object = json.as_object().expect("profile is an object");
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordSalt"));
        assert!(!json.to_string().contains(SALT));
    }

    #[rstest]
    #[tokio::test]
    async fn email_lookup_reports_unknown_users() {
        let harness = harness_with(users_returning(None), MockUserSettingRepository::new());

        let err = harness
            .service
            .get_by_email("nobody@example.com")
            .await
            .expect_err("unknown email");

        assert!(err.is_logic());
        assert_eq!(err.message(), "system user not found");
    }

    #[rstest]
    #[tokio::test]
    async fn new_password_gets_an_alphanumeric_salt(context: RequestContext) {
        let before = stored_user(true);
        let id = before.id.clone().expect("id");
        let mut users = MockSystemUserRepository::new();
        users.expect_find_user_by_email().returning(|_| Ok(None));
        users
            .expect_find_user()
            .return_once(move |_| Ok(Some(before)));
        users
            .expect_update_user()
            .withf(|user| {
                user.password_salt != SALT
                    && password::verify("difference", &user.password_salt, &user.password)
            })
            .times(1)
            .returning(|user| Ok(Some(user.clone())));
        let harness = harness_with(users, MockUserSettingRepository::new());

        harness
            .service
            .update(
                SystemUserChanges {
                    id,
                    name: "Ada".into(),
                    surname: "Lovelace".into(),
                    email: "ada@example.com".into(),
                    password: Some(Zeroizing::new("difference".into())),
                    is_active: true,
                },
                &context,
            )
            .await
            .expect("updated");
    }

    #[rstest]
    #[tokio::test]
    async fn logout_is_idempotent() {
        let harness = harness_with(MockSystemUserRepository::new(), MockUserSettingRepository::new());
        let token = SessionToken::generate();

        harness.service.logout(token.as_str()).await.expect("first");
        harness.service.logout(token.as_str()).await.expect("second");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[case(Some("unknown-token"))]
    #[tokio::test]
    async fn authenticate_rejects_absent_sessions(#[case] raw: Option<&str>) {
        let harness = harness_with(MockSystemUserRepository::new(), MockUserSettingRepository::new());

        let err = harness
            .service
            .authenticate(raw)
            .await
            .expect_err("no session");
        assert!(err.is_auth());
    }
}
