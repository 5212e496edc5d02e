//! Permission seeding, enforcement and invalidation over the in-memory
//! adapters.

use lms_backend::domain::permission::default_catalogue;
use lms_backend::domain::{
    GRANTED, NewSystemUser, RequestContext, SystemUserProfile, SystemUserSetting, WITHHELD,
};
use lms_backend::test_support::TestApp;
use pagination::QuerySpec;
use rstest::rstest;
use zeroize::Zeroizing;

const MEMBER_EMAIL: &str = "grace@example.com";
const MEMBER_PASSWORD: &str = "compiler pioneer";

async fn app() -> TestApp {
    TestApp::start().await.expect("test app starts")
}

async fn create_member(app: &TestApp, admin: &RequestContext) -> SystemUserProfile {
    app.services
        .users
        .create(
            NewSystemUser {
                name: "Grace".into(),
                surname: "Hopper".into(),
                email: MEMBER_EMAIL.into(),
                password: Zeroizing::new(MEMBER_PASSWORD.into()),
                is_active: true,
            },
            admin,
        )
        .await
        .expect("member is created")
}

async fn set_permission(
    app: &TestApp,
    admin: &RequestContext,
    member: &SystemUserProfile,
    key: &str,
    value: &str,
) {
    app.services
        .settings
        .set(
            SystemUserSetting::new(member.id.clone(), key, value, "view clients"),
            admin,
        )
        .await
        .expect("setting is stored");
}

#[rstest]
#[tokio::test]
async fn new_users_receive_every_default_permission() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;

    let settings = app
        .services
        .settings
        .get_by_user_id(&member.id, &admin)
        .await
        .expect("settings are listed");

    assert_eq!(settings.len(), default_catalogue().len());
    assert!(settings.iter().all(|setting| setting.value == GRANTED));
}

#[rstest]
#[tokio::test]
async fn withheld_permission_takes_effect_after_a_cached_grant() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;
    let session = app
        .login(MEMBER_EMAIL, MEMBER_PASSWORD)
        .await
        .expect("member logs in");
    let query = QuerySpec::new(1, 10);

    app.services
        .clients
        .get_all(&query, &session)
        .await
        .expect("granted permission allows listing");

    set_permission(&app, &admin, &member, "clients.view", WITHHELD).await;

    let err = app
        .services
        .clients
        .get_all(&query, &session)
        .await
        .expect_err("withheld permission denies listing");
    assert!(err.is_logic());
    assert_eq!(err.message(), "not authorised: clients.view");

    set_permission(&app, &admin, &member, "clients.view", GRANTED).await;

    app.services
        .clients
        .get_all(&query, &session)
        .await
        .expect("restored permission allows listing");
}

#[rstest]
#[tokio::test]
async fn deleted_permission_is_treated_as_missing() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;
    let session = app
        .login(MEMBER_EMAIL, MEMBER_PASSWORD)
        .await
        .expect("member logs in");
    let query = QuerySpec::new(1, 10);
    app.services
        .clients
        .get_all(&query, &session)
        .await
        .expect("granted permission allows listing");

    let setting = app
        .services
        .settings
        .get_by_user_id(&member.id, &admin)
        .await
        .expect("settings are listed")
        .into_iter()
        .find(|setting| setting.key == "clients.view")
        .expect("seeded view permission");
    app.services
        .settings
        .delete(setting.id.expect("stored setting has an id"), &admin)
        .await
        .expect("setting is deleted");

    let err = app
        .services
        .clients
        .get_all(&query, &session)
        .await
        .expect_err("missing permission denies listing");
    assert_eq!(err.message(), "not authorised: clients.view");
}

#[rstest]
#[tokio::test]
async fn anonymous_requests_are_rejected_before_permissions() {
    let app = app().await;

    let err = app
        .services
        .clients
        .get_all(&QuerySpec::new(1, 10), &RequestContext::anonymous())
        .await
        .expect_err("anonymous request rejected");

    assert!(err.is_auth());
}

#[rstest]
#[tokio::test]
async fn referenced_users_cannot_be_deleted() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;

    let err = app
        .services
        .users
        .delete(&member.id, &admin)
        .await
        .expect_err("seeded settings block deletion");

    assert!(err.is_logic());
    assert_eq!(err.message(), "user is still referenced by settings");
    app.services
        .users
        .get_by_id(&member.id, &admin)
        .await
        .expect("member still exists");
}

#[rstest]
#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    create_member(&app, &admin).await;

    let err = app
        .services
        .users
        .create(
            NewSystemUser {
                name: "Other".into(),
                surname: "Person".into(),
                email: MEMBER_EMAIL.into(),
                password: Zeroizing::new("another secret".into()),
                is_active: true,
            },
            &admin,
        )
        .await
        .expect_err("email already taken");

    assert_eq!(
        err.message(),
        "a user with this email address already exists"
    );
}
