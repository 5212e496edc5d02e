//! Login, logout and session revocation over the in-memory adapters.

use std::time::Duration;

use lms_backend::domain::{
    LOGIN_REJECTED_MESSAGE, NewSystemUser, RequestContext, SystemUserChanges, SystemUserProfile,
};
use lms_backend::test_support::{ADMIN_EMAIL, ADMIN_PASSWORD, TestApp};
use rstest::rstest;
use zeroize::Zeroizing;

async fn app() -> TestApp {
    TestApp::start().await.expect("test app starts")
}

fn token_of(context: &RequestContext) -> String {
    context
        .token()
        .expect("authenticated context")
        .as_str()
        .to_owned()
}

async fn create_member(app: &TestApp, admin: &RequestContext) -> SystemUserProfile {
    app.services
        .users
        .create(
            NewSystemUser {
                name: "Ada".into(),
                surname: "Lovelace".into(),
                email: "ada@example.com".into(),
                password: Zeroizing::new("analytical engine".into()),
                is_active: true,
            },
            admin,
        )
        .await
        .expect("member is created")
}

#[rstest]
#[case(ADMIN_EMAIL, "not the password")]
#[case("nobody@example.com", ADMIN_PASSWORD)]
#[tokio::test]
async fn rejected_logins_share_one_message(#[case] email: &str, #[case] password: &str) {
    let app = app().await;

    let err = app.login(email, password).await.expect_err("login rejected");

    assert!(err.is_logic());
    assert_eq!(err.message(), LOGIN_REJECTED_MESSAGE);
}

#[rstest]
#[tokio::test]
async fn successful_login_authenticates_later_requests() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");

    let context = app
        .services
        .users
        .authenticate(Some(&token_of(&admin)))
        .await
        .expect("token is live");

    assert_eq!(context, admin);
}

#[rstest]
#[tokio::test]
async fn logout_is_idempotent() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let token = token_of(&admin);

    app.services.users.logout(&token).await.expect("first logout");
    app.services.users.logout(&token).await.expect("second logout");

    let err = app
        .services
        .users
        .authenticate(Some(&token))
        .await
        .expect_err("token revoked");
    assert!(err.is_auth());
}

#[rstest]
#[tokio::test]
async fn sessions_expire_with_their_lifetime() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");

    app.clock.advance(Duration::from_secs(6 * 60 * 60));

    let err = app
        .services
        .users
        .authenticate(Some(&token_of(&admin)))
        .await
        .expect_err("session expired");
    assert!(err.is_auth());
}

#[rstest]
#[tokio::test]
async fn deactivation_revokes_existing_sessions() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;
    let first = app
        .login("ada@example.com", "analytical engine")
        .await
        .expect("member logs in");
    let second = app
        .login("ada@example.com", "analytical engine")
        .await
        .expect("member logs in again");

    app.services
        .users
        .update(
            SystemUserChanges {
                id: member.id.clone(),
                name: member.name.clone(),
                surname: member.surname.clone(),
                email: member.email.clone(),
                password: None,
                is_active: false,
            },
            &admin,
        )
        .await
        .expect("member is deactivated");

    for context in [&first, &second] {
        let err = app
            .services
            .users
            .authenticate(Some(&token_of(context)))
            .await
            .expect_err("session revoked");
        assert!(err.is_auth());
    }
    let err = app
        .login("ada@example.com", "analytical engine")
        .await
        .expect_err("inactive member cannot log in");
    assert_eq!(err.message(), LOGIN_REJECTED_MESSAGE);
}

#[rstest]
#[case(None)]
#[case(Some(Zeroizing::new(String::new())))]
#[tokio::test]
async fn profile_changes_keep_sessions_and_password(#[case] password: Option<Zeroizing<String>>) {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;
    let session = app
        .login("ada@example.com", "analytical engine")
        .await
        .expect("member logs in");

    app.services
        .users
        .update(
            SystemUserChanges {
                id: member.id.clone(),
                name: "Augusta Ada".into(),
                surname: member.surname.clone(),
                email: member.email.clone(),
                password,
                is_active: true,
            },
            &admin,
        )
        .await
        .expect("member is renamed");

    app.services
        .users
        .authenticate(Some(&token_of(&session)))
        .await
        .expect("session survives");
    app.login("ada@example.com", "analytical engine")
        .await
        .expect("password unchanged");
}

#[rstest]
#[tokio::test]
async fn password_change_replaces_the_old_password() {
    let app = app().await;
    let admin = app.admin_context().await.expect("admin logs in");
    let member = create_member(&app, &admin).await;

    app.services
        .users
        .update(
            SystemUserChanges {
                id: member.id.clone(),
                name: member.name.clone(),
                surname: member.surname.clone(),
                email: member.email.clone(),
                password: Some(Zeroizing::new("difference engine".into())),
                is_active: true,
            },
            &admin,
        )
        .await
        .expect("password is changed");

    app.login("ada@example.com", "analytical engine")
        .await
        .expect_err("old password rejected");
    app.login("ada@example.com", "difference engine")
        .await
        .expect("new password accepted");
}
