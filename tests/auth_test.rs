mod common;

use assert_matches::assert_matches;
use stockroom_api::auth::{consts, RegisterRequest, Role};
use stockroom_api::errors::ServiceError;

fn register_request(username: &str, role: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: None,
        password: "a-long-enough-password".to_string(),
        role: role.to_string(),
    }
}

#[tokio::test]
async fn register_login_and_validate_round_trip() {
    let app = common::setup().await;

    let created = app
        .auth
        .register(register_request("amara", "manager"))
        .await
        .unwrap();
    assert_eq!(created.role, "manager");

    let login = app.auth.login("amara", "a-long-enough-password").await.unwrap();
    assert_eq!(login.token_type, "Bearer");
    assert_eq!(login.username, "amara");

    let user = app.auth.validate_token(&login.access_token).unwrap();
    assert_eq!(user.user_id, created.id);
    assert_eq!(user.role, Role::Manager);
    assert!(user.has_permission(consts::STOCK_ADJUST));
    assert!(!user.has_permission(consts::USERS_MANAGE));
}

#[tokio::test]
async fn wrong_password_and_unknown_user_both_look_alike() {
    let app = common::setup().await;
    app.auth
        .register(register_request("kofi", "staff"))
        .await
        .unwrap();

    let wrong = app.auth.login("kofi", "bad-password").await.unwrap_err();
    let missing = app.auth.login("nobody", "bad-password").await.unwrap_err();
    assert_matches!(&wrong, ServiceError::Unauthorized(m) if m == "Invalid credentials");
    assert_matches!(&missing, ServiceError::Unauthorized(m) if m == "Invalid credentials");
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = common::setup().await;
    app.auth
        .register(register_request("dana", "staff"))
        .await
        .unwrap();
    let err = app
        .auth
        .register(register_request("dana", "manager"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::Conflict(_));
}

#[tokio::test]
async fn unknown_role_is_rejected() {
    let app = common::setup().await;
    let err = app
        .auth
        .register(register_request("sam", "superuser"))
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidInput(_));
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let app = common::setup().await;
    app.auth
        .register(register_request("lena", "admin"))
        .await
        .unwrap();
    let login = app.auth.login("lena", "a-long-enough-password").await.unwrap();

    let mut tampered = login.access_token.clone();
    tampered.push('x');
    let err = app.auth.validate_token(&tampered).unwrap_err();
    assert_matches!(err, ServiceError::Unauthorized(_));
}
