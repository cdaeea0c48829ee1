mod common;

use common::TestApp;
use marketplace_api::auth::AuthError;
use marketplace_api::entities::UserRole;

#[tokio::test]
async fn register_then_verify_credentials() {
    let app = TestApp::new().await;

    let created = app
        .auth_service
        .register_user("new-user@example.com", "correct horse battery")
        .await
        .expect("registration failed");
    assert_eq!(created.role, UserRole::Customer);
    assert_ne!(created.password_hash, "correct horse battery");

    let verified = app
        .auth_service
        .verify_credentials("new-user@example.com", "correct horse battery")
        .await
        .expect("valid credentials rejected");
    assert_eq!(verified.id, created.id);

    let wrong = app
        .auth_service
        .verify_credentials("new-user@example.com", "wrong password")
        .await
        .unwrap_err();
    assert!(matches!(wrong, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn emails_are_unique_and_case_insensitive() {
    let app = TestApp::new().await;

    app.auth_service
        .register_user("Someone@Example.com", "password123")
        .await
        .expect("registration failed");

    let err = app
        .auth_service
        .register_user("someone@example.com", "password123")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::EmailTaken));
}

#[tokio::test]
async fn tokens_round_trip_through_validation() {
    let app = TestApp::new().await;
    let (user, token) = app.create_user("jwt@example.com", UserRole::Vendor).await;

    let claims = app
        .auth_service
        .validate_token(&token)
        .expect("token invalid");
    assert_eq!(claims.sub, user.id.to_string());
    assert_eq!(claims.role, "vendor");

    let principal = app
        .auth_service
        .auth_user_from_claims(claims)
        .expect("claims invalid");
    assert_eq!(principal.user_id, user.id);
    assert!(principal.has_role(UserRole::Vendor));
    assert!(!principal.is_admin());
}

#[tokio::test]
async fn tampered_tokens_are_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.create_user("jwt@example.com", UserRole::Customer).await;

    let mut tampered = token.clone();
    tampered.pop();
    let err = app.auth_service.validate_token(&tampered).unwrap_err();
    assert!(matches!(
        err,
        AuthError::InvalidToken | AuthError::TokenExpired
    ));
}
