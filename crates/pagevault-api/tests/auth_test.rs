//! Registration, login and session integration tests.
//!
//! Run with: `cargo test -p pagevault-api --test auth_test`

mod helpers;

use helpers::auth::{login, register, register_test_user, TEST_PASSWORD};
use helpers::setup_test_app;
use serde_json::Value;

#[tokio::test]
async fn test_browser_route_redirects_to_login() {
    let app = setup_test_app().await;

    let response = app.client().get("/files").await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/login?next=%2Ffiles");
}

#[tokio::test]
async fn test_api_route_requires_session() {
    let app = setup_test_app().await;

    let response = app.client().get("/api/files").await;

    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_session_token_is_rejected() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/api/files")
        .add_header("cookie", "pagevault_session=deadbeef")
        .await;

    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_index_redirects_by_session() {
    let app = setup_test_app().await;
    let client = app.client();

    let anonymous = client.get("/").await;
    assert_eq!(anonymous.status_code(), 303);
    assert_eq!(anonymous.header("location"), "/login");

    let user = register_test_user(client, "alice").await;
    let logged_in = client.get("/").add_header("cookie", user.cookie.clone()).await;
    assert_eq!(logged_in.status_code(), 303);
    assert_eq!(logged_in.header("location"), "/files");
}

#[tokio::test]
async fn test_login_form_renders() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/login?error=invalid_credentials&next=%2Ffiles")
        .await;

    assert_eq!(response.status_code(), 200);
    let html = response.text();
    assert!(html.contains("action=\"/login\""));
    assert!(html.contains("Invalid username or password."));
    assert!(html.contains("name=\"next\" value=\"/files\""));
}

#[tokio::test]
async fn test_login_sets_session_cookie_and_follows_next() {
    let app = setup_test_app().await;
    let client = app.client();
    assert_eq!(
        register(client, "bob", "bob@example.com", TEST_PASSWORD).await,
        303
    );

    let response = client
        .post("/login")
        .form(&[
            ("username", "bob"),
            ("password", TEST_PASSWORD),
            ("next", "/api/files"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/api/files");
    let cookie = response.header("set-cookie");
    let cookie = cookie.to_str().expect("ascii cookie");
    assert!(cookie.starts_with("pagevault_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Strict"));
}

#[tokio::test]
async fn test_login_ignores_external_next() {
    let app = setup_test_app().await;
    let client = app.client();
    register(client, "carol", "carol@example.com", TEST_PASSWORD).await;

    let response = client
        .post("/login")
        .form(&[
            ("username", "carol"),
            ("password", TEST_PASSWORD),
            ("next", "https://evil.example/"),
        ])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(response.header("location"), "/files");
}

#[tokio::test]
async fn test_login_with_wrong_password_redirects_with_error() {
    let app = setup_test_app().await;
    let client = app.client();
    register(client, "dave", "dave@example.com", TEST_PASSWORD).await;

    let response = client
        .post("/login")
        .form(&[("username", "dave"), ("password", "not-the-password")])
        .await;

    assert_eq!(response.status_code(), 303);
    assert_eq!(
        response.header("location"),
        "/login?error=invalid_credentials"
    );
    assert!(response.maybe_header("set-cookie").is_none());
}

#[tokio::test]
async fn test_login_is_case_insensitive_on_username() {
    let app = setup_test_app().await;
    let client = app.client();
    register(client, "Erin", "erin@example.com", TEST_PASSWORD).await;

    assert!(login(client, "erin", TEST_PASSWORD).await.is_some());
}

#[tokio::test]
async fn test_registration_rules() {
    let app = setup_test_app().await;
    let client = app.client();

    // Too short
    assert_eq!(register(client, "ab", "ab@example.com", TEST_PASSWORD).await, 400);
    assert_eq!(register(client, "frank", "frank@example.com", "short").await, 400);
    // Bad email
    assert_eq!(register(client, "frank", "not-an-email", TEST_PASSWORD).await, 400);

    let mismatch = client
        .post("/register")
        .form(&[
            ("username", "frank"),
            ("email", "frank@example.com"),
            ("password", TEST_PASSWORD),
            ("confirm_password", "something-else"),
        ])
        .await;
    assert_eq!(mismatch.status_code(), 400);

    assert_eq!(
        register(client, "frank", "frank@example.com", TEST_PASSWORD).await,
        303
    );
    assert_eq!(
        register(client, "FRANK", "frank2@example.com", TEST_PASSWORD).await,
        409
    );
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "grace").await;

    let before = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(before.status_code(), 200);

    let logout = client
        .get("/logout")
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(logout.status_code(), 303);
    assert_eq!(logout.header("location"), "/login");
    let cleared = logout.header("set-cookie");
    assert!(cleared.to_str().expect("ascii cookie").contains("Max-Age=0"));

    let after = client
        .get("/api/files")
        .add_header("cookie", user.cookie.clone())
        .await;
    assert_eq!(after.status_code(), 401);
}
