use axum_test::TestServer;
use pagevault_api::auth::SESSION_COOKIE;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Logged-in test user; `cookie` is ready for a `Cookie` header.
pub struct TestUser {
    pub username: String,
    pub cookie: String,
}

pub async fn register(client: &TestServer, username: &str, email: &str, password: &str) -> u16 {
    let response = client
        .post("/register")
        .form(&[
            ("username", username),
            ("email", email),
            ("password", password),
            ("confirm_password", password),
        ])
        .await;
    response.status_code().as_u16()
}

/// `name=value` of the session cookie set by a login response.
pub fn session_cookie_from(set_cookie: &str) -> Option<String> {
    let pair = set_cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name == SESSION_COOKIE && !value.is_empty() {
        Some(pair.to_string())
    } else {
        None
    }
}

pub async fn login(client: &TestServer, username: &str, password: &str) -> Option<String> {
    let response = client
        .post("/login")
        .form(&[("username", username), ("password", password)])
        .await;
    let set_cookie = response.maybe_header("set-cookie")?;
    session_cookie_from(set_cookie.to_str().ok()?)
}

/// Register and log in a fresh user.
pub async fn register_test_user(client: &TestServer, username: &str) -> TestUser {
    let status = register(
        client,
        username,
        &format!("{}@example.com", username),
        TEST_PASSWORD,
    )
    .await;
    assert_eq!(status, 303, "registration should redirect to login");

    let cookie = login(client, username, TEST_PASSWORD)
        .await
        .expect("login should set a session cookie");

    TestUser {
        username: username.to_string(),
        cookie,
    }
}
