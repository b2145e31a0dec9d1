//! Login, logout and registration handlers

use super::pages;
use crate::auth::middleware::safe_next;
use crate::auth::session::{clear_session_cookie, cookie_value, session_cookie};
use crate::auth::{Registration, SESSION_COOKIE};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

/// GET /
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Redirect {
    let logged_in = match cookie_value(&headers, SESSION_COOKIE) {
        Some(token) => state.sessions.get(&token).await.is_some(),
        None => false,
    };

    if logged_in {
        Redirect::to("/files")
    } else {
        Redirect::to("/login")
    }
}

/// GET /login
pub async fn login_form(Query(query): Query<LoginQuery>) -> Html<String> {
    Html(pages::login_page(
        query.error.as_deref(),
        query.next.as_deref(),
    ))
}

/// POST /login
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let Some(user) = state
        .users
        .authenticate(&form.username, &form.password)
        .await
    else {
        tracing::info!(username = %form.username, "Login failed");
        let mut target = "/login?error=invalid_credentials".to_string();
        if let Some(next) = form.next.as_deref().filter(|n| !n.is_empty()) {
            target.push_str("&next=");
            target.push_str(&urlencoding::encode(next));
        }
        return Redirect::to(&target).into_response();
    };

    let session = state.sessions.create(&user).await;
    let cookie = session_cookie(
        &session.token,
        state.sessions.ttl(),
        state.config.cookie_secure(),
    );

    tracing::info!(user_id = %user.id, username = %user.username, "Login succeeded");

    (
        [(SET_COOKIE, cookie)],
        Redirect::to(safe_next(form.next.as_deref())),
    )
        .into_response()
}

/// GET /logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = cookie_value(&headers, SESSION_COOKIE) {
        state.sessions.remove(&token).await;
    }

    (
        [(SET_COOKIE, clear_session_cookie(state.config.cookie_secure()))],
        Redirect::to("/login"),
    )
        .into_response()
}

/// GET /register
pub async fn register_form() -> Html<&'static str> {
    Html(pages::register_page())
}

/// POST /register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Form(form): Form<Registration>,
) -> Result<Redirect, HttpAppError> {
    state.users.register(&form).await?;
    Ok(Redirect::to("/login"))
}
