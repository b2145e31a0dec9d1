use crate::auth::models::SessionContext;
use crate::auth::session::{cookie_value, SESSION_COOKIE};
use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use pagevault_core::AppError;
use std::sync::Arc;

/// Resolve the session cookie for protected routes.
///
/// Browser routes without a live session are redirected to the login form
/// with a `next` parameter; JSON routes under `/api/` get a 401 instead.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(token) = cookie_value(request.headers(), SESSION_COOKIE) {
        if let Some(session) = state.sessions.get(&token).await {
            request.extensions_mut().insert(SessionContext {
                user_id: session.user_id,
                username: session.username,
            });
            return next.run(request).await;
        }
    }

    let path = request.uri().path();
    tracing::debug!(path = %path, "Request without valid session");

    if path.starts_with("/api/") {
        return HttpAppError(AppError::Unauthorized("Login required".to_string())).into_response();
    }

    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or(path);
    login_redirect(target).into_response()
}

pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!("/login?next={}", urlencoding::encode(next)))
}

/// Only local absolute paths are honoured as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://") =>
        {
            path
        }
        _ => "/files",
    }
}
