use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use pagevault_core::AppError;
use uuid::Uuid;

/// Authenticated user for the current request, inserted by the session
/// middleware and stored in request extensions
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub username: String,
}

// Extension cannot be combined with Multipart, so extract directly from parts.
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Login required".to_string())))
    }
}
