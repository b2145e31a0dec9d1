use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use pagevault_core::models::{Session, User};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const SESSION_COOKIE: &str = "pagevault_session";

const TOKEN_BYTES: usize = 32;

/// In-process session registry keyed by cookie token
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_hours: i64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            ttl: Duration::hours(ttl_hours.max(1)),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self, user: &User) -> Session {
        let now = Utc::now();
        let session = Session {
            token: generate_token(),
            user_id: user.id,
            username: user.username.clone(),
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.inner.lock().await;
        sessions.retain(|_, s| !s.is_expired(now));
        sessions.insert(session.token.clone(), session.clone());

        tracing::info!(user_id = %user.id, expires_at = %session.expires_at, "Session created");
        session
    }

    /// Look up a live session. Expired sessions are dropped on access.
    pub async fn get(&self, token: &str) -> Option<Session> {
        let mut sessions = self.inner.lock().await;
        let session = sessions.get(token)?;

        if session.is_expired(Utc::now()) {
            tracing::debug!(user_id = %session.user_id, "Session expired");
            sessions.remove(token);
            return None;
        }

        Some(session.clone())
    }

    pub async fn remove(&self, token: &str) -> Option<Session> {
        let removed = self.inner.lock().await.remove(token);
        if let Some(ref session) = removed {
            tracing::info!(user_id = %session.user_id, "Session ended");
        }
        removed
    }

    #[cfg(test)]
    async fn insert(&self, session: Session) {
        self.inner
            .lock()
            .await
            .insert(session.token.clone(), session);
    }
}

fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..TOKEN_BYTES).map(|_| rng.random()).collect();
    hex::encode(bytes)
}

/// `Set-Cookie` value establishing a session
pub fn session_cookie(token: &str, max_age: Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; SameSite=Strict; HttpOnly",
        SESSION_COOKIE,
        token,
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value removing the session cookie
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", Duration::zero(), secure)
}

/// Value of the named cookie from the `Cookie` header(s)
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all("Cookie")
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|cookie_str| cookie_str.split(';'))
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;
            (key == name && !value.is_empty()).then(|| value.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new(24);
        let user = user();
        let session = store.create(&user).await;

        assert_eq!(session.token.len(), TOKEN_BYTES * 2);
        assert_eq!(store.get(&session.token).await.unwrap().user_id, user.id);

        store.remove(&session.token).await;
        assert!(store.get(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let store = SessionStore::new(24);
        let now = Utc::now();
        store
            .insert(Session {
                token: "stale".to_string(),
                user_id: Uuid::new_v4(),
                username: "alice".to_string(),
                created_at: now - Duration::hours(25),
                expires_at: now - Duration::hours(1),
            })
            .await;

        assert!(store.get("stale").await.is_none());
    }

    #[test]
    fn test_cookie_value_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Cookie",
            HeaderValue::from_static("theme=dark; pagevault_session=abc123; other=1"),
        );
        assert_eq!(
            cookie_value(&headers, SESSION_COOKIE),
            Some("abc123".to_string())
        );
        assert_eq!(cookie_value(&headers, "missing"), None);

        let mut empty = HeaderMap::new();
        empty.insert("Cookie", HeaderValue::from_static("pagevault_session="));
        assert_eq!(cookie_value(&empty, SESSION_COOKIE), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("tok", Duration::hours(1), true);
        assert!(cookie.starts_with("pagevault_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        let cleared = clear_session_cookie(false);
        assert!(cleared.contains("Max-Age=0"));
        assert!(!cleared.contains("Secure"));
    }
}
