use super::password::{hash_password, verify_password};
use chrono::Utc;
use pagevault_core::models::User;
use pagevault_core::AppError;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;
use uuid::Uuid;

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));

/// Registration form fields
#[derive(Debug, Clone, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), AppError> {
        let username = self.username.trim();
        let email = self.email.trim();

        if username.is_empty()
            || email.is_empty()
            || self.password.is_empty()
            || self.confirm_password.is_empty()
        {
            return Err(AppError::InvalidInput("All fields are required".to_string()));
        }
        if username.chars().count() < MIN_USERNAME_LEN {
            return Err(AppError::InvalidInput(format!(
                "Username must be at least {} characters",
                MIN_USERNAME_LEN
            )));
        }
        if !EMAIL_RE.is_match(email) {
            return Err(AppError::InvalidInput("Invalid email address".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.password != self.confirm_password {
            return Err(AppError::InvalidInput("Passwords do not match".to_string()));
        }
        Ok(())
    }
}

/// In-process user registry keyed by lower-cased username
#[derive(Clone, Default)]
pub struct UserStore {
    inner: Arc<Mutex<HashMap<String, User>>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, AppError> {
        registration.validate()?;

        let username = registration.username.trim().to_string();
        let email = registration.email.trim().to_lowercase();
        let password_hash = hash_password(&registration.password)?;

        let mut users = self.inner.lock().await;
        if users.contains_key(&username.to_lowercase()) {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if users.values().any(|u| u.email == email) {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.clone(),
            email,
            password_hash,
            created_at: Utc::now(),
        };
        users.insert(username.to_lowercase(), user.clone());

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Return the user when the credentials match.
    pub async fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        let user = self
            .inner
            .lock()
            .await
            .get(&username.trim().to_lowercase())
            .cloned()?;

        match verify_password(password, &user.password_hash) {
            Ok(true) => Some(user),
            Ok(false) => None,
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Stored password hash unreadable");
                None
            }
        }
    }

    pub async fn count(&self) -> usize {
        self.inner.lock().await.len()
    }
}
