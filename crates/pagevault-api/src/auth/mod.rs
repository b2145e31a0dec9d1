//! Session-based browser authentication
//!
//! Users register with a username and password (argon2 hashed) and log in
//! through a form. A successful login issues an opaque token stored in the
//! `pagevault_session` cookie; protected routes resolve it through
//! [`middleware::session_middleware`].

pub mod middleware;
pub mod models;
pub mod password;
pub mod session;
pub mod users;

pub use models::SessionContext;
pub use session::{SessionStore, SESSION_COOKIE};
pub use users::{Registration, UserStore};
