//! PageVault API
//!
//! HTTP surface for uploads, file management, document processing and
//! session-based login.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
