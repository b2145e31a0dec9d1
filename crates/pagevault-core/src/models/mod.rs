//! Data models for the application
//!
//! Each sub-module represents one feature area: uploaded files, users and
//! sessions, and processing results.

mod file;
mod processing;
mod user;

// Re-export all models for convenient imports
pub use file::{StoredFile, UploadedFile};
pub use processing::{PageOutcome, ProcessingResult};
pub use user::{Session, User};
