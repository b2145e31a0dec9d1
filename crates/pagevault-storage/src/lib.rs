//! PageVault Storage Library
//!
//! Storage abstraction with S3 (object_store) and local filesystem backends.
//!
//! # Storage key format
//!
//! Uploaded files live in a per-owner namespace:
//!
//! - `uploads/{owner_id}/{stored_filename}`
//!
//! where `stored_filename` is `{sanitized_base}_{uuid}{.ext}`, so two uploads
//! with the same original name never share a key. Keys must not contain `..`
//! or a leading `/`. Key generation is centralized in [`keys`] so every
//! backend stays consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use pagevault_core::StorageBackend;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteStream, Storage, StorageError, StorageResult, StoredObject};
