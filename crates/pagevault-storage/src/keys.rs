//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{owner_id}/{stored_filename}`.

use std::path::Path;
use uuid::Uuid;

pub const UPLOAD_PREFIX: &str = "uploads";

/// Generate a storage key for the given owner and (already unique) filename.
pub fn generate_storage_key(owner_id: Uuid, filename: &str) -> String {
    format!("{}/{}", owner_prefix(owner_id), filename)
}

/// Namespace prefix holding every upload of one owner.
pub fn owner_prefix(owner_id: Uuid) -> String {
    format!("{}/{}", UPLOAD_PREFIX, owner_id)
}

/// Reduce a client-supplied name to `[A-Za-z0-9._-]`, dropping any directory
/// components. Returns `None` when nothing usable is left.
pub fn secure_filename(filename: &str) -> Option<String> {
    let last = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_').to_string();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

/// Build a collision-resistant stored name: `{sanitized_base}_{uuid}{.ext}`.
///
/// Stem and extension are taken from the client name separately, so a stem
/// with no usable characters becomes `file` and keeps its extension.
pub fn unique_filename(original: &str) -> String {
    let last = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let path = Path::new(last);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| e.to_lowercase());
    let base = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(secure_filename)
        .unwrap_or_else(|| "file".to_string());

    match ext {
        Some(ext) => format!("{}_{}.{}", base, Uuid::new_v4(), ext),
        None => format!("{}_{}", base, Uuid::new_v4()),
    }
}

/// Recover the display name from a stored name by stripping the `_{uuid}`
/// suffix. Names that don't carry the suffix are returned unchanged.
pub fn original_filename(stored: &str) -> String {
    let path = Path::new(stored);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(stored);
    let ext = path.extension().and_then(|e| e.to_str());

    // A hyphenated UUID is 36 characters, preceded by '_'.
    if stem.len() > 37 && stem.is_char_boundary(stem.len() - 37) {
        let (base, suffix) = stem.split_at(stem.len() - 37);
        if let Some(uuid_part) = suffix.strip_prefix('_') {
            if Uuid::parse_str(uuid_part).is_ok() {
                return match ext {
                    Some(ext) => format!("{}.{}", base, ext),
                    None => base.to_string(),
                };
            }
        }
    }

    stored.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_storage_key() {
        let owner = Uuid::new_v4();
        let key = generate_storage_key(owner, "report_x.pdf");
        assert_eq!(key, format!("uploads/{}/report_x.pdf", owner));
    }

    #[test]
    fn test_secure_filename_strips_directories() {
        assert_eq!(
            secure_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            secure_filename("C:\\temp\\my report.pdf").as_deref(),
            Some("my_report.pdf")
        );
        assert_eq!(secure_filename("..").as_deref(), None);
        assert_eq!(secure_filename("").as_deref(), None);
    }

    #[test]
    fn test_unique_filename_differs_per_call() {
        let a = unique_filename("report.pdf");
        let b = unique_filename("report.pdf");
        assert_ne!(a, b);
        assert!(a.starts_with("report_"));
        assert!(a.ends_with(".pdf"));
    }

    #[test]
    fn test_unique_filename_lowercases_extension() {
        let name = unique_filename("Scan.PDF");
        assert!(name.starts_with("Scan_"));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_original_filename_round_trip() {
        let stored = unique_filename("report.pdf");
        assert_eq!(original_filename(&stored), "report.pdf");

        let stored = unique_filename("my photo.png");
        assert_eq!(original_filename(&stored), "my_photo.png");
    }

    #[test]
    fn test_original_filename_without_suffix() {
        assert_eq!(original_filename("notes.pdf"), "notes.pdf");
        assert_eq!(original_filename("short_1234.pdf"), "short_1234.pdf");
    }

    #[test]
    fn test_unique_filename_keeps_extension_of_non_ascii_name() {
        let stored = unique_filename("фото.png");
        assert!(stored.starts_with("file_"));
        assert!(stored.ends_with(".png"));
        assert_eq!(original_filename(&stored), "file.png");

        let stored = unique_filename("報告 2024.PDF");
        assert!(stored.starts_with("2024_"));
        assert!(stored.ends_with(".pdf"));
    }

    #[test]
    fn test_unique_filename_drops_directories_and_odd_extensions() {
        let stored = unique_filename("../../secret/report.pdf");
        assert!(stored.starts_with("report_"));
        assert!(stored.ends_with(".pdf"));

        let stored = unique_filename("notes.p df");
        assert!(stored.starts_with("notes_"));
        assert!(!stored.contains(' '));
        assert!(!stored.contains('.'));
    }
}
