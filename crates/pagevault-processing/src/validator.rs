use pagevault_core::Config;
use std::path::Path;

/// Upload validation errors. The `Display` text is shown to users.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("No file part in the request")]
    NoFile,

    #[error("No file selected")]
    NoFilename,

    #[error("File is empty")]
    EmptyFile,

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("File type not allowed: .{extension} (allowed: {})", .allowed.join(", "))]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("File has no extension: {0}")]
    MissingExtension(String),

    #[error("Content type not allowed: {content_type}")]
    InvalidContentType { content_type: String },

    #[error("Content type {content_type} does not match extension .{extension}")]
    ExtensionContentTypeMismatch {
        extension: String,
        content_type: String,
    },
}

/// Content type implied by an allowed extension
pub fn expected_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Lower-cased extension of a filename, if any
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_lowercase())
}

/// Upload validator
///
/// A pure predicate over (filename, declared content type, size): it has no
/// side effects, so a rejected upload never reaches storage.
#[derive(Debug, Clone)]
pub struct FileValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl FileValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.max_file_size_bytes(),
            config.allowed_extensions().to_vec(),
            config.allowed_content_types().to_vec(),
        )
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::NoFilename);
        }

        let extension = file_extension(filename)
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if !self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Validate that the declared content type matches the file extension
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let extension = file_extension(filename)
            .ok_or_else(|| ValidationError::MissingExtension(filename.to_string()))?;

        let Some(expected) = expected_content_type(&extension) else {
            // Extension allowed by configuration but unknown here: nothing to cross-check.
            tracing::debug!(
                extension = %extension,
                content_type = %content_type,
                "Unknown extension, skipping content type cross-validation"
            );
            return Ok(());
        };

        if normalize_content_type(content_type) != expected {
            return Err(ValidationError::ExtensionContentTypeMismatch {
                extension,
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }

    /// Content type to validate and store with: the declared type, or the one
    /// implied by the extension when the client sent none or a generic type.
    pub fn resolve_content_type(&self, filename: &str, declared: Option<&str>) -> String {
        let declared = declared
            .map(normalize_content_type)
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream");

        declared.unwrap_or_else(|| {
            file_extension(filename)
                .and_then(|ext| expected_content_type(&ext))
                .unwrap_or("application/octet-stream")
                .to_string()
        })
    }

    /// Validate all aspects of a file. Size is checked first.
    pub fn validate_all(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

/// Lower-case and drop parameters (`image/png; charset=x` -> `image/png`)
fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase()
}
