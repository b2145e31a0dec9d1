//! Configuration module
//!
//! Configuration is read once from the environment at process start
//! (a `.env` file is honored when present). There is no hot reload.

use std::env;

use crate::storage_types::StorageBackend;

// Common constants
const SERVER_PORT: u16 = 5001;
const MAX_FILE_SIZE_MB: usize = 10;
/// Largest accepted `MAX_FILE_SIZE_MB`; keeps byte limits within a 32-bit `usize`
const MAX_FILE_SIZE_MB_CEILING: usize = 2048;
const BYTES_PER_MB: usize = 1024 * 1024;
const SESSION_TTL_HOURS: i64 = 24;
const LOCAL_OUTPUT_DIR: &str = "uploads";
const GEMINI_MODEL: &str = "gemini-2.0-flash";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const AI_MAX_RETRIES: u32 = 3;
const AI_RETRY_DELAY_SECS: u64 = 5;
const AI_TIMEOUT_SECS: u64 = 120;
const OCR_TIMEOUT_SECS: u64 = 60;
const OCR_LANGUAGE: &str = "eng";
const RENDER_DPI: u32 = 300;
const OUTPUT_TIMEOUT_SECS: u64 = 60;
const MAX_PAGE_WORKERS: usize = 4;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "gif"];
pub const DEFAULT_ALLOWED_CONTENT_TYPES: &[&str] =
    &["application/pdf", "image/png", "image/jpeg", "image/gif"];

/// Base configuration shared by every component
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub session_ttl_hours: i64,
    pub cookie_secure: bool,
}

/// Full service configuration
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: String,
    pub local_storage_base_url: Option<String>,
    // Upload validation
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    // Generative AI
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub ai_max_retries: u32,
    pub ai_retry_delay_secs: u64,
    pub ai_timeout_secs: u64,
    // External engines
    pub tesseract_path: String,
    pub pdftoppm_path: String,
    pub pdfseparate_path: String,
    pub pdfunite_path: String,
    pub wkhtmltopdf_path: String,
    // Pipeline tuning
    pub ocr_timeout_secs: u64,
    pub ocr_language: String,
    pub render_dpi: u32,
    pub max_page_workers: usize,
    pub html_conversion_enabled: bool,
    // Processed output delivery
    pub output_server_url: Option<String>,
    pub output_dir: Option<String>,
    pub output_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<ServiceConfig>);

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn env_list(key: &str, default: &[&str]) -> Vec<String> {
    env::var(key)
        .unwrap_or_else(|_| default.join(","))
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .to_lowercase()
        .parse()
        .unwrap_or(default)
}

fn default_page_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_PAGE_WORKERS)
}

impl Config {
    fn as_service(&self) -> &ServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_service().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = ServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_service().validate()
    }

    // Convenience getters for common fields
    pub fn server_port(&self) -> u16 {
        self.as_service().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_service().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_service().base.environment
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.as_service().base.session_ttl_hours
    }

    pub fn cookie_secure(&self) -> bool {
        self.as_service().base.cookie_secure
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_service().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_service().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_service().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_service().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_service().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> &str {
        &self.as_service().local_storage_path
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_service().local_storage_base_url.as_deref()
    }

    pub fn max_file_size_bytes(&self) -> usize {
        self.as_service().max_file_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.as_service().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.as_service().allowed_content_types
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.as_service().gemini_api_key.as_deref()
    }

    pub fn gemini_model(&self) -> &str {
        &self.as_service().gemini_model
    }

    pub fn gemini_api_base(&self) -> &str {
        &self.as_service().gemini_api_base
    }

    pub fn ai_max_retries(&self) -> u32 {
        self.as_service().ai_max_retries
    }

    pub fn ai_retry_delay_secs(&self) -> u64 {
        self.as_service().ai_retry_delay_secs
    }

    pub fn ai_timeout_secs(&self) -> u64 {
        self.as_service().ai_timeout_secs
    }

    pub fn tesseract_path(&self) -> &str {
        &self.as_service().tesseract_path
    }

    pub fn pdftoppm_path(&self) -> &str {
        &self.as_service().pdftoppm_path
    }

    pub fn pdfseparate_path(&self) -> &str {
        &self.as_service().pdfseparate_path
    }

    pub fn pdfunite_path(&self) -> &str {
        &self.as_service().pdfunite_path
    }

    pub fn wkhtmltopdf_path(&self) -> &str {
        &self.as_service().wkhtmltopdf_path
    }

    pub fn ocr_timeout_secs(&self) -> u64 {
        self.as_service().ocr_timeout_secs
    }

    pub fn ocr_language(&self) -> &str {
        &self.as_service().ocr_language
    }

    pub fn render_dpi(&self) -> u32 {
        self.as_service().render_dpi
    }

    pub fn max_page_workers(&self) -> usize {
        self.as_service().max_page_workers
    }

    pub fn html_conversion_enabled(&self) -> bool {
        self.as_service().html_conversion_enabled
    }

    pub fn output_server_url(&self) -> Option<&str> {
        self.as_service().output_server_url.as_deref()
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.as_service().output_dir.as_deref()
    }

    pub fn output_timeout_secs(&self) -> u64 {
        self.as_service().output_timeout_secs
    }
}

impl Default for Config {
    fn default() -> Self {
        Config(Box::default())
    }
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "development".to_string(),
            session_ttl_hours: SESSION_TTL_HOURS,
            cookie_secure: false,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            storage_backend: StorageBackend::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: LOCAL_OUTPUT_DIR.to_string(),
            local_storage_base_url: None,
            max_file_size_bytes: MAX_FILE_SIZE_MB * BYTES_PER_MB,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allowed_content_types: DEFAULT_ALLOWED_CONTENT_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            gemini_api_key: None,
            gemini_model: GEMINI_MODEL.to_string(),
            gemini_api_base: GEMINI_API_BASE.to_string(),
            ai_max_retries: AI_MAX_RETRIES,
            ai_retry_delay_secs: AI_RETRY_DELAY_SECS,
            ai_timeout_secs: AI_TIMEOUT_SECS,
            tesseract_path: "tesseract".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            pdfseparate_path: "pdfseparate".to_string(),
            pdfunite_path: "pdfunite".to_string(),
            wkhtmltopdf_path: "wkhtmltopdf".to_string(),
            ocr_timeout_secs: OCR_TIMEOUT_SECS,
            ocr_language: OCR_LANGUAGE.to_string(),
            render_dpi: RENDER_DPI,
            max_page_workers: default_page_workers(),
            html_conversion_enabled: true,
            output_server_url: None,
            output_dir: None,
            output_timeout_secs: OUTPUT_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production = is_production_name(&environment);

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            session_ttl_hours: env::var("SESSION_TTL_HOURS")
                .unwrap_or_else(|_| SESSION_TTL_HOURS.to_string())
                .parse()
                .unwrap_or(SESSION_TTL_HOURS),
            cookie_secure: env_bool("COOKIE_SECURE", is_production),
        };

        let s3_bucket = env::var("S3_BUCKET_NAME")
            .or_else(|_| env::var("S3_BUCKET"))
            .ok()
            .filter(|s| !s.trim().is_empty());

        // Explicit backend wins; otherwise a configured bucket selects S3.
        let storage_backend = match env::var("STORAGE_BACKEND") {
            Ok(value) => value.parse::<StorageBackend>()?,
            Err(_) if s3_bucket.is_some() => StorageBackend::S3,
            Err(_) => StorageBackend::Local,
        };

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_FILE_SIZE_MB);

        let config = ServiceConfig {
            base,
            storage_backend,
            s3_bucket,
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION")
                .or_else(|_| env::var("AWS_DEFAULT_REGION"))
                .ok(),
            local_storage_path: env::var("LOCAL_OUTPUT_DIR")
                .or_else(|_| env::var("LOCAL_STORAGE_PATH"))
                .unwrap_or_else(|_| LOCAL_OUTPUT_DIR.to_string()),
            local_storage_base_url: env::var("LOCAL_STORAGE_BASE_URL").ok(),
            max_file_size_bytes: file_size_bytes(max_file_size_mb)?,
            allowed_extensions: env_list("ALLOWED_EXTENSIONS", DEFAULT_ALLOWED_EXTENSIONS),
            allowed_content_types: env_list(
                "ALLOWED_CONTENT_TYPES",
                DEFAULT_ALLOWED_CONTENT_TYPES,
            ),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| GEMINI_MODEL.to_string()),
            gemini_api_base: env::var("GEMINI_API_BASE")
                .unwrap_or_else(|_| GEMINI_API_BASE.to_string()),
            ai_max_retries: env::var("AI_MAX_RETRIES")
                .unwrap_or_else(|_| AI_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(AI_MAX_RETRIES),
            ai_retry_delay_secs: env::var("AI_RETRY_DELAY_SECS")
                .unwrap_or_else(|_| AI_RETRY_DELAY_SECS.to_string())
                .parse()
                .unwrap_or(AI_RETRY_DELAY_SECS),
            ai_timeout_secs: env::var("AI_TIMEOUT_SECS")
                .unwrap_or_else(|_| AI_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(AI_TIMEOUT_SECS),
            tesseract_path: env::var("TESSERACT_PATH")
                .unwrap_or_else(|_| "tesseract".to_string()),
            pdftoppm_path: env::var("PDFTOPPM_PATH").unwrap_or_else(|_| "pdftoppm".to_string()),
            pdfseparate_path: env::var("PDFSEPARATE_PATH")
                .unwrap_or_else(|_| "pdfseparate".to_string()),
            pdfunite_path: env::var("PDFUNITE_PATH").unwrap_or_else(|_| "pdfunite".to_string()),
            wkhtmltopdf_path: env::var("WKHTMLTOPDF_PATH")
                .unwrap_or_else(|_| "wkhtmltopdf".to_string()),
            ocr_timeout_secs: env::var("OCR_TIMEOUT_SECS")
                .unwrap_or_else(|_| OCR_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(OCR_TIMEOUT_SECS),
            ocr_language: env::var("OCR_LANGUAGE").unwrap_or_else(|_| OCR_LANGUAGE.to_string()),
            render_dpi: env::var("RENDER_DPI")
                .unwrap_or_else(|_| RENDER_DPI.to_string())
                .parse()
                .unwrap_or(RENDER_DPI),
            max_page_workers: env::var("MAX_PAGE_WORKERS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_page_workers),
            html_conversion_enabled: env_bool("HTML_CONVERSION_ENABLED", true),
            output_server_url: env::var("OUTPUT_SERVER_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            output_dir: env::var("OUTPUT_DIR")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            output_timeout_secs: env::var("OUTPUT_TIMEOUT_SECS")
                .unwrap_or_else(|_| OUTPUT_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(OUTPUT_TIMEOUT_SECS),
        };

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }

        if self.max_file_size_bytes > MAX_FILE_SIZE_MB_CEILING * BYTES_PER_MB {
            return Err(anyhow::anyhow!(
                "MAX_FILE_SIZE_MB must be at most {}",
                MAX_FILE_SIZE_MB_CEILING
            ));
        }

        if self.allowed_extensions.is_empty() {
            return Err(anyhow::anyhow!("ALLOWED_EXTENSIONS must not be empty"));
        }

        if !(72..=1200).contains(&self.render_dpi) {
            return Err(anyhow::anyhow!(
                "RENDER_DPI must be between 72 and 1200 (got {})",
                self.render_dpi
            ));
        }

        if self.max_page_workers == 0 {
            return Err(anyhow::anyhow!("MAX_PAGE_WORKERS must be at least 1"));
        }

        if self.base.session_ttl_hours <= 0 {
            return Err(anyhow::anyhow!("SESSION_TTL_HOURS must be positive"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET_NAME must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.trim().is_empty() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_OUTPUT_DIR must not be empty when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Convert a megabyte limit to bytes, rejecting values above the ceiling.
fn file_size_bytes(mb: usize) -> Result<usize, anyhow::Error> {
    if mb > MAX_FILE_SIZE_MB_CEILING {
        return Err(anyhow::anyhow!(
            "MAX_FILE_SIZE_MB must be at most {} (got {})",
            MAX_FILE_SIZE_MB_CEILING,
            mb
        ));
    }
    mb.checked_mul(BYTES_PER_MB)
        .ok_or_else(|| anyhow::anyhow!("MAX_FILE_SIZE_MB is too large: {}", mb))
}
