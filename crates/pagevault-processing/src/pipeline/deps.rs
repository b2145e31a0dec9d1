use super::command::{run_command, CommandError};
use super::EnginePaths;
use serde::Serialize;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize)]
pub struct DependencyStatus {
    pub name: &'static str,
    pub path: String,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyReport {
    pub dependencies: Vec<DependencyStatus>,
}

impl DependencyReport {
    pub fn all_available(&self) -> bool {
        self.dependencies.iter().all(|d| d.available)
    }

    pub fn missing(&self) -> impl Iterator<Item = &DependencyStatus> {
        self.dependencies.iter().filter(|d| !d.available)
    }
}

/// Probe each external tool with its version flag.
pub async fn check_system_dependencies(paths: &EnginePaths) -> DependencyReport {
    let checks = [
        ("tesseract", paths.tesseract.as_str(), "--version"),
        ("pdftoppm", paths.pdftoppm.as_str(), "-v"),
        ("pdfseparate", paths.pdfseparate.as_str(), "-v"),
        ("pdfunite", paths.pdfunite.as_str(), "-v"),
        ("wkhtmltopdf", paths.wkhtmltopdf.as_str(), "--version"),
    ];

    let mut dependencies = Vec::with_capacity(checks.len());
    for (name, path, flag) in checks {
        let available = probe(path, flag).await;
        if available {
            tracing::debug!(dependency = name, path = %path, "Dependency available");
        } else {
            tracing::warn!(dependency = name, path = %path, "Dependency not available");
        }
        dependencies.push(DependencyStatus {
            name,
            path: path.to_string(),
            available,
        });
    }

    DependencyReport { dependencies }
}

async fn probe(path: &str, flag: &str) -> bool {
    match run_command(path, &[flag], CHECK_TIMEOUT).await {
        Ok(_) => true,
        // Older poppler tools print their version and exit with 99.
        Err(CommandError::Failed { code, .. }) => code == Some(99),
        Err(_) => false,
    }
}
