use crate::auth::{SessionStore, UserStore};
use pagevault_core::Config;
use pagevault_processing::{DependencyReport, FileValidator, PdfPipeline};
use pagevault_storage::Storage;
use std::sync::Arc;

/// Shared application state handed to every handler
pub struct AppState {
    pub config: Config,
    pub storage: Arc<dyn Storage>,
    pub validator: FileValidator,
    /// `None` when no AI key is configured
    pub pipeline: Option<Arc<PdfPipeline>>,
    /// External tool availability, probed once at startup
    pub dependencies: DependencyReport,
    pub users: UserStore,
    pub sessions: SessionStore,
}
