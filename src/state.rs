//! Shared application state.

use std::sync::Arc;

use crate::config::{AppConfig, DEFAULT_MAX_UPLOAD_BYTES};
use crate::converter::{ConversionService, DocumentConverter, JobWorkspace};

#[derive(Clone)]
pub struct AppState {
    pub converter: Arc<dyn DocumentConverter + Send + Sync>,
    pub workspace: JobWorkspace,
    pub isolate_profile: bool,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(converter: Arc<dyn DocumentConverter + Send + Sync>, workspace: JobWorkspace) -> Self {
        Self {
            converter,
            workspace,
            isolate_profile: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_upload_limit(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn from_config(config: &AppConfig) -> std::io::Result<Self> {
        let workspace = JobWorkspace::new(config.work_dir.clone(), config.keep_job_files);
        workspace.ensure_root()?;

        let converter = Arc::new(ConversionService::from_config(&config.converter));
        Ok(Self {
            converter,
            workspace,
            isolate_profile: config.converter.isolate_profile,
            max_upload_bytes: config.max_upload_bytes,
        })
    }
}
