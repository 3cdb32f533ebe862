use crate::Config;
use crate::templating::{DEFAULT_INDEX_TEMPLATE, INDEX_TEMPLATE};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Failed to create upload directory: {0}")]
    UploadDirectoryCreationFailed(#[source] std::io::Error),

    #[error("Failed to create static files directory: {0}")]
    StaticDirectoryCreationFailed(#[source] std::io::Error),

    #[error("Failed to create templates directory: {0}")]
    TemplateDirectoryCreationFailed(#[source] std::io::Error),

    #[error("Failed to write default index template: {0}")]
    DefaultTemplateWriteFailed(#[source] std::io::Error),
}

impl StartupCheckError {
    /// Without a writable upload directory the server cannot do its job.
    pub fn is_critical(&self) -> bool {
        matches!(self, StartupCheckError::UploadDirectoryCreationFailed(_))
    }
}

async fn ensure_directory(label: &str, dir: &Path) -> Result<(), std::io::Error> {
    if dir.exists() {
        info!("{} directory exists: {:?}", label, dir);
        return Ok(());
    }

    info!("{} directory does not exist, creating: {:?}", label, dir);
    tokio::fs::create_dir_all(dir).await.inspect_err(|e| {
        error!("Failed to create {} directory {:?}: {}", label, dir, e);
    })
}

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    if let Err(e) = ensure_directory("Upload", &config.storage.upload_directory).await {
        errors.push(StartupCheckError::UploadDirectoryCreationFailed(e));
    } else if let Err(e) = tokio::fs::read_dir(&config.storage.upload_directory).await {
        error!("Upload directory is not accessible: {}", e);
        errors.push(StartupCheckError::UploadDirectoryCreationFailed(e));
    }

    if let Err(e) = ensure_directory("Static files", &config.static_files.directory).await {
        errors.push(StartupCheckError::StaticDirectoryCreationFailed(e));
    }

    let templates_dir = &config.templates.directory;
    match ensure_directory("Templates", templates_dir).await {
        Ok(()) => {
            let index_path = templates_dir.join(INDEX_TEMPLATE);
            if !index_path.exists() {
                warn!(
                    "Index template missing, writing default to {:?}",
                    index_path
                );
                if let Err(e) = tokio::fs::write(&index_path, DEFAULT_INDEX_TEMPLATE).await {
                    error!("Failed to write default index template: {}", e);
                    errors.push(StartupCheckError::DefaultTemplateWriteFailed(e));
                }
            }
        }
        Err(e) => errors.push(StartupCheckError::TemplateDirectoryCreationFailed(e)),
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
