use super::{
    AssetSummary, ImageMetadata, SNIFF_LEN, extract_metadata, public_url, scan_images,
    sniff_content_type,
};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// Builds the catalog listing by re-reading the storage directory on every call.
#[derive(Debug, Clone)]
pub struct CatalogService {
    upload_directory: PathBuf,
}

impl CatalogService {
    pub fn new(upload_directory: PathBuf) -> Self {
        Self { upload_directory }
    }

    /// Sorted storage names of every listed image.
    pub async fn image_names(&self) -> Vec<String> {
        scan_images(&self.upload_directory).await
    }

    pub async fn list_catalog(&self) -> Vec<AssetSummary> {
        let names = self.image_names().await;
        let mut catalog = Vec::with_capacity(names.len());

        for name in names {
            let path = self.upload_directory.join(&name);

            // Files removed between scan and stat are skipped
            let file_metadata = match tokio::fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    debug!("Skipping {}: {}", name, e);
                    continue;
                }
            };

            let mime = content_type_for(&path).await;
            let metadata = probe_metadata(path).await;

            catalog.push(AssetSummary {
                id: name.clone(),
                url: public_url(&name),
                name,
                size: file_metadata.len(),
                mime,
                width: metadata.width,
                height: metadata.height,
                exif: metadata.exif,
            });
        }

        catalog.sort_by(|a, b| a.name.cmp(&b.name));
        catalog
    }
}

async fn probe_metadata(path: PathBuf) -> ImageMetadata {
    match tokio::task::spawn_blocking(move || extract_metadata(&path)).await {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Metadata task failed: {}", e);
            ImageMetadata::default()
        }
    }
}

/// Extension lookup first; sniffs the stored bytes when the extension is unknown.
///
/// Names from `scan_images` always carry a suffix `mime_guess` knows, so the sniff
/// only runs for paths that did not come through the scanner.
async fn content_type_for(path: &Path) -> String {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }

    let mut prefix = Vec::with_capacity(SNIFF_LEN);
    match tokio::fs::File::open(path).await {
        Ok(file) => {
            if let Err(e) = file.take(SNIFF_LEN as u64).read_to_end(&mut prefix).await {
                debug!("Could not read {:?} for sniffing: {}", path, e);
            }
        }
        Err(e) => debug!("Could not open {:?} for sniffing: {}", path, e),
    }

    sniff_content_type(&prefix).to_string()
}
