use std::path::Path;
use tracing::{debug, warn};

/// Lists the image files directly inside `directory`, sorted by name.
///
/// An unreadable or missing directory is reported as empty rather than as an error.
pub async fn scan_images(directory: &Path) -> Vec<String> {
    let mut images = Vec::new();

    let mut entries = match tokio::fs::read_dir(directory).await {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read image directory {:?}: {}", directory, e);
            return images;
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Stopped scanning {:?}: {}", directory, e);
                break;
            }
        };

        let is_file = entry
            .file_type()
            .await
            .map(|file_type| file_type.is_file())
            .unwrap_or(false);
        if !is_file {
            continue;
        }

        // Non UTF-8 names cannot be served under /uploads anyway
        if let Ok(file_name) = entry.file_name().into_string()
            && super::is_image(&file_name)
        {
            images.push(file_name);
        }
    }

    images.sort();
    debug!("Found {} images in {:?}", images.len(), directory);
    images
}
