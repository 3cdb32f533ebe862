// Gallery module - image ingestion and catalog
mod background;
mod catalog;
mod error;
mod ingest;
mod metadata;
mod naming;
mod scan;
mod sniff;
mod types;

// Re-export public items
pub use background::{BackgroundSelector, LcgShuffle, NoShuffle, Shuffle};
pub use catalog::CatalogService;
pub use error::IngestError;
pub use ingest::{IngestionService, Upload};
pub use metadata::extract_metadata;
pub use naming::{allocate_storage_name, with_image_extension};
pub use scan::scan_images;
pub use sniff::sniff_content_type;
pub use types::*;

/// Largest accepted upload, in bytes (50 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Number of leading bytes inspected when sniffing content.
pub const SNIFF_LEN: usize = 512;

/// Upper bound on the background pool handed to the index page.
pub const BACKGROUND_POOL_SIZE: usize = 6;

/// URL prefix under which stored images are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

pub(crate) const IMAGE_TYPE_PREFIX: &str = "image/";

pub fn is_image(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.ends_with(".jpg")
        || lower.ends_with(".jpeg")
        || lower.ends_with(".png")
        || lower.ends_with(".gif")
        || lower.ends_with(".webp")
}

pub fn public_url(storage_name: &str) -> String {
    format!("{}/{}", UPLOADS_URL_PREFIX, storage_name)
}
