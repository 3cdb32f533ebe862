use serde::{Deserialize, Serialize};

/// A file accepted by the ingestion service.
#[derive(Debug, Clone, Serialize)]
pub struct StoredAsset {
    pub name: String,
    pub url: String,
    pub size: u64,
    pub content_type: String,
}

/// One entry of the catalog listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssetSummary {
    pub id: String,
    pub name: String,
    pub url: String,
    pub size: u64,
    pub mime: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifFields>,
}

/// Derived per request, never stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetadata {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub exif: Option<ExifFields>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExifFields {
    #[serde(rename = "DateTime", default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(rename = "CameraModel", default, skip_serializing_if = "Option::is_none")]
    pub camera_model: Option<String>,
    #[serde(rename = "CameraMake", default, skip_serializing_if = "Option::is_none")]
    pub camera_make: Option<String>,
    #[serde(rename = "Latitude", default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<String>,
    #[serde(rename = "Longitude", default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<String>,
}

impl ExifFields {
    pub fn is_empty(&self) -> bool {
        self.date_time.is_none()
            && self.camera_model.is_none()
            && self.camera_make.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResponse {
    pub fn accepted(asset: &StoredAsset) -> Self {
        Self {
            success: true,
            id: Some(asset.name.clone()),
            url: Some(asset.url.clone()),
            size: Some(asset.size),
            error: None,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self {
            success: false,
            id: None,
            url: None,
            size: None,
            error: Some(reason.to_string()),
        }
    }
}
