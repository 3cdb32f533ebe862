use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("upload exceeds the {} byte limit", super::MAX_UPLOAD_BYTES)]
    TooLarge,

    #[error("no file field in upload")]
    MissingFile,

    #[error("upload content is not an image")]
    InvalidFileType,

    #[error("IO error: {0}")]
    Storage(#[from] std::io::Error),
}

impl IngestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            IngestError::TooLarge | IngestError::MissingFile | IngestError::InvalidFileType => {
                StatusCode::BAD_REQUEST
            }
            IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reason text safe to hand back to the uploader. Storage causes stay in the logs.
    pub fn client_message(&self) -> &'static str {
        match self {
            IngestError::TooLarge => "File too large (maximum 50 MiB)",
            IngestError::MissingFile => "Missing file",
            IngestError::InvalidFileType => "Invalid file type",
            IngestError::Storage(_) => "Could not save file",
        }
    }
}
