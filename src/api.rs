use crate::gallery::{IngestError, StoredAsset, Upload, UploadResponse};
use axum::{
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::{
        HeaderMap, StatusCode,
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE,
        },
    },
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Serialize;
use tokio_util::io::StreamReader;
use tracing::{debug, error};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const NO_CACHE: &str = "no-cache, no-store, must-revalidate";

/// Multipart field that carries the uploaded file.
pub const FILE_FIELD: &str = "file";

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    match serde_json::to_vec(body) {
        Ok(bytes) => (
            status,
            [(CONTENT_TYPE, JSON_CONTENT_TYPE), (CACHE_CONTROL, NO_CACHE)],
            bytes,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serialize API response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        json_response(
            self.status_code(),
            &UploadResponse::rejected(self.client_message()),
        )
    }
}

pub async fn list_images_handler(State(app_state): State<crate::AppState>) -> Response {
    let catalog = app_state.catalog.list_catalog().await;
    json_response(StatusCode::OK, &catalog)
}

pub async fn upload_handler(
    State(app_state): State<crate::AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let declared_size = headers
        .get(CONTENT_LENGTH)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let multipart = match multipart {
        Ok(multipart) => Some(multipart),
        Err(rejection) => {
            debug!("Upload is not a readable multipart body: {}", rejection);
            None
        }
    };

    match ingest_multipart(&app_state, declared_size, multipart).await {
        Ok(asset) => json_response(StatusCode::OK, &UploadResponse::accepted(&asset)),
        Err(e) => e.into_response(),
    }
}

async fn ingest_multipart(
    app_state: &crate::AppState,
    declared_size: Option<u64>,
    multipart: Option<Multipart>,
) -> Result<StoredAsset, IngestError> {
    let ingestion = &app_state.ingestion;

    if let Some(mut multipart) = multipart {
        loop {
            match multipart.next_field().await {
                // A part without a filename is a plain form value, not a file
                Ok(Some(field))
                    if field.name() == Some(FILE_FIELD) && field.file_name().is_some() =>
                {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let stream = field.map(|chunk| chunk.map_err(multipart_io_error));
                    let reader = StreamReader::new(Box::pin(stream));
                    return ingestion
                        .ingest(declared_size, Some(Upload::new(filename, reader)))
                        .await;
                }
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    return Err(IngestError::TooLarge);
                }
                Err(e) => {
                    debug!("Malformed multipart body: {}", e);
                    break;
                }
            }
        }
    }

    ingestion
        .ingest::<tokio::io::Empty>(declared_size, None)
        .await
}

fn multipart_io_error(e: MultipartError) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

pub async fn preflight_handler() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (CONTENT_TYPE, JSON_CONTENT_TYPE),
            (CACHE_CONTROL, NO_CACHE),
            (ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

pub async fn method_not_allowed_handler() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &UploadResponse::rejected("Unsupported method"),
    )
}
