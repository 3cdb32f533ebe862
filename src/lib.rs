use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod api;
pub mod gallery;
pub mod startup_checks;
pub mod static_files;
pub mod templating;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub storage: StorageConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub upload_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StaticConfig {
    pub directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            app: AppConfig {
                name: "Pixelshelf".to_string(),
                log_level: "info".to_string(),
            },
            storage: StorageConfig {
                upload_directory: PathBuf::from("uploads"),
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
        }
    }
}

use axum::{
    Router,
    extract::{DefaultBodyLimit, Path, State},
    response::IntoResponse,
};
use gallery::{BackgroundSelector, CatalogService, IngestionService};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Allowance on top of the upload cap for multipart framing and extra fields.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub uploads_handler: static_files::StaticFileHandler,
    pub static_handler: static_files::StaticFileHandler,
    pub ingestion: Arc<IngestionService>,
    pub catalog: Arc<CatalogService>,
    pub background: BackgroundSelector,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let upload_directory = config.storage.upload_directory.clone();

        Self {
            template_engine: Arc::new(templating::TemplateEngine::new(
                config.templates.directory.clone(),
            )),
            uploads_handler: static_files::StaticFileHandler::new(upload_directory.clone()),
            static_handler: static_files::StaticFileHandler::new(
                config.static_files.directory.clone(),
            ),
            ingestion: Arc::new(IngestionService::new(upload_directory.clone())),
            catalog: Arc::new(CatalogService::new(upload_directory)),
            background: BackgroundSelector::default(),
            config,
        }
    }

    /// Swaps the background selector, e.g. for a deterministic one in tests.
    pub fn with_background(mut self, background: BackgroundSelector) -> Self {
        self.background = background;
        self
    }
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.static_handler.serve(&path).await
}

async fn uploads_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
) -> impl IntoResponse {
    app_state.uploads_handler.serve(&path).await
}

pub async fn create_app(config: Config) -> Router {
    create_app_with_state(AppState::new(config))
}

pub fn create_app_with_state(app_state: AppState) -> Router {
    let body_limit = gallery::MAX_UPLOAD_BYTES as usize + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/", axum::routing::get(templating::index_handler))
        .route(
            "/api",
            axum::routing::get(api::list_images_handler)
                .post(api::upload_handler)
                .options(api::preflight_handler)
                .fallback(api::method_not_allowed_handler),
        )
        .route("/uploads/{*path}", axum::routing::get(uploads_file_handler))
        .route("/static/{*path}", axum::routing::get(static_file_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let method = request.method();
                    let uri = request.uri();
                    let headers = request.headers();
                    let user_agent = headers
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");
                    let referer = headers
                        .get("referer")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %method,
                        path = %uri.path(),
                        query = ?uri.query(),
                        user_agent = %user_agent,
                        referer = %referer,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = response.status();
                        let size = response
                            .headers()
                            .get("content-length")
                            .and_then(|h| h.to_str().ok())
                            .unwrap_or("-");

                        tracing::info!(
                            target: "access_log",
                            status = %status,
                            size = %size,
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}
