use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
};
use chrono::Datelike;
use std::{collections::HashMap, path::PathBuf, sync::Arc, time::SystemTime};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

pub const INDEX_TEMPLATE: &str = "index.html.liquid";

/// Written to the template directory on first start and used whenever the file
/// cannot be loaded.
pub const DEFAULT_INDEX_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width,initial-scale=1" />
<title>{{ app_name }}</title>
<link rel="stylesheet" href="/static/styles.css" />
</head>
<body class="dark">
<div id="bg-wrap" aria-hidden="true">
  {% for bg in bg_pool %}<div class="bg-layer" id="bg-{{ forloop.index0 }}" data-bg-url="/uploads/{{ bg }}"></div>
  {% endfor %}
</div>

<header class="container">
  <h1>{{ app_name }}</h1>
  <label id="upload-label" class="card">
    <span>Upload</span>
    <input id="upload" type="file" accept="image/*" multiple class="sr-only" />
  </label>
</header>

<main class="container">
  <div id="grid" class="grid" data-count="{{ images | size }}"></div>
</main>

<footer class="container">&copy; {{ year }}</footer>

<script src="/static/main.js"></script>
</body>
</html>
"#;

pub struct TemplateEngine {
    template_dir: PathBuf,
    cache: Arc<RwLock<HashMap<String, CachedTemplate>>>,
}

struct CachedTemplate {
    content: String,
    modified: SystemTime,
}

impl TemplateEngine {
    pub fn new(template_dir: PathBuf) -> Self {
        Self {
            template_dir,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn load_template(&self, path: &str) -> Result<String, String> {
        let template_path = self.template_dir.join(path);

        let metadata = tokio::fs::metadata(&template_path)
            .await
            .map_err(|e| format!("Failed to get metadata for {}: {}", path, e))?;

        let modified = metadata
            .modified()
            .map_err(|e| format!("Failed to get modified time: {}", e))?;

        let mut cache = self.cache.write().await;

        if let Some(cached) = cache.get(path)
            && cached.modified >= modified
        {
            debug!("Using cached template for {}", path);
            return Ok(cached.content.clone());
        }

        info!("Loading template: {}", path);

        let content = tokio::fs::read_to_string(&template_path)
            .await
            .map_err(|e| format!("Failed to read template {}: {}", path, e))?;

        cache.insert(
            path.to_string(),
            CachedTemplate {
                content: content.clone(),
                modified,
            },
        );

        Ok(content)
    }

    /// Renders the index page, falling back to the built-in template.
    pub async fn render_index(&self, globals: liquid::Object) -> Result<String, String> {
        let template_content = match self.load_template(INDEX_TEMPLATE).await {
            Ok(content) => content,
            Err(e) => {
                warn!("{}; using built-in index template", e);
                DEFAULT_INDEX_TEMPLATE.to_string()
            }
        };
        render_source(&template_content, &globals)
    }
}

fn render_source(source: &str, globals: &liquid::Object) -> Result<String, String> {
    let parser = liquid::ParserBuilder::with_stdlib()
        .build()
        .map_err(|e| format!("Failed to create parser: {}", e))?;

    let template = parser
        .parse(source)
        .map_err(|e| format!("Failed to parse template: {}", e))?;

    template
        .render(globals)
        .map_err(|e| format!("Failed to render template: {}", e))
}

#[axum::debug_handler]
pub async fn index_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let images = app_state.catalog.image_names().await;
    let bg_pool = app_state.background.select(images.clone());

    let globals = liquid::object!({
        "app_name": app_state.config.app.name,
        "images": images,
        "bg_pool": bg_pool,
        "year": chrono::Utc::now().year(),
    });

    match app_state.template_engine.render_index(globals).await {
        Ok(html) => Ok(Html(html)),
        Err(e) => {
            error!("Template rendering error: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
