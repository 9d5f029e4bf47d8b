use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod export;
pub mod leaderboard;
pub mod likes;
pub mod robots;
pub mod sentences;
pub mod starfield;
pub mod startup_checks;
pub mod static_files;
pub mod templating;
pub mod theme;


#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub templates: TemplateConfig,
    pub static_files: StaticConfig,
    #[serde(default)]
    pub sentences: sentences::SentencesConfig,
    #[serde(default)]
    pub likes: likes::LikesConfig,
    #[serde(default)]
    pub leaderboard: leaderboard::LeaderboardConfig,
    #[serde(default)]
    pub starfield: starfield::StarfieldConfig,
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
    #[serde(default)]
    pub base_url: Option<String>,
    /// Path prefix the site is served under, e.g. `/daily`. Empty means the root.
    #[serde(default)]
    pub base_path: String,
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
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "每天一句话".to_string(),
                log_level: "info".to_string(),
                base_url: None,
                base_path: String::new(),
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            static_files: StaticConfig {
                directory: PathBuf::from("static"),
            },
            sentences: sentences::SentencesConfig::default(),
            likes: likes::LikesConfig::default(),
            leaderboard: leaderboard::LeaderboardConfig::default(),
            starfield: starfield::StarfieldConfig::default(),
        }
    }
}

/// `"daily/"` and `"/daily"` both become `"/daily"`; `"/"` becomes empty.
pub fn normalize_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

use axum::{
    Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub static_handler: static_files::StaticFileHandler,
    pub sentences: Arc<sentences::SentenceStore>,
    pub likes: likes::DynLikeService,
    pub panels: leaderboard::SharedPanelRegistry,
    pub starfield: starfield::StarfieldRenderer,
    pub config: Config,
}

impl AppState {
    /// Builds the shared state around an already constructed like service and
    /// loads the sentence catalog once.
    pub async fn with_like_service(mut config: Config, likes: likes::DynLikeService) -> Self {
        config.app.base_path = normalize_base_path(&config.app.base_path);

        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
        ));

        let static_handler =
            static_files::StaticFileHandler::new(config.static_files.directory.clone());

        let sentences = Arc::new(sentences::SentenceStore::new(config.sentences.clone()));
        match sentences.refresh().await {
            Ok(count) => info!("Loaded {} sentences", count),
            Err(e) => warn!("Failed to load sentences: {}", e),
        }

        let panels = Arc::new(leaderboard::PanelRegistry::new(
            config.leaderboard.clone(),
            likes.clone(),
            sentences.clone(),
        ));

        let starfield = starfield::StarfieldRenderer::new(config.starfield.clone());

        Self {
            template_engine,
            static_handler,
            sentences,
            likes,
            panels,
            starfield,
            config,
        }
    }

    pub async fn from_config(config: Config) -> Result<Self, likes::LikesError> {
        let service = likes::create_service(&config.likes)?;
        info!("Using like service: {}", service.name());
        Ok(Self::with_like_service(config, service).await)
    }
}

#[derive(Deserialize)]
struct StaticQuery {
    v: Option<String>,
}

async fn static_file_handler(
    State(app_state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<StaticQuery>,
) -> impl IntoResponse {
    app_state
        .static_handler
        .serve(&path, query.v.is_some())
        .await
}

pub async fn create_app(config: Config) -> Result<Router, likes::LikesError> {
    let app_state = AppState::from_config(config).await?;
    Ok(create_router(app_state))
}

pub fn create_router(app_state: AppState) -> Router {
    let base_path = app_state.config.app.base_path.clone();

    let routes = Router::new()
        .route("/", get(sentences::handlers::timeline_handler))
        .route("/api/sentences", get(sentences::handlers::sentences_api_handler))
        .route(
            "/api/sentences/refresh",
            post(sentences::handlers::refresh_sentences_handler),
        )
        .route(
            "/api/leaderboard/panels",
            post(leaderboard::handlers::mount_panel_handler),
        )
        .route(
            "/api/leaderboard/panels/{id}",
            get(leaderboard::handlers::panel_view_handler)
                .delete(leaderboard::handlers::unmount_panel_handler),
        )
        .route(
            "/api/leaderboard/panels/{id}/fragment",
            get(leaderboard::handlers::panel_fragment_handler),
        )
        .route(
            "/api/leaderboard/panels/{id}/page",
            put(leaderboard::handlers::set_page_handler),
        )
        .route(
            "/api/leaderboard/panels/{id}/layout",
            put(leaderboard::handlers::layout_handler),
        )
        .route("/starfield.svg", get(starfield::starfield_svg_handler))
        .route("/robots.txt", get(robots::robots_txt_handler))
        .route("/static/{*path}", get(static_file_handler))
        .with_state(app_state);

    let app = if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    };

    app.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<axum::extract::MatchedPath>()
                    .map(|matched_path| matched_path.as_str());

                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    matched_path,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                let header = |name: &str| {
                    request
                        .headers()
                        .get(name)
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-")
                        .to_string()
                };

                tracing::info!(
                    target: "access_log",
                    method = %request.method(),
                    path = %request.uri().path(),
                    query = ?request.uri().query(),
                    user_agent = %header("user-agent"),
                    referer = %header("referer"),
                    "request"
                );
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    let size = response
                        .headers()
                        .get("content-length")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        status = %response.status(),
                        size = %size,
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            ),
    )
}
