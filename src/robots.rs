use crate::AppState;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::error;

/// Crawlers may read the timeline; the JSON and panel endpoints are per-visit.
pub fn default_robots_txt(base_path: &str) -> String {
    format!(
        "User-agent: *\nAllow: {base}/\nDisallow: {base}/api/\nDisallow: {base}/starfield.svg\n",
        base = base_path
    )
}

/// `GET /robots.txt`. A `robots.txt` in the static directory wins over the default.
pub async fn robots_txt_handler(State(app_state): State<AppState>) -> Response {
    let custom_robots_path = app_state.config.static_files.directory.join("robots.txt");

    let body = match tokio::fs::read_to_string(&custom_robots_path).await {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                error!("Failed to read custom robots.txt: {}", e);
            }
            default_robots_txt(&app_state.config.app.base_path)
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}
