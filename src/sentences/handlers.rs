use super::{
    core::{format_full_date, format_month_day, render_markdown},
    types::SentenceCatalog,
};
use crate::{
    AppState, Config,
    leaderboard::LeaderboardView,
    likes::{DynLikeService, LikesMap},
    static_files::StaticFileHandler,
    templating::INDEX_TEMPLATE,
    theme::Theme,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json},
};
use tracing::{error, warn};

pub const PAGE_TITLE: &str = "每天一句话";
pub const META_DESCRIPTION: &str = "记录每天的一句话，用时间线展示";

/// Like counts for the timeline. A failing service just means no counts.
pub async fn fetch_likes_or_empty(service: &DynLikeService) -> LikesMap {
    match service.fetch_all_likes().await {
        Ok(likes) => likes,
        Err(e) => {
            warn!("Failed to fetch like counts from {}: {}", service.name(), e);
            LikesMap::new()
        }
    }
}

pub struct TimelinePage<'a> {
    pub catalog: &'a SentenceCatalog,
    pub likes: &'a LikesMap,
    pub leaderboard: &'a LeaderboardView,
    pub interactive: bool,
    pub theme: Theme,
}

pub async fn timeline_globals(
    config: &Config,
    static_handler: &StaticFileHandler,
    page: TimelinePage<'_>,
) -> liquid::Object {
    let sentences: Vec<_> = page
        .catalog
        .sentences()
        .iter()
        .map(|sentence| {
            liquid::object!({
                "date": sentence.date,
                "date_label": format_full_date(&sentence.date),
                "month_day": format_month_day(&sentence.date),
                "content": sentence.content,
                "html_content": render_markdown(&sentence.content),
                "likes": page.likes.get(&sentence.date).copied().unwrap_or(0),
            })
        })
        .collect();

    let base_path = config.app.base_path.trim_end_matches('/');
    let css_url = static_handler.get_versioned_url("/static/site.css").await;
    let script_url = static_handler.get_versioned_url("/static/site.js").await;

    liquid::object!({
        "site_name": config.app.name,
        "page_title": PAGE_TITLE,
        "meta_description": META_DESCRIPTION,
        "base_url": config.app.base_url.clone().unwrap_or_default(),
        "base_path": base_path,
        "css_url": format!("{}{}", base_path, css_url),
        "script_url": format!("{}{}", base_path, script_url),
        "theme": page.theme.as_str(),
        "sentences": sentences,
        "sentence_count": page.catalog.len(),
        "leaderboard": page.leaderboard,
        "leaderboard_interactive": page.interactive,
    })
}

/// `GET /`: every entry newest first, with the leaderboard panel mounted alongside.
pub async fn timeline_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let theme = Theme::from_headers(&headers);
    let catalog = app_state.sentences.catalog().await;

    let (likes, panel) = tokio::join!(
        fetch_likes_or_empty(&app_state.likes),
        app_state.panels.mount()
    );
    let view = panel.view().await;

    let globals = timeline_globals(
        &app_state.config,
        &app_state.static_handler,
        TimelinePage {
            catalog: &catalog,
            likes: &likes,
            leaderboard: &view,
            interactive: true,
            theme,
        },
    )
    .await;

    match app_state
        .template_engine
        .render_template(INDEX_TEMPLATE, globals)
        .await
    {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template rendering error: {}", e);
            if let Err(e) = app_state.panels.unmount(panel.id()).await {
                warn!("Failed to unmount panel after render error: {}", e);
            }
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

pub async fn sentences_api_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let catalog = app_state.sentences.catalog().await;
    Json(catalog.sentences().to_vec())
}

pub async fn refresh_sentences_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    match app_state.sentences.refresh().await {
        Ok(count) => (StatusCode::OK, format!("Loaded {} sentences", count)).into_response(),
        Err(e) => {
            error!("Failed to refresh sentences: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to refresh sentences").into_response()
        }
    }
}
