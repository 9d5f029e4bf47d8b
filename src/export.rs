use crate::{
    AppState,
    sentences::handlers::{TimelinePage, fetch_likes_or_empty, timeline_globals},
    templating::INDEX_TEMPLATE,
    theme::Theme,
};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Template error: {0}")]
    TemplateError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub index: PathBuf,
    pub sentences: usize,
    pub static_files: usize,
}

/// Writes the site as plain files under `out`: `index.html`, `starfield.svg`
/// and a copy of the static directory. The leaderboard is a one-off snapshot
/// with no live controls.
pub async fn export_site(app_state: &AppState, out: &Path) -> Result<ExportSummary, ExportError> {
    tokio::fs::create_dir_all(out).await?;
    app_state.static_handler.refresh_file_versions().await;

    let catalog = app_state.sentences.catalog().await;
    let (likes, leaderboard) = tokio::join!(
        fetch_likes_or_empty(&app_state.likes),
        app_state.panels.snapshot()
    );

    let globals = timeline_globals(
        &app_state.config,
        &app_state.static_handler,
        TimelinePage {
            catalog: &catalog,
            likes: &likes,
            leaderboard: &leaderboard,
            interactive: false,
            theme: Theme::System,
        },
    )
    .await;

    let html = app_state
        .template_engine
        .render_template(INDEX_TEMPLATE, globals)
        .await
        .map_err(ExportError::TemplateError)?;

    let index = out.join("index.html");
    tokio::fs::write(&index, html).await?;

    let static_files = if app_state.static_handler.static_dir.exists() {
        app_state.static_handler.copy_to(&out.join("static")).await?
    } else {
        0
    };

    let (width, height) = app_state.starfield.default_size();
    let svg = app_state.starfield.render(width, height).await;
    tokio::fs::write(out.join("starfield.svg"), svg.as_bytes()).await?;

    info!(
        "Exported {} sentences and {} static files to {:?}",
        catalog.len(),
        static_files,
        out
    );

    Ok(ExportSummary {
        index,
        sentences: catalog.len(),
        static_files,
    })
}
