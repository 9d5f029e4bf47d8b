use super::{error::LeaderboardError, pagination::LayoutMeasurement};
use crate::{AppState, templating::LEADERBOARD_TEMPLATE};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
};
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct PageRequest {
    pub page: usize,
}

pub async fn mount_panel_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let panel = app_state.panels.mount().await;
    (StatusCode::CREATED, Json(panel.view().await))
}

pub async fn panel_view_handler(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, LeaderboardError> {
    let panel = app_state.panels.get(id).await?;
    Ok(Json(panel.view().await))
}

pub async fn panel_fragment_handler(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, LeaderboardError> {
    let panel = app_state.panels.get(id).await?;
    let view = panel.view().await;

    let globals = liquid::object!({
        "leaderboard": view,
        "leaderboard_interactive": true,
    });

    Ok(
        match app_state
            .template_engine
            .render_fragment(LEADERBOARD_TEMPLATE, &globals)
            .await
        {
            Ok(html) => Html(html).into_response(),
            Err(e) => {
                error!("Template rendering error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        },
    )
}

pub async fn set_page_handler(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PageRequest>,
) -> Result<impl IntoResponse, LeaderboardError> {
    let panel = app_state.panels.get(id).await?;
    panel.set_page(request.page).await;
    Ok(Json(panel.view().await))
}

pub async fn layout_handler(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(measurement): Json<LayoutMeasurement>,
) -> Result<impl IntoResponse, LeaderboardError> {
    let panel = app_state.panels.get(id).await?;
    panel.apply_measurement(&measurement).await?;
    Ok(Json(panel.view().await))
}

pub async fn unmount_panel_handler(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, LeaderboardError> {
    app_state.panels.unmount(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
