use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("Leaderboard panel not found: {0}")]
    PanelNotFound(Uuid),

    #[error("Invalid layout measurement")]
    InvalidMeasurement,
}

impl IntoResponse for LeaderboardError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            LeaderboardError::PanelNotFound(_) => (StatusCode::NOT_FOUND, "Panel not found"),
            LeaderboardError::InvalidMeasurement => {
                (StatusCode::BAD_REQUEST, "Invalid layout measurement")
            }
        };

        (status, message).into_response()
    }
}
