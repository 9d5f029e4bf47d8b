use thiserror::Error;

#[derive(Debug, Error)]
pub enum LikesError {
    #[error("Invalid like service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Like service request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Like service returned status {0}")]
    BadStatus(reqwest::StatusCode),
}
