pub mod config;
pub mod error;
pub mod providers;
pub mod types;

pub use config::*;
pub use error::*;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Read side of the external like-counting service.
#[async_trait]
pub trait LikeService: Send + Sync {
    async fn fetch_all_likes(&self) -> Result<LikesMap, LikesError>;

    /// `page` is 1-based. Ranking order is whatever the service returns.
    async fn fetch_top_likes(&self, page: usize, page_size: usize)
    -> Result<TopLikesPage, LikesError>;

    fn name(&self) -> &str;
}

pub type DynLikeService = Arc<dyn LikeService>;

pub fn create_service(config: &LikesConfig) -> Result<DynLikeService, LikesError> {
    match config {
        LikesConfig::Http(http_config) => Ok(Arc::new(providers::http::HttpLikeService::new(
            http_config,
        )?)),
        LikesConfig::Null => Ok(Arc::new(providers::null::NullLikeService::new())),
    }
}
