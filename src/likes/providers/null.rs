use crate::likes::{LikeService, LikesError, LikesMap, TopLikesPage};
use async_trait::async_trait;
use tracing::debug;

/// Offline provider: nobody has liked anything.
pub struct NullLikeService;

impl NullLikeService {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullLikeService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LikeService for NullLikeService {
    async fn fetch_all_likes(&self) -> Result<LikesMap, LikesError> {
        debug!("NULL LIKE SERVICE - returning empty like map");
        Ok(LikesMap::new())
    }

    async fn fetch_top_likes(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<TopLikesPage, LikesError> {
        debug!(
            "NULL LIKE SERVICE - returning empty ranking for page {} (size {})",
            page, page_size
        );
        Ok(TopLikesPage::default())
    }

    fn name(&self) -> &str {
        "Null Like Service (Offline)"
    }
}
