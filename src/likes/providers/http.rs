use crate::likes::{HttpLikesConfig, LikeCount, LikeService, LikesError, LikesMap, TopLikesPage};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpLikeService {
    client: reqwest::Client,
    all_likes_url: Url,
    top_likes_url: Url,
}

impl HttpLikeService {
    pub fn new(config: &HttpLikesConfig) -> Result<Self, LikesError> {
        let mut base = Url::parse(&config.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let all_likes_url = base.join(config.all_likes_path.trim_start_matches('/'))?;
        let top_likes_url = base.join(config.top_likes_path.trim_start_matches('/'))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            all_likes_url,
            top_likes_url,
        })
    }

    pub fn all_likes_url(&self) -> &Url {
        &self.all_likes_url
    }

    pub fn top_likes_url(&self) -> &Url {
        &self.top_likes_url
    }

    async fn get(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LikesError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LikesError::BadStatus(status));
        }
        Ok(response)
    }
}

#[async_trait]
impl LikeService for HttpLikeService {
    async fn fetch_all_likes(&self) -> Result<LikesMap, LikesError> {
        debug!("Fetching all likes from {}", self.all_likes_url);

        let counts: Vec<LikeCount> = self
            .get(self.client.get(self.all_likes_url.clone()))
            .await?
            .json()
            .await?;

        Ok(counts
            .into_iter()
            .map(|count| (count.date, count.likes))
            .collect())
    }

    async fn fetch_top_likes(
        &self,
        page: usize,
        page_size: usize,
    ) -> Result<TopLikesPage, LikesError> {
        debug!(
            "Fetching top likes page {} (size {}) from {}",
            page, page_size, self.top_likes_url
        );

        let request = self
            .client
            .get(self.top_likes_url.clone())
            .query(&[("page", page), ("limit", page_size)]);

        Ok(self.get(request).await?.json().await?)
    }

    fn name(&self) -> &str {
        "HTTP Like Service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, extract::Query, http::StatusCode, routing::get};
    use serde::Deserialize;

    fn config(base_url: &str) -> HttpLikesConfig {
        HttpLikesConfig {
            base_url: base_url.to_string(),
            all_likes_path: "likes".to_string(),
            top_likes_path: "likes/top".to_string(),
            timeout_seconds: 5,
        }
    }

    #[derive(Deserialize)]
    struct TopQuery {
        page: usize,
        limit: usize,
    }

    async fn spawn_fake_service(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/api", addr)
    }

    #[test]
    fn test_urls_join_under_base_path() {
        let service = HttpLikeService::new(&config("https://likes.example.com/v1")).unwrap();
        assert_eq!(
            service.all_likes_url().as_str(),
            "https://likes.example.com/v1/likes"
        );
        assert_eq!(
            service.top_likes_url().as_str(),
            "https://likes.example.com/v1/likes/top"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpLikeService::new(&config("not a url")),
            Err(LikesError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_all_and_top_likes() {
        let router = Router::new()
            .route(
                "/api/likes",
                get(|| async {
                    Json(serde_json::json!([
                        {"date": "2024-01-01", "likes": 3},
                        {"date": "2024-01-02", "likes": 7}
                    ]))
                }),
            )
            .route(
                "/api/likes/top",
                get(|Query(query): Query<TopQuery>| async move {
                    Json(serde_json::json!({
                        "items": [{"date": format!("page-{}", query.page), "likes": query.limit}],
                        "total": 23
                    }))
                }),
            );
        let base_url = spawn_fake_service(router).await;
        let service = HttpLikeService::new(&config(&base_url)).unwrap();

        let likes = service.fetch_all_likes().await.unwrap();
        assert_eq!(likes.get("2024-01-02"), Some(&7));
        assert_eq!(likes.len(), 2);

        let page = service.fetch_top_likes(2, 6).await.unwrap();
        assert_eq!(page.total, 23);
        assert_eq!(
            page.items,
            vec![LikeCount {
                date: "page-2".to_string(),
                likes: 6
            }]
        );
    }

    #[tokio::test]
    async fn test_missing_total_defaults_to_zero() {
        let router = Router::new().route(
            "/api/likes/top",
            get(|| async { Json(serde_json::json!({"items": []})) }),
        );
        let base_url = spawn_fake_service(router).await;
        let service = HttpLikeService::new(&config(&base_url)).unwrap();

        let page = service.fetch_top_likes(1, 10).await.unwrap();
        assert_eq!(page, TopLikesPage::default());
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new().route(
            "/api/likes/top",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
        );
        let base_url = spawn_fake_service(router).await;
        let service = HttpLikeService::new(&config(&base_url)).unwrap();

        match service.fetch_top_likes(1, 10).await {
            Err(LikesError::BadStatus(status)) => {
                assert_eq!(status, reqwest::StatusCode::SERVICE_UNAVAILABLE)
            }
            other => panic!("expected bad status, got {:?}", other),
        }
    }
}
