pub mod sim;
pub mod svg;

pub use sim::{Meteor, Star, Starfield, TrailPoint, TrailSegment};

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{debug, error};

const SIZE_BUCKET: u32 = 64;
const MAX_WIDTH: u32 = 3840;
const MAX_HEIGHT: u32 = 2160;
const MAX_CACHED: usize = 16;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StarfieldConfig {
    pub loop_seconds: u64,
    pub frames_per_second: u64,
    pub sample_every: usize,
    pub seed: Option<u64>,
    pub default_width: u32,
    pub default_height: u32,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            loop_seconds: 12,
            frames_per_second: 60,
            sample_every: 6,
            seed: None,
            default_width: 1920,
            default_height: 1080,
        }
    }
}

/// Compiles star fields to SVG and keeps the most recent sizes around.
#[derive(Clone)]
pub struct StarfieldRenderer {
    config: StarfieldConfig,
    seed: u64,
    cache: Arc<RwLock<HashMap<(u32, u32), Arc<String>>>>,
}

impl StarfieldRenderer {
    pub fn new(config: StarfieldConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        Self {
            config,
            seed,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Rounds a viewport up to the bucket grid so nearby sizes share a render.
    pub fn bucket(width: u32, height: u32) -> (u32, u32) {
        let round = |value: u32, max: u32| {
            value
                .clamp(1, max)
                .div_ceil(SIZE_BUCKET)
                .saturating_mul(SIZE_BUCKET)
                .min(max)
        };
        (round(width, MAX_WIDTH), round(height, MAX_HEIGHT))
    }

    pub fn default_size(&self) -> (u32, u32) {
        (self.config.default_width, self.config.default_height)
    }

    /// Renders with the configured seed, so there is at most one SVG per size bucket.
    pub async fn render(&self, width: u32, height: u32) -> Arc<String> {
        let (width, height) = Self::bucket(width, height);
        let key = (width, height);

        if let Some(svg) = self.cache.read().await.get(&key) {
            debug!("Using cached starfield for {}x{}", width, height);
            return svg.clone();
        }

        let config = self.config.clone();
        let seed = self.seed;
        let svg = match tokio::task::spawn_blocking(move || {
            svg::render_svg(width, height, seed, &config)
        })
        .await
        {
            Ok(svg) => Arc::new(svg),
            Err(e) => {
                error!("Starfield render task failed: {}", e);
                return Arc::new(String::new());
            }
        };

        let mut cache = self.cache.write().await;
        if cache.len() >= MAX_CACHED {
            cache.clear();
        }
        cache.insert(key, svg.clone());

        svg
    }
}

#[derive(Deserialize)]
pub struct StarfieldQuery {
    width: Option<u32>,
    height: Option<u32>,
}

pub async fn starfield_svg_handler(
    State(app_state): State<AppState>,
    Query(query): Query<StarfieldQuery>,
) -> Response {
    let (default_width, default_height) = app_state.starfield.default_size();
    let svg = app_state
        .starfield
        .render(
            query.width.unwrap_or(default_width),
            query.height.unwrap_or(default_height),
        )
        .await;

    if svg.is_empty() {
        return (StatusCode::INTERNAL_SERVER_ERROR, "Starfield unavailable").into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "image/svg+xml"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        svg.as_str().to_owned(),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_rounds_up_and_clamps() {
        assert_eq!(StarfieldRenderer::bucket(1920, 1080), (1920, 1088));
        assert_eq!(StarfieldRenderer::bucket(1, 1), (64, 64));
        assert_eq!(StarfieldRenderer::bucket(0, 0), (64, 64));
        assert_eq!(StarfieldRenderer::bucket(10_000, 10_000), (3840, 2160));
    }

    #[tokio::test]
    async fn test_render_is_cached_per_bucket() {
        let renderer = StarfieldRenderer::new(StarfieldConfig {
            loop_seconds: 2,
            seed: Some(4),
            ..StarfieldConfig::default()
        });

        let a = renderer.render(300, 200).await;
        let b = renderer.render(310, 190).await;
        assert!(Arc::ptr_eq(&a, &b));

        let c = renderer.render(400, 200).await;
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(renderer.cache.read().await.len(), 2);
    }
}
