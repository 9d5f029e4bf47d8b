#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use onesentence::{
    AppConfig, Config, ServerConfig, StaticConfig, TemplateConfig,
    leaderboard::LeaderboardConfig,
    likes::{HttpLikesConfig, LikesConfig},
    sentences::SentencesConfig,
    starfield::StarfieldConfig,
};
use serde::Deserialize;
use serde_json::json;
use std::{fs, path::Path, path::PathBuf, sync::Arc};
use tempfile::TempDir;

/// `(date, likes)` pairs, already in ranking order.
pub type Ranking = Arc<Vec<(String, u64)>>;

#[derive(Deserialize)]
struct TopQuery {
    page: usize,
    limit: usize,
}

pub fn ranking(count: usize) -> Vec<(String, u64)> {
    (0..count)
        .map(|i| (format!("2024-01-{:02}", i + 1), (count - i) as u64 * 3))
        .collect()
}

/// Runs a like service on an ephemeral port and returns its base URL.
pub async fn spawn_like_service(ranking: Vec<(String, u64)>) -> String {
    let app = Router::new()
        .route(
            "/api/likes",
            get(|State(ranking): State<Ranking>| async move {
                let counts: Vec<_> = ranking
                    .iter()
                    .map(|(date, likes)| json!({ "date": date, "likes": likes }))
                    .collect();
                Json(counts)
            }),
        )
        .route(
            "/api/likes/top",
            get(
                |State(ranking): State<Ranking>, Query(query): Query<TopQuery>| async move {
                    let items: Vec<_> = ranking
                        .iter()
                        .skip((query.page.max(1) - 1) * query.limit)
                        .take(query.limit)
                        .map(|(date, likes)| json!({ "date": date, "likes": likes }))
                        .collect();
                    Json(json!({ "items": items, "total": ranking.len() }))
                },
            ),
        )
        .with_state(Arc::new(ranking));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}/api/", addr)
}

/// A base URL nothing is listening on.
pub async fn unreachable_like_service() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api/", addr)
}

pub fn write_sentence(data_dir: &Path, date: &str, content: &str) {
    let dir = data_dir.join(date);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("README.md"), content).unwrap();
}

pub fn repo_dir(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(name)
}

/// Site config using the shipped templates and static files with a data
/// directory under `temp_dir`.
pub fn test_config(temp_dir: &TempDir, likes_base_url: Option<String>) -> Config {
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();

    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        app: AppConfig {
            name: "TestSite".to_string(),
            log_level: "error".to_string(),
            base_url: Some("http://localhost:3000".to_string()),
            base_path: String::new(),
        },
        templates: TemplateConfig {
            directory: repo_dir("templates"),
        },
        static_files: StaticConfig {
            directory: repo_dir("static"),
        },
        sentences: SentencesConfig {
            data_directory: data_dir,
            file_name: "README.md".to_string(),
            refresh_interval_minutes: None,
        },
        likes: match likes_base_url {
            Some(base_url) => LikesConfig::Http(HttpLikesConfig {
                base_url,
                all_likes_path: "likes".to_string(),
                top_likes_path: "likes/top".to_string(),
                timeout_seconds: 2,
            }),
            None => LikesConfig::Null,
        },
        leaderboard: LeaderboardConfig::default(),
        starfield: StarfieldConfig {
            loop_seconds: 1,
            seed: Some(7),
            ..StarfieldConfig::default()
        },
    }
}
