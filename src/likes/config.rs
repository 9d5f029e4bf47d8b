use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LikesConfig {
    Http(HttpLikesConfig),
    #[default]
    Null,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpLikesConfig {
    pub base_url: String,
    #[serde(default = "default_all_likes_path")]
    pub all_likes_path: String,
    #[serde(default = "default_top_likes_path")]
    pub top_likes_path: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_all_likes_path() -> String {
    "likes".to_string()
}

fn default_top_likes_path() -> String {
    "likes/top".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}
