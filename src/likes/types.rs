use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeCount {
    pub date: String,
    pub likes: u64,
}

/// One server-ranked page. `items` keeps the service's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopLikesPage {
    pub items: Vec<LikeCount>,
    #[serde(default)]
    pub total: u64,
}

pub type LikesMap = HashMap<String, u64>;
