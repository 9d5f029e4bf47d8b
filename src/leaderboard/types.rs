use super::{pagination::PaginationLimits, rank::RankBadge};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// A like count joined with the entry it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub date: String,
    pub content: String,
    pub likes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub badge: RankBadge,
    pub marker: Option<&'static str>,
    pub badge_class: &'static str,
    pub date: String,
    pub date_label: String,
    pub content: String,
    pub likes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardView {
    pub id: Uuid,
    pub loading: bool,
    pub total: u64,
    pub current_page: usize,
    pub total_pages: usize,
    pub items_per_page: usize,
    pub page_numbers: Vec<usize>,
    pub has_prev: bool,
    pub has_next: bool,
    pub rows: Vec<LeaderboardRow>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub refresh_interval_minutes: u64,
    pub initial_items_per_page: usize,
    pub min_items_per_page: usize,
    pub max_items_per_page: usize,
    pub relayout_threshold: usize,
    pub max_page_buttons: usize,
    pub missing_content: String,
    pub panel_idle_minutes: u64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        let limits = PaginationLimits::default();
        Self {
            refresh_interval_minutes: 10,
            initial_items_per_page: 10,
            min_items_per_page: limits.min_items_per_page,
            max_items_per_page: limits.max_items_per_page,
            relayout_threshold: limits.relayout_threshold,
            max_page_buttons: limits.max_page_buttons,
            missing_content: "（内容缺失）".to_string(),
            panel_idle_minutes: 30,
        }
    }
}

impl LeaderboardConfig {
    pub fn limits(&self) -> PaginationLimits {
        let min_items_per_page = self.min_items_per_page.max(1);
        PaginationLimits {
            min_items_per_page,
            max_items_per_page: self.max_items_per_page.max(min_items_per_page),
            relayout_threshold: self.relayout_threshold,
            max_page_buttons: self.max_page_buttons.max(1),
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_minutes.max(1) * 60)
    }

    pub fn panel_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.panel_idle_minutes.max(1) * 60)
    }
}
