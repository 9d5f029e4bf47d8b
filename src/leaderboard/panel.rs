use super::{
    error::LeaderboardError,
    pagination::{LayoutMeasurement, Pagination},
    rank::RankBadge,
    types::*,
};
use crate::{
    likes::{DynLikeService, TopLikesPage},
    sentences::{SentenceCatalog, SentenceStore, core::format_month_day},
};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct RankedRow {
    rank: usize,
    entry: RankedEntry,
}

#[derive(Debug)]
struct PanelState {
    pagination: Pagination,
    rows: Vec<RankedRow>,
    loading: bool,
}

/// One mounted leaderboard: its own pagination, rows and polling task.
///
/// Disposing the panel (or dropping the last handle) cancels its token; any
/// fetch still in flight is then discarded instead of written back.
pub struct LeaderboardPanel {
    id: Uuid,
    service: DynLikeService,
    sentences: Arc<SentenceStore>,
    missing_content: String,
    state: RwLock<PanelState>,
    last_seen: RwLock<Instant>,
    cancel: CancellationToken,
}

impl LeaderboardPanel {
    pub fn new(
        config: &LeaderboardConfig,
        service: DynLikeService,
        sentences: Arc<SentenceStore>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            service,
            sentences,
            missing_content: config.missing_content.clone(),
            state: RwLock::new(PanelState {
                pagination: Pagination::new(config.initial_items_per_page, config.limits()),
                rows: Vec::new(),
                loading: true,
            }),
            last_seen: RwLock::new(Instant::now()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn dispose(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Disposing leaderboard panel {}", self.id);
            self.cancel.cancel();
        }
    }

    pub async fn touch(&self) {
        *self.last_seen.write().await = Instant::now();
    }

    pub async fn idle_for(&self) -> Duration {
        self.last_seen.read().await.elapsed()
    }

    /// Fetches the ranked page for the current position and page size.
    ///
    /// On failure the previous rows and total stay in place. If the service
    /// reports a total that pushes the current page out of range, the page is
    /// clamped and the new page fetched.
    ///
    /// The fetch runs on its own task, so a caller that goes away mid-fetch
    /// (a dropped request handler) still leaves the panel settled.
    pub async fn refresh(self: &Arc<Self>) {
        let panel = Arc::clone(self);
        let task = tokio::spawn(async move { panel.load_current_page().await });

        if let Err(e) = task.await {
            warn!("Refresh task for panel {} failed: {}", self.id, e);
        }
    }

    async fn load_current_page(&self) {
        loop {
            let (page, per_page) = {
                let mut state = self.state.write().await;
                state.loading = true;
                (
                    state.pagination.current_page(),
                    state.pagination.items_per_page(),
                )
            };

            let result = self.service.fetch_top_likes(page, per_page).await;

            if self.is_disposed() {
                debug!("Panel {} disposed, discarding fetched page {}", self.id, page);
                return;
            }

            let catalog = self.sentences.catalog().await;
            let mut state = self.state.write().await;

            if state.pagination.current_page() != page
                || state.pagination.items_per_page() != per_page
            {
                debug!(
                    "Panel {} moved on while page {} was loading, discarding",
                    self.id, page
                );
                return;
            }

            match result {
                Ok(top) => {
                    let rows = self.join(&state.pagination, &top, &catalog);
                    state.rows = rows;
                    if state.pagination.set_total(top.total) {
                        debug!(
                            "Panel {} clamped to page {} of {}",
                            self.id,
                            state.pagination.current_page(),
                            state.pagination.total_pages()
                        );
                        continue;
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch likes for panel {}: {}", self.id, e);
                }
            }

            state.loading = false;
            return;
        }
    }

    fn join(
        &self,
        pagination: &Pagination,
        top: &TopLikesPage,
        catalog: &SentenceCatalog,
    ) -> Vec<RankedRow> {
        top.items
            .iter()
            .enumerate()
            .map(|(index, item)| RankedRow {
                rank: pagination.rank_of(index),
                entry: RankedEntry {
                    date: item.date.clone(),
                    content: catalog
                        .get(&item.date)
                        .map(|sentence| sentence.content.clone())
                        .unwrap_or_else(|| self.missing_content.clone()),
                    likes: item.likes,
                },
            })
            .collect()
    }

    /// Moves to `page` (clamped) and re-fetches if the page changed.
    pub async fn set_page(self: &Arc<Self>, page: usize) -> bool {
        let changed = self.state.write().await.pagination.set_current_page(page);
        if changed {
            self.refresh().await;
        }
        changed
    }

    /// Feeds an auto-fit measurement of the rendered panel.
    ///
    /// Ignored while loading or before any row has rendered, since there is
    /// no row to measure. Returns true when the page size changed, in which
    /// case the page is re-fetched at the new size.
    pub async fn apply_measurement(
        self: &Arc<Self>,
        measurement: &LayoutMeasurement,
    ) -> Result<bool, LeaderboardError> {
        if !measurement.is_valid() {
            return Err(LeaderboardError::InvalidMeasurement);
        }

        let committed = {
            let mut state = self.state.write().await;
            if state.loading || state.rows.is_empty() {
                debug!("Panel {} has nothing rendered yet, ignoring measurement", self.id);
                return Ok(false);
            }
            state.pagination.apply_measurement(measurement)
        };

        if committed {
            self.refresh().await;
        }
        Ok(committed)
    }

    pub async fn rows(&self) -> Vec<RankedEntry> {
        let state = self.state.read().await;
        state.rows.iter().map(|row| row.entry.clone()).collect()
    }

    pub async fn pagination(&self) -> Pagination {
        self.state.read().await.pagination.clone()
    }

    pub async fn view(&self) -> LeaderboardView {
        let state = self.state.read().await;
        let pagination = &state.pagination;

        let rows = state
            .rows
            .iter()
            .map(|row| {
                let badge = RankBadge::for_rank(row.rank);
                LeaderboardRow {
                    rank: row.rank,
                    badge,
                    marker: badge.marker(),
                    badge_class: badge.css_class(),
                    date: row.entry.date.clone(),
                    date_label: format_month_day(&row.entry.date),
                    content: row.entry.content.clone(),
                    likes: row.entry.likes,
                }
            })
            .collect();

        LeaderboardView {
            id: self.id,
            loading: state.loading,
            total: pagination.total(),
            current_page: pagination.current_page(),
            total_pages: pagination.total_pages(),
            items_per_page: pagination.items_per_page(),
            page_numbers: pagination.page_numbers(),
            has_prev: pagination.has_prev(),
            has_next: pagination.has_next(),
            rows,
        }
    }

    /// Re-fetches on `period` until the panel is disposed or dropped.
    pub fn spawn_polling(self: &Arc<Self>, period: Duration) {
        let token = self.cancel.clone();
        let panel = Arc::downgrade(self);
        let id = self.id;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        let Some(panel) = panel.upgrade() else { break };
                        debug!("Scheduled refresh for panel {}", id);
                        panel.refresh().await;
                    }
                }
            }

            debug!("Polling stopped for panel {}", id);
        });
    }
}

impl Drop for LeaderboardPanel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
