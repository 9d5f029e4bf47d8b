use super::{error::LeaderboardError, panel::LeaderboardPanel, types::*};
use crate::{likes::DynLikeService, sentences::SentenceStore};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub type SharedPanelRegistry = Arc<PanelRegistry>;

/// Live leaderboard panels, one per mounted view.
pub struct PanelRegistry {
    config: LeaderboardConfig,
    service: DynLikeService,
    sentences: Arc<SentenceStore>,
    poll_interval: Duration,
    panels: RwLock<HashMap<Uuid, Arc<LeaderboardPanel>>>,
}

impl PanelRegistry {
    pub fn new(
        config: LeaderboardConfig,
        service: DynLikeService,
        sentences: Arc<SentenceStore>,
    ) -> Self {
        let poll_interval = config.refresh_interval();
        Self {
            config,
            service,
            sentences,
            poll_interval,
            panels: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn get_config(&self) -> &LeaderboardConfig {
        &self.config
    }

    /// Creates a panel, loads its first page and starts its polling task.
    pub async fn mount(&self) -> Arc<LeaderboardPanel> {
        let panel = Arc::new(self.new_panel());
        panel.refresh().await;
        panel.spawn_polling(self.poll_interval);

        self.panels.write().await.insert(panel.id(), panel.clone());
        debug!("Mounted leaderboard panel {}", panel.id());

        panel
    }

    /// A one-off view of the first ranked page with no polling, for static output.
    pub async fn snapshot(&self) -> LeaderboardView {
        let panel = Arc::new(self.new_panel());
        panel.refresh().await;
        let view = panel.view().await;
        panel.dispose();
        view
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<LeaderboardPanel>, LeaderboardError> {
        let panel = self
            .panels
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(LeaderboardError::PanelNotFound(id))?;
        panel.touch().await;
        Ok(panel)
    }

    pub async fn unmount(&self, id: Uuid) -> Result<(), LeaderboardError> {
        let panel = self
            .panels
            .write()
            .await
            .remove(&id)
            .ok_or(LeaderboardError::PanelNotFound(id))?;
        panel.dispose();
        debug!("Unmounted leaderboard panel {}", id);
        Ok(())
    }

    /// Disposes panels that have not been used for `max_idle`. Returns how many.
    pub async fn reap_idle(&self, max_idle: Duration) -> usize {
        let candidates: Vec<Arc<LeaderboardPanel>> =
            self.panels.read().await.values().cloned().collect();

        let mut idle = Vec::new();
        for panel in candidates {
            if panel.idle_for().await >= max_idle {
                idle.push(panel.id());
            }
        }

        let mut panels = self.panels.write().await;
        for id in &idle {
            if let Some(panel) = panels.remove(id) {
                panel.dispose();
            }
        }

        idle.len()
    }

    pub async fn len(&self) -> usize {
        self.panels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.panels.read().await.is_empty()
    }

    pub async fn dispose_all(&self) {
        let mut panels = self.panels.write().await;
        for (_, panel) in panels.drain() {
            panel.dispose();
        }
    }

    pub fn start_idle_reaper(registry: SharedPanelRegistry, interval_minutes: u64) {
        let max_idle = registry.config.panel_idle_timeout();
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(interval_minutes * 60));
            interval.tick().await; // Skip the first immediate tick

            loop {
                interval.tick().await;
                let reaped = registry.reap_idle(max_idle).await;
                if reaped > 0 {
                    info!("Disposed {} idle leaderboard panels", reaped);
                }
            }
        });
    }

    fn new_panel(&self) -> LeaderboardPanel {
        LeaderboardPanel::new(&self.config, self.service.clone(), self.sentences.clone())
    }
}
