// bases/sync_dashboard/src/state.rs
//! Shared dashboard state
//!
//! A sync holds the completion store for its whole duration, so page
//! renders read the state file from disk instead. Operations that touch
//! the store or the library (sync, refresh, clearing archives, resetting
//! state) are mutually exclusive; a second one is refused as busy.

use crate::error::DashboardError;
use chrono::{DateTime, Local};
use completion_store::{CompletionRecord, CompletionStore};
use media_downloader::ArchiveStats;
use playlist_primitives::PlaylistDescriptor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use sync_orchestrator::{SyncOrchestrator, SyncPlan, SyncProgress, SyncReport};
use sync_settings::Settings;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Most recently resolved playlists
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub playlists: Vec<PlaylistDescriptor>,
    pub refreshed_at: Option<DateTime<Local>>,
    /// Why the last refresh failed, if it did
    pub error: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    settings: Arc<Settings>,
    orchestrator: SyncOrchestrator,
    store: Mutex<CompletionStore>,
    catalog: RwLock<Catalog>,
    last_report: RwLock<Option<SyncReport>>,
    busy: AtomicBool,
    shutdown: CancellationToken,
    tool_version: String,
}

/// Exclusive claim on store and library; released on drop
pub struct BusyGuard(Arc<Shared>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.busy.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    pub async fn new(
        orchestrator: SyncOrchestrator,
        store: CompletionStore,
        shutdown: CancellationToken,
    ) -> Self {
        let tool_version = match orchestrator.runner().tool_version().await {
            Ok(version) if !version.is_empty() => version,
            Ok(_) => "unknown".to_string(),
            Err(e) => {
                warn!("Could not read downloader version: {e}");
                "unknown".to_string()
            }
        };
        let settings = Arc::new(orchestrator.settings().clone());

        Self {
            inner: Arc::new(Shared {
                settings,
                orchestrator,
                store: Mutex::new(store),
                catalog: RwLock::new(Catalog::default()),
                last_report: RwLock::new(None),
                busy: AtomicBool::new(false),
                shutdown,
                tool_version,
            }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn tool_version(&self) -> &str {
        &self.inner.tool_version
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.inner.orchestrator.subscribe()
    }

    pub async fn catalog(&self) -> Catalog {
        self.inner.catalog.read().await.clone()
    }

    pub async fn last_report(&self) -> Option<SyncReport> {
        self.inner.last_report.read().await.clone()
    }

    pub fn try_claim(&self) -> Result<BusyGuard, DashboardError> {
        self.inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| BusyGuard(Arc::clone(&self.inner)))
            .map_err(|_| DashboardError::Busy)
    }

    /// Read-only view of the state file; never blocks on a running sync
    pub fn snapshot(&self) -> CompletionRecord {
        match CompletionRecord::read(&self.inner.settings.state_path) {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                warn!("Could not read download state: {e}");
                CompletionRecord::default()
            }
        }
    }

    pub async fn archive_stats(&self) -> Result<ArchiveStats, DashboardError> {
        let root = self.inner.settings.root_path.clone();
        Ok(tokio::task::spawn_blocking(move || media_downloader::archive_stats(&root)).await?)
    }

    /// Re-resolve the playlist set
    pub async fn refresh(&self) -> Result<usize, DashboardError> {
        let _guard = self.try_claim()?;
        self.resolve().await
    }

    async fn resolve(&self) -> Result<usize, DashboardError> {
        let result = {
            let mut store = self.inner.store.lock().await;
            self.inner.orchestrator.resolve(&mut store).await
        };

        let mut catalog = self.inner.catalog.write().await;
        catalog.refreshed_at = Some(Local::now());
        match result {
            Ok(playlists) => {
                info!("Loaded {} playlists", playlists.len());
                catalog.playlists = playlists;
                catalog.error = None;
                Ok(catalog.playlists.len())
            }
            Err(e) => {
                catalog.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Start syncing every pending playlist in the background
    pub async fn start_sync_all(&self) -> Result<(), DashboardError> {
        let guard = self.try_claim()?;
        let playlists = self.inner.catalog.read().await.playlists.clone();
        let state = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let shared = &state.inner;
            let mut store = shared.store.lock().await;
            let plan = if playlists.is_empty() {
                match shared.orchestrator.plan(&mut store).await {
                    Ok(plan) => plan,
                    Err(e) => {
                        error!("Could not resolve playlists: {e}");
                        return;
                    }
                }
            } else {
                SyncPlan::new(playlists, &store)
            };
            let report = shared
                .orchestrator
                .execute(plan, &mut store, &shared.shutdown)
                .await;
            *shared.last_report.write().await = Some(report);
        });
        Ok(())
    }

    /// Start syncing one known playlist, completed or not
    pub async fn start_sync_one(&self, id: &str) -> Result<(), DashboardError> {
        let descriptor = self
            .inner
            .catalog
            .read()
            .await
            .playlists
            .iter()
            .find(|p| p.id.as_str() == id)
            .cloned()
            .ok_or_else(|| DashboardError::UnknownPlaylist(id.to_string()))?;
        let guard = self.try_claim()?;
        let state = self.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let shared = &state.inner;
            let mut store = shared.store.lock().await;
            let report = shared
                .orchestrator
                .sync_playlist(descriptor, &mut store, &shared.shutdown)
                .await;
            *shared.last_report.write().await = Some(report);
        });
        Ok(())
    }

    pub async fn clear_archives(&self) -> Result<usize, DashboardError> {
        let _guard = self.try_claim()?;
        let root = self.inner.settings.root_path.clone();
        let removed = tokio::task::spawn_blocking(move || media_downloader::clear_archives(&root))
            .await?
            .map_err(|e| DashboardError::io("clearing download archives", e))?;
        info!("Cleared {removed} download archives");
        Ok(removed)
    }

    pub async fn reset_state(&self) -> Result<(), DashboardError> {
        let _guard = self.try_claim()?;
        self.inner.store.lock().await.reset()?;
        info!("Download state reset");
        Ok(())
    }

    /// Resolves once a background sync has let go of the store
    pub async fn wait_for_sync(&self) {
        let _store = self.inner.store.lock().await;
    }
}
