//! Drives a sync run: resolve, diff against completion state, download
//!
//! Playlists are processed one at a time in resolution order. A playlist is
//! marked complete only after its download succeeded and post-processing
//! ran; a failed playlist leaves the state untouched and the run moves on.
//! Cancellation is honoured between playlists, never in the middle of one;
//! only the abort token kills a download in flight.

mod error;
mod plan;
mod progress;
mod report;
mod shutdown;

use chrono::Utc;
use completion_store::CompletionStore;
use media_downloader::DownloadRunner;
use playlist_primitives::PlaylistDescriptor;
use playlist_resolver::PlaylistResolver;
use post_processor::PostProcessor;
use std::sync::Arc;
use sync_settings::Settings;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub use error::SyncError;
pub use plan::SyncPlan;
pub use progress::{SyncProgress, PROGRESS_CAPACITY};
pub use report::{ItemReport, ItemStatus, SyncReport};
pub use shutdown::{install_signal_handler, FORCED_EXIT_CODE};

use progress::emit;

pub struct SyncOrchestrator {
    settings: Arc<Settings>,
    runner: DownloadRunner,
    resolver: PlaylistResolver,
    post_processor: PostProcessor,
    progress: broadcast::Sender<SyncProgress>,
    abort: CancellationToken,
}

impl SyncOrchestrator {
    /// Wire up the production components from `settings`
    ///
    /// Fails when the download tool cannot be found.
    pub async fn new(settings: Arc<Settings>) -> Result<Self, SyncError> {
        let runner = DownloadRunner::new(Arc::clone(&settings)).await?;
        let post_processor = PostProcessor::new(Arc::clone(&settings))?;
        Ok(Self::with_parts(settings, runner, post_processor))
    }

    /// Build around an existing runner; the resolver shares its tool
    pub fn with_parts(
        settings: Arc<Settings>,
        runner: DownloadRunner,
        post_processor: PostProcessor,
    ) -> Self {
        let resolver = PlaylistResolver::new(Arc::clone(&settings), runner.downloader());
        let (progress, _) = broadcast::channel(PROGRESS_CAPACITY);
        Self {
            settings,
            runner,
            resolver,
            post_processor,
            progress,
            abort: CancellationToken::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn runner(&self) -> &DownloadRunner {
        &self.runner
    }

    /// Cancelling this kills the download in flight and fails its playlist
    pub fn abort_token(&self) -> CancellationToken {
        self.abort.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    pub async fn resolve(
        &self,
        store: &mut CompletionStore,
    ) -> Result<Vec<PlaylistDescriptor>, SyncError> {
        Ok(self.resolver.resolve(store).await?)
    }

    pub async fn plan(&self, store: &mut CompletionStore) -> Result<SyncPlan, SyncError> {
        let playlists = self.resolve(store).await?;
        Ok(SyncPlan::new(playlists, store))
    }

    /// Resolve and sync everything that is not yet complete
    pub async fn run(
        &self,
        store: &mut CompletionStore,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let plan = self.plan(store).await?;
        Ok(self.execute(plan, store, cancel).await)
    }

    /// Sync one playlist even if it is already complete
    pub async fn sync_playlist(
        &self,
        descriptor: PlaylistDescriptor,
        store: &mut CompletionStore,
        cancel: &CancellationToken,
    ) -> SyncReport {
        self.execute(SyncPlan::forced(descriptor), store, cancel)
            .await
    }

    /// Process the pending part of `plan`
    pub async fn execute(
        &self,
        plan: SyncPlan,
        store: &mut CompletionStore,
        cancel: &CancellationToken,
    ) -> SyncReport {
        let mut report = SyncReport::begin(plan.total(), plan.completed.len(), &plan.pending);
        info!(
            "Total playlists: {}, already synced: {}, pending: {}",
            report.total,
            report.already_completed,
            plan.pending.len()
        );
        emit(
            &self.progress,
            SyncProgress::RunStarted {
                total: report.total,
                already_completed: report.already_completed,
                pending: plan.pending.len(),
            },
        );

        let count = plan.pending.len();
        for (index, descriptor) in plan.pending.iter().enumerate() {
            if cancel.is_cancelled() {
                self.cancelled(&mut report, count - index);
                break;
            }

            let completed = self
                .process_item(index, count, descriptor, store, &mut report)
                .await;

            let more = index + 1 < count;
            if completed && more && !self.pause(cancel).await {
                self.cancelled(&mut report, count - index - 1);
                break;
            }
        }

        report.finished_at = Utc::now();
        info!(
            "Sync finished: {} newly completed, {} failed, {} already synced",
            report.newly_completed, report.failed, report.already_completed
        );
        if report.persist_failures > 0 {
            error!(
                "{} completions could not be saved to {}; they will be downloaded again next run",
                report.persist_failures,
                store.path().display()
            );
        }
        emit(&self.progress, SyncProgress::RunFinished(report.clone()));
        report
    }

    /// Download, post-process and record one playlist; true when completed
    async fn process_item(
        &self,
        index: usize,
        count: usize,
        descriptor: &PlaylistDescriptor,
        store: &mut CompletionStore,
        report: &mut SyncReport,
    ) -> bool {
        let id = &descriptor.id;
        info!("[{}/{}] {}", index + 1, count, descriptor.title);
        report.items[index].status = ItemStatus::Running;
        emit(
            &self.progress,
            SyncProgress::ItemStarted {
                index: index + 1,
                count,
                id: id.clone(),
                title: descriptor.title.clone(),
            },
        );

        let tx = self.progress.clone();
        let line_id = id.clone();
        let result = self
            .runner
            .run_abortable(descriptor, &self.abort, move |line| {
                emit(
                    &tx,
                    SyncProgress::Output {
                        id: line_id.clone(),
                        kind: line.kind,
                        text: line.text.clone(),
                    },
                )
            })
            .await;

        let failure = match result {
            Ok(outcome) if outcome.is_success() => None,
            Ok(outcome) => Some(match outcome.error_lines.last() {
                Some(line) => format!("exit code {}: {line}", outcome.exit_code),
                None => format!("exit code {}", outcome.exit_code),
            }),
            Err(e) => Some(e.to_string()),
        };

        if let Some(reason) = failure {
            warn!("Failed: {} ({reason})", descriptor.title);
            let item = &mut report.items[index];
            item.status = ItemStatus::Failed;
            item.error = Some(reason.clone());
            report.failed += 1;
            emit(
                &self.progress,
                SyncProgress::ItemFailed {
                    id: id.clone(),
                    title: descriptor.title.clone(),
                    error: reason,
                },
            );
            return false;
        }

        let destination = self.runner.destination(descriptor);
        let post_process = self.post_processor.process(descriptor, &destination).await;

        if let Err(e) = store.mark_completed(id) {
            error!("Could not record completion of {}: {e}", descriptor.title);
            report.persist_failures += 1;
        }
        info!("Completed: {}", descriptor.title);

        let item = &mut report.items[index];
        item.status = ItemStatus::Completed;
        item.post_process = Some(post_process.clone());
        report.newly_completed += 1;
        emit(
            &self.progress,
            SyncProgress::ItemCompleted {
                id: id.clone(),
                title: descriptor.title.clone(),
                post_process,
            },
        );
        true
    }

    /// Wait between playlists; false when cancelled while waiting
    async fn pause(&self, cancel: &CancellationToken) -> bool {
        let pause = self.settings.pause();
        if pause.is_zero() {
            return true;
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = tokio::time::sleep(pause) => true,
        }
    }

    fn cancelled(&self, report: &mut SyncReport, remaining: usize) {
        warn!("Sync cancelled, {remaining} playlists left pending");
        report.cancelled = true;
        emit(&self.progress, SyncProgress::Cancelled { remaining });
    }
}
