// bases/sync_cli/src/output.rs
use completion_store::StoreStats;
use media_downloader::LineKind;
use std::path::Path;
use sync_orchestrator::{ItemStatus, SyncPlan, SyncProgress, SyncReport};
use sync_settings::Settings;

#[derive(Debug, Clone, Copy)]
pub struct OutputHandler {
    verbose: bool,
}

impl OutputHandler {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    pub fn print_banner(&self, settings: &Settings) {
        println!("Playlist sync");
        println!("Input: {}", settings.input_method);
        println!("Library: {}", settings.root_path.display());
        if self.verbose {
            println!("State file: {}", settings.state_path.display());
            println!("Downloader: {}", settings.downloader_program());
            println!(
                "Audio: {} (quality {})",
                settings.audio_format, settings.audio_quality
            );
        }
    }

    pub fn print_plan(&self, plan: &SyncPlan) {
        println!(
            "Total playlists: {}, already synced: {}, pending: {}",
            plan.total(),
            plan.completed.len(),
            plan.pending.len()
        );
        if plan.pending.is_empty() {
            println!("Everything is up to date");
        }
    }

    pub fn print_status(&self, plan: &SyncPlan, stats: &StoreStats) {
        self.print_plan(plan);
        for playlist in &plan.pending {
            println!("  pending  {} ({})", playlist.title, playlist.id);
        }
        if self.verbose {
            for playlist in &plan.completed {
                println!("  synced   {} ({})", playlist.title, playlist.id);
            }
            println!(
                "Cached playlist info: {}, channel cached: {}",
                stats.total_playlists, stats.channel_cached
            );
        }
    }

    /// Render one live event; returns false once the run is over
    pub fn print_progress(&self, event: &SyncProgress) -> bool {
        match event {
            SyncProgress::RunStarted { .. } => {}
            SyncProgress::ItemStarted {
                index, count, title, ..
            } => println!("[{index}/{count}] {title}"),
            SyncProgress::Output { kind, text, .. } => {
                let noteworthy = matches!(kind, LineKind::Fatal | LineKind::Unavailable);
                if self.verbose || noteworthy {
                    println!("    {text}");
                }
            }
            SyncProgress::ItemCompleted { post_process, .. } => {
                if post_process.has_failures() {
                    println!("  done, with post-processing problems (see log)");
                } else {
                    println!("  done");
                }
            }
            SyncProgress::ItemFailed { error, .. } => println!("  failed: {error}"),
            SyncProgress::Cancelled { remaining } => {
                println!("Stopping, {remaining} playlists left for the next run")
            }
            SyncProgress::RunFinished(_) => return false,
        }
        true
    }

    pub fn print_report(&self, report: &SyncReport) {
        println!();
        println!("Sync summary");
        println!("  Total playlists:  {}", report.total);
        println!("  Already synced:   {}", report.already_completed);
        println!("  Newly completed:  {}", report.newly_completed);
        println!("  Failed:           {}", report.failed);
        if report.cancelled {
            println!("  Not started:      {}", report.skipped());
        }
        if report.failed > 0 {
            println!("Failed playlists will be retried next run:");
            report
                .items
                .iter()
                .filter(|item| item.status == ItemStatus::Failed)
                .for_each(|item| println!("  {} ({})", item.title, item.id));
        }
        if report.persist_failures > 0 {
            eprintln!(
                "Warning: {} completions could not be saved and will be downloaded again",
                report.persist_failures
            );
        }
        if self.verbose {
            let elapsed = report.finished_at - report.started_at;
            println!("Finished in {}s", elapsed.num_seconds());
        }
    }

    pub fn print_archives_cleared(&self, count: usize, root: &Path) {
        println!("Removed {count} download archives under {}", root.display());
    }

    pub fn print_state_reset(&self, path: &Path) {
        println!("Download state reset: {}", path.display());
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        eprintln!("Error: {}", error);

        if self.verbose {
            eprintln!("\nError details:");
            error.chain().skip(1).for_each(|cause| {
                eprintln!("  caused by: {}", cause);
            });
        }
    }
}
