// bases/sync_cli/src/app.rs
use crate::args::{Args, Command};
use crate::output::OutputHandler;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use completion_store::CompletionStore;
use std::sync::Arc;
use sync_orchestrator::{install_signal_handler, SyncOrchestrator, FORCED_EXIT_CODE};
use sync_settings::Settings;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

pub struct App {
    args: Args,
    output: OutputHandler,
}

impl App {
    pub fn new(args: Args) -> Self {
        let output = OutputHandler::new(args.verbose);
        Self { args, output }
    }

    pub async fn run(&self) -> Result<()> {
        let settings = Settings::load(&self.args.config).wrap_err_with(|| {
            format!("Could not load settings from {}", self.args.config.display())
        })?;
        debug!("Loaded settings from {}", self.args.config.display());
        let settings = Arc::new(settings);

        match self.args.command() {
            Command::Sync => self.sync(settings).await,
            Command::Status => self.status(settings).await,
            Command::ClearArchives => self.clear_archives(&settings),
            Command::ResetState => self.reset_state(&settings),
        }
    }

    async fn sync(&self, settings: Arc<Settings>) -> Result<()> {
        self.output.print_banner(&settings);

        let orchestrator = SyncOrchestrator::new(Arc::clone(&settings)).await?;
        let abort = orchestrator.abort_token();
        let cancel = install_signal_handler(abort.clone());
        let mut store = CompletionStore::load(&settings.state_path);
        let plan = orchestrator.plan(&mut store).await?;
        self.output.print_plan(&plan);

        let mut events = orchestrator.subscribe();
        let output = self.output;
        let printer = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !output.print_progress(&event) {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        });

        let report = orchestrator.execute(plan, &mut store, &cancel).await;
        drop(orchestrator);
        printer.await?;

        self.output.print_report(&report);
        if abort.is_cancelled() {
            std::process::exit(FORCED_EXIT_CODE);
        }
        Ok(())
    }

    async fn status(&self, settings: Arc<Settings>) -> Result<()> {
        let orchestrator = SyncOrchestrator::new(Arc::clone(&settings)).await?;
        let mut store = CompletionStore::load(&settings.state_path);
        let plan = orchestrator.plan(&mut store).await?;
        self.output.print_status(&plan, &store.stats());
        Ok(())
    }

    fn clear_archives(&self, settings: &Settings) -> Result<()> {
        let removed = media_downloader::clear_archives(&settings.root_path).wrap_err_with(|| {
            format!("Could not clear archives under {}", settings.root_path.display())
        })?;
        self.output
            .print_archives_cleared(removed, &settings.root_path);
        Ok(())
    }

    fn reset_state(&self, settings: &Settings) -> Result<()> {
        let mut store = CompletionStore::load(&settings.state_path);
        store.reset()?;
        self.output.print_state_reset(store.path());
        Ok(())
    }

    pub fn print_error(&self, error: &color_eyre::Report) {
        self.output.print_error(error);
    }
}
