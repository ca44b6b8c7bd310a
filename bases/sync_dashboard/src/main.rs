// bases/sync_dashboard/src/main.rs
use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use completion_store::CompletionStore;
use std::sync::Arc;
use sync_orchestrator::{install_signal_handler, SyncOrchestrator};
use sync_settings::Settings;

mod config;
mod error;
mod server;
mod state;
mod view;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = config::CliArgs::parse();
    let config = config::Config::from_args(args);

    let settings = Settings::load(&config.settings_path).wrap_err_with(|| {
        format!(
            "Could not load settings from {}",
            config.settings_path.display()
        )
    })?;
    let settings = Arc::new(settings);
    tracing::info!(
        "Library at {}, input: {}",
        settings.root_path.display(),
        settings.input_method
    );

    let orchestrator = SyncOrchestrator::new(Arc::clone(&settings)).await?;
    let shutdown = install_signal_handler(orchestrator.abort_token());
    let store = CompletionStore::load(&settings.state_path);
    let state = state::AppState::new(orchestrator, store, shutdown).await;

    if let Err(e) = state.refresh().await {
        tracing::warn!("Initial playlist resolution failed: {e}");
    }

    server::run(state, &config).await?;

    Ok(())
}
