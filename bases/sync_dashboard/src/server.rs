// bases/sync_dashboard/src/server.rs
use crate::config::Config;
use crate::error::DashboardError;
use crate::state::AppState;
use crate::view::{playlist_cards, ListQuery, Overview, PlaylistCard};
use askama::Template;
use async_stream::stream;
use axum::{
    extract::{Path, Query, State},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, Redirect,
    },
    routing::{get, post},
    Json, Router,
};
use completion_store::{CompletionRecord, StoreStats};
use futures::Stream;
use playlist_primitives::ChannelInfo;
use std::convert::Infallible;
use std::time::Duration;
use sync_orchestrator::SyncReport;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tracing::{info, warn};

const KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    channel: Option<ChannelInfo>,
    overview: Overview,
    percent_synced: String,
    tool_version: String,
    archive_files: usize,
    archive_entries: usize,
    refreshed_at: String,
    catalog_error: Option<String>,
    busy: bool,
    last_run: Option<String>,
    cards: Vec<PlaylistCard>,
    search: String,
    sort: &'static str,
    tab: &'static str,
    stats: StoreStats,
    settings_json: String,
}

pub fn router(state: AppState) -> Router {
    let library = ServeDir::new(&state.settings().root_path);

    Router::new()
        .route("/", get(index))
        .route("/sync", post(sync_all))
        .route("/playlists/:id/sync", post(sync_one))
        .route("/refresh", post(refresh))
        .route("/archives/clear", post(clear_archives))
        .route("/state/reset", post(reset_state))
        .route("/events", get(events))
        .route("/api/state", get(api_state))
        .nest_service("/library", library)
        .with_state(state)
}

/// Serve until the shutdown token fires, then let a running sync wind down
pub async fn run(state: AppState, config: &Config) -> color_eyre::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    info!("Dashboard listening on http://{}", config.addr());

    let shutdown = state.shutdown_token();
    axum::serve(listener, router(state.clone()))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    if state.is_busy() {
        info!("Waiting for the current playlist to finish...");
    }
    state.wait_for_sync().await;
    Ok(())
}

fn summarize(report: &SyncReport) -> String {
    let mut summary = format!(
        "{} newly completed, {} failed, {} already synced",
        report.newly_completed, report.failed, report.already_completed
    );
    if report.cancelled {
        summary.push_str(&format!(", {} not started", report.skipped()));
    }
    summary
}

async fn index(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, DashboardError> {
    let record = state.snapshot();
    let catalog = state.catalog().await;
    let archives = state.archive_stats().await?;
    let overview = Overview::new(&catalog.playlists, &record);

    let template = IndexTemplate {
        channel: record.channel_info.clone(),
        percent_synced: overview.percent_synced(),
        overview,
        tool_version: state.tool_version().to_string(),
        archive_files: archives.files,
        archive_entries: archives.entries,
        refreshed_at: catalog
            .refreshed_at
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string()),
        catalog_error: catalog.error.clone(),
        busy: state.is_busy(),
        last_run: state.last_report().await.as_ref().map(summarize),
        cards: playlist_cards(&catalog.playlists, &record, &query),
        search: query.search().to_string(),
        sort: query.sort().as_param(),
        tab: query.tab().as_param(),
        stats: record.stats(),
        settings_json: serde_json::to_string_pretty(state.settings())
            .unwrap_or_else(|e| format!("unavailable: {e}")),
    };

    Ok(Html(template.render()?))
}

async fn sync_all(State(state): State<AppState>) -> Result<Redirect, DashboardError> {
    state.start_sync_all().await?;
    Ok(Redirect::to("/"))
}

async fn sync_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, DashboardError> {
    state.start_sync_one(&id).await?;
    Ok(Redirect::to("/"))
}

async fn refresh(State(state): State<AppState>) -> Result<Redirect, DashboardError> {
    state.refresh().await?;
    Ok(Redirect::to("/"))
}

async fn clear_archives(State(state): State<AppState>) -> Result<Redirect, DashboardError> {
    state.clear_archives().await?;
    Ok(Redirect::to("/"))
}

async fn reset_state(State(state): State<AppState>) -> Result<Redirect, DashboardError> {
    state.reset_state().await?;
    Ok(Redirect::to("/"))
}

async fn api_state(State(state): State<AppState>) -> Json<CompletionRecord> {
    Json(state.snapshot())
}

/// Live sync progress as server-sent events
async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send> {
    let mut rx = state.subscribe();
    let shutdown = state.shutdown_token();

    let stream = stream! {
        loop {
            let received = tokio::select! {
                _ = shutdown.cancelled() => None,
                received = rx.recv() => Some(received),
            };
            match received {
                None | Some(Err(RecvError::Closed)) => break,
                Some(Err(RecvError::Lagged(missed))) => {
                    yield Ok(Event::default().event("lagged").data(missed.to_string()));
                }
                Some(Ok(progress)) => match Event::default().event("progress").json_data(&progress) {
                    Ok(event) => yield Ok(event),
                    Err(e) => warn!("Could not encode progress event: {e}"),
                },
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE).text("keep-alive"))
}
