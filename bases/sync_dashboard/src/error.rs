//! Dashboard error types

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use completion_store::StoreError;
use sync_orchestrator::SyncError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("a sync is already running")]
    Busy,

    #[error("unknown playlist {0}")]
    UnknownPlaylist(String),

    #[error("failed to render page: {0}")]
    Template(#[from] askama::Error),

    #[error("failed to resolve playlists")]
    Sync(#[from] SyncError),

    #[error("failed to update the download state")]
    Store(#[from] StoreError),

    #[error("io error during {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl DashboardError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        DashboardError::Io {
            operation: operation.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            DashboardError::Busy => StatusCode::CONFLICT,
            DashboardError::UnknownPlaylist(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Full message including sources, for error pages and logs
fn describe(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = describe(&self);
        if status.is_server_error() {
            tracing::error!("{message}");
        }

        let body = format!(
            r#"<!DOCTYPE html>
            <html>
            <head><title>Error</title></head>
            <body>
                <h1>{}</h1>
                <p>{}</p>
                <a href="/">Back to dashboard</a>
            </body>
            </html>"#,
            status,
            escape(&message)
        );

        (status, Html(body)).into_response()
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
