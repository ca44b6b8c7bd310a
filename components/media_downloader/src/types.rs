// components/media_downloader/src/types.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("Required executable not found: {0}")]
    DependencyNotFound(String),

    #[error("Failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code}: {stderr}")]
    ToolFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Download aborted")]
    Aborted,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DownloadError {
    pub fn spawn(program: impl Into<String>, source: std::io::Error) -> Self {
        DownloadError::Spawn {
            program: program.into(),
            source,
        }
    }
}
