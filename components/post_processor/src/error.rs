use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PostProcessError {
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("failed to start {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {code} while converting {input}")]
    Transcode {
        program: String,
        input: PathBuf,
        code: i32,
    },

    #[error("{path} contains no caption cues")]
    NoCues { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
