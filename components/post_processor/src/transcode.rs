use crate::error::PostProcessError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Container the downloader may leave behind that players handle poorly
pub const SOURCE_EXTENSION: &str = "opus";
pub const TARGET_EXTENSION: &str = "mp3";
/// Conversions land here first and are renamed once complete
pub const PARTIAL_EXTENSION: &str = "part.mp3";

#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), PostProcessError>;
}

pub struct FfmpegTranscoder {
    program: String,
}

impl FfmpegTranscoder {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(&self, input: &Path, output: &Path) -> Result<(), PostProcessError> {
        let status = Command::new(&self.program)
            .arg("-n")
            .arg("-i")
            .arg(input)
            .args(["-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|source| PostProcessError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(PostProcessError::Transcode {
                program: self.program.clone(),
                input: input.to_path_buf(),
                code: status.code().unwrap_or(-1),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct TranscodeSummary {
    pub converted: usize,
    pub failed: usize,
}

/// Convert every `*.opus` in `dir` to `*.mp3`
///
/// A source file is deleted only after its conversion succeeded. Files whose
/// target already exists are left alone. The target only appears once the
/// transcoder has finished, so an interrupted conversion is retried.
pub async fn transcode_dir(transcoder: &dyn Transcoder, dir: &Path) -> TranscodeSummary {
    let mut summary = TranscodeSummary::default();
    let sources = match crate::files_with_extension(dir, SOURCE_EXTENSION).await {
        Ok(sources) => sources,
        Err(e) => {
            error!("Could not list {}: {e}", dir.display());
            return summary;
        }
    };
    if sources.is_empty() {
        debug!("No {SOURCE_EXTENSION} files to convert in {}", dir.display());
        return summary;
    }

    info!("Converting {} {SOURCE_EXTENSION} file(s)", sources.len());
    for source in sources {
        let target = source.with_extension(TARGET_EXTENSION);
        if target.exists() {
            info!("Skipping {}, {} already exists", source.display(), target.display());
            continue;
        }

        match convert(transcoder, &source, &target).await {
            Ok(()) => {
                info!("Converted and deleted: {}", source.display());
                summary.converted += 1;
            }
            Err(e) => {
                error!("Failed to convert {}: {e}", source.display());
                summary.failed += 1;
            }
        }
    }
    summary
}

async fn convert(
    transcoder: &dyn Transcoder,
    source: &Path,
    target: &Path,
) -> Result<(), PostProcessError> {
    let partial = source.with_extension(PARTIAL_EXTENSION);
    remove_if_present(&partial).await?;

    if let Err(e) = transcoder.transcode(source, &partial).await {
        if let Err(cleanup) = remove_if_present(&partial).await {
            warn!("Could not remove {}: {cleanup}", partial.display());
        }
        return Err(e);
    }
    tokio::fs::rename(&partial, target).await?;
    tokio::fs::remove_file(source).await?;
    Ok(())
}

async fn remove_if_present(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}
