// components/media_downloader/src/ytdlp.rs
use crate::types::DownloadError;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::debug;

/// The external download tool
///
/// This is the only seam through which processes are started, so
/// everything above it can be exercised with a scripted fake.
#[async_trait]
pub trait Downloader: Send + Sync {
    fn program(&self) -> &str;

    async fn check_available(&self) -> Result<(), DownloadError>;

    /// Start a long-running invocation and stream its merged output
    async fn spawn(&self, args: &[String]) -> Result<Box<dyn OutputStream>, DownloadError>;

    /// Run a short query and return its stdout, failing on a nonzero exit
    async fn capture(&self, args: &[String]) -> Result<String, DownloadError>;
}

/// Merged stdout/stderr of a running invocation
#[async_trait]
pub trait OutputStream: Send {
    /// Next raw line, `None` once both streams are closed
    async fn next_line(&mut self) -> Option<String>;

    /// Wait for the process to exit, `-1` when killed by a signal
    async fn wait(self: Box<Self>) -> Result<i32, DownloadError>;

    /// Kill the process and reap it
    async fn kill(self: Box<Self>) -> Result<(), DownloadError>;
}

pub struct YtDlp {
    program: String,
}

impl YtDlp {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        command
    }
}

impl Default for YtDlp {
    fn default() -> Self {
        Self::new("yt-dlp")
    }
}

#[async_trait]
impl Downloader for YtDlp {
    fn program(&self) -> &str {
        &self.program
    }

    async fn check_available(&self) -> Result<(), DownloadError> {
        let looks_like_path = self.program.contains(['/', '\\']);
        let found = if looks_like_path {
            Path::new(&self.program).is_file()
        } else {
            which::which(&self.program).is_ok()
        };

        if found {
            Ok(())
        } else {
            Err(DownloadError::DependencyNotFound(self.program.clone()))
        }
    }

    async fn spawn(&self, args: &[String]) -> Result<Box<dyn OutputStream>, DownloadError> {
        debug!("Running {} {}", self.program, args.join(" "));

        let mut command = self.command(args);
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
        // Keep terminal signals for the orchestrator; it lets the current item finish
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|e| DownloadError::spawn(&self.program, e))?;

        let (tx, rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx));
        }

        Ok(Box::new(ChildOutput { child, lines: rx }))
    }

    async fn capture(&self, args: &[String]) -> Result<String, DownloadError> {
        debug!("Querying {} {}", self.program, args.join(" "));

        let output = self
            .command(args)
            .output()
            .await
            .map_err(|e| DownloadError::spawn(&self.program, e))?;

        if !output.status.success() {
            return Err(DownloadError::ToolFailed {
                program: self.program.clone(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

struct ChildOutput {
    child: Child,
    lines: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl OutputStream for ChildOutput {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    async fn wait(mut self: Box<Self>) -> Result<i32, DownloadError> {
        let status = self.child.wait().await?;
        Ok(status.code().unwrap_or(-1))
    }

    async fn kill(mut self: Box<Self>) -> Result<(), DownloadError> {
        self.child.kill().await?;
        Ok(())
    }
}

/// Forward a pipe line by line, decoding lossily
///
/// Carriage returns count as line breaks so in-place progress updates
/// arrive as separate lines.
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf);
                for part in text.split(['\r', '\n']).filter(|p| !p.is_empty()) {
                    if tx.send(part.to_string()).is_err() {
                        return;
                    }
                }
            }
            Err(e) => {
                debug!("Stopped reading tool output: {e}");
                break;
            }
        }
    }
}
