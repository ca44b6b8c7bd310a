// components/media_downloader/src/testing.rs
//! Scripted stand-in for the external tool
//!
//! Responses are keyed by the URL argument, which is the last non-extra
//! argument of every invocation this crate builds. Unscripted downloads
//! succeed with no output; unscripted queries fail.
use crate::types::DownloadError;
use crate::ytdlp::{Downloader, OutputStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Clone)]
struct ScriptedRun {
    lines: Vec<String>,
    exit_code: i32,
}

#[derive(Debug, Default)]
pub struct ScriptedDownloader {
    available: bool,
    downloads: HashMap<String, ScriptedRun>,
    captures: HashMap<String, Result<String, String>>,
    download_calls: Mutex<Vec<Vec<String>>>,
    capture_calls: Mutex<Vec<Vec<String>>>,
    killed: Arc<Mutex<usize>>,
}

impl ScriptedDownloader {
    pub fn new() -> Self {
        Self {
            available: true,
            ..Default::default()
        }
    }

    /// A tool that fails its availability check
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_download<I, S>(mut self, url: &str, lines: I, exit_code: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downloads.insert(
            url.to_string(),
            ScriptedRun {
                lines: lines.into_iter().map(Into::into).collect(),
                exit_code,
            },
        );
        self
    }

    pub fn with_capture(mut self, url: &str, stdout: impl Into<String>) -> Self {
        self.captures.insert(url.to_string(), Ok(stdout.into()));
        self
    }

    pub fn with_failing_capture(mut self, url: &str, stderr: impl Into<String>) -> Self {
        self.captures.insert(url.to_string(), Err(stderr.into()));
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Argument lists of every download started, in order
    pub fn download_calls(&self) -> Vec<Vec<String>> {
        self.download_calls.lock().clone()
    }

    /// URLs of every download started, in order
    pub fn downloaded_urls(&self) -> Vec<String> {
        self.download_calls()
            .iter()
            .filter_map(|args| find_url(args, self.downloads.keys()).or_else(|| output_url(args)))
            .collect()
    }

    pub fn capture_calls(&self) -> Vec<Vec<String>> {
        self.capture_calls.lock().clone()
    }

    /// Number of downloads killed before they finished
    pub fn killed(&self) -> usize {
        *self.killed.lock()
    }
}

fn find_url<'a>(
    args: &[String],
    mut known: impl Iterator<Item = &'a String>,
) -> Option<String> {
    known.find(|url| args.contains(url)).cloned()
}

/// The argument right after the output template
fn output_url(args: &[String]) -> Option<String> {
    let output = args.iter().position(|a| a == "--output")?;
    args.get(output + 2).cloned()
}

#[async_trait]
impl Downloader for ScriptedDownloader {
    fn program(&self) -> &str {
        "scripted-yt-dlp"
    }

    async fn check_available(&self) -> Result<(), DownloadError> {
        if self.available {
            Ok(())
        } else {
            Err(DownloadError::DependencyNotFound(self.program().to_string()))
        }
    }

    async fn spawn(&self, args: &[String]) -> Result<Box<dyn OutputStream>, DownloadError> {
        self.download_calls.lock().push(args.to_vec());

        let run = find_url(args, self.downloads.keys())
            .and_then(|url| self.downloads.get(&url).cloned())
            .unwrap_or(ScriptedRun {
                lines: Vec::new(),
                exit_code: 0,
            });

        Ok(Box::new(ScriptedOutput {
            lines: run.lines.into(),
            exit_code: run.exit_code,
            killed: Arc::clone(&self.killed),
        }))
    }

    async fn capture(&self, args: &[String]) -> Result<String, DownloadError> {
        self.capture_calls.lock().push(args.to_vec());

        let scripted = args
            .last()
            .and_then(|url| self.captures.get(url))
            .cloned()
            .unwrap_or_else(|| Err("no scripted response".to_string()));

        scripted.map_err(|stderr| DownloadError::ToolFailed {
            program: self.program().to_string(),
            code: 1,
            stderr,
        })
    }
}

struct ScriptedOutput {
    lines: VecDeque<String>,
    exit_code: i32,
    killed: Arc<Mutex<usize>>,
}

#[async_trait]
impl OutputStream for ScriptedOutput {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }

    async fn wait(self: Box<Self>) -> Result<i32, DownloadError> {
        Ok(self.exit_code)
    }

    async fn kill(self: Box<Self>) -> Result<(), DownloadError> {
        *self.killed.lock() += 1;
        Ok(())
    }
}
