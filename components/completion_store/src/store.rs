use crate::error::StoreError;
use crate::record::{CompletionRecord, StoreStats};
use playlist_primitives::{ChannelInfo, PlaylistDescriptor, PlaylistId};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Completion state bound to its backing file
#[derive(Debug)]
pub struct CompletionStore {
    path: PathBuf,
    record: CompletionRecord,
}

impl CompletionStore {
    /// Load the state at `path`, initialising it when needed
    ///
    /// Never fails: a missing or blank file becomes an empty record that is
    /// written out immediately, an unparsable file is copied aside to
    /// `<path>.corrupt` and replaced, and an unreadable file yields an empty
    /// in-memory record.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        match CompletionRecord::read(&path) {
            Ok(Some(record)) => {
                debug!(
                    "Loaded state from {} ({} completed)",
                    path.display(),
                    record.completed_playlists.len()
                );
                Self { path, record }
            }
            Ok(None) => {
                let store = Self::empty(path);
                store.persist_or_log();
                info!("Created new state file: {}", store.path.display());
                store
            }
            Err(e @ StoreError::Parse { .. }) => {
                warn!("{e}, starting from an empty state");
                let store = Self::empty(path);
                store.set_aside_corrupt();
                store.persist_or_log();
                store
            }
            Err(e) => {
                error!("{e}, continuing with an empty in-memory state");
                Self::empty(path)
            }
        }
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            record: CompletionRecord::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self) -> &CompletionRecord {
        &self.record
    }

    pub fn is_completed(&self, id: &PlaylistId) -> bool {
        self.record.is_completed(id)
    }

    /// Record `id` as fully synced and flush
    ///
    /// Returns `Ok(false)` without touching the file if `id` was already
    /// completed. On a write error the id stays completed in memory.
    pub fn mark_completed(&mut self, id: &PlaylistId) -> Result<bool, StoreError> {
        if !self.record.completed_playlists.insert(id.clone()) {
            return Ok(false);
        }
        self.persist()?;
        debug!(
            "State saved, {} playlists completed",
            self.record.completed_playlists.len()
        );
        Ok(true)
    }

    pub fn cache_descriptor(
        &mut self,
        id: &PlaylistId,
        descriptor: PlaylistDescriptor,
    ) -> Result<(), StoreError> {
        self.record.playlist_info.insert(id.clone(), descriptor);
        self.persist()
    }

    pub fn cached_descriptor(&self, id: &PlaylistId) -> Option<&PlaylistDescriptor> {
        self.record.playlist_info.get(id)
    }

    pub fn cache_channel_info(&mut self, info: ChannelInfo) -> Result<(), StoreError> {
        self.record.channel_info = Some(info);
        self.persist()
    }

    pub fn channel_info(&self) -> Option<&ChannelInfo> {
        self.record.channel_info.as_ref()
    }

    pub fn stats(&self) -> StoreStats {
        self.record.stats()
    }

    /// Forget everything: completion, cached metadata and channel info
    ///
    /// Downloaded files and archive ledgers are left alone.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.record = CompletionRecord::default();
        self.persist()?;
        info!("State reset: {}", self.path.display());
        Ok(())
    }

    /// Atomically replace the state file with the in-memory record
    fn persist(&self) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(&self.record).map_err(StoreError::Serialize)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::write(&self.path, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".state-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|e| StoreError::write(&self.path, e))?;
        tmp.write_all(&json)
            .and_then(|_| tmp.as_file().sync_all())
            .map_err(|e| StoreError::write(&self.path, e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::write(&self.path, e.error))?;

        Ok(())
    }

    fn persist_or_log(&self) {
        if let Err(e) = self.persist() {
            error!("{e}: completion progress will not survive this process");
        }
    }

    fn set_aside_corrupt(&self) {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".corrupt");
        match std::fs::copy(&self.path, &backup) {
            Ok(_) => warn!("Kept unreadable state as {}", Path::new(&backup).display()),
            Err(e) => warn!("Could not keep a copy of the unreadable state: {e}"),
        }
    }
}
