//! File-based transcript storage.
//!
//! Sessions are stored as JSON files in `~/.sapling/transcripts/`, written
//! via temp file + rename.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::transcripts_dir;
use crate::core::TeachingSession;
use crate::error::{Result, SaplingError};
use crate::storage::traits::most_recent;
use crate::storage::TranscriptStore;

/// File-based transcript storage.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    /// Directory where transcript files are stored.
    dir: PathBuf,
}

impl FileTranscriptStore {
    /// Create a store in the default directory.
    ///
    /// Uses `~/.sapling/transcripts/` or `$SAPLING_HOME/transcripts/`.
    pub fn new() -> Result<Self> {
        let dir = transcripts_dir().ok_or_else(|| {
            SaplingError::config("Could not determine transcripts directory (no home directory)")
        })?;
        Self::with_dir(dir)
    }

    /// Create a store in a custom directory, creating it if needed.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| SaplingError::storage(&dir, e))?;
        }
        Ok(Self { dir })
    }

    /// Directory holding the transcript files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of a session file. Ids that could escape the directory or hide
    /// as dotfiles are rejected.
    fn session_path(&self, id: &str) -> Option<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        valid.then(|| self.dir.join(format!("{id}.json")))
    }

    fn temp_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!(".{id}.json.tmp"))
    }

    fn atomic_write(&self, session: &TeachingSession) -> Result<()> {
        let final_path = self
            .session_path(&session.id)
            .ok_or_else(|| SaplingError::invalid_session_id(&session.id))?;
        let temp_path = self.temp_path(&session.id);

        let json = serde_json::to_string_pretty(session)?;

        {
            let mut file =
                fs::File::create(&temp_path).map_err(|e| SaplingError::storage(&temp_path, e))?;
            file.write_all(json.as_bytes())
                .map_err(|e| SaplingError::storage(&temp_path, e))?;
            file.sync_all()
                .map_err(|e| SaplingError::storage(&temp_path, e))?;
        }

        fs::rename(&temp_path, &final_path).map_err(|e| SaplingError::storage(&final_path, e))?;
        tracing::debug!(path = %final_path.display(), "transcript saved");
        Ok(())
    }
}

impl TranscriptStore for FileTranscriptStore {
    fn get(&self, id: &str) -> Result<Option<TeachingSession>> {
        let Some(path) = self.session_path(id) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).map_err(|e| SaplingError::storage(&path, e))?;
        let session: TeachingSession = serde_json::from_str(&content)?;
        Ok(Some(session))
    }

    fn put(&self, session: &TeachingSession) -> Result<()> {
        self.atomic_write(session)
    }

    fn list(&self, limit: usize) -> Result<Vec<TeachingSession>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.dir).map_err(|e| SaplingError::storage(&self.dir, e))?;
        let mut sessions = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| SaplingError::storage(&self.dir, e))?;
            let path = entry.path();

            if path.extension().map(|e| e != "json").unwrap_or(true) {
                continue;
            }
            if path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(true)
            {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<TeachingSession>(&content).ok());
            match parsed {
                Some(session) => sessions.push(session),
                None => tracing::warn!(path = %path.display(), "skipping unreadable transcript"),
            }
        }

        Ok(most_recent(sessions, limit))
    }

    fn delete(&self, id: &str) -> Result<()> {
        let Some(path) = self.session_path(id) else {
            return Ok(());
        };
        if path.exists() {
            fs::remove_file(&path).map_err(|e| SaplingError::storage(&path, e))?;
        }

        let temp_path = self.temp_path(id);
        if temp_path.exists() {
            let _ = fs::remove_file(&temp_path);
        }
        Ok(())
    }
}
