//! Show command for sapling.
//!
//! Prints a saved transcript and the outline of the tree it produced.

use serde::{Deserialize, Serialize};

use crate::core::TranscriptEntry;
use crate::storage::TranscriptStore;

/// Options for the show command.
#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// One transcript line for output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryInfo {
    /// When it was said.
    pub timestamp: String,
    /// Who said it.
    pub speaker: String,
    /// What was said.
    pub text: String,
    /// Classifier verdict for teacher lines.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&TranscriptEntry> for EntryInfo {
    fn from(entry: &TranscriptEntry) -> Self {
        Self {
            timestamp: entry.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            speaker: entry.speaker.as_str().to_string(),
            text: entry.text.clone(),
            category: entry.category.map(|c| c.to_string()),
        }
    }
}

/// Output format for the show command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// Session ID.
    pub session_id: String,
    /// Whether teaching reached the end.
    pub completed: bool,
    /// The dialogue.
    pub entries: Vec<EntryInfo>,
    /// Tree outline at the end of the session.
    pub outline: String,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ShowOutput {
    /// Create a failed output.
    pub fn failure(session_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            session_id: session_id.into(),
            completed: false,
            entries: Vec::new(),
            outline: String::new(),
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Show failed: {}\n",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        let status = if self.completed { "complete" } else { "partial" };
        let mut lines = vec![format!("Session {} ({status})", self.session_id)];
        lines.push(String::new());

        for entry in &self.entries {
            let category = entry
                .category
                .as_ref()
                .map(|c| format!("  [{c}]"))
                .unwrap_or_default();
            lines.push(format!(
                "[{}] {}: {}{}",
                entry.timestamp, entry.speaker, entry.text, category
            ));
        }

        if !self.outline.is_empty() {
            lines.push(String::new());
            lines.push(self.outline.trim_end().to_string());
        }

        lines.join("\n") + "\n"
    }

    /// Format based on output options.
    pub fn format_output(&self, options: &ShowOptions) -> String {
        if options.quiet {
            return String::new();
        }
        if options.json {
            serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_text()
        }
    }
}

/// The show command implementation.
pub struct ShowCommand<S: TranscriptStore> {
    store: S,
}

impl<S: TranscriptStore> ShowCommand<S> {
    /// Create a new show command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the show command.
    pub fn run(&self, session_id: &str) -> ShowOutput {
        let session = match self.store.get(session_id) {
            Ok(Some(session)) => session,
            Ok(None) => {
                return ShowOutput::failure(session_id, format!("Session not found: {session_id}"))
            }
            Err(e) => {
                return ShowOutput::failure(session_id, format!("Failed to load session: {e}"))
            }
        };

        ShowOutput {
            success: true,
            session_id: session.id.clone(),
            completed: session.completed,
            entries: session.transcript.iter().map(EntryInfo::from).collect(),
            outline: session.outline,
            error: None,
        }
    }
}
