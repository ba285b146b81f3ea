//! Sessions command for sapling.
//!
//! Lists saved teaching sessions with their IDs, useful for finding the ID
//! to pass to `sapling show`.

use serde::{Deserialize, Serialize};

use crate::core::TeachingSession;
use crate::storage::TranscriptStore;

/// Options for the sessions command.
#[derive(Debug, Clone, Default)]
pub struct SessionsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of sessions to show.
    pub limit: usize,
}

/// Summary of a single session for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID.
    pub id: String,
    /// Whether teaching reached the end.
    pub completed: bool,
    /// Number of robot utterances.
    pub prompts: usize,
    /// Last updated timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<&TeachingSession> for SessionSummary {
    fn from(session: &TeachingSession) -> Self {
        Self {
            id: session.id.clone(),
            completed: session.completed,
            prompts: session.prompt_count(),
            updated_at: session.updated_at.to_rfc3339(),
        }
    }
}

/// Output format for the sessions command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsOutput {
    /// Whether the command was successful.
    pub success: bool,
    /// List of session summaries.
    pub sessions: Vec<SessionSummary>,
    /// Total count of sessions returned.
    pub count: usize,
    /// Error message if command failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionsOutput {
    /// Create a successful output.
    pub fn success(sessions: Vec<SessionSummary>) -> Self {
        let count = sessions.len();
        Self {
            success: true,
            sessions,
            count,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            sessions: vec![],
            count: 0,
            error: Some(error.into()),
        }
    }

    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        if !self.success {
            return format!(
                "Sessions failed: {}",
                self.error.as_deref().unwrap_or("unknown error")
            );
        }

        if self.sessions.is_empty() {
            return "No sessions found.".to_string();
        }

        let mut lines = vec![format!("Sessions ({} found):", self.count)];
        lines.push(String::new());
        lines.push(format!(
            "{:<26}  {:<10}  {:>7}  {}",
            "ID", "STATUS", "PROMPTS", "UPDATED"
        ));
        lines.push("-".repeat(70));

        for session in &self.sessions {
            let status = if session.completed { "complete" } else { "partial" };
            let updated: String = session.updated_at.chars().take(19).collect();
            lines.push(format!(
                "{:<26}  {:<10}  {:>7}  {}",
                session.id, status, session.prompts, updated
            ));
        }

        lines.join("\n")
    }

    /// Format based on output options.
    pub fn format_output(&self, options: &SessionsOptions) -> String {
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

/// The sessions command implementation.
pub struct SessionsCommand<S: TranscriptStore> {
    store: S,
}

impl<S: TranscriptStore> SessionsCommand<S> {
    /// Create a new sessions command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Run the sessions command.
    pub fn run(&self, options: &SessionsOptions) -> SessionsOutput {
        match self.store.list(options.limit) {
            Ok(sessions) => {
                SessionsOutput::success(sessions.iter().map(SessionSummary::from).collect())
            }
            Err(e) => SessionsOutput::failure(format!("Failed to list sessions: {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Prompt;
    use crate::storage::MemoryTranscriptStore;
    use std::sync::Arc;

    fn options(limit: usize) -> SessionsOptions {
        SessionsOptions {
            limit,
            ..Default::default()
        }
    }

    #[test]
    fn test_sessions_empty() {
        let cmd = SessionsCommand::new(Arc::new(MemoryTranscriptStore::new()));

        let output = cmd.run(&options(10));

        assert!(output.success);
        assert_eq!(output.count, 0);
        assert!(output.format_text().contains("No sessions found"));
    }

    #[test]
    fn test_sessions_respects_limit() {
        let store = Arc::new(MemoryTranscriptStore::new());
        for i in 0..5 {
            store
                .put(&TeachingSession::with_id(format!("teach-{i}")))
                .unwrap();
        }

        let output = SessionsCommand::new(store).run(&options(3));

        assert!(output.success);
        assert_eq!(output.count, 3);
    }

    #[test]
    fn test_summary_from_session() {
        let mut session = TeachingSession::with_id("teach-1");
        session.record_prompt(&Prompt::question("How do I wave?"));
        session.record_prompt(&Prompt::notification("Okay"));
        session.finish("", true);

        let summary = SessionSummary::from(&session);

        assert_eq!(summary.id, "teach-1");
        assert!(summary.completed);
        assert_eq!(summary.prompts, 2);
    }

    #[test]
    fn test_format_text_lists_status() {
        let output = SessionsOutput::success(vec![SessionSummary {
            id: "teach-20260101120000000".to_string(),
            completed: false,
            prompts: 4,
            updated_at: "2026-01-01T12:00:00+00:00".to_string(),
        }]);

        let text = output.format_text();
        assert!(text.contains("teach-20260101120000000"));
        assert!(text.contains("partial"));
        assert!(text.contains("2026-01-01T12:00:00"));
    }

    #[test]
    fn test_format_output_modes() {
        let output = SessionsOutput::failure("disk on fire");
        assert!(output.format_text().contains("disk on fire"));

        let quiet = SessionsOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(output.format_output(&quiet).is_empty());

        let json = SessionsOptions {
            json: true,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&output.format_output(&json)).unwrap();
        assert_eq!(value["success"], false);
    }
}
