//! Teaching session records.
//!
//! A session keeps the dialogue as spoken plus the outline of the tree it
//! produced. The tree itself is never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::prompt::{Prompt, Response, ResponseCategory};

/// Record of one teaching conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeachingSession {
    /// Unique session identifier (`teach-<timestamp>`).
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
    /// Everything said, in order.
    pub transcript: Vec<TranscriptEntry>,
    /// Outline of the tree at the last update.
    #[serde(default)]
    pub outline: String,
    /// Whether teaching reached the end.
    #[serde(default)]
    pub completed: bool,
}

impl TeachingSession {
    /// Create a session with a fresh timestamp-derived id.
    pub fn new() -> Self {
        Self::with_id(generate_session_id())
    }

    /// Create a session with the given id.
    pub fn with_id(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            updated_at: now,
            transcript: Vec::new(),
            outline: String::new(),
            completed: false,
        }
    }

    /// Record something the robot said.
    pub fn record_prompt(&mut self, prompt: &Prompt) {
        self.push(TranscriptEntry::new(Speaker::Robot, &prompt.text, None));
    }

    /// Record a classified teacher reply.
    pub fn record_response(&mut self, response: &Response) {
        self.push(TranscriptEntry::new(
            Speaker::Teacher,
            &response.text,
            Some(response.category),
        ));
    }

    /// Store the final outline and completion flag.
    pub fn finish(&mut self, outline: impl Into<String>, completed: bool) {
        self.outline = outline.into();
        self.completed = completed;
        self.touch();
    }

    /// Number of robot utterances, notifications included.
    pub fn prompt_count(&self) -> usize {
        self.transcript
            .iter()
            .filter(|e| e.speaker == Speaker::Robot)
            .count()
    }

    /// Update the session's updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn push(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
        self.touch();
    }
}

impl Default for TeachingSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One utterance in a transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Who spoke.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
    /// Classifier verdict, for teacher replies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ResponseCategory>,
    /// When it was said.
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    /// Create an entry stamped now.
    pub fn new(
        speaker: Speaker,
        text: impl Into<String>,
        category: Option<ResponseCategory>,
    ) -> Self {
        Self {
            speaker,
            text: text.into(),
            category,
            timestamp: Utc::now(),
        }
    }
}

/// Party in the dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The learning agent.
    Robot,
    /// The human teacher.
    Teacher,
}

impl Speaker {
    /// Label used when printing transcripts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Robot => "robot",
            Speaker::Teacher => "teacher",
        }
    }
}

/// Generate a session id from the current time, to the millisecond.
pub fn generate_session_id() -> String {
    format!("teach-{}", Utc::now().format("%Y%m%d%H%M%S%3f"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_new() {
        let session = TeachingSession::with_id("teach-1");

        assert_eq!(session.id, "teach-1");
        assert!(session.transcript.is_empty());
        assert!(session.outline.is_empty());
        assert!(!session.completed);
        assert_eq!(session.created_at, session.updated_at);
    }

    #[test]
    fn test_generated_id_shape() {
        let id = generate_session_id();
        let digits = id.strip_prefix("teach-").unwrap();
        assert_eq!(digits.len(), 17);
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_record_dialogue() {
        let mut session = TeachingSession::with_id("teach-1");
        let old_updated = session.updated_at;

        std::thread::sleep(std::time::Duration::from_millis(10));
        session.record_prompt(&Prompt::question("How do I wave?"));
        session.record_response(&Response::instruction("lift your hand"));

        assert_eq!(session.transcript.len(), 2);
        assert_eq!(session.transcript[0].speaker, Speaker::Robot);
        assert!(session.transcript[0].category.is_none());
        assert_eq!(session.transcript[1].speaker, Speaker::Teacher);
        assert_eq!(
            session.transcript[1].category,
            Some(ResponseCategory::Instruction)
        );
        assert_eq!(session.prompt_count(), 1);
        assert!(session.updated_at > old_updated);
    }

    #[test]
    fn test_finish() {
        let mut session = TeachingSession::with_id("teach-1");
        session.finish("[x] root: Root\n", true);

        assert!(session.completed);
        assert_eq!(session.outline, "[x] root: Root\n");
    }

    #[test]
    fn test_serde_shape() {
        let mut session = TeachingSession::with_id("teach-1");
        session.record_prompt(&Prompt::notification("Okay"));
        session.record_response(&Response::done("that's it"));

        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"speaker\":\"robot\""));
        assert!(json.contains("\"category\":\"done\""));

        let back: TeachingSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
