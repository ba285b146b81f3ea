//! Question/answer protocol types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Something the learner says to the teacher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Text to speak or print.
    pub text: String,
    /// Whether the learner waits for exactly one [`Response`] before
    /// continuing. Notifications set this to false.
    pub needs_response: bool,
}

impl Prompt {
    /// A question that must be answered.
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            needs_response: true,
        }
    }

    /// A notification that needs no answer.
    pub fn notification(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            needs_response: false,
        }
    }
}

/// Semantic category of a teacher's utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseCategory {
    /// Describes what to do.
    Instruction,
    /// Nothing more to add at this point.
    Done,
    /// The utterance was misheard.
    Misrecognized,
    /// The teacher asked something back.
    Question,
    /// Neither an instruction nor a closing remark.
    Statement,
}

impl ResponseCategory {
    /// Lowercase name used in messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseCategory::Instruction => "instruction",
            ResponseCategory::Done => "done",
            ResponseCategory::Misrecognized => "misrecognized",
            ResponseCategory::Question => "question",
            ResponseCategory::Statement => "statement",
        }
    }
}

impl fmt::Display for ResponseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified answer to a [`Prompt`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Raw utterance text.
    pub text: String,
    /// Category assigned by the classifier.
    pub category: ResponseCategory,
}

impl Response {
    /// Create a response.
    pub fn new(text: impl Into<String>, category: ResponseCategory) -> Self {
        Self {
            text: text.into(),
            category,
        }
    }

    /// An instruction response.
    pub fn instruction(text: impl Into<String>) -> Self {
        Self::new(text, ResponseCategory::Instruction)
    }

    /// A done response.
    pub fn done(text: impl Into<String>) -> Self {
        Self::new(text, ResponseCategory::Done)
    }

    /// A misrecognized response.
    pub fn misrecognized(text: impl Into<String>) -> Self {
        Self::new(text, ResponseCategory::Misrecognized)
    }
}

/// What the learner does next after one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Emit this prompt. If it needs a response, pass exactly one to the
    /// next `step`; otherwise call `step(None)`.
    Prompt(Prompt),
    /// Teaching finished. No further prompts will follow.
    Done,
}

impl Turn {
    /// The prompt, if this turn emits one.
    pub fn prompt(&self) -> Option<&Prompt> {
        match self {
            Turn::Prompt(prompt) => Some(prompt),
            Turn::Done => None,
        }
    }

    /// Whether teaching has finished.
    pub fn is_done(&self) -> bool {
        matches!(self, Turn::Done)
    }
}
