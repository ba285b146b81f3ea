//! Core types and logic for sapling.
//!
//! This module contains the teaching state machine, the question/answer
//! protocol types, and the session records kept for each conversation.

pub mod learner;
pub mod prompt;
pub mod session;

pub use learner::{find_unlearned, next_target, TaskLearner};
pub use prompt::{Prompt, Response, ResponseCategory, Turn};
pub use session::{generate_session_id, Speaker, TeachingSession, TranscriptEntry};
