//! Sapling - teach a robot a task by talking to it
//!
//! Sapling builds a behavior tree from a conversation with a human teacher.
//! The learner asks about the leftmost part of the tree it does not know
//! yet, turns each classified reply into a tree edit, and stops once the
//! teacher says the whole task is covered.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod ports;
pub mod storage;
pub mod tree;

pub use config::Config;
pub use core::{Prompt, Response, ResponseCategory, TaskLearner, TeachingSession, Turn};
pub use error::{ParseFailure, Result, SaplingError};
pub use ports::{InstructionParser, KeywordClassifier, KeywordParser, ResponseClassifier};
pub use storage::{FileTranscriptStore, MemoryTranscriptStore, TranscriptStore};
pub use tree::{BehaviorTree, Fragment, NodeId, NodeKind, Position};

// CLI commands
pub use cli::{SessionsCommand, ShowCommand, TeachCommand};
