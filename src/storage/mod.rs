//! Transcript storage for sapling.
//!
//! This module persists teaching sessions, supporting file-based and
//! in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileTranscriptStore;
pub use memory::MemoryTranscriptStore;
pub use traits::TranscriptStore;
