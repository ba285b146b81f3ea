//! Language collaborators the learner depends on.
//!
//! The learner only sees the [`InstructionParser`] and
//! [`ResponseClassifier`] traits. [`KeywordParser`] and
//! [`KeywordClassifier`] are small rule-based implementations used by the
//! CLI; a trained parser or classifier plugs in behind the same traits.

pub mod classifier;
pub mod keyword;
pub mod traits;

pub use classifier::KeywordClassifier;
pub use keyword::KeywordParser;
pub use traits::{InstructionParser, ResponseClassifier};
