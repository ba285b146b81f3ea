//! Unified error types for sapling.
//!
//! Teaching distinguishes two classes of failure. Recoverable ones (a reply
//! the parser cannot map to an instruction) never leave the learner: it
//! apologizes and asks again. Everything else reaching a caller as `Err`
//! is fatal for the session and means the caller or the node model broke
//! a contract.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::ResponseCategory;

/// The main error type for sapling operations.
#[derive(Error, Debug)]
pub enum SaplingError {
    /// I/O errors from transcript or config file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// The instruction parser could not map the text to a subtree.
    #[error("parse failure: {0}")]
    Parse(#[from] ParseFailure),

    /// A handle refers to a node that was detached or never existed.
    #[error("node not found: #{index}")]
    NodeNotFound { index: usize },

    /// Structural misuse of the tree (detaching the root, attaching under a leaf).
    #[error("invalid tree operation: {message}")]
    InvalidTree { message: String },

    /// The caller broke the one-response-per-question handshake.
    #[error("protocol violation: {message}")]
    ProtocolViolation { message: String },

    /// A reply category that has no meaning for the current question.
    #[error("unexpected {category} response while teaching {target}")]
    UnexpectedResponse {
        target: String,
        category: ResponseCategory,
    },

    /// Transcript not found in storage.
    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    /// Session id that cannot name a transcript file.
    #[error("invalid session id: {session_id:?}")]
    InvalidSessionId { session_id: String },
}

/// A specialized Result type for sapling operations.
pub type Result<T> = std::result::Result<T, SaplingError>;

/// Returned by an instruction parser when the text matches no known grammar.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot understand {text:?}: {reason}")]
pub struct ParseFailure {
    /// The text that failed to parse.
    pub text: String,
    /// Why the parser rejected it.
    pub reason: String,
}

impl ParseFailure {
    /// Create a parse failure for the given text.
    pub fn new(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reason: reason.into(),
        }
    }
}

impl SaplingError {
    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid tree operation error.
    pub fn invalid_tree(message: impl Into<String>) -> Self {
        Self::InvalidTree {
            message: message.into(),
        }
    }

    /// Create a protocol violation error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolViolation {
            message: message.into(),
        }
    }

    /// Create an unexpected response error.
    pub fn unexpected_response(target: impl Into<String>, category: ResponseCategory) -> Self {
        Self::UnexpectedResponse {
            target: target.into(),
            category,
        }
    }

    /// Create a session not found error.
    pub fn session_not_found(session_id: impl Into<String>) -> Self {
        Self::SessionNotFound {
            session_id: session_id.into(),
        }
    }

    /// Create an invalid session id error.
    pub fn invalid_session_id(session_id: impl Into<String>) -> Self {
        Self::InvalidSessionId {
            session_id: session_id.into(),
        }
    }

    /// Whether the learner may apologize and re-ask instead of aborting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

impl From<io::Error> for SaplingError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SaplingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Exit codes for the sapling CLI.
pub mod exit_codes {
    /// Command completed.
    pub const OK: i32 = 0;

    /// Command failed with a reported error.
    pub const ERROR: i32 = 1;

    /// Session aborted by a fatal teaching error or a panic.
    pub const ABORTED: i32 = 3;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = SaplingError::storage(
            "/tmp/test.json",
            io::Error::new(io::ErrorKind::NotFound, "file not found"),
        );
        assert!(err.to_string().contains("storage error"));
        assert!(err.to_string().contains("/tmp/test.json"));
    }

    #[test]
    fn test_parse_failure_display() {
        let err: SaplingError = ParseFailure::new("blorp", "no clauses").into();
        assert_eq!(
            err.to_string(),
            "parse failure: cannot understand \"blorp\": no clauses"
        );
    }

    #[test]
    fn test_unexpected_response_display() {
        let err = SaplingError::unexpected_response("step 'go home'", ResponseCategory::Done);
        assert_eq!(
            err.to_string(),
            "unexpected done response while teaching step 'go home'"
        );
    }

    #[test]
    fn test_node_not_found_display() {
        let err = SaplingError::NodeNotFound { index: 7 };
        assert_eq!(err.to_string(), "node not found: #7");
    }

    #[test]
    fn test_only_parse_failures_are_recoverable() {
        assert!(SaplingError::Parse(ParseFailure::new("x", "y")).is_recoverable());

        let fatal = vec![
            SaplingError::serde("test"),
            SaplingError::config("test"),
            SaplingError::invalid_tree("test"),
            SaplingError::protocol("test"),
            SaplingError::NodeNotFound { index: 0 },
            SaplingError::session_not_found("test"),
            SaplingError::unexpected_response("root", ResponseCategory::Question),
        ];
        for err in fatal {
            assert!(!err.is_recoverable(), "{err} should be fatal");
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: SaplingError = io_err.into();
        assert!(matches!(err, SaplingError::Storage { .. }));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: SaplingError = json_err.into();
        assert!(matches!(err, SaplingError::Serde { .. }));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_codes::OK, 0);
        assert_eq!(exit_codes::ERROR, 1);
        assert_eq!(exit_codes::ABORTED, 3);
    }
}
