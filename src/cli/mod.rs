//! CLI commands for sapling.
//!
//! - **teach**: run an interactive teaching session
//! - **sessions**: list saved transcripts
//! - **show**: print one saved transcript

pub mod sessions;
pub mod show;
pub mod teach;

pub use sessions::{SessionsCommand, SessionsOptions, SessionsOutput};
pub use show::{ShowCommand, ShowOptions, ShowOutput};
pub use teach::{TeachCommand, TeachOptions, TeachOutcome, TeachOutput};
