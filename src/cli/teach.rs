//! Teach command for sapling.
//!
//! Runs one interactive teaching session: prompts go to the writer, replies
//! come from the reader one line at a time. The transcript is saved at the
//! end whether or not teaching finished.

use std::io::{BufRead, Write};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::core::{Response, TaskLearner, TeachingSession, Turn};
use crate::error::{Result, SaplingError};
use crate::ports::{InstructionParser, KeywordClassifier, KeywordParser, ResponseClassifier};
use crate::storage::TranscriptStore;

/// Options for the teach command.
#[derive(Debug, Clone, Default)]
pub struct TeachOptions {
    /// Print the summary as JSON.
    pub json: bool,
    /// Suppress the summary.
    pub quiet: bool,
    /// Apologize for unexpected replies instead of aborting.
    pub lenient: bool,
    /// Do not save the transcript.
    pub no_save: bool,
}

/// How a teaching session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeachOutcome {
    /// The root was learned.
    Completed,
    /// Input ended before the root was learned.
    Abandoned,
    /// The learner rejected a reply or the protocol broke.
    Aborted,
    /// Reading input, writing prompts or saving failed.
    Failed,
}

/// Output format for the teach command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeachOutput {
    /// Whether the session ended without an error.
    pub success: bool,
    /// Session ID.
    pub session_id: String,
    /// How the session ended.
    pub outcome: TeachOutcome,
    /// Number of teacher replies read.
    pub responses: usize,
    /// Whether the transcript was saved.
    pub saved: bool,
    /// Outline of the tree as it stood at the end.
    pub outline: String,
    /// Error message if the session ended badly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeachOutput {
    /// Format as human-readable text.
    pub fn format_text(&self) -> String {
        let headline = match self.outcome {
            TeachOutcome::Completed => "Teaching complete.".to_string(),
            TeachOutcome::Abandoned => "Teaching stopped before the task was learned.".to_string(),
            TeachOutcome::Aborted | TeachOutcome::Failed => format!(
                "Teaching aborted: {}",
                self.error.as_deref().unwrap_or("unknown error")
            ),
        };

        let mut lines = vec![headline, String::new(), self.outline.trim_end().to_string()];
        if self.saved {
            lines.push(String::new());
            lines.push(format!("Transcript saved as {}", self.session_id));
        } else if let (Some(error), TeachOutcome::Completed | TeachOutcome::Abandoned) =
            (&self.error, self.outcome)
        {
            lines.push(String::new());
            lines.push(format!("Transcript not saved: {error}"));
        }

        lines.join("\n") + "\n"
    }

    /// Format based on output options.
    pub fn format_output(&self, options: &TeachOptions) -> String {
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

/// The teach command implementation.
pub struct TeachCommand<S: TranscriptStore> {
    store: S,
    config: Config,
}

impl<S: TranscriptStore> TeachCommand<S> {
    /// Create a new teach command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run a session, reading replies from `input` and writing the dialogue
    /// to `output`.
    pub fn run<R: BufRead, W: Write>(
        &self,
        input: R,
        output: &mut W,
        options: &TeachOptions,
    ) -> TeachOutput {
        let mut dialogue = self.config.dialogue.clone();
        dialogue.strict = dialogue.strict && !options.lenient;

        let parser = KeywordParser::from_config(&self.config.parser);
        let classifier = KeywordClassifier::from_config(&self.config.classifier);
        let mut learner = TaskLearner::new(parser, &dialogue);
        let mut session = TeachingSession::new();
        info!(session = %session.id, strict = dialogue.strict, "teaching session started");

        let result = converse(&mut learner, &classifier, &mut session, input, output);

        let (outcome, mut error) = match result {
            Ok(true) => (TeachOutcome::Completed, None),
            Ok(false) => (TeachOutcome::Abandoned, None),
            Err(e @ SaplingError::Storage { .. }) => (TeachOutcome::Failed, Some(e.to_string())),
            Err(e) => {
                warn!(session = %session.id, error = %e, "teaching aborted");
                (TeachOutcome::Aborted, Some(e.to_string()))
            }
        };

        let completed = outcome == TeachOutcome::Completed;
        session.finish(learner.tree().outline(), completed);

        let save = self.config.storage.save_transcripts && !options.no_save;
        let mut saved = false;
        if save {
            match self.store.put(&session) {
                Ok(()) => saved = true,
                Err(e) => {
                    warn!(session = %session.id, error = %e, "failed to save transcript");
                    error.get_or_insert_with(|| format!("Failed to save transcript: {e}"));
                }
            }
        }

        info!(session = %session.id, ?outcome, saved, "teaching session ended");
        TeachOutput {
            success: matches!(outcome, TeachOutcome::Completed | TeachOutcome::Abandoned)
                && error.is_none(),
            session_id: session.id.clone(),
            outcome,
            responses: session.transcript.len() - session.prompt_count(),
            saved,
            outline: session.outline,
            error,
        }
    }
}

/// Drive the learner until it finishes or input runs out.
///
/// Returns whether teaching finished.
fn converse<P, C, R, W>(
    learner: &mut TaskLearner<P>,
    classifier: &C,
    session: &mut TeachingSession,
    input: R,
    output: &mut W,
) -> Result<bool>
where
    P: InstructionParser,
    C: ResponseClassifier,
    R: BufRead,
    W: Write,
{
    let mut lines = input.lines();
    let mut reply: Option<Response> = None;

    loop {
        let prompt = match learner.step(reply.take())? {
            Turn::Done => return Ok(true),
            Turn::Prompt(prompt) => prompt,
        };
        session.record_prompt(&prompt);
        writeln!(output, "robot> {}", prompt.text)?;

        if !prompt.needs_response {
            continue;
        }

        write!(output, "you> ")?;
        output.flush()?;
        let Some(line) = lines.next().transpose()? else {
            writeln!(output)?;
            return Ok(false);
        };

        let response = classifier.respond(line.trim());
        session.record_response(&response);
        reply = Some(response);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Speaker;
    use crate::storage::MemoryTranscriptStore;
    use std::io::Cursor;
    use std::sync::Arc;

    fn run(input: &str, options: &TeachOptions) -> (TeachOutput, String, Arc<MemoryTranscriptStore>) {
        let store = Arc::new(MemoryTranscriptStore::new());
        let cmd = TeachCommand::new(Arc::clone(&store), Config::default());
        let mut written = Vec::new();
        let output = cmd.run(Cursor::new(input.to_string()), &mut written, options);
        (output, String::from_utf8(written).unwrap(), store)
    }

    #[test]
    fn test_complete_session() {
        let input = "go to the counter\nsay hello\nthat's it\nthat's all\n";

        let (output, dialogue, store) = run(input, &TeachOptions::default());

        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.outcome, TeachOutcome::Completed);
        assert_eq!(output.responses, 4);
        assert!(output.saved);
        assert!(output.outline.starts_with("[x] root: Root\n"));
        assert!(output.outline.contains("[x] step: go to the counter"));
        assert!(output.outline.contains("- action: say hello"));

        assert!(dialogue.contains("robot> What should I do after approaching the person?"));
        assert!(dialogue.contains("robot> How do I go to the counter?"));
        assert!(dialogue.contains("robot> What is the next step of going to the counter?"));
        assert!(dialogue.contains("robot> Okay, I've learned how to go to the counter"));

        let saved = store.get(&output.session_id).unwrap().unwrap();
        assert!(saved.completed);
        assert_eq!(saved.outline, output.outline);
        assert_eq!(saved.transcript[0].speaker, Speaker::Robot);
    }

    #[test]
    fn test_end_of_input_abandons_session() {
        let (output, _, store) = run("go to the counter\n", &TeachOptions::default());

        assert!(output.success);
        assert_eq!(output.outcome, TeachOutcome::Abandoned);
        let saved = store.get(&output.session_id).unwrap().unwrap();
        assert!(!saved.completed);
        assert!(saved.outline.contains("[ ] step: go to the counter"));
    }

    #[test]
    fn test_unexpected_reply_aborts_in_strict_mode() {
        let (output, _, store) = run("why would I?\n", &TeachOptions::default());

        assert!(!output.success);
        assert_eq!(output.outcome, TeachOutcome::Aborted);
        assert!(output.error.unwrap().contains("unexpected question response"));
        assert!(store.exists(&output.session_id).unwrap());
    }

    #[test]
    fn test_lenient_mode_keeps_going() {
        let options = TeachOptions {
            lenient: true,
            ..Default::default()
        };

        let (output, dialogue, _) = run("why would I?\nthat's all\n", &options);

        assert_eq!(output.outcome, TeachOutcome::Completed);
        assert!(dialogue.contains("robot> I'm sorry, I don't quite understand what you said"));
    }

    #[test]
    fn test_blank_line_at_next_step_is_asked_again() {
        let input = "go to the counter\nsay hello\n\nthat's it\nthat's all\n";

        let (output, dialogue, _) = run(input, &TeachOptions::default());

        assert!(output.success, "{:?}", output.error);
        assert_eq!(output.outcome, TeachOutcome::Completed, "{dialogue}");
        assert!(dialogue.contains("robot> I'm sorry I misheard you, let's try again"));
        assert_eq!(
            dialogue
                .matches("robot> What is the next step of going to the counter?")
                .count(),
            2
        );
    }

    #[test]
    fn test_no_save() {
        let options = TeachOptions {
            no_save: true,
            ..Default::default()
        };

        let (output, _, store) = run("that's all\n", &options);

        assert!(output.success);
        assert!(!output.saved);
        assert!(store.is_empty());
    }

    #[test]
    fn test_conditional_dialogue() {
        let input = "if the person says yes, say great\nno\nwave goodbye\nthat's all\n";

        let (output, dialogue, _) = run(input, &TeachOptions::default());

        assert_eq!(output.outcome, TeachOutcome::Completed, "{dialogue}");
        assert!(dialogue.contains("robot> Should I do anything else when the person says yes?"));
        assert!(dialogue.contains("robot> What should I do if the person says no?"));
        assert!(output.outline.contains("[x] conditional: when the person says yes"));
        assert!(output.outline.contains("- action: wave goodbye"));
    }

    #[test]
    fn test_format_output() {
        let (output, _, _) = run("that's all\n", &TeachOptions::default());

        let text = output.format_text();
        assert!(text.starts_with("Teaching complete."));
        assert!(text.contains("Transcript saved as teach-"));

        let json = TeachOptions {
            json: true,
            ..Default::default()
        };
        let value: serde_json::Value = serde_json::from_str(&output.format_output(&json)).unwrap();
        assert_eq!(value["outcome"], "completed");

        let quiet = TeachOptions {
            quiet: true,
            ..Default::default()
        };
        assert!(output.format_output(&quiet).is_empty());
    }
}
