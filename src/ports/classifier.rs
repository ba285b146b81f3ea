//! Phrase-list utterance classifier.

use crate::config::ClassifierConfig;
use crate::core::ResponseCategory;
use crate::ports::ResponseClassifier;

/// Leading words that mark a question even without a question mark.
const QUESTION_OPENERS: &[&str] = &["what", "why", "how", "where", "who", "which"];

/// Leading phrases that mark a remark rather than an instruction.
const STATEMENT_OPENERS: &[&str] = &[
    "i think",
    "i guess",
    "i'm",
    "i am",
    "it is",
    "it's",
    "that is",
    "that's",
    "this is",
];

/// Classifier matching whole utterances against configured phrase lists.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    done_phrases: Vec<String>,
    misrecognized_phrases: Vec<String>,
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl KeywordClassifier {
    /// Create a classifier from configuration.
    pub fn from_config(config: &ClassifierConfig) -> Self {
        let lower =
            |phrases: &[String]| -> Vec<String> { phrases.iter().map(|p| normalize(p)).collect() };
        Self {
            done_phrases: lower(&config.done_phrases),
            misrecognized_phrases: lower(&config.misrecognized_phrases),
        }
    }

    fn is_done(&self, text: &str) -> bool {
        if self.done_phrases.iter().any(|p| p == text) {
            return true;
        }
        // "no, that's it" / "nope that's all"
        ["no ", "nope ", "okay ", "ok "].iter().any(|lead| {
            text.strip_prefix(lead)
                .is_some_and(|rest| self.done_phrases.iter().any(|p| p == rest))
        })
    }
}

impl ResponseClassifier for KeywordClassifier {
    fn classify(&self, utterance: &str) -> ResponseCategory {
        let text = normalize(utterance);

        if text.is_empty() || self.misrecognized_phrases.iter().any(|p| *p == text) {
            return ResponseCategory::Misrecognized;
        }
        if self.is_done(&text) {
            return ResponseCategory::Done;
        }

        let first_word = text.split(' ').next().unwrap_or_default();
        if utterance.trim_end().ends_with('?') || QUESTION_OPENERS.contains(&first_word) {
            return ResponseCategory::Question;
        }
        if STATEMENT_OPENERS
            .iter()
            .any(|opener| text == *opener || text.starts_with(&format!("{opener} ")))
        {
            return ResponseCategory::Statement;
        }

        ResponseCategory::Instruction
    }
}

/// Lowercase, drop punctuation other than apostrophes, collapse whitespace.
fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> ResponseCategory {
        KeywordClassifier::default().classify(text)
    }

    #[test]
    fn test_instruction() {
        assert_eq!(classify("go to the counter"), ResponseCategory::Instruction);
        assert_eq!(
            classify("If they say yes, say great."),
            ResponseCategory::Instruction
        );
    }

    #[test]
    fn test_done_phrases() {
        assert_eq!(classify("That's it."), ResponseCategory::Done);
        assert_eq!(classify("no"), ResponseCategory::Done);
        assert_eq!(classify("No, that's all!"), ResponseCategory::Done);
        assert_eq!(classify("nothing else"), ResponseCategory::Done);
    }

    #[test]
    fn test_misrecognized() {
        assert_eq!(classify(""), ResponseCategory::Misrecognized);
        assert_eq!(classify("   "), ResponseCategory::Misrecognized);
        assert_eq!(classify("Scratch that"), ResponseCategory::Misrecognized);
        assert_eq!(classify("huh?"), ResponseCategory::Misrecognized);
    }

    #[test]
    fn test_question() {
        assert_eq!(classify("can you repeat?"), ResponseCategory::Question);
        assert_eq!(classify("why would I do that"), ResponseCategory::Question);
    }

    #[test]
    fn test_statement() {
        assert_eq!(classify("I think so"), ResponseCategory::Statement);
        assert_eq!(classify("it's raining"), ResponseCategory::Statement);
    }

    #[test]
    fn test_custom_phrases() {
        let config = ClassifierConfig {
            done_phrases: vec!["Finito".to_string()],
            misrecognized_phrases: vec!["beep".to_string()],
        };
        let classifier = KeywordClassifier::from_config(&config);
        assert_eq!(classifier.classify("finito!"), ResponseCategory::Done);
        assert_eq!(classifier.classify("beep"), ResponseCategory::Misrecognized);
        assert_eq!(classifier.classify("that's it"), ResponseCategory::Statement);
    }

    #[test]
    fn test_respond_keeps_raw_text() {
        let response = KeywordClassifier::default().respond("  Go home. ");
        assert_eq!(response.text, "  Go home. ");
        assert_eq!(response.category, ResponseCategory::Instruction);
    }
}
