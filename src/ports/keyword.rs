//! Rule-based instruction parser.
//!
//! Splits an instruction into clauses and maps each clause onto a node:
//! primitive verbs ("say", "wait", ...) become actions, anything else an
//! unelaborated step the learner will ask about. A leading `if <condition>,`
//! turns the whole instruction into a conditional.

use crate::config::ParserConfig;
use crate::error::ParseFailure;
use crate::ports::InstructionParser;
use crate::tree::Fragment;

/// Separators between sequential clauses, longest first.
const CLAUSE_SEPARATORS: &[&str] = &[
    ", and then ",
    " and after that ",
    ", after that ",
    " after that ",
    " and then ",
    ", then ",
    " then ",
    "; ",
    ". ",
];

/// Words dropped from the front of a clause.
const LEADING_FILLERS: &[&str] = &["and ", "then ", "first ", "next ", "finally ", "also "];

/// Subjects recognized in "if <subject> says <text>" conditions.
const SPEAKERS: &[&str] = &["the person", "the customer", "they", "he", "she", "someone"];

/// Parser driven by keyword rules and a list of primitive verbs.
#[derive(Debug, Clone)]
pub struct KeywordParser {
    primitives: Vec<String>,
}

impl Default for KeywordParser {
    fn default() -> Self {
        Self::from_config(&ParserConfig::default())
    }
}

impl KeywordParser {
    /// Create a parser with the given primitive verbs.
    pub fn new(primitives: Vec<String>) -> Self {
        Self {
            primitives: primitives.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Create a parser from configuration.
    pub fn from_config(config: &ParserConfig) -> Self {
        Self::new(config.primitives.clone())
    }

    fn parse_conditional(&self, original: &str, rest: &str) -> Result<Fragment, ParseFailure> {
        let (condition, body) = split_condition(rest).ok_or_else(|| {
            ParseFailure::new(original, "a conditional needs something to do after the condition")
        })?;
        if condition.is_empty() {
            return Err(ParseFailure::new(original, "the condition is empty"));
        }

        let body = self.parse_clauses(original, body)?;
        let trigger_text = trigger_literal(condition);
        Ok(Fragment::conditional(trigger_text, condition, body))
    }

    fn parse_clauses(&self, original: &str, text: &str) -> Result<Vec<Fragment>, ParseFailure> {
        let fragments: Vec<Fragment> = split_clauses(text)
            .into_iter()
            .map(|clause| self.clause_to_fragment(clause))
            .collect();

        if fragments.is_empty() {
            return Err(ParseFailure::new(original, "no instruction found"));
        }
        Ok(fragments)
    }

    fn clause_to_fragment(&self, clause: &str) -> Fragment {
        if self.is_primitive(clause) {
            Fragment::action(clause)
        } else {
            Fragment::step(clause, Some(gerund(clause)))
        }
    }

    fn is_primitive(&self, clause: &str) -> bool {
        self.primitives.iter().any(|p| {
            clause == p
                || clause
                    .strip_prefix(p.as_str())
                    .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

impl InstructionParser for KeywordParser {
    fn parse_instruction(&self, text: &str) -> Result<Vec<Fragment>, ParseFailure> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Err(ParseFailure::new(text, "nothing to parse"));
        }

        match normalized.strip_prefix("if ") {
            Some(rest) => Ok(vec![self.parse_conditional(text, rest)?]),
            None => self.parse_clauses(text, &normalized),
        }
    }
}

/// Lowercase, collapse whitespace, drop trailing sentence punctuation.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_string()
}

fn split_clauses(text: &str) -> Vec<&str> {
    let mut clauses = vec![text];
    for separator in CLAUSE_SEPARATORS {
        clauses = clauses
            .into_iter()
            .flat_map(|clause| clause.split(separator))
            .collect();
    }

    clauses
        .into_iter()
        .map(strip_fillers)
        .filter(|clause| !clause.is_empty())
        .collect()
}

fn strip_fillers(clause: &str) -> &str {
    let mut clause = clause.trim().trim_end_matches([',', '.', '!']).trim();
    loop {
        if LEADING_FILLERS.iter().any(|filler| clause == filler.trim_end()) {
            return "";
        }
        let stripped = LEADING_FILLERS
            .iter()
            .find_map(|filler| clause.strip_prefix(filler));
        match stripped {
            Some(rest) => clause = rest.trim_start(),
            None => return clause,
        }
    }
}

/// Split "<condition>, <body>" or "<condition> then <body>".
fn split_condition(rest: &str) -> Option<(&str, &str)> {
    let (condition, body) = rest
        .split_once(',')
        .or_else(|| rest.split_once(" then "))?;
    let body = body.trim().trim_start_matches("then ").trim();
    if body.is_empty() {
        return None;
    }
    Some((condition.trim(), body))
}

/// The literal reply a condition listens for.
///
/// "the person says yes" listens for "yes"; a condition that names no
/// speaker listens for its own text.
fn trigger_literal(condition: &str) -> String {
    for speaker in SPEAKERS {
        let Some(rest) = condition.strip_prefix(speaker) else {
            continue;
        };
        let rest = rest.trim_start();
        let said = rest
            .strip_prefix("says ")
            .or_else(|| rest.strip_prefix("say "))
            .or_else(|| rest.strip_prefix("answers "))
            .or_else(|| rest.strip_prefix("answer "));
        if let Some(said) = said {
            return said.trim().trim_matches(['"', '\'']).to_string();
        }
    }
    condition.to_string()
}

/// Present participle of a clause's leading verb: "go to the counter"
/// becomes "going to the counter".
pub fn gerund(clause: &str) -> String {
    let (verb, rest) = match clause.split_once(' ') {
        Some((verb, rest)) => (verb, Some(rest)),
        None => (clause, None),
    };

    let participle = verb_participle(verb);
    match rest {
        Some(rest) => format!("{participle} {rest}"),
        None => participle,
    }
}

fn verb_participle(verb: &str) -> String {
    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u');
    let chars: Vec<char> = verb.chars().collect();

    if chars.len() < 2 {
        return format!("{verb}ing");
    }
    if let Some(stem) = verb.strip_suffix("ie") {
        return format!("{stem}ying");
    }
    let silent_e = verb.ends_with('e')
        && !verb.ends_with("ee")
        && !verb.ends_with("ye")
        && !verb.ends_with("oe");
    if silent_e && chars.len() > 2 {
        return format!("{}ing", &verb[..verb.len() - 1]);
    }

    // Single-vowel words ending consonant-vowel-consonant double the last letter.
    let n = chars.len();
    let vowel_groups = chars
        .iter()
        .enumerate()
        .filter(|(i, c)| is_vowel(**c) && (*i == 0 || !is_vowel(chars[i - 1])))
        .count();
    if n >= 3
        && vowel_groups == 1
        && !is_vowel(chars[n - 1])
        && !matches!(chars[n - 1], 'w' | 'x' | 'y')
        && is_vowel(chars[n - 2])
        && !is_vowel(chars[n - 3])
    {
        return format!("{verb}{}ing", chars[n - 1]);
    }

    format!("{verb}ing")
}
