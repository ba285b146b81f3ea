//! Configuration loading for sapling.
//!
//! Configuration follows a precedence chain:
//! 1. Environment variables (highest priority)
//! 2. Project config (`.sapling/config.toml`)
//! 3. User config (`~/.sapling/config.toml`)
//! 4. Defaults (lowest priority)
//!
//! All configuration is optional.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, SaplingError};

/// Main configuration struct for sapling.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How the learner phrases and closes its questions.
    pub dialogue: DialogueConfig,
    /// Rule-based instruction parser settings.
    pub parser: ParserConfig,
    /// Rule-based classifier settings.
    pub classifier: ClassifierConfig,
    /// Transcript storage settings.
    pub storage: StorageConfig,
}

/// Dialogue behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DialogueConfig {
    /// Name of the root node.
    pub root_name: String,
    /// Description of the mandatory first action under the root.
    pub approach: String,
    /// Trigger literals treated as an affirmative reply.
    pub affirmative: Vec<String>,
    /// Trigger literals treated as a negative reply.
    pub negative: Vec<String>,
    /// Abort on replies that make no sense for the current question
    /// instead of apologizing and asking again.
    pub strict: bool,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            root_name: "Root".to_string(),
            approach: "approaching the person".to_string(),
            affirmative: vec!["yes".to_string()],
            negative: vec!["no".to_string()],
            strict: true,
        }
    }
}

impl DialogueConfig {
    /// Check that a literal list is usable (non-empty, no blank entries).
    pub fn is_valid_literals(values: &[String]) -> bool {
        !values.is_empty() && values.iter().all(|v| !v.trim().is_empty())
    }
}

/// Rule-based parser configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Leading verbs whose clauses become actions instead of steps.
    pub primitives: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            primitives: ["say", "ask", "wait", "nod", "smile", "wave", "point"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Rule-based classifier configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Utterances meaning "nothing more here".
    pub done_phrases: Vec<String>,
    /// Utterances meaning "you misheard me, undo that".
    pub misrecognized_phrases: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            done_phrases: to_strings(&[
                "done",
                "i'm done",
                "that's it",
                "that is it",
                "that's all",
                "that is all",
                "that's everything",
                "nothing",
                "nothing else",
                "no",
                "nope",
                "finished",
            ]),
            misrecognized_phrases: to_strings(&[
                "huh",
                "what",
                "pardon",
                "sorry",
                "come again",
                "never mind",
                "nevermind",
                "scratch that",
                "undo",
                "wrong",
            ]),
        }
    }
}

/// Transcript storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Whether `sapling teach` saves its transcript.
    pub save_transcripts: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            save_transcripts: true,
        }
    }
}

impl Config {
    /// Load configuration with full precedence chain.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables
    /// 2. Project config (`.sapling/config.toml` in cwd)
    /// 3. User config (`~/.sapling/config.toml`)
    /// 4. Defaults
    pub fn load() -> Self {
        match env::current_dir() {
            Ok(cwd) => Self::load_from_cwd(&cwd),
            Err(_) => {
                let mut config = Config::default();
                if let Some(user_config) = Self::load_user_config() {
                    config = config.merge(user_config);
                }
                config.apply_env_overrides();
                config
            }
        }
    }

    /// Load configuration with a specific working directory.
    pub fn load_from_cwd(cwd: &Path) -> Self {
        let mut config = Config::default();

        if let Some(user_config) = Self::load_user_config() {
            config = config.merge(user_config);
        }

        if let Some(project_config) = Self::load_project_config(cwd) {
            config = config.merge(project_config);
        }

        config.apply_env_overrides();

        config
    }

    /// Load user config from `~/.sapling/config.toml`.
    fn load_user_config() -> Option<Config> {
        let home = sapling_home()?;
        Self::load_optional(&home.join("config.toml"))
    }

    /// Load project config from `.sapling/config.toml` in the given directory.
    fn load_project_config(cwd: &Path) -> Option<Config> {
        Self::load_optional(&cwd.join(".sapling").join("config.toml"))
    }

    /// Load a config file that may be absent. Unreadable or invalid files
    /// are logged and skipped.
    fn load_optional(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring config file");
                None
            }
        }
    }

    /// Load config from a specific file path.
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let content = fs::read_to_string(path).map_err(|e| SaplingError::storage(path, e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| SaplingError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the learner cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !DialogueConfig::is_valid_literals(&self.dialogue.affirmative) {
            return Err(SaplingError::config(
                "dialogue.affirmative must list at least one non-blank literal",
            ));
        }
        if !DialogueConfig::is_valid_literals(&self.dialogue.negative) {
            return Err(SaplingError::config(
                "dialogue.negative must list at least one non-blank literal",
            ));
        }
        if self.dialogue.approach.trim().is_empty() {
            return Err(SaplingError::config("dialogue.approach must not be blank"));
        }
        Ok(())
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // SAPLING_APPROACH
        if let Ok(val) = env::var("SAPLING_APPROACH") {
            if val.trim().is_empty() {
                tracing::warn!(
                    "Invalid SAPLING_APPROACH value (blank). Using '{}'.",
                    self.dialogue.approach
                );
            } else {
                self.dialogue.approach = val;
            }
        }

        // SAPLING_STRICT
        if let Ok(val) = env::var("SAPLING_STRICT") {
            match parse_bool(&val) {
                Some(strict) => self.dialogue.strict = strict,
                None => tracing::warn!(
                    "Invalid SAPLING_STRICT value '{}'. Expected true/false. Using '{}'.",
                    val,
                    self.dialogue.strict
                ),
            }
        }

        // SAPLING_SAVE_TRANSCRIPTS
        if let Ok(val) = env::var("SAPLING_SAVE_TRANSCRIPTS") {
            match parse_bool(&val) {
                Some(save) => self.storage.save_transcripts = save,
                None => tracing::warn!(
                    "Invalid SAPLING_SAVE_TRANSCRIPTS value '{}'. Expected true/false. Using '{}'.",
                    val,
                    self.storage.save_transcripts
                ),
            }
        }
    }

    /// Merge another config into this one.
    ///
    /// The `other` config takes precedence field by field. A value equal to
    /// the default cannot override a non-default value from a lower layer,
    /// since "unset" and "explicitly default" look the same after parsing.
    fn merge(mut self, other: Config) -> Self {
        let default_dialogue = DialogueConfig::default();
        if other.dialogue.root_name != default_dialogue.root_name {
            self.dialogue.root_name = other.dialogue.root_name;
        }
        if other.dialogue.approach != default_dialogue.approach {
            self.dialogue.approach = other.dialogue.approach;
        }
        if other.dialogue.affirmative != default_dialogue.affirmative {
            self.dialogue.affirmative = other.dialogue.affirmative;
        }
        if other.dialogue.negative != default_dialogue.negative {
            self.dialogue.negative = other.dialogue.negative;
        }
        if other.dialogue.strict != default_dialogue.strict {
            self.dialogue.strict = other.dialogue.strict;
        }

        if other.parser.primitives != ParserConfig::default().primitives {
            self.parser.primitives = other.parser.primitives;
        }

        let default_classifier = ClassifierConfig::default();
        if other.classifier.done_phrases != default_classifier.done_phrases {
            self.classifier.done_phrases = other.classifier.done_phrases;
        }
        if other.classifier.misrecognized_phrases != default_classifier.misrecognized_phrases {
            self.classifier.misrecognized_phrases = other.classifier.misrecognized_phrases;
        }

        if other.storage.save_transcripts != StorageConfig::default().save_transcripts {
            self.storage.save_transcripts = other.storage.save_transcripts;
        }

        self
    }

    /// Save configuration to the project config file.
    ///
    /// Writes `.sapling/config.toml` in the given directory via temp file
    /// and rename.
    pub fn save_project(&self, cwd: &Path) -> Result<()> {
        let sapling_dir = cwd.join(".sapling");

        if !sapling_dir.exists() {
            fs::create_dir_all(&sapling_dir).map_err(|e| SaplingError::storage(&sapling_dir, e))?;
        }

        let config_path = sapling_dir.join("config.toml");
        let content =
            toml::to_string_pretty(self).map_err(|e| SaplingError::config(e.to_string()))?;

        let temp_path = sapling_dir.join(".config.toml.tmp");
        fs::write(&temp_path, &content).map_err(|e| SaplingError::storage(&temp_path, e))?;

        let file = fs::File::open(&temp_path).map_err(|e| SaplingError::storage(&temp_path, e))?;
        file.sync_all()
            .map_err(|e| SaplingError::storage(&temp_path, e))?;
        drop(file);

        fs::rename(&temp_path, &config_path)
            .map_err(|e| SaplingError::storage(&config_path, e))?;

        Ok(())
    }
}

fn parse_bool(val: &str) -> Option<bool> {
    match val.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Get the sapling home directory.
///
/// Uses `SAPLING_HOME` when set and non-empty, otherwise `~/.sapling`.
pub fn sapling_home() -> Option<PathBuf> {
    if let Ok(home) = env::var("SAPLING_HOME") {
        if home.is_empty() {
            tracing::warn!("SAPLING_HOME is empty, using default");
        } else {
            let path = PathBuf::from(&home);
            if path.is_absolute() {
                return Some(path);
            }
            if let Ok(canonical) = path.canonicalize() {
                return Some(canonical);
            }
            tracing::warn!("SAPLING_HOME is relative and doesn't exist, using as-is");
            return Some(path);
        }
    }

    if let Some(home) = dirs::home_dir() {
        return Some(home.join(".sapling"));
    }

    let fallback = env::temp_dir().join("sapling");
    tracing::warn!("HOME not set, using fallback location: {}", fallback.display());
    Some(fallback)
}

/// Get the transcripts directory.
///
/// Returns `<sapling_home>/transcripts/`.
pub fn transcripts_dir() -> Option<PathBuf> {
    sapling_home().map(|h| h.join("transcripts"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.dialogue.root_name, "Root");
        assert_eq!(config.dialogue.approach, "approaching the person");
        assert_eq!(config.dialogue.affirmative, vec!["yes"]);
        assert_eq!(config.dialogue.negative, vec!["no"]);
        assert!(config.dialogue.strict);

        assert!(config.parser.primitives.contains(&"say".to_string()));
        assert!(config.classifier.done_phrases.contains(&"that's it".to_string()));
        assert!(config.storage.save_transcripts);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");

        let toml_content = r#"
[dialogue]
approach = "greeting the guest"
affirmative = ["yes", "sure"]

[parser]
primitives = ["beep"]
"#;
        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();

        assert_eq!(config.dialogue.approach, "greeting the guest");
        assert_eq!(config.dialogue.affirmative, vec!["yes", "sure"]);
        assert_eq!(config.parser.primitives, vec!["beep"]);
        // Untouched sections keep defaults
        assert_eq!(config.dialogue.negative, vec!["no"]);
        assert!(config.storage.save_transcripts);
    }

    #[test]
    fn test_load_from_file_missing() {
        let result = Config::load_from_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(SaplingError::Storage { .. })));
    }

    #[test]
    fn test_load_from_file_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "this is not valid toml [[[").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(SaplingError::Config { .. })));
    }

    #[test]
    fn test_load_from_file_rejects_empty_literals() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "[dialogue]\nnegative = []\n").unwrap();

        let result = Config::load_from_file(&config_path);
        assert!(matches!(result, Err(SaplingError::Config { .. })));
    }

    #[test]
    #[serial]
    fn test_project_config_precedence() {
        let home = TempDir::new().unwrap();
        env::set_var("SAPLING_HOME", home.path());

        let dir = TempDir::new().unwrap();
        let sapling_dir = dir.path().join(".sapling");
        fs::create_dir_all(&sapling_dir).unwrap();
        fs::write(
            sapling_dir.join("config.toml"),
            "[dialogue]\nstrict = false\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert!(!config.dialogue.strict);
        assert_eq!(config.dialogue.approach, "approaching the person");

        env::remove_var("SAPLING_HOME");
    }

    #[test]
    #[serial]
    fn test_user_config_then_project_config() {
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[dialogue]\napproach = \"walking up\"\nstrict = false\n",
        )
        .unwrap();
        env::set_var("SAPLING_HOME", home.path());

        let dir = TempDir::new().unwrap();
        let sapling_dir = dir.path().join(".sapling");
        fs::create_dir_all(&sapling_dir).unwrap();
        fs::write(
            sapling_dir.join("config.toml"),
            "[dialogue]\napproach = \"rolling over\"\n",
        )
        .unwrap();

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.dialogue.approach, "rolling over");
        // Non-default user value survives a project file that does not set it
        assert!(!config.dialogue.strict);

        env::remove_var("SAPLING_HOME");
    }

    #[test]
    #[serial]
    fn test_env_var_precedence() {
        let home = TempDir::new().unwrap();
        env::set_var("SAPLING_HOME", home.path());

        let dir = TempDir::new().unwrap();
        let sapling_dir = dir.path().join(".sapling");
        fs::create_dir_all(&sapling_dir).unwrap();
        fs::write(
            sapling_dir.join("config.toml"),
            "[dialogue]\napproach = \"from file\"\n",
        )
        .unwrap();

        env::set_var("SAPLING_APPROACH", "from env");
        env::set_var("SAPLING_STRICT", "false");
        env::set_var("SAPLING_SAVE_TRANSCRIPTS", "0");

        let config = Config::load_from_cwd(dir.path());

        assert_eq!(config.dialogue.approach, "from env");
        assert!(!config.dialogue.strict);
        assert!(!config.storage.save_transcripts);

        env::remove_var("SAPLING_APPROACH");
        env::remove_var("SAPLING_STRICT");
        env::remove_var("SAPLING_SAVE_TRANSCRIPTS");
        env::remove_var("SAPLING_HOME");
    }

    #[test]
    #[serial]
    fn test_invalid_env_values_are_ignored() {
        let home = TempDir::new().unwrap();
        env::set_var("SAPLING_HOME", home.path());
        env::set_var("SAPLING_STRICT", "sometimes");
        env::set_var("SAPLING_APPROACH", "   ");

        let dir = TempDir::new().unwrap();
        let config = Config::load_from_cwd(dir.path());

        assert!(config.dialogue.strict);
        assert_eq!(config.dialogue.approach, "approaching the person");

        env::remove_var("SAPLING_STRICT");
        env::remove_var("SAPLING_APPROACH");
        env::remove_var("SAPLING_HOME");
    }

    #[test]
    #[serial]
    fn test_invalid_project_file_is_skipped() {
        let home = TempDir::new().unwrap();
        env::set_var("SAPLING_HOME", home.path());

        let dir = TempDir::new().unwrap();
        let sapling_dir = dir.path().join(".sapling");
        fs::create_dir_all(&sapling_dir).unwrap();
        fs::write(sapling_dir.join("config.toml"), "[[[").unwrap();

        let config = Config::load_from_cwd(dir.path());
        assert_eq!(config, Config::default());

        env::remove_var("SAPLING_HOME");
    }

    #[test]
    fn test_save_project_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.dialogue.approach = "rolling up".to_string();
        config.dialogue.strict = false;

        config.save_project(dir.path()).unwrap();

        let saved = dir.path().join(".sapling").join("config.toml");
        assert!(saved.exists());
        assert!(!dir.path().join(".sapling").join(".config.toml.tmp").exists());
        let loaded = Config::load_from_file(&saved).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    #[serial]
    fn test_sapling_home_env() {
        let dir = TempDir::new().unwrap();
        env::set_var("SAPLING_HOME", dir.path());

        assert_eq!(sapling_home(), Some(dir.path().to_path_buf()));
        assert_eq!(transcripts_dir(), Some(dir.path().join("transcripts")));

        env::remove_var("SAPLING_HOME");
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
