use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub use crate::config::language::{
    CompileConfig, DEFAULT_COMPILE_TIMEOUT_MS, FileExtension, Language, RunConfig, Strategy,
};
use crate::types::Problem;

pub mod language;
mod loader;

/// Example configuration embedded at compile time.
///
/// Library users can access this to generate a starter config file.
pub const EXAMPLE_CONFIG: &str = include_str!("../../gavel.example.toml");

/// Per-run wall-clock limit used when a problem does not set one
pub const DEFAULT_TIME_LIMIT_MS: u64 = 15_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid characters in file extension")]
    InvalidFileExtChars,

    #[error("failed to parse config: {0}")]
    Parse(#[from] config::ConfigError),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Config for Gavel
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Directory under which per-submission workspaces are created.
    /// Defaults to `gavel` inside the system temp directory.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,

    /// Wall-clock limit per test case run when the problem has none
    #[serde(default = "default_time_limit_ms")]
    pub default_time_limit_ms: u64,

    /// Maximum number of submissions judged at the same time
    #[serde(default = "default_max_concurrent_judges")]
    pub max_concurrent_judges: usize,

    /// Language configurations keyed by language ID
    #[serde(default)]
    pub languages: HashMap<String, Language>,
}

impl Config {
    /// Create a new config with embedded default languages
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty config with no languages
    pub fn empty() -> Self {
        Self {
            workspace_root: None,
            default_time_limit_ms: DEFAULT_TIME_LIMIT_MS,
            max_concurrent_judges: default_max_concurrent_judges(),
            languages: HashMap::new(),
        }
    }

    /// Resolve a language identifier to its configuration
    ///
    /// Matches configured IDs exactly first, then IDs and aliases
    /// case-insensitively.
    pub fn get_language(&self, name: &str) -> Result<&Language, ConfigError> {
        let id = self
            .canonical_id(name)
            .ok_or_else(|| ConfigError::UnsupportedLanguage(name.to_string()))?;
        self.languages
            .get(id)
            .ok_or_else(|| ConfigError::UnsupportedLanguage(name.to_string()))
    }

    /// The configured ID a language name or alias refers to
    pub fn canonical_id(&self, name: &str) -> Option<&str> {
        if let Some((id, _)) = self.languages.get_key_value(name) {
            return Some(id.as_str());
        }
        let name = name.trim();
        self.languages
            .iter()
            .find(|(id, lang)| {
                id.eq_ignore_ascii_case(name)
                    || lang.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
            })
            .map(|(id, _)| id.as_str())
    }

    /// Directory under which workspaces are created
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("gavel"))
    }

    /// Per-run wall-clock limit for a problem
    pub fn time_limit_for(&self, problem: &Problem) -> Duration {
        Duration::from_millis(problem.time_limit_ms.unwrap_or(self.default_time_limit_ms))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_toml(EXAMPLE_CONFIG).expect("embedded default config should be valid")
    }
}

fn default_time_limit_ms() -> u64 {
    DEFAULT_TIME_LIMIT_MS
}

fn default_max_concurrent_judges() -> usize {
    4
}
