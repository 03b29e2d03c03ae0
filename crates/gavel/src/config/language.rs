use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;

const INVALID_FILE_EXT_CHARS: [char; 2] = ['/', '.'];

/// Configuration for a programming language
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Language {
    /// Human-readable name for the language (e.g., "C++ 17 (GCC)")
    pub name: String,

    /// Alternative spellings accepted when resolving the language,
    /// matched case-insensitively
    #[serde(default)]
    pub aliases: Vec<String>,

    /// File extension
    pub extension: FileExtension,

    /// Compilation configuration (None for interpreted languages)
    #[serde(default)]
    pub compile: Option<CompileConfig>,

    /// Execution configuration
    pub run: RunConfig,
}

/// How a resolved language is built
#[derive(Debug, Clone, Copy)]
pub enum Strategy<'a> {
    /// No build step; the run command takes the source file directly
    Interpreted,

    /// The build command must succeed before any run command is attempted
    Compiled { build: &'a CompileConfig },
}

impl Language {
    /// Check if the language is compiled
    pub fn is_compiled(&self) -> bool {
        self.compile.is_some()
    }

    /// Get the build strategy for this language
    pub fn strategy(&self) -> Strategy<'_> {
        match self.compile {
            Some(ref build) => Strategy::Compiled { build },
            None => Strategy::Interpreted,
        }
    }

    /// Get the source file name for this language
    pub fn source_name(&self) -> String {
        if let Some(ref compile) = self.compile {
            compile.source_name.clone()
        } else {
            format!("main.{}", self.extension)
        }
    }

    /// Name of the artifact passed to the run command as `{binary}`
    ///
    /// For interpreted languages this is the source file itself.
    pub fn binary_name(&self) -> String {
        match self.compile {
            Some(ref compile) => compile.output_name.clone(),
            None => self.source_name(),
        }
    }

    /// The build command with placeholders expanded
    pub fn build_command(&self) -> Option<Vec<String>> {
        self.compile.as_ref().map(|compile| {
            Self::expand_command(&compile.command, &compile.source_name, &compile.output_name)
        })
    }

    /// The run command for the host platform with placeholders expanded
    pub fn run_command(&self) -> Vec<String> {
        Self::expand_command(
            self.run.host_command(),
            &self.source_name(),
            &self.binary_name(),
        )
    }

    /// Expand placeholders in the given command
    pub fn expand_command(command: &[String], source: &str, binary: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| {
                arg.replace("{source}", source)
                    .replace("{output}", binary)
                    .replace("{binary}", binary)
            })
            .collect()
    }
}

/// File extension without dot (e.g., "cpp")
#[derive(Debug, Clone, Serialize)]
pub struct FileExtension(String);

impl FileExtension {
    pub fn new(extension: &str) -> Result<Self, ConfigError> {
        let contains_invalid = extension
            .chars()
            .any(|c| INVALID_FILE_EXT_CHARS.contains(&c));
        if contains_invalid {
            return Err(ConfigError::InvalidFileExtChars);
        }
        Ok(Self(extension.to_owned()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for FileExtension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FileExtension::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a file extension without '/' or '.' characters",
            )
        })
    }
}

impl std::fmt::Display for FileExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default compile timeout when a language does not set one
pub const DEFAULT_COMPILE_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the compilation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {output}
    pub command: Vec<String>,

    /// Source file name in the workspace (e.g., "main.cpp")
    pub source_name: String,

    /// Output artifact name (e.g., "main")
    pub output_name: String,

    /// Wall-clock limit for the compiler in milliseconds
    #[serde(default = "default_compile_timeout_ms")]
    pub timeout_ms: u64,

    /// Environment variables to set during compilation
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_compile_timeout_ms() -> u64 {
    DEFAULT_COMPILE_TIMEOUT_MS
}

/// Configuration for the execution step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Command and arguments with placeholders
    /// Placeholders: {source}, {binary}
    pub command: Vec<String>,

    /// Replacement command used on Windows hosts, where interpreter
    /// binaries are often named differently (e.g., `python` vs `python3`)
    #[serde(default)]
    pub windows_command: Option<Vec<String>>,

    /// Environment Variables to set
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl RunConfig {
    /// The command template for the platform we are running on
    pub fn host_command(&self) -> &[String] {
        match self.windows_command {
            Some(ref command) if cfg!(windows) => command,
            _ => &self.command,
        }
    }
}
