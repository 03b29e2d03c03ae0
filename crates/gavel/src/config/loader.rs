//! Configuration file loading for Gavel
//!
//! Handles loading and parsing configuration files using the config crate.

use std::collections::HashSet;
use std::path::Path;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};

use crate::config::{Config, ConfigError, EXAMPLE_CONFIG};

/// Prefix for environment variable overrides (e.g. `GAVEL_DEFAULT_TIME_LIMIT_MS`)
const ENV_PREFIX: &str = "GAVEL";

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = ConfigBuilder::builder()
            .add_source(File::from(path))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let config = ConfigBuilder::builder()
            .add_source(File::from_str(content, FileFormat::Toml))
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the layered configuration used by services
    ///
    /// Embedded defaults, then the optional file, then `GAVEL_*`
    /// environment variables, each overriding the previous layer.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::layered(
            path,
            Environment::with_prefix(ENV_PREFIX).try_parsing(true),
        )
    }

    fn layered(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder()
            .add_source(File::from_str(EXAMPLE_CONFIG, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config: Config = builder.add_source(env).build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_time_limit_ms == 0 {
            return Err(ConfigError::Invalid(
                "default_time_limit_ms must be positive".to_owned(),
            ));
        }
        if self.max_concurrent_judges == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_judges must be positive".to_owned(),
            ));
        }

        let mut names = HashSet::new();
        for (id, lang) in &self.languages {
            if lang.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty name"
                )));
            }
            if lang.extension.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty extension"
                )));
            }
            if lang.run.command.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "language '{id}' has empty run command"
                )));
            }
            if let Some(ref compile) = lang.compile {
                if compile.command.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has empty compile command"
                    )));
                }
                if compile.timeout_ms == 0 {
                    return Err(ConfigError::Invalid(format!(
                        "language '{id}' has zero compile timeout"
                    )));
                }
            }

            for name in std::iter::once(id).chain(lang.aliases.iter()) {
                if !names.insert(name.to_lowercase()) {
                    return Err(ConfigError::Invalid(format!(
                        "language name or alias '{name}' is used more than once"
                    )));
                }
            }
        }

        Ok(())
    }
}
