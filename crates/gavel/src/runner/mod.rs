//! Code runner for Gavel
//!
//! Provides the build step and the test case evaluator on top of the process
//! runner.

use thiserror::Error;

pub use crate::runner::build::{BuildReport, build};
pub use crate::runner::evaluate::{Evaluation, RunLimits, evaluate, verdict};

mod build;
mod evaluate;

use crate::{
    config::{Config, ConfigError, Language},
    types::TestCase,
    workspace::{Workspace, WorkspaceError},
};

/// Errors that occur during the build step
#[derive(Debug, Error)]
pub enum BuildError {
    /// The compiler ran and rejected the source
    #[error("compilation failed: {diagnostic}")]
    Failed { diagnostic: String },

    #[error("compilation timed out after {timeout_ms} ms")]
    TimedOut { timeout_ms: u64 },

    /// The compiler could not be started
    #[error("toolchain '{program}' is not installed or not on PATH: {message}")]
    ToolchainMissing { program: String, message: String },

    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

impl BuildError {
    /// Whether the failure is the submission's fault rather than ours
    pub fn is_submission_error(&self) -> bool {
        !matches!(self, BuildError::Workspace(_))
    }
}

/// High-level runner for building and evaluating submissions
#[derive(Debug, Clone)]
pub struct Runner {
    config: Config,
}

impl Runner {
    /// Create a new runner with the given configuration
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a new runner with default configuration
    pub fn with_defaults() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a language identifier
    pub fn language(&self, name: &str) -> Result<&Language, ConfigError> {
        self.config.get_language(name)
    }

    /// Write the source into the workspace and build it
    pub async fn build(
        &self,
        workspace: &Workspace,
        language: &Language,
        source: &[u8],
    ) -> Result<BuildReport, BuildError> {
        build::build(workspace, language, source).await
    }

    /// Run every test case against the built program
    pub async fn evaluate(
        &self,
        workspace: &Workspace,
        language: &Language,
        cases: &[TestCase],
        limits: RunLimits,
    ) -> Evaluation {
        evaluate::evaluate(workspace, language, cases, limits).await
    }
}
