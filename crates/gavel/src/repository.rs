//! Problem lookup
//!
//! The engine reads problems through [`ProblemRepository`]; storage is the
//! caller's business. Two implementations ship with the crate: an in-memory
//! map and a directory of TOML files.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use config::{Config as ConfigBuilder, File, FileFormat};
use thiserror::Error;
use tracing::debug;

use crate::types::Problem;

/// Errors that occur while looking up problems
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid problem id '{0}'")]
    InvalidId(String),

    #[error("failed to read problem file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse problem file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
}

/// Read access to problems
pub trait ProblemRepository: Send + Sync {
    /// Find an active problem by id
    ///
    /// Inactive and unknown problems both resolve to `None`.
    fn find(
        &self,
        problem_id: &str,
    ) -> impl Future<Output = Result<Option<Problem>, RepositoryError>> + Send;
}

/// Problems held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryProblems {
    problems: HashMap<String, Problem>,
}

impl InMemoryProblems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a problem, keyed by its id
    pub fn insert(&mut self, problem: Problem) {
        self.problems.insert(problem.id.clone(), problem);
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, problem: Problem) -> Self {
        self.insert(problem);
        self
    }

    /// Get a problem regardless of whether it is active
    pub fn get(&self, problem_id: &str) -> Option<&Problem> {
        self.problems.get(problem_id)
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl FromIterator<Problem> for InMemoryProblems {
    fn from_iter<T: IntoIterator<Item = Problem>>(iter: T) -> Self {
        let mut problems = Self::new();
        for problem in iter {
            problems.insert(problem);
        }
        problems
    }
}

impl ProblemRepository for InMemoryProblems {
    async fn find(&self, problem_id: &str) -> Result<Option<Problem>, RepositoryError> {
        Ok(self.problems.get(problem_id).filter(|p| p.active).cloned())
    }
}

/// Problems stored as `<dir>/<id>.toml`
#[derive(Debug, Clone)]
pub struct DirectoryProblems {
    dir: PathBuf,
}

impl DirectoryProblems {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn problem_path(&self, problem_id: &str) -> Result<PathBuf, RepositoryError> {
        let valid = !problem_id.is_empty()
            && problem_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RepositoryError::InvalidId(problem_id.to_owned()));
        }
        Ok(self.dir.join(format!("{problem_id}.toml")))
    }
}

impl ProblemRepository for DirectoryProblems {
    async fn find(&self, problem_id: &str) -> Result<Option<Problem>, RepositoryError> {
        let path = self.problem_path(problem_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "problem file not found");
                return Ok(None);
            }
            Err(source) => return Err(RepositoryError::Read { path, source }),
        };

        let mut problem = parse_problem(&content).map_err(|source| RepositoryError::Parse {
            path: path.clone(),
            source,
        })?;
        if problem.id.is_empty() {
            problem.id = problem_id.to_owned();
        }
        Ok(Some(problem).filter(|p| p.active))
    }
}

/// Parse a problem from TOML
pub fn parse_problem(content: &str) -> Result<Problem, config::ConfigError> {
    ConfigBuilder::builder()
        .set_default("id", "")?
        .add_source(File::from_str(content, FileFormat::Toml))
        .build()?
        .try_deserialize()
}
