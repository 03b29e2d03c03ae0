//! Judging orchestration
//!
//! A judging call moves through
//! `Validating → Building → Evaluating → Scoring → Cleanup → Done`, or ends
//! in `Aborted` when validation or the build fails. The workspace acquired in
//! `Building` is released on every path out of the call.

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, Language};
use crate::repository::{ProblemRepository, RepositoryError};
use crate::runner::{BuildError, RunLimits, Runner};
use crate::types::{JudgeResult, Problem, SubmissionRequest};
use crate::workspace::{Workspace, WorkspaceError, WorkspaceManager};

/// Request-level failure of a judging call
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Missing field or language not permitted for the problem
    #[error("invalid submission: {0}")]
    Validation(String),

    #[error("unsupported language '{0}'")]
    UnsupportedLanguage(String),

    /// Problem is absent or inactive
    #[error("problem '{0}' not found")]
    NotFound(String),

    /// Compiler rejected the source; carries its diagnostics
    #[error("build failed: {0}")]
    BuildFailed(String),

    /// The problem cannot be scored because it has no test cases
    #[error("problem '{0}' has no test cases")]
    NoTestCases(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl JudgeError {
    /// HTTP-style status class of the error
    pub fn status_code(&self) -> u16 {
        match self {
            JudgeError::Validation(_)
            | JudgeError::UnsupportedLanguage(_)
            | JudgeError::BuildFailed(_) => 400,
            JudgeError::NotFound(_) => 404,
            JudgeError::NoTestCases(_) | JudgeError::Internal(_) => 500,
        }
    }
}

impl From<RepositoryError> for JudgeError {
    fn from(e: RepositoryError) -> Self {
        match e {
            // No problem can exist under an id the store cannot address
            RepositoryError::InvalidId(id) => JudgeError::NotFound(id),
            other => JudgeError::Internal(other.to_string()),
        }
    }
}

impl From<WorkspaceError> for JudgeError {
    fn from(e: WorkspaceError) -> Self {
        JudgeError::Internal(e.to_string())
    }
}

impl From<BuildError> for JudgeError {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::Failed { diagnostic } => JudgeError::BuildFailed(diagnostic),
            BuildError::Workspace(e) => e.into(),
            other => JudgeError::BuildFailed(other.to_string()),
        }
    }
}

/// Stages of a judging call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeStage {
    Validating,
    Building,
    Evaluating,
    Scoring,
    Cleanup,
    Done,
    Aborted,
}

/// The judging engine
///
/// Independent calls may run concurrently; each gets its own workspace.
#[derive(Debug)]
pub struct Judge<R> {
    runner: Runner,
    workspaces: WorkspaceManager,
    problems: R,
}

impl<R: ProblemRepository> Judge<R> {
    /// Create a judge reading problems from `problems`
    pub fn new(config: Config, problems: R) -> Self {
        let workspaces =
            WorkspaceManager::new(config.workspace_root(), config.max_concurrent_judges);
        Self {
            runner: Runner::new(config),
            workspaces,
            problems,
        }
    }

    pub fn config(&self) -> &Config {
        self.runner.config()
    }

    pub fn problems(&self) -> &R {
        &self.problems
    }

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    /// Judge `source_code` in `language` against a problem
    pub async fn judge_parts(
        &self,
        problem_id: &str,
        source_code: &str,
        language: &str,
    ) -> Result<JudgeResult, JudgeError> {
        self.judge(&SubmissionRequest::new(problem_id, source_code, language))
            .await
    }

    /// Judge a submission
    #[instrument(
        skip_all,
        fields(problem_id = %request.problem_id, language = %request.language)
    )]
    pub async fn judge(&self, request: &SubmissionRequest) -> Result<JudgeResult, JudgeError> {
        enter(JudgeStage::Validating);
        let (problem, language) = match self.validate(request).await {
            Ok(validated) => validated,
            Err(e) => return Err(abort(e)),
        };

        enter(JudgeStage::Building);
        let mut workspace = match self.workspaces.acquire().await {
            Ok(workspace) => workspace,
            Err(e) => return Err(abort(e.into())),
        };

        let result = self
            .build_and_evaluate(&workspace, &problem, language, request)
            .await;

        enter(JudgeStage::Cleanup);
        if let Err(e) = workspace.release().await {
            warn!(error = %e, "workspace cleanup failed");
        }

        match result {
            Ok(result) => {
                enter(JudgeStage::Done);
                info!(
                    score = result.score(),
                    passed = result.passed_count(),
                    total = result.total_count(),
                    execution_time_ms = result.execution_time_ms(),
                    "submission judged"
                );
                Ok(result)
            }
            Err(e) => Err(abort(e)),
        }
    }

    /// Check the request and resolve the problem and language
    async fn validate(
        &self,
        request: &SubmissionRequest,
    ) -> Result<(Problem, &Language), JudgeError> {
        for (field, value) in [
            ("problemId", &request.problem_id),
            ("sourceCode", &request.source_code),
            ("language", &request.language),
        ] {
            if value.trim().is_empty() {
                return Err(JudgeError::Validation(format!("{field} is required")));
            }
        }

        let problem = self
            .problems
            .find(&request.problem_id)
            .await?
            .filter(|p| p.active)
            .ok_or_else(|| JudgeError::NotFound(request.problem_id.clone()))?;

        if !self.is_allowed(&problem, &request.language) {
            return Err(JudgeError::Validation(format!(
                "language '{}' is not allowed for this problem",
                request.language
            )));
        }

        let language = self
            .runner
            .language(&request.language)
            .map_err(|_| JudgeError::UnsupportedLanguage(request.language.clone()))?;

        if problem.total_test_cases() == 0 {
            return Err(JudgeError::NoTestCases(problem.id.clone()));
        }

        Ok((problem, language))
    }

    /// Whether the problem's allow-list admits `language`, comparing
    /// case-insensitively and through configured aliases
    fn is_allowed(&self, problem: &Problem, language: &str) -> bool {
        let config = self.runner.config();
        let requested = config.canonical_id(language);
        problem.allowed_languages.iter().any(|allowed| {
            allowed.trim().eq_ignore_ascii_case(language.trim())
                || (requested.is_some() && config.canonical_id(allowed) == requested)
        })
    }

    async fn build_and_evaluate(
        &self,
        workspace: &Workspace,
        problem: &Problem,
        language: &Language,
        request: &SubmissionRequest,
    ) -> Result<JudgeResult, JudgeError> {
        let report = self
            .runner
            .build(workspace, language, request.source_code.as_bytes())
            .await?;
        if report.compiled {
            debug!(
                elapsed_ms = report.elapsed.as_millis() as u64,
                warnings = !report.output.is_empty(),
                "build succeeded"
            );
        }

        enter(JudgeStage::Evaluating);
        let limits = RunLimits {
            time_limit: self.runner.config().time_limit_for(problem),
            memory_limit_mb: problem.memory_limit_mb,
        };
        let samples = self
            .runner
            .evaluate(workspace, language, &problem.sample_test_cases, limits)
            .await;
        let hidden = self
            .runner
            .evaluate(workspace, language, &problem.hidden_test_cases, limits)
            .await;

        enter(JudgeStage::Scoring);
        let execution_time_ms = (samples.total_time + hidden.total_time).as_millis() as u64;
        let peak_memory_kb = match (samples.peak_memory_kb, hidden.peak_memory_kb) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let memory_used_mb = peak_memory_kb.map(|kb| kb as f64 / 1024.0);

        Ok(JudgeResult::new(
            samples.results,
            hidden.results,
            execution_time_ms,
            memory_used_mb,
        ))
    }
}

fn enter(stage: JudgeStage) {
    debug!(?stage, "judging stage");
}

fn abort(error: JudgeError) -> JudgeError {
    info!(
        stage = ?JudgeStage::Aborted,
        status = error.status_code(),
        error = %error,
        "judging aborted"
    );
    error
}
