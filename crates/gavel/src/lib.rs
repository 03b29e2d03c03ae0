//! A library for judging untrusted submissions.
//!
//! Gavel takes source code plus a language, builds it once inside a private
//! workspace, runs it against a problem's sample and hidden test cases under a
//! wall-clock limit, and returns a verdict per test case plus a score.
//!
//! # Features
//!
//! - **Data-driven languages**: Compiled and interpreted languages configured in TOML.
//! - **Hard timeouts**: Runaway programs and their process groups are killed and reaped.
//! - **Isolated workspaces**: Concurrent submissions never share a directory.
//! - **Deterministic comparison**: Line endings and surrounding whitespace are normalized.
//!
//! Gavel does not sandbox the programs it runs: there is no namespace,
//! seccomp or cgroup isolation, and memory limits are advisory.

pub use crate::config::{Config, ConfigError, EXAMPLE_CONFIG, Language, Strategy};
pub use crate::judge::{Judge, JudgeError, JudgeStage};
pub use crate::process::ProcessCommand;
pub use crate::repository::{
    DirectoryProblems, InMemoryProblems, ProblemRepository, RepositoryError,
};
pub use crate::runner::{BuildError, BuildReport, Evaluation, RunLimits, Runner};
pub use crate::types::{
    CaseStatus, JudgeResult, Problem, ProcessOutcome, SubmissionRequest, TestCase, TestCaseResult,
};
pub use crate::workspace::{Workspace, WorkspaceError, WorkspaceManager};

pub mod compare;
pub mod config;
pub mod judge;
pub mod process;
pub mod repository;
pub mod runner;
pub mod types;
pub mod workspace;
