//! Test case evaluation
//!
//! Runs the built program once per test case, strictly in order, and turns
//! each process outcome into a verdict.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::compare::{compare, normalize};
use crate::config::Language;
use crate::process::{self, ProcessCommand};
use crate::types::{CaseStatus, GENERIC_ERROR, ProcessOutcome, TestCase, TestCaseResult};
use crate::workspace::Workspace;

/// Limits applied to every run of one submission
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    /// Wall-clock limit per run
    pub time_limit: Duration,

    /// Advisory memory limit; exceeding it is logged, not enforced
    pub memory_limit_mb: Option<u64>,
}

/// Results of evaluating one sequence of test cases
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// One result per test case, in input order
    pub results: Vec<TestCaseResult>,

    /// Sum of wall-clock time across all runs
    pub total_time: Duration,

    /// Highest peak RSS across all runs, in kilobytes
    pub peak_memory_kb: Option<u64>,
}

impl Evaluation {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }
}

/// Evaluate every test case against the program in `workspace`
#[instrument(skip_all, fields(language = %language.name, cases = cases.len()))]
pub async fn evaluate(
    workspace: &Workspace,
    language: &Language,
    cases: &[TestCase],
    limits: RunLimits,
) -> Evaluation {
    let run_command = language.run_command();
    let mut evaluation = Evaluation {
        results: Vec::with_capacity(cases.len()),
        ..Default::default()
    };

    for (index, case) in cases.iter().enumerate() {
        let command = ProcessCommand::new(run_command.iter().cloned())
            .working_dir(workspace.path())
            .envs(&language.run.env)
            .stdin(case.input.as_bytes())
            .timeout(limits.time_limit);
        let outcome = process::run(command).await;

        evaluation.total_time += outcome.elapsed;
        if let Some(kb) = outcome.peak_memory_kb {
            evaluation.peak_memory_kb = Some(evaluation.peak_memory_kb.map_or(kb, |p| p.max(kb)));
            if let Some(limit_mb) = limits.memory_limit_mb
                && kb > limit_mb.saturating_mul(1024)
            {
                warn!(index, peak_kb = kb, limit_mb, "advisory memory limit exceeded");
            }
        }

        let result = verdict(case, &outcome);
        debug!(index, status = %result.status, time_ms = result.time_ms, "test case evaluated");
        evaluation.results.push(result);
    }

    evaluation
}

/// Turn one process outcome into a test case result
pub fn verdict(case: &TestCase, outcome: &ProcessOutcome) -> TestCaseResult {
    let time_ms = outcome.elapsed.as_millis() as u64;

    if !outcome.exited_normally {
        let status = if outcome.timed_out {
            CaseStatus::TimeLimitExceeded
        } else {
            CaseStatus::RuntimeError
        };
        return TestCaseResult {
            input: case.input.clone(),
            expected_output: case.expected_output.clone(),
            actual_output: outcome.diagnostic().unwrap_or(GENERIC_ERROR).to_owned(),
            passed: false,
            status,
            time_ms,
        };
    }

    let actual_output = normalize(&outcome.stdout);
    let passed = compare(&case.expected_output, &actual_output);
    TestCaseResult {
        input: case.input.clone(),
        expected_output: case.expected_output.clone(),
        actual_output,
        passed,
        status: if passed {
            CaseStatus::Accepted
        } else {
            CaseStatus::WrongAnswer
        },
        time_ms,
    }
}
