use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Diagnostic reported for a process killed after exceeding its time limit
pub const TIME_LIMIT_EXCEEDED: &str = "Time limit exceeded";

/// Diagnostic used when a failed run produced nothing on stderr
pub const GENERIC_ERROR: &str = "Error";

/// A single test case of a problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Payload written to the program's stdin
    #[serde(default)]
    pub input: String,

    /// Output the program is expected to print
    pub expected_output: String,

    /// Human-readable explanation (only meaningful for sample cases)
    #[serde(default)]
    pub explanation: Option<String>,
}

impl TestCase {
    pub fn new(input: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            expected_output: expected_output.into(),
            explanation: None,
        }
    }
}

/// A problem as supplied by the problem repository
///
/// The engine only ever reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub id: String,

    #[serde(default)]
    pub title: String,

    /// Inactive problems cannot be judged
    #[serde(default = "default_active")]
    pub active: bool,

    /// Wall-clock limit per test case run in milliseconds
    #[serde(default)]
    pub time_limit_ms: Option<u64>,

    /// Memory limit in megabytes. Advisory only, never enforced.
    #[serde(default)]
    pub memory_limit_mb: Option<u64>,

    /// Language identifiers accepted for this problem
    #[serde(default)]
    pub allowed_languages: Vec<String>,

    #[serde(default)]
    pub sample_test_cases: Vec<TestCase>,

    #[serde(default)]
    pub hidden_test_cases: Vec<TestCase>,
}

fn default_active() -> bool {
    true
}

impl Problem {
    /// Number of sample and hidden test cases combined
    pub fn total_test_cases(&self) -> usize {
        self.sample_test_cases.len() + self.hidden_test_cases.len()
    }
}

/// A request to judge one piece of source code against a problem
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub problem_id: String,
    pub language: String,
    pub source_code: String,
}

impl SubmissionRequest {
    pub fn new(
        problem_id: impl Into<String>,
        source_code: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            problem_id: problem_id.into(),
            language: language.into(),
            source_code: source_code.into(),
        }
    }
}

/// Result of running one external process
#[derive(Debug, Clone, Default)]
pub struct ProcessOutcome {
    /// The process started and exited with status 0
    pub exited_normally: bool,

    /// Captured standard output (lossy UTF-8)
    pub stdout: String,

    /// Captured standard error, or the diagnostic that replaced it
    pub stderr: String,

    /// The process was killed for exceeding its time limit
    pub timed_out: bool,

    /// False if the process could not be spawned at all
    pub started: bool,

    /// Exit code if the process exited on its own
    pub exit_code: Option<i32>,

    /// Wall-clock time from spawn to exit or kill
    pub elapsed: Duration,

    /// Peak resident set size in kilobytes, if it could be sampled
    pub peak_memory_kb: Option<u64>,
}

impl ProcessOutcome {
    /// Outcome for a process that failed to start
    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self {
            stderr: message.into(),
            ..Default::default()
        }
    }

    /// The diagnostic text describing a failure, if there is any
    pub fn diagnostic(&self) -> Option<&str> {
        if self.stderr.trim().is_empty() {
            None
        } else {
            Some(&self.stderr)
        }
    }
}

/// Verdict of a single test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaseStatus {
    #[serde(rename = "AC")]
    Accepted,

    #[serde(rename = "WA")]
    WrongAnswer,

    /// Non-zero exit or failure to start
    #[serde(rename = "RE")]
    RuntimeError,

    #[serde(rename = "TLE")]
    TimeLimitExceeded,
}

impl CaseStatus {
    /// Short verdict code
    pub fn code(&self) -> &'static str {
        match self {
            CaseStatus::Accepted => "AC",
            CaseStatus::WrongAnswer => "WA",
            CaseStatus::RuntimeError => "RE",
            CaseStatus::TimeLimitExceeded => "TLE",
        }
    }
}

impl std::fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of one test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub input: String,
    pub expected_output: String,

    /// Normalized stdout, or the failure diagnostic
    pub actual_output: String,

    pub passed: bool,
    pub status: CaseStatus,

    /// Wall-clock time of the run in milliseconds
    pub time_ms: u64,
}

/// Aggregate result of judging a submission
///
/// The score is always derived from the two result sequences.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeResult {
    sample_results: Vec<TestCaseResult>,
    hidden_results: Vec<TestCaseResult>,
    score: u8,
    execution_time_ms: u64,
    memory_used_mb: Option<f64>,
}

impl JudgeResult {
    pub fn new(
        sample_results: Vec<TestCaseResult>,
        hidden_results: Vec<TestCaseResult>,
        execution_time_ms: u64,
        memory_used_mb: Option<f64>,
    ) -> Self {
        let mut result = Self {
            sample_results,
            hidden_results,
            score: 0,
            execution_time_ms,
            memory_used_mb,
        };
        result.score = result.recompute_score();
        result
    }

    pub fn sample_results(&self) -> &[TestCaseResult] {
        &self.sample_results
    }

    pub fn hidden_results(&self) -> &[TestCaseResult] {
        &self.hidden_results
    }

    /// Score in the range 0..=100
    pub fn score(&self) -> u8 {
        self.score
    }

    /// Sum of the wall-clock time of every test case run
    pub fn execution_time_ms(&self) -> u64 {
        self.execution_time_ms
    }

    /// Highest peak RSS observed across all runs
    pub fn memory_used_mb(&self) -> Option<f64> {
        self.memory_used_mb
    }

    /// Iterate over all results, samples first
    pub fn all_results(&self) -> impl Iterator<Item = &TestCaseResult> {
        self.sample_results.iter().chain(self.hidden_results.iter())
    }

    pub fn passed_count(&self) -> usize {
        self.all_results().filter(|r| r.passed).count()
    }

    pub fn total_count(&self) -> usize {
        self.sample_results.len() + self.hidden_results.len()
    }

    /// Derive the score from the result sets
    pub fn recompute_score(&self) -> u8 {
        score(self.passed_count(), self.total_count()).unwrap_or(0)
    }
}

/// `round(100 * passed / total)`, or `None` when there are no test cases
pub fn score(passed: usize, total: usize) -> Option<u8> {
    if total == 0 {
        return None;
    }
    let passed = passed.min(total) as u64;
    let total = total as u64;
    // Integer round-half-up of 100 * passed / total
    Some(((200 * passed + total) / (2 * total)) as u8)
}
