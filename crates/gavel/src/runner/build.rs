//! Build step for submissions
//!
//! Writes the source into the workspace and, for compiled languages, runs the
//! compiler there.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::config::{Language, Strategy};
use crate::process::{self, ProcessCommand};
use crate::runner::BuildError;
use crate::types::ProcessOutcome;
use crate::workspace::Workspace;

/// Summary of a successful build step
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Whether a compiler actually ran
    pub compiled: bool,

    /// Wall-clock time spent compiling
    pub elapsed: Duration,

    /// Compiler output, kept for warnings
    pub output: String,
}

/// Write the source and build it if the language needs a build step
#[instrument(skip(workspace, language, source), fields(language = %language.name))]
pub async fn build(
    workspace: &Workspace,
    language: &Language,
    source: &[u8],
) -> Result<BuildReport, BuildError> {
    let source_name = language.source_name();
    workspace.write_file(&source_name, source).await?;
    debug!(source_name, "wrote source file");

    let compile = match language.strategy() {
        Strategy::Interpreted => {
            return Ok(BuildReport {
                compiled: false,
                elapsed: Duration::ZERO,
                output: String::new(),
            });
        }
        Strategy::Compiled { build } => build,
    };

    let argv =
        Language::expand_command(&compile.command, &compile.source_name, &compile.output_name);
    let program = argv.first().cloned().unwrap_or_default();
    let timeout = Duration::from_millis(compile.timeout_ms);

    let command = ProcessCommand::new(argv)
        .working_dir(workspace.path())
        .envs(&compile.env)
        .timeout(timeout);
    let outcome = process::run(command).await;

    debug!(
        exited_normally = outcome.exited_normally,
        exit_code = ?outcome.exit_code,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "compilation complete"
    );

    if !outcome.started {
        return Err(BuildError::ToolchainMissing {
            program,
            message: outcome.stderr,
        });
    }
    if outcome.timed_out {
        return Err(BuildError::TimedOut {
            timeout_ms: compile.timeout_ms,
        });
    }
    if !outcome.exited_normally {
        return Err(BuildError::Failed {
            diagnostic: compiler_diagnostic(&outcome, &program),
        });
    }

    Ok(BuildReport {
        compiled: true,
        elapsed: outcome.elapsed,
        output: compiler_output(&outcome),
    })
}

/// Compiler stdout and stderr joined, the way compilers are usually read
fn compiler_output(outcome: &ProcessOutcome) -> String {
    let mut output = outcome.stdout.trim_end().to_owned();
    let stderr = outcome.stderr.trim_end();
    if !output.is_empty() && !stderr.is_empty() {
        output.push('\n');
    }
    output.push_str(stderr);
    output
}

/// The message surfaced for a failed build
///
/// Prefers stderr, then stdout, then a hint that the toolchain may be missing.
fn compiler_diagnostic(outcome: &ProcessOutcome, program: &str) -> String {
    if let Some(stderr) = outcome.diagnostic() {
        return stderr.to_owned();
    }
    if !outcome.stdout.trim().is_empty() {
        return outcome.stdout.clone();
    }
    let status = outcome
        .exit_code
        .map_or_else(|| "abnormally".to_owned(), |code| format!("with code {code}"));
    format!(
        "compiler exited {status} without diagnostics; is the '{program}' toolchain installed?"
    )
}
