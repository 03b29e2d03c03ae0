//! Integration tests for gavel
//!
//! The default suite drives the whole engine through POSIX `sh`, configured
//! as one interpreted and one compiled language, so it only needs a Unix
//! shell. Scenarios that need real toolchains (python3, g++) are behind a
//! feature:
//!    cargo test -p gavel --features toolchain-tests

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;

use gavel::{Config, InMemoryProblems, Judge, Problem, TestCase};

mod build_failure;
mod concurrency;
mod end_to_end;
mod problem_files;
mod timeouts;
mod toolchains;
mod validation;

/// `sh` as an interpreted language and `shc` as a "compiled" one whose
/// build step is a syntax check
const SH_LANGUAGES: &str = r#"
[languages.sh]
name = "POSIX shell"
aliases = ["shell"]
extension = "sh"

[languages.sh.run]
command = ["sh", "{source}"]

[languages.shc]
name = "Checked shell"
extension = "sh"

[languages.shc.compile]
command = ["sh", "-c", "sh -n {source} && cp {source} {output}"]
source_name = "main.sh"
output_name = "prog"
timeout_ms = 5000

[languages.shc.run]
command = ["sh", "{binary}"]
"#;

/// Config with the shell languages and workspaces under `root`
pub(crate) fn sh_config(root: &Path) -> Config {
    let mut config = Config::parse_toml(SH_LANGUAGES).expect("shell languages should parse");
    config.workspace_root = Some(root.to_path_buf());
    config
}

pub(crate) fn problem(
    id: &str,
    allowed: &[&str],
    samples: Vec<TestCase>,
    hidden: Vec<TestCase>,
) -> Problem {
    Problem {
        id: id.to_owned(),
        title: id.to_owned(),
        active: true,
        time_limit_ms: Some(5000),
        memory_limit_mb: Some(256),
        allowed_languages: allowed.iter().map(|s| s.to_string()).collect(),
        sample_test_cases: samples,
        hidden_test_cases: hidden,
    }
}

/// A judge over the given problems using the shell languages
pub(crate) fn sh_judge(
    root: &Path,
    problems: impl IntoIterator<Item = Problem>,
) -> Arc<Judge<InMemoryProblems>> {
    Arc::new(Judge::new(sh_config(root), problems.into_iter().collect()))
}

/// Number of entries left under a workspace root
pub(crate) fn leftover_workspaces(root: &Path) -> usize {
    std::fs::read_dir(root).map(|dir| dir.count()).unwrap_or(0)
}
