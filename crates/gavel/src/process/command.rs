//! Command builder for external processes

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;

/// Timeout used when none is set explicitly
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(15_000);

/// Builder describing one external process invocation
#[derive(Debug, Clone)]
pub struct ProcessCommand {
    /// Program followed by its arguments
    argv: Vec<String>,
    working_dir: Option<PathBuf>,
    env: HashMap<String, String>,
    /// Full payload written to stdin before it is closed
    stdin: Vec<u8>,
    timeout: Duration,
}

impl ProcessCommand {
    /// Create a command from a program and its arguments
    pub fn new(argv: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            argv: argv.into_iter().map(Into::into).collect(),
            working_dir: None,
            env: HashMap::new(),
            stdin: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the working directory
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Set an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set multiple environment variables
    pub fn envs<'a>(mut self, vars: impl IntoIterator<Item = (&'a String, &'a String)>) -> Self {
        self.env
            .extend(vars.into_iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// Set the stdin payload
    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = data.into();
        self
    }

    /// Set the wall-clock timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The program being run, if any
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn get_working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Split into the tokio command and the stdin payload
    ///
    /// Returns `None` for an empty command line.
    pub(crate) fn into_parts(self) -> Option<(Command, Vec<u8>, Duration)> {
        let program = self.argv.first()?;
        let mut command = Command::new(program);
        command.args(&self.argv[1..]).envs(&self.env);
        if let Some(ref dir) = self.working_dir {
            command.current_dir(dir);
        }
        Some((command, self.stdin, self.timeout))
    }
}
