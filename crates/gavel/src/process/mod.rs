//! Running external processes
//!
//! Spawns exactly one child per call, feeds it the full stdin payload up
//! front, captures stdout and stderr, and enforces a wall-clock timeout. On
//! Unix the child leads its own process group, and the whole group is
//! SIGKILLed on timeout so no descendant outlives the call.

use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};

pub use crate::process::command::{DEFAULT_TIMEOUT, ProcessCommand};
use crate::types::{ProcessOutcome, TIME_LIMIT_EXCEEDED};

mod command;

/// How often peak memory is sampled while a process runs
const MEMORY_SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

/// How long to wait for output pipes to close after the child is gone
const OUTPUT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Run a command to completion or timeout
///
/// Never fails: a process that cannot be started yields an outcome with
/// `started == false` and the system error as its diagnostic.
#[instrument(skip(command), fields(program = command.program().unwrap_or_default()))]
pub async fn run(command: ProcessCommand) -> ProcessOutcome {
    let Some((mut cmd, stdin_data, timeout)) = command.into_parts() else {
        return ProcessOutcome::spawn_failed("empty command");
    };

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    cmd.process_group(0);

    let start = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(error = %e, "failed to spawn process");
            return ProcessOutcome::spawn_failed(e.to_string());
        }
    };
    let pid = child.id();

    // Stdin is written from its own task so a child that never reads
    // cannot block output collection; dropping the handle closes the pipe.
    let stdin_task = child.stdin.take().map(|mut stdin| {
        tokio::spawn(async move {
            if let Err(e) = stdin.write_all(&stdin_data).await {
                debug!(error = %e, "stdin closed early");
            }
        })
    });
    let stdout_reader = child.stdout.take().map(OutputReader::spawn);
    let stderr_reader = child.stderr.take().map(OutputReader::spawn);

    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);
    let mut sampler = tokio::time::interval(MEMORY_SAMPLE_INTERVAL);
    let mut peak_memory_kb: Option<u64> = None;

    let status = loop {
        tokio::select! {
            biased;
            status = child.wait() => break Some(status),
            () = &mut deadline => break None,
            _ = sampler.tick() => {
                if let Some(kb) = pid.and_then(sample_peak_rss) {
                    peak_memory_kb = Some(peak_memory_kb.map_or(kb, |peak| peak.max(kb)));
                }
            }
        }
    };

    let timed_out = status.is_none();
    if timed_out {
        debug!(?timeout, "time limit exceeded, killing process");
    }
    // Kill the group even after a normal exit, taking down any stragglers
    // the program left behind
    terminate(&mut child, pid).await;
    let elapsed = start.elapsed();

    if let Some(task) = stdin_task {
        task.abort();
    }
    let (stdout, stderr) = tokio::join!(drain(stdout_reader), drain(stderr_reader));

    let mut outcome = ProcessOutcome {
        exited_normally: false,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        timed_out,
        started: true,
        exit_code: None,
        elapsed,
        peak_memory_kb,
    };

    match status {
        None => {
            if outcome.stderr.trim().is_empty() {
                outcome.stderr = TIME_LIMIT_EXCEEDED.to_owned();
            }
        }
        Some(Ok(status)) => {
            outcome.exited_normally = status.success();
            outcome.exit_code = status.code();
            if !status.success()
                && outcome.stderr.trim().is_empty()
                && let Some(description) = describe_abnormal_exit(status)
            {
                outcome.stderr = description;
            }
        }
        Some(Err(e)) => {
            warn!(error = %e, "failed to wait for process");
            if outcome.stderr.trim().is_empty() {
                outcome.stderr = e.to_string();
            }
        }
    }

    debug!(
        exited_normally = outcome.exited_normally,
        exit_code = ?outcome.exit_code,
        timed_out = outcome.timed_out,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        peak_memory_kb = ?outcome.peak_memory_kb,
        "process finished"
    );

    outcome
}

/// Background task collecting one output pipe
///
/// The bytes read so far survive a stop request, so a pipe held open by a
/// stray descendant costs at most the drain timeout, never the output.
struct OutputReader {
    task: JoinHandle<Vec<u8>>,
    stop: oneshot::Sender<()>,
}

impl OutputReader {
    fn spawn<R: AsyncRead + Unpin + Send + 'static>(reader: R) -> Self {
        let (stop, stopped) = oneshot::channel();
        Self {
            task: tokio::spawn(read_until_stopped(reader, stopped)),
            stop,
        }
    }
}

async fn read_until_stopped<R: AsyncRead + Unpin>(
    mut reader: R,
    mut stopped: oneshot::Receiver<()>,
) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        tokio::select! {
            read = reader.read(&mut chunk) => match read {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                // On a read error keep whatever arrived before it
                Err(_) => break,
            },
            _ = &mut stopped => break,
        }
    }
    buf
}

async fn drain(reader: Option<OutputReader>) -> Vec<u8> {
    let Some(OutputReader { mut task, stop }) = reader else {
        return Vec::new();
    };
    let joined = match tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut task).await {
        Ok(joined) => joined,
        Err(_) => {
            warn!("output pipe still open after process exit, keeping what was read");
            let _ = stop.send(());
            task.await
        }
    };
    match joined {
        Ok(buf) => buf,
        Err(e) => {
            warn!(error = %e, "output reader task failed");
            Vec::new()
        }
    }
}

/// Forcibly kill the child (and its process group) and reap it
async fn terminate(child: &mut Child, pid: Option<u32>) {
    if let Some(pid) = pid {
        kill_process_group(pid);
    }

    if let Err(e) = child.start_kill()
        && e.kind() != std::io::ErrorKind::InvalidInput
    {
        debug!(error = %e, "kill after exit");
    }
    if let Err(e) = child.wait().await {
        warn!(error = %e, "failed to reap process");
    }
}

#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pgid) = i32::try_from(pid) else {
        return;
    };
    match killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => warn!(pid, error = %e, "failed to kill process group"),
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: u32) {}

#[cfg(unix)]
fn describe_abnormal_exit(status: ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map(|signal| format!("Process terminated by signal {signal}"))
}

#[cfg(not(unix))]
fn describe_abnormal_exit(_status: ExitStatus) -> Option<String> {
    None
}

#[cfg(target_os = "linux")]
fn sample_peak_rss(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{pid}/status")).ok()?;
    parse_vm_hwm(&status)
}

#[cfg(not(target_os = "linux"))]
fn sample_peak_rss(_pid: u32) -> Option<u64> {
    None
}

/// Extract the `VmHWM` (peak RSS) value in kilobytes from `/proc/<pid>/status`
fn parse_vm_hwm(status: &str) -> Option<u64> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("VmHWM:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse().ok())
}
