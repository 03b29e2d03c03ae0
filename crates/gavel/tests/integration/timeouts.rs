use std::time::{Duration, Instant};

use gavel::{CaseStatus, TestCase};

use super::{leftover_workspaces, problem, sh_judge};

#[tokio::test]
async fn sleeping_program_exceeds_time_limit() {
    let root = tempfile::tempdir().unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let pid_file = scratch.path().join("pid");

    let mut slow = problem(
        "slow",
        &["sh"],
        vec![TestCase::new("", "done")],
        vec![TestCase::new("", "done")],
    );
    slow.time_limit_ms = Some(300);
    let judge = sh_judge(root.path(), [slow]);

    let source = format!("echo $$ >> {}\nexec sleep 30", pid_file.display());
    let started = Instant::now();
    let result = judge.judge_parts("slow", &source, "sh").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(10));
    for case in result.all_results() {
        assert!(!case.passed);
        assert_eq!(case.status, CaseStatus::TimeLimitExceeded);
        assert_eq!(case.actual_output, "Time limit exceeded");
    }
    assert_eq!(result.score(), 0);
    assert_eq!(leftover_workspaces(root.path()), 0);

    // Every run was killed and reaped: nothing left in the process table
    if cfg!(target_os = "linux") {
        let pids = std::fs::read_to_string(&pid_file).unwrap();
        assert_eq!(pids.lines().count(), 2);
        for pid in pids.lines() {
            let proc_dir = std::path::Path::new("/proc").join(pid.trim());
            assert!(!proc_dir.exists(), "process {pid} survived the time limit");
        }
    }
}

#[tokio::test]
async fn fast_cases_pass_alongside_a_timeout() {
    let root = tempfile::tempdir().unwrap();
    let mut mixed = problem(
        "mixed",
        &["sh"],
        vec![TestCase::new("fast", "fast"), TestCase::new("slow", "slow")],
        vec![],
    );
    mixed.time_limit_ms = Some(300);
    let judge = sh_judge(root.path(), [mixed]);

    let source = r#"read mode
if [ "$mode" = "slow" ]; then sleep 30; fi
echo "$mode""#;
    let result = judge.judge_parts("mixed", source, "sh").await.unwrap();

    assert!(result.sample_results()[0].passed);
    assert_eq!(
        result.sample_results()[1].status,
        CaseStatus::TimeLimitExceeded
    );
    assert_eq!(result.score(), 50);
}
