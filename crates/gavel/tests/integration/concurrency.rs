use gavel::TestCase;

use super::{leftover_workspaces, problem, sh_judge};

/// Each program writes its own marker into a file with the same name,
/// waits, and reads it back. Shared workspaces would mix the markers.
fn marker_source(marker: &str) -> String {
    format!("echo {marker} > shared.txt\nsleep 0.3\ncat shared.txt")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_submissions_do_not_share_workspaces() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [
            problem("alpha", &["sh"], vec![TestCase::new("", "alpha")], vec![]),
            problem("beta", &["shc"], vec![TestCase::new("", "beta")], vec![]),
        ],
    );

    let a = {
        let judge = judge.clone();
        tokio::spawn(async move { judge.judge_parts("alpha", &marker_source("alpha"), "sh").await })
    };
    let b = {
        let judge = judge.clone();
        tokio::spawn(async move { judge.judge_parts("beta", &marker_source("beta"), "shc").await })
    };

    let a = a.await.unwrap().unwrap();
    let b = b.await.unwrap().unwrap();

    assert_eq!(a.sample_results()[0].actual_output, "alpha");
    assert_eq!(b.sample_results()[0].actual_output, "beta");
    assert_eq!(a.score(), 100);
    assert_eq!(b.score(), 100);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_identical_submissions_run_in_parallel() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("echo", &["sh"], vec![TestCase::new("ping", "ping")], vec![])],
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let judge = judge.clone();
            tokio::spawn(async move { judge.judge_parts("echo", "cat", "sh").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().score(), 100);
    }
    assert_eq!(judge.workspaces().available(), judge.workspaces().capacity());
    assert_eq!(leftover_workspaces(root.path()), 0);
}
