use gavel::{InMemoryProblems, Judge, JudgeError, TestCase};

use super::{leftover_workspaces, problem, sh_judge};

#[tokio::test]
async fn syntax_error_is_a_request_level_build_failure() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem(
            "echo",
            &["shc"],
            vec![TestCase::new("x", "x")],
            vec![TestCase::new("y", "y")],
        )],
    );

    let err = judge
        .judge_parts("echo", "if then fi (", "shc")
        .await
        .unwrap_err();

    match err {
        JudgeError::BuildFailed(ref diagnostic) => assert!(!diagnostic.trim().is_empty()),
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert_eq!(err.status_code(), 400);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn missing_compiler_is_a_build_failure_with_hint() {
    let root = tempfile::tempdir().unwrap();
    let mut config = super::sh_config(root.path());
    config
        .languages
        .get_mut("shc")
        .and_then(|lang| lang.compile.as_mut())
        .unwrap()
        .command = vec!["gavel-no-such-compiler".to_owned(), "{source}".to_owned()];
    let problems: InMemoryProblems =
        [problem("echo", &["shc"], vec![TestCase::new("x", "x")], vec![])]
            .into_iter()
            .collect();
    let judge = Judge::new(config, problems);

    let err = judge.judge_parts("echo", "cat", "shc").await.unwrap_err();

    match err {
        JudgeError::BuildFailed(ref message) => {
            assert!(message.contains("gavel-no-such-compiler"), "{message}")
        }
        other => panic!("expected BuildFailed, got {other:?}"),
    }
    assert_eq!(leftover_workspaces(root.path()), 0);
}
