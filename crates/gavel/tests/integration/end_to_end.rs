use gavel::{CaseStatus, TestCase};

use super::{leftover_workspaces, problem, sh_judge};

#[tokio::test]
async fn echo_passes_with_full_score() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("echo", &["sh"], vec![TestCase::new("hello", "hello")], vec![])],
    );

    let result = judge.judge_parts("echo", "cat", "sh").await.unwrap();

    assert_eq!(result.sample_results().len(), 1);
    assert!(result.sample_results()[0].passed);
    assert_eq!(result.sample_results()[0].actual_output, "hello");
    assert_eq!(result.score(), 100);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn crlf_output_is_tolerated() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("five", &["sh"], vec![TestCase::new("", "5\n")], vec![])],
    );

    let result = judge
        .judge_parts("five", r"printf '5\r\n'", "sh")
        .await
        .unwrap();

    assert!(result.sample_results()[0].passed);
    assert_eq!(result.score(), 100);
}

#[tokio::test]
async fn results_follow_test_case_order() {
    let root = tempfile::tempdir().unwrap();
    let samples = vec![
        TestCase::new("1", "1"),
        TestCase::new("2", "wrong"),
        TestCase::new("3", "3"),
    ];
    let hidden = vec![TestCase::new("4", "4"), TestCase::new("5", "nope")];
    let judge = sh_judge(
        root.path(),
        [problem("order", &["sh"], samples.clone(), hidden.clone())],
    );

    let result = judge.judge_parts("order", "cat", "sh").await.unwrap();

    for (case, result) in samples.iter().zip(result.sample_results()) {
        assert_eq!(case.input, result.input);
        assert_eq!(case.expected_output, result.expected_output);
    }
    for (case, result) in hidden.iter().zip(result.hidden_results()) {
        assert_eq!(case.input, result.input);
    }
    let passed: Vec<_> = result.all_results().map(|r| r.passed).collect();
    assert_eq!(passed, vec![true, false, true, true, false]);
    assert_eq!(result.score(), 60);
    assert_eq!(result.score(), result.recompute_score());
}

#[tokio::test]
async fn runtime_error_does_not_stop_later_cases() {
    let root = tempfile::tempdir().unwrap();
    let source = r#"read n
if [ "$n" = "0" ]; then echo "division by zero" >&2; exit 3; fi
echo "$n""#;
    let judge = sh_judge(
        root.path(),
        [problem(
            "div",
            &["sh"],
            vec![TestCase::new("0", "0")],
            vec![TestCase::new("7", "7")],
        )],
    );

    let result = judge.judge_parts("div", source, "sh").await.unwrap();

    let failed = &result.sample_results()[0];
    assert!(!failed.passed);
    assert_eq!(failed.status, CaseStatus::RuntimeError);
    assert_eq!(failed.actual_output.trim(), "division by zero");
    assert!(result.hidden_results()[0].passed);
    assert_eq!(result.score(), 50);
}

#[tokio::test]
async fn silent_runtime_error_reports_generic_diagnostic() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("fail", &["sh"], vec![TestCase::new("", "1")], vec![])],
    );

    let result = judge.judge_parts("fail", "exit 1", "sh").await.unwrap();

    assert_eq!(result.sample_results()[0].actual_output, "Error");
    assert_eq!(result.score(), 0);
}

#[tokio::test]
async fn compiled_language_builds_once_and_runs_every_case() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem(
            "double",
            &["shc"],
            vec![TestCase::new("2", "4")],
            vec![TestCase::new("21", "42")],
        )],
    );

    let result = judge
        .judge_parts("double", "read n; echo $((n * 2))", "shc")
        .await
        .unwrap();

    assert_eq!(result.score(), 100);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn language_aliases_are_accepted() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("echo", &["sh"], vec![TestCase::new("x", "x")], vec![])],
    );

    let result = judge.judge_parts("echo", "cat", "SHELL").await.unwrap();
    assert_eq!(result.score(), 100);
}
