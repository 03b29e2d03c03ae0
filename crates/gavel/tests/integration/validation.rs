use gavel::{JudgeError, Problem, SubmissionRequest, TestCase};

use super::{leftover_workspaces, problem, sh_judge};

#[tokio::test]
async fn disallowed_language_is_a_validation_error() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("echo", &["shc"], vec![TestCase::new("x", "x")], vec![])],
    );

    let err = judge.judge_parts("echo", "cat", "sh").await.unwrap_err();

    assert!(matches!(err, JudgeError::Validation(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn missing_source_is_rejected() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(
        root.path(),
        [problem("echo", &["sh"], vec![TestCase::new("x", "x")], vec![])],
    );

    let request = SubmissionRequest {
        problem_id: "echo".to_owned(),
        language: "sh".to_owned(),
        source_code: String::new(),
    };
    let err = judge.judge(&request).await.unwrap_err();
    assert!(matches!(err, JudgeError::Validation(ref m) if m.contains("sourceCode")));
}

#[tokio::test]
async fn unknown_problem_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let judge = sh_judge(root.path(), Vec::<Problem>::new());

    let err = judge.judge_parts("ghost", "cat", "sh").await.unwrap_err();
    assert_eq!(err.status_code(), 404);
}
