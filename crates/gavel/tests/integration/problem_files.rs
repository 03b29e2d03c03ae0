use gavel::{DirectoryProblems, Judge, JudgeError};

use super::{leftover_workspaces, sh_config};

const ADD_TOML: &str = r#"
title = "Add"
time_limit_ms = 2000
allowed_languages = ["sh"]

[[sample_test_cases]]
input = "1 2"
expected_output = "3"

[[hidden_test_cases]]
input = "40 2"
expected_output = "42"
"#;

#[tokio::test]
async fn judges_problem_loaded_from_directory() {
    let problems_dir = tempfile::tempdir().unwrap();
    std::fs::write(problems_dir.path().join("add.toml"), ADD_TOML).unwrap();
    let root = tempfile::tempdir().unwrap();
    let judge = Judge::new(sh_config(root.path()), DirectoryProblems::new(problems_dir.path()));

    let result = judge
        .judge_parts("add", "read a b; echo $((a + b))", "sh")
        .await
        .unwrap();

    assert_eq!(result.total_count(), 2);
    assert_eq!(result.score(), 100);
    assert_eq!(leftover_workspaces(root.path()), 0);
}

#[tokio::test]
async fn inactive_problem_file_is_not_found() {
    let problems_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        problems_dir.path().join("old.toml"),
        format!("active = false\n{ADD_TOML}"),
    )
    .unwrap();
    let root = tempfile::tempdir().unwrap();
    let judge = Judge::new(sh_config(root.path()), DirectoryProblems::new(problems_dir.path()));

    let err = judge.judge_parts("old", "cat", "sh").await.unwrap_err();
    assert!(matches!(err, JudgeError::NotFound(_)));
}
