//! Scenarios against real compilers and interpreters

#![cfg(feature = "toolchain-tests")]

use gavel::{Config, InMemoryProblems, Judge, JudgeError, TestCase};

use super::problem;

fn judge(root: &std::path::Path, allowed: &[&str]) -> Judge<InMemoryProblems> {
    let mut config = Config::default();
    config.workspace_root = Some(root.to_path_buf());
    let problems: InMemoryProblems =
        [problem("echo", allowed, vec![TestCase::new("hello", "hello")], vec![])]
            .into_iter()
            .collect();
    Judge::new(config, problems)
}

#[tokio::test]
async fn python_echo_scores_full_marks() {
    let root = tempfile::tempdir().unwrap();
    let judge = judge(root.path(), &["Python"]);

    let result = judge
        .judge_parts("echo", "print(input())", "Python")
        .await
        .unwrap();

    assert!(result.sample_results()[0].passed);
    assert_eq!(result.score(), 100);
}

#[tokio::test]
async fn cpp_missing_semicolon_fails_to_build() {
    let root = tempfile::tempdir().unwrap();
    let judge = judge(root.path(), &["C++"]);
    let source = concat!(
        "#include <iostream>\n",
        "int main() { std::cout << \"hello\" << std::endl return 0; }\n",
    );

    let err = judge.judge_parts("echo", source, "C++").await.unwrap_err();

    assert!(matches!(err, JudgeError::BuildFailed(_)), "{err:?}");
}

#[tokio::test]
async fn cpp_echo_scores_full_marks() {
    let root = tempfile::tempdir().unwrap();
    let judge = judge(root.path(), &["cpp"]);
    let source = concat!(
        "#include <iostream>\n",
        "#include <string>\n",
        "int main() { std::string s; std::cin >> s; std::cout << s << \"\\n\"; }\n",
    );

    let result = judge.judge_parts("echo", source, "cpp").await.unwrap();
    assert_eq!(result.score(), 100);
}
