use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const QUIZ: &str = r#"{
    "title": "Arithmetic",
    "subtitle": "Warm-up",
    "questions": [
        { "question": "What is 2 + 2?", "options": ["3", "4", "5"], "correct": 2 },
        { "question": "<b>Unsafe</b>", "options": ["a", "b"], "correct": 1 },
        { "question": "No options", "options": [], "correct": 1 }
    ]
}"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(quiz: &str, answers: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("quiz.json"), quiz).unwrap();
        fs::write(dir.path().join("answers.txt"), answers).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_quiz"))
            .current_dir(self.dir.path())
            .env_remove("RUST_LOG")
            .args(["--mode", "file", "--logging-enabled", "false"])
            .args(["--config", path_str(&self.path("config.json"))])
            .args(["--quiz-file", path_str(&self.path("quiz.json"))])
            .args(["--input-file", path_str(&self.path("answers.txt"))])
            .args(["--output-file", path_str(&self.path("transcript.txt"))])
            .args(extra)
            .output()
            .unwrap()
    }

    fn transcript(&self) -> String {
        fs::read_to_string(self.path("transcript.txt")).unwrap()
    }
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn completed_quiz_writes_transcript() {
    let workspace = Workspace::new(QUIZ, "help\n2\n");
    let output = workspace.run(&[]);

    assert!(output.status.success(), "{output:?}");
    let transcript = workspace.transcript();
    assert!(transcript.starts_with("=== Arithmetic ===\nWarm-up\n"));
    assert!(transcript.contains("Your answer (or command): help\nAvailable commands:"));
    assert!(transcript.contains("Correct!"));
    assert!(transcript.contains("Your score: 1/1"));
    assert!(!transcript.contains("Unsafe"));
}

#[test]
fn replace_policy_keeps_sanitized_question() {
    let workspace = Workspace::new(QUIZ, "1\n1\n");
    let output = workspace.run(&["--sanitization-policy", "replace"]);

    assert!(output.status.success(), "{output:?}");
    let transcript = workspace.transcript();
    assert!(transcript.contains("?b?Unsafe?/b?"));
    assert!(transcript.contains("/2"));
}

#[test]
fn quiz_length_caps_questions() {
    let workspace = Workspace::new(QUIZ, "2\n");
    let output = workspace.run(&["--sanitization-policy", "remove", "--quiz-length", "1"]);

    assert!(output.status.success(), "{output:?}");
    assert!(workspace.transcript().contains("Your score: 1/1"));
}

#[test]
fn quit_exits_cleanly_without_results() {
    let workspace = Workspace::new(QUIZ, "q\n");
    let output = workspace.run(&[]);

    assert!(output.status.success(), "{output:?}");
    let transcript = workspace.transcript();
    assert!(transcript.contains("Exiting quiz."));
    assert!(!transcript.contains("Quiz Completed!"));
}

#[test]
fn exhausted_answers_fail() {
    let workspace = Workspace::new(QUIZ, "7\n");
    let output = workspace.run(&[]);

    assert!(!output.status.success());
    assert!(workspace.transcript().contains("Invalid option number. Please try again."));
}

#[test]
fn malformed_quiz_fails_before_session() {
    let workspace = Workspace::new("{ \"questions\": [", "1\n");
    let output = workspace.run(&[]);

    assert!(!output.status.success());
    assert_eq!(workspace.transcript(), "");
}

#[test]
fn missing_quiz_file_fails() {
    let workspace = Workspace::new(QUIZ, "1\n");
    fs::remove_file(workspace.path("quiz.json")).unwrap();
    let output = workspace.run(&[]);

    assert!(!output.status.success());
}

#[test]
fn config_file_supplies_policy() {
    let workspace = Workspace::new(QUIZ, "1\n1\n");
    fs::write(
        workspace.path("config.json"),
        r#"{ "sanitization_policy": "remove" }"#,
    )
    .unwrap();
    let output = workspace.run(&[]);

    assert!(output.status.success(), "{output:?}");
    assert!(workspace.transcript().contains(": Unsafe\n"));
}
