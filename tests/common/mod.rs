#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run the binary with `args`, piping `stdin`. Logs go to a directory inside
/// `project` so tests never touch the real home directory.
pub fn run_hook(args: &[&str], stdin: &str, project: &Path) -> (i32, String, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hookwarden"));
    command
        .args(args)
        .arg("--project-dir")
        .arg(project)
        .env("HOOKWARDEN_LOG_DIR", project.join(".claude").join("logs"));
    spawn(command, stdin)
}

/// Like [`run_hook`] but without `--project-dir`, for tests that exercise
/// project-directory resolution themselves.
pub fn run_hook_bare(args: &[&str], stdin: &str, log_dir: &Path) -> (i32, String, String) {
    let mut command = Command::new(env!("CARGO_BIN_EXE_hookwarden"));
    command.args(args).env("HOOKWARDEN_LOG_DIR", log_dir);
    spawn(command, stdin)
}

fn spawn(mut command: Command, stdin: &str) -> (i32, String, String) {
    let mut child = command
        .env_remove("CLAUDE_PROJECT_DIR")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn binary");

    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();

    let output = child.wait_with_output().unwrap();
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

pub fn temp_project() -> tempfile::TempDir {
    tempfile::tempdir().unwrap()
}

/// Fields every host payload carries.
pub fn common(cwd: &Path) -> String {
    let session_id = uuid::Uuid::new_v4();
    format!(
        r#"
    "session_id": "{session_id}",
    "transcript_path": "/tmp/t.jsonl",
    "cwd": "{}",
    "permission_mode": "default"
"#,
        cwd.display()
    )
}

pub fn bash_event(cwd: &Path, command: &str) -> String {
    let common = common(cwd);
    let command = serde_json::to_string(command).unwrap();
    format!(
        r#"{{ {common},
            "hook_event_name": "PreToolUse",
            "tool_name": "Bash",
            "tool_input": {{ "command": {command} }}
        }}"#
    )
}

pub fn file_event(cwd: &Path, event_name: &str, file_path: &str) -> String {
    let common = common(cwd);
    let file_path = serde_json::to_string(file_path).unwrap();
    format!(
        r#"{{ {common},
            "hook_event_name": "{event_name}",
            "tool_name": "Write",
            "tool_input": {{ "file_path": {file_path}, "content": "" }}
        }}"#
    )
}

pub fn write_file(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

pub fn manifest(project: &Path) -> serde_json::Value {
    read_json(&project.join(".claude/.change-manifest.json"))
}

/// `additionalContext` from a `hookSpecificOutput` payload on stdout.
pub fn additional_context(stdout: &str, event_name: &str) -> String {
    let output: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let specific = &output["hookSpecificOutput"];
    assert_eq!(specific["hookEventName"], event_name, "unexpected payload: {stdout}");
    specific["additionalContext"].as_str().unwrap().to_string()
}
