mod common;

use common::{manifest, run_hook, temp_project, write_file};
use std::fs;

#[test]
fn empty_project_prints_nothing() {
    let project = temp_project();
    let (code, stdout, stderr) = run_hook(&["session-start"], "", project.path());
    assert_eq!(code, 0);
    assert!(stdout.is_empty(), "expected no stdout, got: {stdout}");
    assert!(stderr.is_empty());
}

#[test]
fn resets_log_and_manifest() {
    let project = temp_project();
    write_file(project.path(), ".claude/.modified-files.log", "2024-01-01T00:00:00.000Z src/a.ts\n");
    write_file(
        project.path(),
        ".claude/.change-manifest.json",
        r#"{"sessionStart": "2024-01-01T00:00:00Z", "files": {"src/a.ts": {"lastModified": "2024-01-01T00:00:00Z", "type": "source", "tested": false, "editCount": 4}}}"#,
    );

    let (code, _, _) = run_hook(&["session-start"], "", project.path());
    assert_eq!(code, 0);

    let log = fs::read_to_string(project.path().join(".claude/.modified-files.log")).unwrap();
    assert!(log.is_empty());
    let manifest = manifest(project.path());
    assert_eq!(manifest["files"], serde_json::json!({}));
    assert_ne!(manifest["sessionStart"], "2024-01-01T00:00:00Z");
}

#[test]
fn reports_stack_from_package_json() {
    let project = temp_project();
    write_file(
        project.path(),
        "package.json",
        r#"{"dependencies": {"react": "^18.0.0"}, "devDependencies": {"vitest": "^1.0.0"}}"#,
    );
    let (_, stdout, _) = run_hook(&["session-start"], "", project.path());
    assert_eq!(stdout.trim_end(), "[Session] Project stack: React, Vitest");
}

#[test]
fn reports_plans_then_stack_then_profile() {
    let project = temp_project();
    write_file(project.path(), ".claude/plans/auth-checklist.md", "- [ ] a\n");
    write_file(project.path(), ".claude/plans/roadmap.md", "");
    write_file(project.path(), "go.mod", "module x\nrequire github.com/gin-gonic/gin v1.9.0\n");
    write_file(
        project.path(),
        ".claude/project-profile.json",
        r#"{"sessionCount": 3, "activeLanguages": {"Go": 9, "SQL": 2}, "conventions": {"testStyle": "co-located .test files"}}"#,
    );

    let (code, stdout, _) = run_hook(&["session-start"], "", project.path());
    assert_eq!(code, 0);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "[Session] Active checklists found: auth-checklist.md. Review them to continue previous work.",
            "[Session] Project stack: Go, Gin",
            "[Session] Learned conventions: testStyle: co-located .test files",
            "[Session] Most active languages (3 sessions): Go, SQL",
        ]
    );
}

#[test]
fn corrupt_profile_is_skipped() {
    let project = temp_project();
    write_file(project.path(), ".claude/project-profile.json", "{broken");
    write_file(project.path(), "Dockerfile", "FROM alpine");
    let (code, stdout, stderr) = run_hook(&["session-start"], "", project.path());
    assert_eq!(code, 0);
    assert!(stderr.is_empty());
    assert_eq!(stdout.trim_end(), "[Session] Project stack: Docker");
}
