mod common;

use common::{additional_context, common, run_hook, temp_project, write_file};

fn pre_compact(project: &std::path::Path) -> (i32, String, String) {
    let common = common(project);
    let input = format!(
        r#"{{ {common},
            "hook_event_name": "PreCompact",
            "trigger": "auto",
            "custom_instructions": ""
        }}"#
    );
    run_hook(&["pre-compact"], &input, project)
}

#[test]
fn empty_session_prints_nothing() {
    let project = temp_project();
    let (code, stdout, stderr) = pre_compact(project.path());
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.is_empty());
}

#[test]
fn summarizes_distinct_files_and_checklists() {
    let project = temp_project();
    write_file(
        project.path(),
        ".claude/.modified-files.log",
        "2024-05-01T10:00:00.000Z src/a.ts\n\
         2024-05-01T10:01:00.000Z src/b.ts\n\
         2024-05-01T10:02:00.000Z src/a.ts\n",
    );
    write_file(project.path(), ".claude/plans/ship-checklist.md", "- [x] a\n- [x] b\n- [ ] c\n");
    write_file(project.path(), ".claude/plans/empty-checklist.md", "nothing here\n");

    let (code, stdout, _) = pre_compact(project.path());
    assert_eq!(code, 0);
    assert_eq!(
        additional_context(&stdout, "PreCompact"),
        "[Compact] Files modified this session (2): src/a.ts, src/b.ts\n\
         [Compact] Checklist ship-checklist.md: 2/3 complete"
    );
}

#[test]
fn caps_listed_files_at_twenty() {
    let project = temp_project();
    let log: String = (0..23)
        .map(|i| format!("2024-05-01T10:00:00.000Z src/f{i}.ts\n"))
        .collect();
    write_file(project.path(), ".claude/.modified-files.log", &log);

    let (_, stdout, _) = pre_compact(project.path());
    let context = additional_context(&stdout, "PreCompact");
    assert!(context.starts_with("[Compact] Files modified this session (23): src/f0.ts, "));
    assert!(context.ends_with("src/f19.ts..."));
}

#[test]
fn custom_inline_template() {
    let project = temp_project();
    write_file(
        project.path(),
        ".claude/hookwarden.toml",
        "[compact_template]\ninline = \"Touched {{ file_count }} files\\n\\n{% for f in files %}- {{ f }}\\n{% endfor %}\"\n",
    );
    write_file(project.path(), ".claude/.modified-files.log", "2024-05-01T10:00:00.000Z src/a.ts\n");

    let (_, stdout, _) = pre_compact(project.path());
    assert_eq!(
        additional_context(&stdout, "PreCompact"),
        "Touched 1 files\n- src/a.ts"
    );
}

#[test]
fn broken_template_falls_back_to_default() {
    let project = temp_project();
    write_file(
        project.path(),
        ".claude/hookwarden.toml",
        "[compact_template]\nfile = \"missing.tmpl\"\n",
    );
    write_file(project.path(), ".claude/.modified-files.log", "2024-05-01T10:00:00.000Z src/a.ts\n");

    let (code, stdout, stderr) = pre_compact(project.path());
    assert_eq!(code, 0);
    assert!(stderr.is_empty());
    assert_eq!(
        additional_context(&stdout, "PreCompact"),
        "[Compact] Files modified this session (1): src/a.ts"
    );
}
