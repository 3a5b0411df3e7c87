use super::*;
use serde_json::json;

// =================================================================
// Input deserialization
// =================================================================

#[test]
fn deserialize_pre_tool_use_bash() {
    let input = json!({
        "session_id": "sess-1",
        "cwd": "/home/user/project",
        "hook_event_name": "PreToolUse",
        "tool_name": "Bash",
        "tool_input": { "command": "rm -rf /", "description": "cleanup" },
        "tool_use_id": "toolu_1"
    });

    let event = HookEvent::parse(&input.to_string()).unwrap();
    assert_eq!(event.command(), "rm -rf /");
    assert_eq!(event.file_path(), "");
    assert_eq!(event.cwd.as_deref(), Some("/home/user/project"));
    assert_eq!(event.tool_name.as_deref(), Some("Bash"));
}

#[test]
fn deserialize_write_file_path() {
    let event = HookEvent::parse(
        r#"{"tool_input": {"file_path": "src/app.ts", "content": "x"}}"#,
    )
    .unwrap();
    assert_eq!(event.file_path(), "src/app.ts");
    assert_eq!(event.command(), "");
}

#[test]
fn deserialize_user_prompt() {
    let event = HookEvent::parse(r#"{"hook_event_name": "UserPromptSubmit", "prompt": "fix it"}"#).unwrap();
    assert_eq!(event.prompt(), "fix it");
}

#[test]
fn malformed_payload_is_rejected() {
    assert!(HookEvent::parse("not json").is_none());
    assert!(HookEvent::parse("").is_none());
    assert!(HookEvent::parse("{\"prompt\":").is_none());
}

#[test]
fn non_object_payload_is_rejected() {
    assert!(HookEvent::parse("[]").is_none());
    assert!(HookEvent::parse("42").is_none());
    assert!(HookEvent::parse("null").is_none());
}

#[test]
fn wrongly_typed_field_is_empty_event() {
    let event = HookEvent::parse(r#"{"tool_input": {"command": 42}}"#).unwrap();
    assert_eq!(event.command(), "");
}

#[test]
fn null_tool_input_is_tolerated() {
    let event = HookEvent::parse(r#"{"tool_input": null, "prompt": "hi"}"#).unwrap();
    assert_eq!(event.command(), "");
    assert_eq!(event.prompt(), "hi");
}

#[test]
fn response_text_keeps_strings_and_serializes_objects() {
    let string = HookEvent::parse(r#"{"tool_response": "FAIL src/a.test.ts"}"#).unwrap();
    assert_eq!(string.response_text(), "FAIL src/a.test.ts");

    let object = HookEvent::parse(r#"{"tool_response": {"stdout": "ok"}}"#).unwrap();
    assert_eq!(object.response_text(), r#"{"stdout":"ok"}"#);

    let missing = HookEvent::parse("{}").unwrap();
    assert_eq!(missing.response_text(), "{}");
}

// =================================================================
// Output serialization
// =================================================================

#[test]
fn serialize_post_tool_use_context() {
    let output = HookOutput::with_context(ContextEvent::PostToolUse, "hint".into());
    let v = serde_json::to_value(&output).unwrap();
    assert_eq!(v["hookSpecificOutput"]["hookEventName"], "PostToolUse");
    assert_eq!(v["hookSpecificOutput"]["additionalContext"], "hint");
}

#[test]
fn serialize_pre_compact_context() {
    let output = HookOutput::with_context(ContextEvent::PreCompact, "saved".into());
    let v = serde_json::to_value(&output).unwrap();
    assert_eq!(v["hookSpecificOutput"]["hookEventName"], "PreCompact");
}

#[test]
fn empty_output_has_no_fields() {
    let v = serde_json::to_value(HookOutput::default()).unwrap();
    assert_eq!(v, json!({}));
}

#[test]
fn outcome_exit_codes() {
    assert_eq!(Outcome::Pass.exit_code(), 0);
    assert_eq!(Outcome::Advise("x".into()).exit_code(), 0);
    assert_eq!(Outcome::Notify("x".into()).exit_code(), 0);
    assert_eq!(Outcome::Block("x".into()).exit_code(), BLOCKING_EXIT);
}

#[test]
fn context_outcome_is_json() {
    let outcome = Outcome::context(ContextEvent::PreToolUse, "[Impact] x".into()).unwrap();
    match outcome {
        Outcome::Advise(json) => {
            let v: serde_json::Value = serde_json::from_str(&json).unwrap();
            assert_eq!(v["hookSpecificOutput"]["hookEventName"], "PreToolUse");
            assert_eq!(v["hookSpecificOutput"]["additionalContext"], "[Impact] x");
        }
        other => panic!("expected Advise, got {other:?}"),
    }
}
