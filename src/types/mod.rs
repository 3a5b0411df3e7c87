use serde::{Deserialize, Serialize};

// ===================================================================
// Hook Input (received via stdin, snake_case JSON)
// ===================================================================

/// The subset of a tool call's `tool_input` the hooks look at.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// One hook event as delivered by the host.
///
/// Every field is optional: the hooks are bound to different lifecycle
/// events and each reads only what it needs. See [`HookEvent::parse`] for
/// how malformed payloads are handled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<ToolInput>,
    #[serde(default)]
    pub tool_response: Option<serde_json::Value>,
}

impl HookEvent {
    /// Parse a stdin payload.
    ///
    /// Returns `None` unless the payload is a JSON object. An object whose
    /// known fields have the wrong type becomes an empty event.
    pub fn parse(input: &str) -> Option<Self> {
        let value: serde_json::Value = match serde_json::from_str(input) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "malformed hook payload");
                return None;
            }
        };
        if !value.is_object() {
            tracing::warn!("hook payload is not a JSON object");
            return None;
        }
        Some(serde_json::from_value(value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "unexpected field types in hook payload, treating as empty event");
            Self::default()
        }))
    }

    /// `tool_input.command`, or `""`.
    pub fn command(&self) -> &str {
        self.tool_input
            .as_ref()
            .and_then(|t| t.command.as_deref())
            .unwrap_or("")
    }

    /// `tool_input.file_path`, or `""`.
    pub fn file_path(&self) -> &str {
        self.tool_input
            .as_ref()
            .and_then(|t| t.file_path.as_deref())
            .unwrap_or("")
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("")
    }

    /// The tool response as text: strings verbatim, anything else as JSON.
    pub fn response_text(&self) -> String {
        match &self.tool_response {
            None => "{}".to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

// ===================================================================
// Hook Output (written to stdout as JSON, camelCase)
// ===================================================================

/// Top-level structured output written to stdout on exit code 0.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    /// Event-specific output fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hook_specific_output: Option<HookSpecificOutput>,
}

/// Event-specific output, tagged by `hookEventName`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "hookEventName")]
pub enum HookSpecificOutput {
    PreToolUse(AdditionalContext),
    PostToolUse(AdditionalContext),
    PreCompact(AdditionalContext),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

/// Which event an advisory JSON payload is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextEvent {
    PreToolUse,
    PostToolUse,
    PreCompact,
}

impl HookOutput {
    pub fn with_context(event: ContextEvent, text: String) -> Self {
        let context = AdditionalContext {
            additional_context: Some(text),
        };
        let specific = match event {
            ContextEvent::PreToolUse => HookSpecificOutput::PreToolUse(context),
            ContextEvent::PostToolUse => HookSpecificOutput::PostToolUse(context),
            ContextEvent::PreCompact => HookSpecificOutput::PreCompact(context),
        };
        Self {
            hook_specific_output: Some(specific),
        }
    }
}

// ===================================================================
// Hook Outcome (what the process boundary does with a result)
// ===================================================================

/// Exit status that tells the host to reject the in-flight action.
pub const BLOCKING_EXIT: i32 = 2;

/// The result of running one hook, mapped onto the exit-code protocol by
/// `main`.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0, nothing written.
    Pass,
    /// Exit 0 with text (plain or JSON) on stdout.
    Advise(String),
    /// Exit 0 with text on stderr.
    Notify(String),
    /// Exit 2 with the rejection message on stderr.
    Block(String),
}

impl Outcome {
    /// Wrap advisory text in a `hookSpecificOutput` JSON payload.
    pub fn context(event: ContextEvent, text: String) -> anyhow::Result<Self> {
        let json = serde_json::to_string(&HookOutput::with_context(event, text))?;
        Ok(Self::Advise(json))
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Block(_) => BLOCKING_EXIT,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests;
