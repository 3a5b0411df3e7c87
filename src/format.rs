//! External formatter/linter invocation for written files.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const FORMATTABLE_EXTS: &[&str] = &[
    ".ts", ".tsx", ".js", ".jsx", ".css", ".json", ".md", ".html", ".yaml", ".yml", ".vue",
    ".svelte",
];

/// Any of these at the project root means the project uses prettier.
const PRETTIER_MARKERS: &[&str] = &[
    ".prettierrc",
    ".prettierrc.json",
    "prettier.config.js",
    "node_modules/.bin/prettier",
];

const ESLINT_BIN: &str = "node_modules/.bin/eslint";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One tool run against the written file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: &'static str,
    pub args: Vec<String>,
}

impl ToolInvocation {
    fn npx(args: &[&str], file_path: &str) -> Self {
        let mut all: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        all.push(file_path.to_string());
        Self {
            program: "npx",
            args: all,
        }
    }
}

#[derive(Debug)]
pub enum ToolOutcome {
    Completed(ExitStatus),
    TimedOut,
}

/// Tools to run for `file_path`, decided from what the project has installed.
pub fn plan(project: &Path, file_path: &str) -> Vec<ToolInvocation> {
    let ext = crate::paths::extension(file_path);
    if !FORMATTABLE_EXTS.contains(&ext.as_str()) {
        return Vec::new();
    }

    let mut tools = Vec::new();
    if PRETTIER_MARKERS.iter().any(|m| project.join(m).exists()) {
        tools.push(ToolInvocation::npx(&["prettier", "--write"], file_path));
    }
    if crate::paths::SCRIPT_EXTS.contains(&ext.as_str()) && project.join(ESLINT_BIN).exists() {
        tools.push(ToolInvocation::npx(&["eslint", "--fix"], file_path));
    }
    tools
}

/// Run `tool` in `project` with output discarded, killing it at `timeout`.
pub fn run(project: &Path, tool: &ToolInvocation, timeout: Duration) -> Result<ToolOutcome> {
    let mut child = Command::new(tool.program)
        .args(&tool.args)
        .current_dir(project)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawning {} {}", tool.program, tool.args.join(" ")))?;

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().context("waiting for formatter")? {
            return Ok(ToolOutcome::Completed(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(ToolOutcome::TimedOut);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
