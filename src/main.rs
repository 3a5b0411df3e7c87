mod bash_analysis;
mod classifier;
mod format;
mod impact;
mod logging;
mod metadata;
mod paths;
mod preferences;
mod quality;
mod rules;
mod session;
mod stack;
mod store;
mod types;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session::Session;
use std::io::{self, Read, Write};
use std::panic;
use std::path::{Path, PathBuf};
use std::process;
use types::{HookEvent, Outcome};

/// Guard and context hooks for an AI coding assistant.
#[derive(Debug, Parser)]
#[command(name = "hookwarden", version)]
struct Cli {
    /// Project root holding `.claude/` state. Falls back to the event's
    /// `cwd`, then the current directory.
    #[arg(long, global = true, env = "CLAUDE_PROJECT_DIR")]
    project_dir: Option<PathBuf>,

    #[command(subcommand)]
    hook: Hook,
}

#[derive(Debug, Clone, Copy, Subcommand)]
enum Hook {
    /// PreToolUse(Bash): block destructive shell commands.
    GuardCommand,
    /// PreToolUse(Write|Edit): block protected files, annotate impact.
    GuardFile,
    /// PostToolUse(Bash): hints from command output.
    PostBash,
    /// PostToolUse(Write|Edit): manifest, formatting, related tests, smells.
    PostEdit,
    /// SessionStart: reset session state and report project context.
    SessionStart,
    /// UserPromptSubmit: intent and risk advisories.
    PromptContext,
    /// Notification(idle_prompt): remind what was being worked on.
    IdleReminder,
    /// PreCompact: summary that survives compaction.
    PreCompact,
    /// Stop: fold the session into the project profile.
    UpdateProfile,
}

impl Hook {
    fn reads_stdin(self) -> bool {
        !matches!(
            self,
            Hook::SessionStart | Hook::IdleReminder | Hook::UpdateProfile
        )
    }
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("reading hook payload from stdin")?;
    Ok(buffer)
}

/// `--project-dir`/`CLAUDE_PROJECT_DIR`, then the event's `cwd`, then the
/// process working directory.
fn resolve_project_dir(flag: Option<&Path>, event: &HookEvent) -> PathBuf {
    if let Some(dir) = flag.filter(|d| !d.as_os_str().is_empty()) {
        return dir.to_path_buf();
    }
    if let Some(cwd) = event.cwd.as_deref().filter(|c| !c.is_empty()) {
        return PathBuf::from(cwd);
    }
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn run(cli: &Cli) -> Result<Outcome> {
    let event = if cli.hook.reads_stdin() {
        match HookEvent::parse(&read_stdin()?) {
            Some(event) => event,
            None => return Ok(Outcome::Pass),
        }
    } else {
        HookEvent::default()
    };
    let project = resolve_project_dir(cli.project_dir.as_deref(), &event);
    let session = Session::open(&project);
    tracing::debug!(
        hook = ?cli.hook,
        project = %session.project().display(),
        event = event.hook_event_name.as_deref().unwrap_or(""),
        session_id = event.session_id.as_deref().unwrap_or(""),
        tool = event.tool_name.as_deref().unwrap_or(""),
        "running hook"
    );

    match cli.hook {
        Hook::GuardCommand => session.handle_guard_command(&event),
        Hook::GuardFile => session.handle_guard_file(&event),
        Hook::PostBash => session.handle_post_bash(&event),
        Hook::PostEdit => session.handle_post_edit(&event),
        Hook::SessionStart => session.handle_session_start(),
        Hook::PromptContext => session.handle_prompt_context(&event),
        Hook::IdleReminder => session.handle_idle_reminder(),
        Hook::PreCompact => session.handle_pre_compact(),
        Hook::UpdateProfile => session.handle_update_profile(),
    }
}

/// Write the outcome to its channel and return the exit code.
fn emit(outcome: &Outcome) -> i32 {
    match outcome {
        Outcome::Pass => {}
        Outcome::Advise(text) => {
            let _ = writeln!(io::stdout().lock(), "{text}");
        }
        Outcome::Notify(text) | Outcome::Block(text) => {
            let _ = write!(io::stderr().lock(), "{text}");
        }
    }
    outcome.exit_code()
}

fn main() {
    // Argument errors must not look like a block, so they exit 0 too.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            process::exit(0);
        }
    };

    let guard = logging::init();
    panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "hook panicked");
    }));

    let outcome = match panic::catch_unwind(|| run(&cli)) {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => {
            tracing::warn!(hook = ?cli.hook, error = %format!("{err:#}"), "hook failed");
            Outcome::Pass
        }
        Err(_) => Outcome::Pass,
    };

    let code = emit(&outcome);
    drop(guard);
    process::exit(code);
}
