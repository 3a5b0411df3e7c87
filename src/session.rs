use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use minijinja::Environment;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bash_analysis;
use crate::classifier;
use crate::format::{self, ToolOutcome};
use crate::impact;
use crate::metadata::{FileKind, ProjectProfile};
use crate::paths;
use crate::preferences::{DEFAULT_COMPACT_TEMPLATE, Preferences};
use crate::quality;
use crate::rules::{self, Verdict};
use crate::stack;
use crate::store::{ChecklistProgress, StateStore};
use crate::types::{ContextEvent, HookEvent, Outcome};

/// Files listed by name in the pre-compaction summary.
const COMPACT_FILE_LIMIT: usize = 20;
const COMPACT_CHECKLIST_LIMIT: usize = 3;
const IDLE_RECENT_FILES: usize = 3;
const IDLE_CHECKLIST_LIMIT: usize = 2;
const PROFILE_TOP_LANGUAGES: usize = 3;

/// Run a step whose failure must not stop the hook. The error is logged and
/// dropped.
fn best_effort<T>(step: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(step, error = %format!("{err:#}"), "step failed, continuing");
            None
        }
    }
}

/// Context handed to the pre-compaction template.
#[derive(Debug, Serialize)]
struct CompactSummary {
    files: Vec<String>,
    file_count: usize,
    truncated: bool,
    checklists: Vec<ChecklistProgress>,
}

impl CompactSummary {
    fn is_empty(&self) -> bool {
        self.file_count == 0 && self.checklists.is_empty()
    }
}

fn render_template(template: &str, summary: &CompactSummary) -> Result<String> {
    let env = Environment::new();
    let tmpl = env
        .template_from_str(template)
        .context("parsing compact template")?;
    tmpl.render(summary).context("rendering compact template")
}

/// Drop blank lines and trailing whitespace from rendered template output.
fn non_blank_lines(rendered: &str) -> String {
    rendered
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Session {
    project: PathBuf,
    store: StateStore,
    pub prefs: Preferences,
}

impl Session {
    /// Bind to `project`, loading `.claude/hookwarden.toml` if present.
    ///
    /// Never fails: an unreadable preferences file is logged and replaced by
    /// defaults so the guards keep working.
    pub fn open(project: &Path) -> Self {
        let project = std::path::absolute(project).unwrap_or_else(|_| project.to_path_buf());
        let store = StateStore::new(&project);
        let prefs = match Preferences::load(store.dir()) {
            Ok(prefs) => prefs,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "ignoring preferences");
                Preferences::default()
            }
        };
        Self {
            project,
            store,
            prefs,
        }
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    // ---------------------------------------------------------------
    // Guards
    // ---------------------------------------------------------------

    pub fn handle_guard_command(&self, event: &HookEvent) -> Result<Outcome> {
        let command = event.command();
        if command.is_empty() {
            return Ok(Outcome::Pass);
        }
        match rules::evaluate_command(command) {
            Verdict::Block(rule) => {
                tracing::info!(rule = rule.name, command, "blocked command");
                Ok(Outcome::Block(rule.message.to_string()))
            }
            Verdict::Allow { warnings } => {
                for rule in warnings {
                    tracing::info!(rule = rule.name, command, "{}", rule.message);
                }
                Ok(Outcome::Pass)
            }
        }
    }

    pub fn handle_guard_file(&self, event: &HookEvent) -> Result<Outcome> {
        let file_path = event.file_path();
        if file_path.is_empty() {
            return Ok(Outcome::Pass);
        }
        if let Verdict::Block(rule) = rules::evaluate_file(file_path) {
            tracing::info!(rule = rule.name, file_path, "blocked file write");
            return Ok(Outcome::Block(rule.message.to_string()));
        }

        let advisories = impact::annotate(&self.project, file_path);
        if advisories.is_empty() {
            return Ok(Outcome::Pass);
        }
        Outcome::context(ContextEvent::PreToolUse, advisories.join("\n"))
    }

    // ---------------------------------------------------------------
    // Post-tool hooks
    // ---------------------------------------------------------------

    pub fn handle_post_bash(&self, event: &HookEvent) -> Result<Outcome> {
        let hints = bash_analysis::analyze(event.command(), &event.response_text());
        if hints.is_empty() {
            return Ok(Outcome::Pass);
        }
        Outcome::context(ContextEvent::PostToolUse, hints.join("\n"))
    }

    /// Manifest, log, formatting, related tests and smells, each
    /// independently of the others.
    pub fn handle_post_edit(&self, event: &HookEvent) -> Result<Outcome> {
        let file_path = event.file_path();
        if file_path.is_empty() {
            return Ok(Outcome::Pass);
        }
        let now = Utc::now();
        let rel_path = paths::relative_to(&self.project, file_path);
        let mut advisories: Vec<String> = Vec::new();

        best_effort("recording edit", self.record_edit(file_path, &rel_path, now));
        best_effort(
            "appending modified-files log",
            self.store.append_modified(file_path, now),
        );

        if self.prefs.autoformat {
            self.run_formatters(file_path);
        }

        let related = quality::find_related_tests(&self.project, file_path);
        if !related.is_empty() {
            advisories.push(quality::related_test_hint(&related));
            let related_rel: Vec<String> = related
                .iter()
                .map(|t| paths::relative_to(&self.project, t))
                .collect();
            best_effort(
                "recording related tests",
                self.record_related_tests(&rel_path, related_rel),
            );
        }

        let target = paths::resolve(&self.project, file_path);
        let content = fs::read_to_string(&target)
            .with_context(|| format!("reading {}", target.display()));
        if let Some(content) = best_effort("scanning written file", content) {
            advisories.extend(quality::scan_smells(
                file_path,
                &content,
                self.prefs.debug_print_threshold,
            ));
        }

        if advisories.is_empty() {
            return Ok(Outcome::Pass);
        }
        Outcome::context(ContextEvent::PostToolUse, advisories.join(" | "))
    }

    fn record_edit(&self, file_path: &str, rel_path: &str, now: DateTime<Utc>) -> Result<()> {
        let mut manifest = self.store.load_manifest(now)?;
        let entry = manifest.record_edit(rel_path, FileKind::classify(file_path, rel_path), now);
        tracing::debug!(rel_path, edit_count = entry.edit_count, "recorded edit");
        self.store.save_manifest(&manifest)
    }

    fn record_related_tests(&self, rel_path: &str, tests: Vec<String>) -> Result<()> {
        let mut manifest = self.store.load_manifest(Utc::now())?;
        if manifest.set_related_tests(rel_path, tests) {
            self.store.save_manifest(&manifest)?;
        }
        Ok(())
    }

    fn run_formatters(&self, file_path: &str) {
        let timeout = Duration::from_secs(self.prefs.formatter_timeout_secs);
        for tool in format::plan(&self.project, file_path) {
            match best_effort("running formatter", format::run(&self.project, &tool, timeout)) {
                Some(ToolOutcome::Completed(status)) => {
                    tracing::debug!(program = tool.program, args = ?tool.args, %status, "formatter finished");
                }
                Some(ToolOutcome::TimedOut) => {
                    tracing::debug!(program = tool.program, args = ?tool.args, "formatter timed out");
                }
                None => {}
            }
        }
    }

    // ---------------------------------------------------------------
    // Session lifecycle
    // ---------------------------------------------------------------

    pub fn handle_session_start(&self) -> Result<Outcome> {
        let now = Utc::now();
        best_effort("truncating modified-files log", self.store.truncate_log());
        best_effort("resetting change manifest", self.store.reset_manifest(now));

        let mut lines: Vec<String> = Vec::new();

        if let Some(plans) = best_effort("listing plans", self.store.plan_files()) {
            lines.extend(plans_report(&plans));
        }

        lines.extend(stack::stack_line(&stack::detect(&self.project)));

        if let Some(Some(profile)) = best_effort("loading project profile", self.store.load_profile())
        {
            lines.extend(profile_report(&profile));
        }

        if lines.is_empty() {
            return Ok(Outcome::Pass);
        }
        Ok(Outcome::Advise(lines.join("\n")))
    }

    pub fn handle_prompt_context(&self, event: &HookEvent) -> Result<Outcome> {
        let assessment = classifier::assess(event.prompt());
        tracing::debug!(
            intents = ?assessment.intents,
            domains = ?assessment.domains,
            complexity = assessment.complexity.count(),
            risk = assessment.risk.count(),
            "assessed prompt"
        );
        let advisories = classifier::advise(&assessment);
        if advisories.is_empty() {
            return Ok(Outcome::Pass);
        }
        Ok(Outcome::Advise(advisories.join("\n")))
    }

    pub fn handle_idle_reminder(&self) -> Result<Outcome> {
        let mut reminders: Vec<String> = Vec::new();

        let recent = best_effort("reading modified-files log", self.store.recent_modified(IDLE_RECENT_FILES));
        if let Some(recent) = recent.filter(|r| !r.is_empty()) {
            reminders.push(format!("Recently modified: {}", recent.join(", ")));
        }

        for progress in self.checklists(IDLE_CHECKLIST_LIMIT) {
            if progress.remaining() > 0 {
                reminders.push(format!(
                    "{}: {} items remaining",
                    progress.name,
                    progress.remaining()
                ));
            }
        }

        if reminders.is_empty() {
            return Ok(Outcome::Pass);
        }
        Ok(Outcome::Notify(format!("[Idle] Context: {}", reminders.join(" | "))))
    }

    pub fn handle_pre_compact(&self) -> Result<Outcome> {
        let files = best_effort("reading modified-files log", self.store.distinct_modified())
            .unwrap_or_default();
        let summary = CompactSummary {
            file_count: files.len(),
            truncated: files.len() > COMPACT_FILE_LIMIT,
            files: files.into_iter().take(COMPACT_FILE_LIMIT).collect(),
            checklists: self
                .checklists(COMPACT_CHECKLIST_LIMIT)
                .into_iter()
                .filter(|c| c.total > 0)
                .collect(),
        };
        if summary.is_empty() {
            return Ok(Outcome::Pass);
        }

        let text = self.render_compact_summary(&summary);
        if text.is_empty() {
            return Ok(Outcome::Pass);
        }
        Outcome::context(ContextEvent::PreCompact, text)
    }

    /// Fold this session's manifest into the project profile.
    pub fn handle_update_profile(&self) -> Result<Outcome> {
        let now = Utc::now();
        let manifest = self.store.load_manifest(now)?;
        if manifest.is_empty() {
            tracing::debug!("no edits this session, profile unchanged");
            return Ok(Outcome::Pass);
        }

        let mut profile = best_effort("loading project profile", self.store.load_profile())
            .flatten()
            .unwrap_or_default();
        if profile.fold(&manifest, now) {
            self.store.save_profile(&profile)?;
            tracing::info!(
                sessions = profile.session_count,
                files = manifest.files.len(),
                "updated project profile"
            );
        }
        Ok(Outcome::Pass)
    }

    // ---------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------

    /// Progress for the first `limit` checklist files. Unreadable ones are
    /// skipped.
    fn checklists(&self, limit: usize) -> Vec<ChecklistProgress> {
        best_effort("listing checklists", self.store.checklist_files())
            .unwrap_or_default()
            .iter()
            .take(limit)
            .filter_map(|name| best_effort("reading checklist", self.store.checklist_progress(name)))
            .collect()
    }

    /// Render with the configured template, falling back to the default one
    /// when the configured template cannot be loaded or rendered.
    fn render_compact_summary(&self, summary: &CompactSummary) -> String {
        let rendered = self
            .prefs
            .compact_template
            .source(self.store.dir())
            .and_then(|template| render_template(&template, summary));
        let rendered = match rendered {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %format!("{err:#}"), "compact template failed, using default");
                best_effort(
                    "rendering default compact template",
                    render_template(DEFAULT_COMPACT_TEMPLATE, summary),
                )
                .unwrap_or_default()
            }
        };
        non_blank_lines(&rendered)
    }
}

fn plans_report(plans: &[String]) -> Option<String> {
    if plans.is_empty() {
        return None;
    }
    let checklists: Vec<&str> = plans
        .iter()
        .filter(|p| p.contains("checklist"))
        .map(String::as_str)
        .collect();
    if checklists.is_empty() {
        Some(format!("[Session] Active plans found: {}.", plans.join(", ")))
    } else {
        Some(format!(
            "[Session] Active checklists found: {}. Review them to continue previous work.",
            checklists.join(", ")
        ))
    }
}

fn profile_report(profile: &ProjectProfile) -> Vec<String> {
    let mut lines = Vec::new();
    if !profile.conventions.is_empty() {
        let conventions: Vec<String> = profile
            .conventions
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect();
        lines.push(format!("[Session] Learned conventions: {}", conventions.join(", ")));
    }
    if profile.session_count > 1 {
        let top = profile.top_languages(PROFILE_TOP_LANGUAGES);
        if !top.is_empty() {
            lines.push(format!(
                "[Session] Most active languages ({} sessions): {}",
                profile.session_count,
                top.join(", ")
            ));
        }
    }
    lines
}
