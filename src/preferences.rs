use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

const FILENAME: &str = "hookwarden.toml";

/// Reproduces the fixed pre-compaction summary. Blank lines are dropped
/// after rendering.
pub const DEFAULT_COMPACT_TEMPLATE: &str = "\
{% if file_count > 0 %}[Compact] Files modified this session ({{ file_count }}): {{ files | join(\", \") }}{% if truncated %}...{% endif %}{% endif %}
{% for c in checklists %}[Compact] Checklist {{ c.name }}: {{ c.done }}/{{ c.total }} complete
{% endfor %}";

/// Pre-compaction summary template: either an inline minijinja string or a
/// path to a template file (relative to `.claude/`).
///
/// In TOML this looks like one of:
///
/// ```toml
/// [compact_template]
/// inline = "{{ file_count }} files touched"
///
/// # or
///
/// [compact_template]
/// file = "compact.tmpl"
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CompactTemplate {
    Inline(String),
    File(String),
}

impl Default for CompactTemplate {
    fn default() -> Self {
        CompactTemplate::Inline(DEFAULT_COMPACT_TEMPLATE.into())
    }
}

impl CompactTemplate {
    /// The template text, reading it from `dir` for the file form.
    pub fn source(&self, dir: &Path) -> Result<String> {
        match self {
            CompactTemplate::Inline(s) => Ok(s.clone()),
            CompactTemplate::File(f) => {
                let path = dir.join(f);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading template {}", path.display()))
            }
        }
    }
}

/// Per-project settings stored in `.claude/hookwarden.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Preferences {
    /// Run prettier/eslint on written files when the project has them.
    #[serde(default = "default_autoformat")]
    pub autoformat: bool,

    /// Seconds each formatter run may take before it is killed.
    #[serde(default = "default_formatter_timeout_secs")]
    pub formatter_timeout_secs: u64,

    /// Debug-print call sites tolerated before the quality advisory fires.
    #[serde(default = "default_debug_print_threshold")]
    pub debug_print_threshold: usize,

    #[serde(default)]
    pub compact_template: CompactTemplate,
}

fn default_autoformat() -> bool {
    true
}

fn default_formatter_timeout_secs() -> u64 {
    10
}

fn default_debug_print_threshold() -> usize {
    3
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            autoformat: default_autoformat(),
            formatter_timeout_secs: default_formatter_timeout_secs(),
            debug_print_threshold: default_debug_print_threshold(),
            compact_template: CompactTemplate::default(),
        }
    }
}

impl Preferences {
    /// Load preferences from `<dir>/hookwarden.toml`.
    ///
    /// A missing file yields defaults; missing keys are filled in by serde.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(FILENAME);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Preferences::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }
}
