//! Ordered pattern rules for the command and file guards.
//!
//! A [`RuleSet`] is evaluated top to bottom. For block-class sets the first
//! matching rule wins and nothing after it is consulted; warn-class sets are
//! collected in full and only ever reach the log.

use regex::Regex;
use std::sync::LazyLock;

use crate::paths;

// ===================================================================
// Rule
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Block,
    Warn,
}

enum Matcher {
    Pattern(Regex),
    /// A pattern plus a check on the text that follows each match, for the
    /// rules that need "not followed by".
    Suffix {
        pattern: Regex,
        rejects: fn(&str) -> bool,
    },
}

pub struct Rule {
    pub name: &'static str,
    pub message: &'static str,
    pub severity: Severity,
    matcher: Matcher,
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("severity", &self.severity)
            .finish()
    }
}

impl Rule {
    fn pattern(name: &'static str, pattern: &str, severity: Severity, message: &'static str) -> Self {
        Self {
            name,
            message,
            severity,
            matcher: Matcher::Pattern(compile(pattern)),
        }
    }

    fn suffix(
        name: &'static str,
        pattern: &str,
        rejects: fn(&str) -> bool,
        severity: Severity,
        message: &'static str,
    ) -> Self {
        Self {
            name,
            message,
            severity,
            matcher: Matcher::Suffix {
                pattern: compile(pattern),
                rejects,
            },
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.matcher {
            Matcher::Pattern(re) => re.is_match(text),
            Matcher::Suffix { pattern, rejects } => pattern
                .find_iter(text)
                .any(|m| !rejects(&text[m.end()..])),
        }
    }
}

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule pattern {pattern:?}: {e}"))
}

// ===================================================================
// RuleSet
// ===================================================================

pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// The earliest rule that matches, if any.
    pub fn first_match(&self, text: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.is_match(text))
    }

    /// Every rule that matches, in table order.
    pub fn all_matches(&self, text: &str) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.is_match(text)).collect()
    }

    #[cfg(test)]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

/// Result of running a command or file path through the guard tables.
#[derive(Debug)]
pub enum Verdict<'a> {
    Allow { warnings: Vec<&'a Rule> },
    Block(&'a Rule),
}

// ===================================================================
// Suffix predicates
// ===================================================================

/// `--force` counts unless it is the start of `--force-with-lease`.
/// Only the rest of the `git push` line is considered.
fn push_has_no_bare_force(rest: &str) -> bool {
    let line = rest.split('\n').next().unwrap_or("");
    !line
        .match_indices("--force")
        .any(|(idx, m)| !line[idx + m.len()..].starts_with("-with-lease"))
}

fn targets_head(rest: &str) -> bool {
    rest.starts_with("HEAD")
}

static DRY_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+--dry-run").expect("dry-run regex is valid"));

fn is_dry_run(rest: &str) -> bool {
    DRY_RUN.is_match(rest)
}

fn is_save_dev(rest: &str) -> bool {
    rest.starts_with("--save-dev")
}

// ===================================================================
// Rule tables
// ===================================================================

/// Destructive shell commands, in priority order.
pub static COMMAND_BLOCKS: LazyLock<RuleSet> = LazyLock::new(|| {
    use Severity::Block;
    RuleSet {
        rules: vec![
            Rule::pattern(
                "rm-root-or-home",
                r"rm\s+(-[rfRF]+\s+)?[/~]",
                Block,
                "Blocked: recursive delete on root or home directory",
            ),
            Rule::pattern(
                "rm-current-dir",
                r"rm\s+-[rfRF]*\s+\.\s*$",
                Block,
                "Blocked: recursive delete on current directory",
            ),
            Rule::suffix(
                "force-push",
                r"git\s+push\s+",
                push_has_no_bare_force,
                Block,
                "Blocked: use --force-with-lease instead of --force",
            ),
            Rule::suffix(
                "hard-reset",
                r"git\s+reset\s+--hard\s+",
                targets_head,
                Block,
                "Blocked: hard reset to non-HEAD ref. Confirm with user first.",
            ),
            Rule::pattern(
                "git-clean-force",
                r"git\s+clean\s+-[dfxDFX]*f",
                Block,
                "Blocked: git clean -f removes untracked files permanently",
            ),
            Rule::pattern(
                "sql-drop",
                r"(?i)drop\s+(database|table|schema)\s",
                Block,
                "Blocked: SQL DROP operation. Confirm with user first.",
            ),
            Rule::pattern(
                "sql-truncate",
                r"(?i)truncate\s+table\s",
                Block,
                "Blocked: SQL TRUNCATE operation. Confirm with user first.",
            ),
            Rule::pattern(
                "raw-disk-write",
                r">\s*/dev/sda",
                Block,
                "Blocked: writing directly to disk device",
            ),
            Rule::pattern(
                "disk-format",
                r"(?i)format\s+[a-z]:",
                Block,
                "Blocked: disk format command",
            ),
            Rule::pattern(
                "windows-recursive-delete",
                r"(?i)del\s+/[sf]",
                Block,
                "Blocked: Windows recursive delete",
            ),
            Rule::suffix(
                "npm-publish",
                r"npm\s+publish",
                is_dry_run,
                Block,
                "Blocked: npm publish without --dry-run. Confirm with user.",
            ),
            Rule::pattern(
                "chmod-777",
                r"chmod\s+-R\s+777",
                Block,
                "Blocked: setting world-writable permissions recursively",
            ),
        ],
    }
});

/// Risky-but-allowed commands. Logged, never surfaced.
pub static COMMAND_WARNINGS: LazyLock<RuleSet> = LazyLock::new(|| {
    use Severity::Warn;
    RuleSet {
        rules: vec![
            Rule::pattern("git-push", r"git\s+push", Warn, "git push detected"),
            Rule::suffix(
                "npm-install-prod",
                r"npm\s+install\s+",
                is_save_dev,
                Warn,
                "npm install without --save-dev",
            ),
        ],
    }
});

/// Files the assistant must never write. Matched against the lower-cased,
/// `/`-separated path.
pub static PROTECTED_FILES: LazyLock<RuleSet> = LazyLock::new(|| {
    use Severity::Block;
    RuleSet {
        rules: vec![
            Rule::pattern(
                "env-file",
                r"\.env($|\.)",
                Block,
                "Blocked: .env files contain secrets. Edit manually.",
            ),
            Rule::pattern(
                "credentials",
                r"credentials\.json|secrets\.json|\.secret",
                Block,
                "Blocked: credentials file. Edit manually.",
            ),
            Rule::pattern(
                "key-material",
                r"\.(pem|key|cert|p12|pfx)$",
                Block,
                "Blocked: certificate/key file. Edit manually.",
            ),
            Rule::pattern(
                "ssh-key",
                r"id_(rsa|ed25519|ecdsa)",
                Block,
                "Blocked: SSH key file.",
            ),
            Rule::pattern("ssh-dir", r"\.ssh/", Block, "Blocked: SSH directory file."),
            Rule::pattern(
                "npm-lock",
                r"package-lock\.json$",
                Block,
                "Blocked: package-lock.json is auto-generated. Use `npm install` instead.",
            ),
            Rule::pattern(
                "yarn-lock",
                r"yarn\.lock$",
                Block,
                "Blocked: yarn.lock is auto-generated. Use `yarn install` instead.",
            ),
            Rule::pattern(
                "pnpm-lock",
                r"pnpm-lock\.yaml$",
                Block,
                "Blocked: pnpm-lock.yaml is auto-generated. Use `pnpm install` instead.",
            ),
        ],
    }
});

// ===================================================================
// Entry points
// ===================================================================

pub fn evaluate_command(command: &str) -> Verdict<'static> {
    if let Some(rule) = COMMAND_BLOCKS.first_match(command) {
        return Verdict::Block(rule);
    }
    Verdict::Allow {
        warnings: COMMAND_WARNINGS.all_matches(command),
    }
}

pub fn evaluate_file(file_path: &str) -> Verdict<'static> {
    let normalized = paths::normalize_separators(file_path).to_lowercase();
    match PROTECTED_FILES.first_match(&normalized) {
        Some(rule) => Verdict::Block(rule),
        None => Verdict::Allow { warnings: Vec::new() },
    }
}
