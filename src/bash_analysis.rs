//! Hints derived from a finished shell command and its output.

use regex::Regex;
use std::sync::LazyLock;

/// A command family paired with the output that signals trouble for it.
struct Check {
    command: Regex,
    trouble: Regex,
    /// Output that overrides `trouble` (e.g. a "0 failed" summary line).
    clean: Option<Regex>,
    message: &'static str,
}

impl Check {
    fn new(command: &str, trouble: &str, clean: Option<&str>, message: &'static str) -> Self {
        let compile = |p: &str| Regex::new(p).unwrap_or_else(|e| panic!("invalid check pattern {p:?}: {e}"));
        Self {
            command: compile(command),
            trouble: compile(trouble),
            clean: clean.map(compile),
            message,
        }
    }

    fn fires(&self, command: &str, output: &str) -> bool {
        self.command.is_match(command)
            && self.trouble.is_match(output)
            && !self.clean.as_ref().is_some_and(|c| c.is_match(output))
    }
}

static TEST_RUN: LazyLock<Check> = LazyLock::new(|| {
    Check::new(
        r"(?i)test|vitest|jest|pytest|cargo test|go test|mvn test|gradle test|rspec|phpunit",
        r"(?i)fail|error",
        Some(r"(?i)0 failed|0 errors|passed"),
        "[Post-Bash] Test failures detected. Fix failing tests before proceeding.",
    )
});

static TSC_COMMAND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)tsc|typescript").expect("tsc regex is valid"));

static TSC_ERRORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Found\s+(\d+)\s+error").expect("tsc errors regex is valid"));

static PYTHON: LazyLock<Check> = LazyLock::new(|| {
    Check::new(
        r"(?i)python|mypy|pyright|flake8|ruff",
        r"(?i)error:|SyntaxError|TypeError|ImportError",
        None,
        "[Post-Bash] Python errors detected. Review and fix before continuing.",
    )
});

/// Compilation checks. A hit here suppresses the generic build hint.
static COMPILERS: LazyLock<Vec<Check>> = LazyLock::new(|| {
    vec![
        Check::new(
            r"(?i)\bgo (build|run|vet|test)",
            r"(?i)cannot|undefined|syntax error",
            None,
            "[Post-Bash] Go compilation errors detected. Fix before continuing.",
        ),
        Check::new(
            r"(?i)cargo (build|check|test|clippy)",
            r"(?i)error\[E\d+\]",
            None,
            "[Post-Bash] Rust compilation errors detected. Fix before continuing.",
        ),
    ]
});

static BUILD: LazyLock<Check> = LazyLock::new(|| {
    Check::new(
        r"(?i)build|compile|make",
        r"(?i)error",
        None,
        "[Post-Bash] Build errors detected. Review output and fix before proceeding.",
    )
});

static LINT: LazyLock<Check> = LazyLock::new(|| {
    Check::new(
        r"(?i)lint|eslint|flake8|ruff|golangci|clippy|checkstyle",
        r"(?i)error|\d+ problems?",
        Some(r"(?i)0 errors|0 problems"),
        "[Post-Bash] Lint errors detected. Fix lint issues before continuing.",
    )
});

static PACKAGES: LazyLock<Check> = LazyLock::new(|| {
    Check::new(
        r"(?i)npm install|yarn add|pnpm add|pip install|cargo add|go get",
        r"(?i)WARN|vulnerability|deprecated|CVE",
        None,
        "[Post-Bash] Package warnings detected. Consider reviewing vulnerabilities.",
    )
});

/// Every hint that applies to `command` given its `output`, in a fixed order.
pub fn analyze(command: &str, output: &str) -> Vec<String> {
    let mut hints = Vec::new();

    if TEST_RUN.fires(command, output) {
        hints.push(TEST_RUN.message.to_string());
    }

    if TSC_COMMAND.is_match(command) {
        let errors = TSC_ERRORS
            .captures(output)
            .and_then(|c| c[1].parse::<u64>().ok())
            .unwrap_or(0);
        if errors > 0 {
            hints.push(format!(
                "[Post-Bash] {errors} TypeScript errors found. Fix before continuing."
            ));
        }
    }

    if PYTHON.fires(command, output) {
        hints.push(PYTHON.message.to_string());
    }

    let mut compiler_failed = false;
    for check in COMPILERS.iter() {
        if check.fires(command, output) {
            hints.push(check.message.to_string());
            compiler_failed = true;
        }
    }

    if !compiler_failed && BUILD.fires(command, output) {
        hints.push(BUILD.message.to_string());
    }

    for check in [&*LINT, &*PACKAGES] {
        if check.fires(command, output) {
            hints.push(check.message.to_string());
        }
    }

    hints
}
