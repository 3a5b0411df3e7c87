//! Post-write checks: related-test discovery and source smells.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::paths;

static DEBUG_PRINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"console\.(log|debug)\(").expect("debug print regex is valid"));

/// Key-like name assigned a quoted literal of 8+ characters. Pattern-based,
/// so false positives and negatives are expected.
static HARDCODED_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:api[_-]?key|secret|password|token)\s*[:=]\s*['"][^'"]{8,}"#)
        .expect("secret regex is valid")
});

static ANY_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":\s*any\b").expect("any type regex is valid"));

pub const SECRET_WARNING: &str =
    "WARNING: Possible hardcoded secret detected! Use environment variables instead.";

// ===================================================================
// Related tests
// ===================================================================

/// Paths where a test for `file_path` would live, in lookup order.
///
/// Empty for anything that is not plain script source (tests, specs and
/// stories included).
pub fn related_test_candidates(file_path: &str) -> Vec<String> {
    let ext = paths::extension(file_path);
    let is_source = paths::SCRIPT_EXTS.contains(&ext.as_str())
        && !paths::is_test_file(file_path)
        && !paths::is_story_file(file_path);
    if !is_source {
        return Vec::new();
    }

    let mut candidates: Vec<String> = Vec::new();
    let mut push = |candidate: Option<String>| {
        if let Some(c) = candidate {
            if !candidates.contains(&c) {
                candidates.push(c);
            }
        }
    };

    push(paths::with_infix(file_path, &ext, ".test"));
    push(paths::with_infix(file_path, &ext, ".spec"));
    for test_dir in ["/test/", "/__tests__/"] {
        if file_path.contains("/src/") {
            let moved = file_path.replacen("/src/", test_dir, 1);
            push(paths::with_infix(&moved, &ext, ".test"));
        }
    }
    candidates
}

/// The candidates that exist, resolved against `project`.
pub fn find_related_tests(project: &Path, file_path: &str) -> Vec<String> {
    related_test_candidates(file_path)
        .into_iter()
        .filter(|c| paths::resolve(project, c).exists())
        .collect()
}

pub fn related_test_hint(found: &[String]) -> String {
    let names: Vec<String> = found
        .iter()
        .map(|f| {
            Path::new(f)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| f.clone())
        })
        .collect();
    format!(
        "[Test Hint] Related test found: {}. Run tests to verify your changes.",
        names.join(", ")
    )
}

// ===================================================================
// Smells
// ===================================================================

/// Advisory lines for smells found in a written file's contents.
///
/// `debug_print_threshold` is exclusive: the debug-print smell fires only
/// above it.
pub fn scan_smells(file_path: &str, content: &str, debug_print_threshold: usize) -> Vec<String> {
    let mut smells = Vec::new();

    // Build scripts (.js) and tests may print freely.
    let prints_allowed = ["test", "spec", ".js"].iter().any(|s| file_path.contains(s));
    if !prints_allowed {
        let count = DEBUG_PRINT.find_iter(content).count();
        if count > debug_print_threshold {
            smells.push(format!(
                "[Quality] {count} console.log/debug statements found. Remove before committing."
            ));
        }
    }

    if HARDCODED_SECRET.is_match(content) {
        smells.push(SECRET_WARNING.to_string());
    }

    let ext = paths::extension(file_path);
    if (ext == ".ts" || ext == ".tsx") && !file_path.contains("test") {
        let count = ANY_TYPE.find_iter(content).count();
        if count > 0 {
            smells.push(format!(
                "[TypeScript] {count} `any` type(s) found. Use specific types or `unknown`."
            ));
        }
    }

    smells
}
