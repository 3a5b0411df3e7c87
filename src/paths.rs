use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

static TEST_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.(test|spec)\.(ts|tsx|js|jsx)$").expect("test file regex is valid")
});

static STORY_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\.stories\.(ts|tsx|js|jsx)$").expect("story file regex is valid")
});

/// Config files by name. The first alternative covers `*.config.*` and
/// `*.rc.*`; the rest are tool names that may appear anywhere in the path.
static CONFIG_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\.(config|rc)\.(ts|js|json|yaml|yml)$|tsconfig|vite\.config|next\.config|tailwind\.config|eslint|prettier",
    )
    .expect("config file regex is valid")
});

/// Source extensions the test-discovery and impact checks care about.
pub const SCRIPT_EXTS: &[&str] = &[".ts", ".tsx", ".js", ".jsx"];

/// Replace `\` with `/` so every path comparison works on one separator.
pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

/// Lower-cased extension including the leading dot (`".ts"`), or `""`.
pub fn extension(path: &str) -> String {
    Path::new(path)
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// File name without its final extension.
pub fn stem(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Insert `infix` before the trailing `ext` of `path`
/// (`src/a.ts` + `.test` → `src/a.test.ts`). The extension is matched
/// ignoring ASCII case and kept as written.
pub fn with_infix(path: &str, ext: &str, infix: &str) -> Option<String> {
    let split = path.len().checked_sub(ext.len())?;
    let (base, tail) = (path.get(..split)?, path.get(split..)?);
    tail.eq_ignore_ascii_case(ext)
        .then(|| format!("{base}{infix}{tail}"))
}

pub fn is_test_file(path: &str) -> bool {
    TEST_FILE.is_match(path)
}

pub fn is_story_file(path: &str) -> bool {
    STORY_FILE.is_match(path)
}

pub fn is_config_file(path: &str) -> bool {
    CONFIG_FILE.is_match(path)
}

/// Resolve `file` against the project directory when it is relative.
pub fn resolve(project: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project.join(path)
    }
}

/// Project-relative form of `file`, always with `/` separators.
///
/// Relative inputs are taken as already project-relative. Absolute paths
/// outside the project are expressed with `..` segments, lexically.
pub fn relative_to(project: &Path, file: &str) -> String {
    let normalized = normalize_separators(file);
    let path = Path::new(&normalized);
    if !path.is_absolute() {
        return normalized.trim_start_matches("./").to_string();
    }

    let base: Vec<Component> = project.components().filter(|c| *c != Component::CurDir).collect();
    let target: Vec<Component> = path.components().collect();
    let shared = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if shared == 0 {
        return normalized;
    }

    let mut parts: Vec<String> = Vec::new();
    for _ in shared..base.len() {
        parts.push("..".into());
    }
    for component in &target[shared..] {
        parts.push(component.as_os_str().to_string_lossy().into_owned());
    }
    normalize_separators(&parts.join("/"))
}
