use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::paths;

/// Counters above this value turn into a learned convention.
const CONVENTION_THRESHOLD: u64 = 3;

/// `activeLanguages` keeps this many entries after every fold.
pub const TOP_LANGUAGES: usize = 10;

/// `activeDirectories` keeps this many entries after every fold.
pub const TOP_DIRECTORIES: usize = 15;

// ===================================================================
// Change manifest
// ===================================================================

/// What kind of file an edit touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Test,
    Story,
    Config,
    Source,
}

impl FileKind {
    /// Classify by absolute (or as-given) path and project-relative path.
    pub fn classify(file_path: &str, rel_path: &str) -> Self {
        if paths::is_test_file(file_path) {
            FileKind::Test
        } else if paths::is_story_file(file_path) {
            FileKind::Story
        } else if paths::is_config_file(rel_path) {
            FileKind::Config
        } else {
            FileKind::Source
        }
    }
}

/// One file touched during the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub last_modified: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default)]
    pub tested: bool,
    #[serde(default)]
    pub edit_count: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_tests: Vec<String>,
}

/// Per-session record of edited files.
/// Stored as `.claude/.change-manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeManifest {
    #[serde(default = "Utc::now")]
    pub session_start: DateTime<Utc>,
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,
}

impl ChangeManifest {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            session_start,
            files: BTreeMap::new(),
        }
    }

    /// Record one write/edit of `rel_path`.
    ///
    /// `edit_count` always increases by one; `tested` never goes back to
    /// false; earlier `related_tests` survive until overwritten.
    pub fn record_edit(&mut self, rel_path: &str, kind: FileKind, now: DateTime<Utc>) -> &FileEntry {
        let previous = self.files.get(rel_path);
        let entry = FileEntry {
            last_modified: now,
            kind,
            tested: kind == FileKind::Test || previous.is_some_and(|p| p.tested),
            edit_count: previous.map_or(0, |p| p.edit_count) + 1,
            related_tests: previous.map(|p| p.related_tests.clone()).unwrap_or_default(),
        };
        self.files.insert(rel_path.to_string(), entry);
        &self.files[rel_path]
    }

    /// Attach discovered test files to an existing entry.
    pub fn set_related_tests(&mut self, rel_path: &str, tests: Vec<String>) -> bool {
        match self.files.get_mut(rel_path) {
            Some(entry) => {
                entry.related_tests = tests;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

// ===================================================================
// Ranked counters
// ===================================================================

/// Frequency counters that serialize most-frequent first.
///
/// Ties are broken by key so output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RankedCounts(BTreeMap<String, u64>);

impl RankedCounts {
    pub fn increment(&mut self, key: &str) {
        *self.0.entry(key.to_string()).or_insert(0) += 1;
    }

    pub fn get(&self, key: &str) -> u64 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries by descending count.
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut entries: Vec<(&str, u64)> = self.0.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    /// Keep only the `n` most frequent entries.
    pub fn truncate_top(&mut self, n: usize) {
        let keep: Vec<String> = self
            .ranked()
            .into_iter()
            .take(n)
            .map(|(k, _)| k.to_string())
            .collect();
        self.0.retain(|k, _| keep.contains(k));
    }
}

impl<const N: usize> From<[(&str, u64); N]> for RankedCounts {
    fn from(entries: [(&str, u64); N]) -> Self {
        Self(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

impl Serialize for RankedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.ranked())
    }
}

// ===================================================================
// Project profile
// ===================================================================

const LANGUAGES: &[(&str, &str)] = &[
    (".ts", "TypeScript"),
    (".tsx", "TypeScript (React)"),
    (".js", "JavaScript"),
    (".jsx", "JavaScript (React)"),
    (".py", "Python"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".java", "Java"),
    (".kt", "Kotlin"),
    (".rb", "Ruby"),
    (".php", "PHP"),
    (".cs", "C#"),
    (".css", "CSS"),
    (".scss", "SCSS"),
    (".vue", "Vue"),
    (".svelte", "Svelte"),
    (".sql", "SQL"),
    (".prisma", "Prisma"),
];

struct FilePattern {
    name: &'static str,
    pattern: &'static str,
    /// Convention set once the counter passes the threshold.
    convention: (&'static str, &'static str),
}

/// Checked in this order; a later pattern overwrites an earlier one's
/// convention when both share an aspect.
const FILE_PATTERNS: &[FilePattern] = &[
    FilePattern {
        name: "test-colocated",
        pattern: r"\.test\.(ts|tsx|js|jsx)$",
        convention: ("testStyle", "co-located .test files"),
    },
    FilePattern {
        name: "spec-colocated",
        pattern: r"\.spec\.(ts|tsx|js|jsx)$",
        convention: ("testStyle", "co-located .spec files"),
    },
    FilePattern {
        name: "storybook",
        pattern: r"\.stories\.(ts|tsx|js|jsx)$",
        convention: ("docs", "Storybook stories"),
    },
    FilePattern {
        name: "css-modules",
        pattern: r"\.module\.css$",
        convention: ("styling", "CSS Modules"),
    },
    FilePattern {
        name: "barrel-exports",
        pattern: r"index\.(ts|js)$",
        convention: ("exports", "barrel index files"),
    },
];

static FILE_PATTERN_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    FILE_PATTERNS
        .iter()
        .map(|p| Regex::new(p.pattern).expect("file pattern regex is valid"))
        .collect()
});

/// Cross-session aggregate of file activity.
/// Stored as `.claude/project-profile.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectProfile {
    pub last_updated: Option<DateTime<Utc>>,
    pub session_count: u64,
    pub active_languages: RankedCounts,
    pub active_directories: RankedCounts,
    pub file_patterns: BTreeMap<String, u64>,
    pub conventions: BTreeMap<String, String>,
}

impl ProjectProfile {
    /// Fold one session's manifest into the profile.
    ///
    /// Returns `false` (and leaves the profile untouched) when the manifest
    /// recorded no files.
    pub fn fold(&mut self, manifest: &ChangeManifest, now: DateTime<Utc>) -> bool {
        if manifest.is_empty() {
            return false;
        }

        self.session_count += 1;
        self.last_updated = Some(now);

        for file in manifest.files.keys() {
            let ext = paths::extension(file);
            if let Some((_, language)) = LANGUAGES.iter().find(|(e, _)| *e == ext) {
                self.active_languages.increment(language);
            }

            if let Some(dir) = leading_directory(file) {
                self.active_directories.increment(&dir);
            }

            for (pattern, re) in FILE_PATTERNS.iter().zip(FILE_PATTERN_REGEXES.iter()) {
                if re.is_match(file) {
                    *self.file_patterns.entry(pattern.name.to_string()).or_insert(0) += 1;
                }
            }
        }

        for pattern in FILE_PATTERNS {
            if self.file_patterns.get(pattern.name).copied().unwrap_or(0) > CONVENTION_THRESHOLD {
                let (aspect, value) = pattern.convention;
                self.conventions.insert(aspect.to_string(), value.to_string());
            }
        }

        self.active_languages.truncate_top(TOP_LANGUAGES);
        self.active_directories.truncate_top(TOP_DIRECTORIES);
        true
    }

    /// The `n` most active languages.
    pub fn top_languages(&self, n: usize) -> Vec<&str> {
        self.active_languages
            .ranked()
            .into_iter()
            .take(n)
            .map(|(k, _)| k)
            .collect()
    }
}

/// First two segments of the file's directory (`src/a/b/c.ts` → `src/a`),
/// or `None` for files at the project root.
fn leading_directory(rel_path: &str) -> Option<String> {
    let (dir, _) = rel_path.rsplit_once('/')?;
    let leading: Vec<&str> = dir.split('/').take(2).collect();
    let joined = leading.join("/");
    if joined.is_empty() || joined == "." {
        None
    } else {
        Some(joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn manifest_with(files: &[&str]) -> ChangeManifest {
        let mut m = ChangeManifest::new(at(0));
        for f in files {
            m.record_edit(f, FileKind::classify(f, f), at(1));
        }
        m
    }

    // ---------------------------------------------------------------
    // Manifest
    // ---------------------------------------------------------------

    #[test]
    fn edit_count_increments_per_edit() {
        let mut m = ChangeManifest::new(at(0));
        for i in 1..=3 {
            m.record_edit("src/a.ts", FileKind::Source, at(i));
        }
        let entry = &m.files["src/a.ts"];
        assert_eq!(entry.edit_count, 3);
        assert_eq!(entry.kind, FileKind::Source);
        assert_eq!(entry.last_modified, at(3));
    }

    #[test]
    fn tested_is_sticky() {
        let mut m = ChangeManifest::new(at(0));
        m.record_edit("src/a.test.ts", FileKind::Test, at(1));
        let entry = m.record_edit("src/a.test.ts", FileKind::Source, at(2));
        assert!(entry.tested);
    }

    #[test]
    fn related_tests_survive_reedit() {
        let mut m = ChangeManifest::new(at(0));
        m.record_edit("src/a.ts", FileKind::Source, at(1));
        assert!(m.set_related_tests("src/a.ts", vec!["src/a.test.ts".into()]));
        let entry = m.record_edit("src/a.ts", FileKind::Source, at(2));
        assert_eq!(entry.related_tests, vec!["src/a.test.ts".to_string()]);
        assert!(!m.set_related_tests("src/missing.ts", vec![]));
    }

    #[test]
    fn classify_file_kinds() {
        assert_eq!(FileKind::classify("/p/src/a.spec.ts", "src/a.spec.ts"), FileKind::Test);
        assert_eq!(FileKind::classify("/p/src/B.stories.tsx", "src/B.stories.tsx"), FileKind::Story);
        assert_eq!(FileKind::classify("/p/vite.config.ts", "vite.config.ts"), FileKind::Config);
        assert_eq!(FileKind::classify("/p/src/main.ts", "src/main.ts"), FileKind::Source);
    }

    #[test]
    fn manifest_json_shape() {
        let mut m = ChangeManifest::new(at(0));
        m.record_edit("src/a.ts", FileKind::Source, at(1));
        let v = serde_json::to_value(&m).unwrap();
        assert!(v["sessionStart"].is_string());
        let entry = &v["files"]["src/a.ts"];
        assert_eq!(entry["type"], "source");
        assert_eq!(entry["tested"], false);
        assert_eq!(entry["editCount"], 1);
        assert!(entry["lastModified"].is_string());
        assert!(entry.get("relatedTests").is_none());
    }

    #[test]
    fn manifest_accepts_minimal_json() {
        let m: ChangeManifest = serde_json::from_str(r#"{"files": {}}"#).unwrap();
        assert!(m.is_empty());
    }

    // ---------------------------------------------------------------
    // Ranked counts
    // ---------------------------------------------------------------

    #[test]
    fn ranked_counts_serialize_most_frequent_first() {
        let counts = RankedCounts::from([("Go", 1), ("Rust", 5), ("CSS", 1), ("Python", 3)]);
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"Rust":5,"Python":3,"CSS":1,"Go":1}"#);
    }

    #[test]
    fn truncate_top_keeps_most_frequent() {
        let mut counts = RankedCounts::from([("a", 1), ("b", 4), ("c", 2)]);
        counts.truncate_top(2);
        assert_eq!(counts.ranked(), vec![("b", 4), ("c", 2)]);
    }

    // ---------------------------------------------------------------
    // Profile fold
    // ---------------------------------------------------------------

    #[test]
    fn empty_manifest_is_a_no_op() {
        let mut profile = ProjectProfile::default();
        assert!(!profile.fold(&ChangeManifest::new(at(0)), at(1)));
        assert_eq!(profile, ProjectProfile::default());
    }

    #[test]
    fn fold_counts_languages_directories_and_patterns() {
        let mut profile = ProjectProfile::default();
        let manifest = manifest_with(&[
            "src/components/Button.tsx",
            "src/components/Button.test.tsx",
            "src/index.ts",
            "README.md",
        ]);
        assert!(profile.fold(&manifest, at(5)));

        assert_eq!(profile.session_count, 1);
        assert_eq!(profile.last_updated, Some(at(5)));
        assert_eq!(profile.active_languages.get("TypeScript (React)"), 2);
        assert_eq!(profile.active_languages.get("TypeScript"), 1);
        assert_eq!(profile.active_languages.len(), 2);
        assert_eq!(profile.active_directories.get("src/components"), 2);
        assert_eq!(profile.active_directories.get("src"), 1);
        assert_eq!(profile.file_patterns.get("test-colocated"), Some(&1));
        assert_eq!(profile.file_patterns.get("barrel-exports"), Some(&1));
        assert!(profile.conventions.is_empty());
    }

    #[test]
    fn conventions_appear_above_threshold() {
        let mut profile = ProjectProfile::default();
        let manifest = manifest_with(&["a/x.test.ts", "a/y.test.ts", "a/z.test.ts", "a/w.test.ts"]);
        profile.fold(&manifest, at(1));
        assert_eq!(
            profile.conventions.get("testStyle").map(String::as_str),
            Some("co-located .test files")
        );
    }

    #[test]
    fn three_matches_are_not_enough_for_a_convention() {
        let mut profile = ProjectProfile::default();
        profile.fold(&manifest_with(&["a.module.css", "b.module.css", "c.module.css"]), at(1));
        assert!(!profile.conventions.contains_key("styling"));
        profile.fold(&manifest_with(&["d.module.css"]), at(2));
        assert_eq!(
            profile.conventions.get("styling").map(String::as_str),
            Some("CSS Modules")
        );
        assert_eq!(profile.session_count, 2);
    }

    #[test]
    fn fold_truncates_to_top_n_sorted_by_count() {
        let mut profile = ProjectProfile::default();
        let exts = [
            "ts", "tsx", "js", "jsx", "py", "go", "rs", "java", "kt", "rb", "php", "cs", "css",
        ];
        let mut files: Vec<String> = Vec::new();
        for (i, ext) in exts.iter().enumerate() {
            for j in 0..=i {
                files.push(format!("dir{i}/sub{j}/file{j}.{ext}"));
            }
        }
        let refs: Vec<&str> = files.iter().map(String::as_str).collect();
        profile.fold(&manifest_with(&refs), at(1));

        assert_eq!(profile.active_languages.len(), TOP_LANGUAGES);
        assert!(profile.active_directories.len() <= TOP_DIRECTORIES);
        let ranked = profile.active_languages.ranked();
        assert!(ranked.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(ranked[0], ("CSS", 13));
        // The three least-used languages fell off.
        assert_eq!(profile.active_languages.get("TypeScript"), 0);
    }

    #[test]
    fn leading_directory_takes_two_segments() {
        assert_eq!(leading_directory("src/a/b/c.ts").as_deref(), Some("src/a"));
        assert_eq!(leading_directory("src/c.ts").as_deref(), Some("src"));
        assert_eq!(leading_directory("c.ts"), None);
    }

    #[test]
    fn top_languages_follow_rank() {
        let profile = ProjectProfile {
            active_languages: RankedCounts::from([("Go", 2), ("Rust", 9), ("SQL", 4), ("CSS", 1)]),
            ..Default::default()
        };
        assert_eq!(profile.top_languages(3), vec!["Rust", "SQL", "Go"]);
    }

    #[test]
    fn profile_accepts_partial_json() {
        let p: ProjectProfile =
            serde_json::from_str(r#"{"sessionCount": 4, "conventions": {"docs": "Storybook stories"}}"#)
                .unwrap();
        assert_eq!(p.session_count, 4);
        assert!(p.last_updated.is_none());
        assert!(p.active_languages.is_empty());
    }
}
