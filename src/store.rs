use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::metadata::{ChangeManifest, ProjectProfile};

/// State directory, relative to the project root.
pub const STATE_DIR: &str = ".claude";

const MANIFEST_FILE: &str = ".change-manifest.json";
const MODIFIED_LOG_FILE: &str = ".modified-files.log";
const PROFILE_FILE: &str = "project-profile.json";
const PLANS_DIR: &str = "plans";

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- \[[ x]\]").expect("checkbox regex is valid"));

static CHECKED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- \[x\]").expect("checked regex is valid"));

/// Read and deserialize a JSON file, returning `None` if it doesn't exist.
fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(s) => {
            let val = serde_json::from_str(&s)
                .with_context(|| format!("parsing {}", path.display()))?;
            Ok(Some(val))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("serializing {}", path.display()))?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

/// Done/total checkbox counts for one plans file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChecklistProgress {
    pub name: String,
    pub done: usize,
    pub total: usize,
}

impl ChecklistProgress {
    pub fn from_markdown(name: &str, markdown: &str) -> Self {
        Self {
            name: name.to_string(),
            done: CHECKED.find_iter(markdown).count(),
            total: CHECKBOX.find_iter(markdown).count(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.done)
    }
}

/// Files the hooks share across invocations, all under `<project>/.claude/`.
///
/// Hooks run one at a time, so every operation is a plain
/// read-modify-write with no locking.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(project: &Path) -> Self {
        Self {
            dir: project.join(STATE_DIR),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    fn log_path(&self) -> PathBuf {
        self.dir.join(MODIFIED_LOG_FILE)
    }

    fn profile_path(&self) -> PathBuf {
        self.dir.join(PROFILE_FILE)
    }

    fn plans_dir(&self) -> PathBuf {
        self.dir.join(PLANS_DIR)
    }

    // ---------------------------------------------------------------
    // Change manifest
    // ---------------------------------------------------------------

    /// The session manifest, or a fresh one starting at `now` when the
    /// file is absent.
    pub fn load_manifest(&self, now: DateTime<Utc>) -> Result<ChangeManifest> {
        Ok(read_json_file(&self.manifest_path())?.unwrap_or_else(|| ChangeManifest::new(now)))
    }

    pub fn save_manifest(&self, manifest: &ChangeManifest) -> Result<()> {
        write_json_file(&self.manifest_path(), manifest)
    }

    pub fn reset_manifest(&self, now: DateTime<Utc>) -> Result<()> {
        self.save_manifest(&ChangeManifest::new(now))
    }

    // ---------------------------------------------------------------
    // Modified-files log
    // ---------------------------------------------------------------

    /// Append `"<timestamp> <path>"` to the modified-files log.
    pub fn append_modified(&self, file_path: &str, now: DateTime<Utc>) -> Result<()> {
        let path = self.log_path();
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening {}", path.display()))?;
        writeln!(log, "{} {}", now.to_rfc3339_opts(SecondsFormat::Millis, true), file_path)
            .with_context(|| format!("appending to {}", path.display()))
    }

    pub fn truncate_log(&self) -> Result<()> {
        let path = self.log_path();
        fs::create_dir_all(&self.dir).with_context(|| format!("creating {}", self.dir.display()))?;
        fs::write(&path, "").with_context(|| format!("truncating {}", path.display()))
    }

    /// Paths from the log in the order they were written, repeats included.
    pub fn modified_paths(&self) -> Result<Vec<String>> {
        let path = self.log_path();
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        Ok(contents
            .lines()
            .filter_map(|line| line.split_once(' ').map(|(_, p)| p.trim()))
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Distinct logged paths in first-seen order.
    pub fn distinct_modified(&self) -> Result<Vec<String>> {
        let mut seen = Vec::new();
        for path in self.modified_paths()? {
            if !seen.contains(&path) {
                seen.push(path);
            }
        }
        Ok(seen)
    }

    /// The last `n` distinct paths, oldest first.
    pub fn recent_modified(&self, n: usize) -> Result<Vec<String>> {
        let mut recent: Vec<String> = Vec::new();
        for path in self.modified_paths()?.into_iter().rev() {
            if recent.len() == n {
                break;
            }
            if !recent.contains(&path) {
                recent.push(path);
            }
        }
        recent.reverse();
        Ok(recent)
    }

    // ---------------------------------------------------------------
    // Project profile
    // ---------------------------------------------------------------

    pub fn load_profile(&self) -> Result<Option<ProjectProfile>> {
        read_json_file(&self.profile_path())
    }

    pub fn save_profile(&self, profile: &ProjectProfile) -> Result<()> {
        write_json_file(&self.profile_path(), profile)
    }

    // ---------------------------------------------------------------
    // Plans
    // ---------------------------------------------------------------

    /// Markdown file names under `plans/`, sorted.
    pub fn plan_files(&self) -> Result<Vec<String>> {
        let dir = self.plans_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".md") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Plans files whose name contains `checklist`.
    pub fn checklist_files(&self) -> Result<Vec<String>> {
        Ok(self
            .plan_files()?
            .into_iter()
            .filter(|name| name.contains("checklist"))
            .collect())
    }

    pub fn checklist_progress(&self, name: &str) -> Result<ChecklistProgress> {
        let path = self.plans_dir().join(name);
        let markdown =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        Ok(ChecklistProgress::from_markdown(name, &markdown))
    }
}
