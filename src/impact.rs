//! Non-blocking advisories for a file that is about to be written.

use std::path::Path;

use crate::paths;

/// Extensions the annotator looks at.
const CODE_EXTS: &[&str] = &[".ts", ".tsx", ".js", ".jsx", ".vue", ".svelte"];

/// Directory names whose contents are usually imported from many places.
const SHARED_SEGMENTS: &[&str] = &[
    "hooks",
    "utils",
    "lib",
    "helpers",
    "contexts",
    "providers",
    "stores",
    "shared",
    "common",
    "core",
];

pub const BARREL_FILE: &str =
    "[Impact] Editing barrel/index file — changes may affect all consumers of this module.";
pub const SHARED_MODULE: &str = "[Impact] Editing shared utility — multiple modules may depend on this. Run full test suite after changes.";
pub const CONFIG_FILE: &str =
    "[Impact] Editing config file — this affects the entire project build/behavior.";
pub const MISSING_TEST: &str =
    "[Quality] No co-located test file found. Consider adding tests for this file.";

/// Every advisory that applies to `file_path`, in a fixed order.
///
/// The path is resolved against `project` for the sibling-test lookup.
/// Files outside [`CODE_EXTS`] get nothing.
pub fn annotate(project: &Path, file_path: &str) -> Vec<&'static str> {
    let ext = paths::extension(file_path);
    if !CODE_EXTS.contains(&ext.as_str()) {
        return Vec::new();
    }

    let rel_path = paths::relative_to(project, file_path);
    let mut advisories = Vec::new();

    if paths::stem(file_path) == "index" {
        advisories.push(BARREL_FILE);
    }
    if in_shared_module(&rel_path) {
        advisories.push(SHARED_MODULE);
    }
    if paths::is_config_file(&rel_path) {
        advisories.push(CONFIG_FILE);
    }
    if !looks_like_test(&rel_path) && !has_colocated_test(project, file_path, &ext) {
        advisories.push(MISSING_TEST);
    }

    advisories
}

/// Whether any directory segment of the relative path is a shared-module name.
fn in_shared_module(rel_path: &str) -> bool {
    let mut segments: Vec<&str> = rel_path.split('/').collect();
    segments.pop();
    segments
        .iter()
        .any(|seg| SHARED_SEGMENTS.iter().any(|s| seg.eq_ignore_ascii_case(s)))
}

fn looks_like_test(rel_path: &str) -> bool {
    ["test", "spec", "stories"].iter().any(|t| rel_path.contains(t))
}

fn has_colocated_test(project: &Path, file_path: &str, ext: &str) -> bool {
    [".test", ".spec"]
        .iter()
        .filter_map(|infix| paths::with_infix(file_path, ext, infix))
        .any(|candidate| paths::resolve(project, &candidate).exists())
}
