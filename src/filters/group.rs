// src/filters/group.rs
// =============================================================================
// Display helpers for the file list: directory grouping and filter presets.
// =============================================================================

use std::collections::BTreeMap;

use crate::github::MarkdownFile;

/// Group name for files at the repository root
pub const ROOT_GROUP: &str = "Root";

/// A named include/exclude pair offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterPreset {
    pub key: &'static str,
    pub name: &'static str,
    pub include: &'static str,
    pub exclude: &'static str,
}

pub const FILTER_PRESETS: &[FilterPreset] = &[
    FilterPreset {
        key: "documentation",
        name: "Documentation Only",
        include: "^docs/",
        exclude: "",
    },
    FilterPreset {
        key: "noTests",
        name: "Exclude Tests",
        include: "",
        exclude: r"test|spec|\.test\.|_test\.",
    },
    FilterPreset {
        key: "readmes",
        name: "READMEs Only",
        include: "README",
        exclude: "",
    },
    FilterPreset {
        key: "rootOnly",
        name: "Root Files Only",
        include: r"^[^/]+\.md$",
        exclude: "",
    },
];

pub fn find_preset(key: &str) -> Option<&'static FilterPreset> {
    FILTER_PRESETS.iter().find(|p| p.key.eq_ignore_ascii_case(key))
}

/// Everything before the last '/', or "" for root files
pub fn directory_of(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
}

pub fn file_name(path: &str) -> &str {
    path.rsplit_once('/').map(|(_, name)| name).unwrap_or(path)
}

// Groups files by the directory they live in
//
// Returns: (directory, files) pairs sorted by name, with root files grouped
// under ROOT_GROUP. Files keep list order inside a group.
//
// Example:
//   [README.md, docs/b.md, api/x.md, docs/a.md]
//     -> [("Root", [README.md]), ("api", [x.md]), ("docs", [b.md, a.md])]
pub fn group_by_directory(files: &[MarkdownFile]) -> Vec<(String, Vec<MarkdownFile>)> {
    let mut groups: BTreeMap<String, Vec<MarkdownFile>> = BTreeMap::new();

    for file in files {
        let dir = match directory_of(&file.path) {
            "" => ROOT_GROUP,
            dir => dir,
        };
        groups.entry(dir.to_string()).or_default().push(file.clone());
    }

    groups.into_iter().collect()
}
