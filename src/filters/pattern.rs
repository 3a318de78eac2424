// src/filters/pattern.rs
// =============================================================================
// Include/exclude filtering of the file list by regular expression.
//
// Rules:
// - a blank pattern filters nothing
// - a pattern that doesn't compile filters nothing either, and the compile
//   error comes back as a message instead of a failure
// - include runs first; exclude only runs if include compiled
// - the input list is never modified, a new list is returned
// =============================================================================

use regex::{Regex, RegexBuilder};

use crate::github::MarkdownFile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    /// Off by default: "readme" matches README.md
    pub case_sensitive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterResult {
    pub files: Vec<MarkdownFile>,
    pub error: Option<String>,
}

impl FilterResult {
    fn ok(files: Vec<MarkdownFile>) -> Self {
        FilterResult { files, error: None }
    }
}

// Ok(None) for a blank pattern
fn compile(pattern: &str, options: FilterOptions) -> Result<Option<Regex>, String> {
    if pattern.trim().is_empty() {
        return Ok(None);
    }

    RegexBuilder::new(pattern)
        .case_insensitive(!options.case_sensitive)
        .build()
        .map(Some)
        .map_err(|e| e.to_string())
}

/// Checks that a pattern compiles; blank patterns are valid
pub fn validate_pattern(pattern: &str) -> Result<(), String> {
    compile(pattern, FilterOptions::default()).map(|_| ())
}

// Shared body of the include and exclude filters
fn retain(
    files: &[MarkdownFile],
    pattern: &str,
    options: FilterOptions,
    keep_matches: bool,
) -> FilterResult {
    match compile(pattern, options) {
        Ok(None) => FilterResult::ok(files.to_vec()),
        Ok(Some(regex)) => FilterResult::ok(
            files
                .iter()
                .filter(|file| regex.is_match(&file.path) == keep_matches)
                .cloned()
                .collect(),
        ),
        Err(error) => FilterResult {
            files: files.to_vec(),
            error: Some(error),
        },
    }
}

/// Keeps files whose path matches `pattern`
pub fn apply_include_filter(
    files: &[MarkdownFile],
    pattern: &str,
    options: FilterOptions,
) -> FilterResult {
    retain(files, pattern, options, true)
}

/// Drops files whose path matches `pattern`
pub fn apply_exclude_filter(
    files: &[MarkdownFile],
    pattern: &str,
    options: FilterOptions,
) -> FilterResult {
    retain(files, pattern, options, false)
}

// Runs the include filter, then the exclude filter
//
// Parameters:
//   files: the full file list
//   include, exclude: regex patterns; blank means "no filter"
//   options: case sensitivity for both patterns
//
// Returns: the surviving files, or the compile error of the first bad
// pattern. An include error stops before exclude runs.
//
// Example:
//   include "^docs/", exclude "\.test\." keeps docs/a.md, drops
//   docs/a.test.md and README.md
pub fn apply_filters(
    files: &[MarkdownFile],
    include: &str,
    exclude: &str,
    options: FilterOptions,
) -> FilterResult {
    let included = apply_include_filter(files, include, options);
    if included.error.is_some() {
        return included;
    }

    apply_exclude_filter(&included.files, exclude, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(paths: &[&str]) -> Vec<MarkdownFile> {
        paths
            .iter()
            .map(|p| MarkdownFile {
                path: p.to_string(),
                sha: format!("sha-{p}"),
                size: 1,
                url: String::new(),
            })
            .collect()
    }

    fn paths(result: &FilterResult) -> Vec<&str> {
        result.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_empty_patterns_are_identity() {
        let list = files(&["README.md", "docs/a.md", "docs/b.mdx"]);
        let result = apply_filters(&list, "", "", FilterOptions::default());
        assert_eq!(result.files, list);
        assert!(result.error.is_none());

        let result = apply_filters(&list, "   ", "\t", FilterOptions::default());
        assert_eq!(result.files, list);
    }

    #[test]
    fn test_include_and_exclude() {
        let list = files(&["README.md", "docs/a.md", "docs/test/b.md", "CHANGELOG.md"]);
        let result = apply_filters(&list, "^docs/", "test", FilterOptions::default());
        assert_eq!(paths(&result), vec!["docs/a.md"]);
    }

    #[test]
    fn test_case_sensitivity() {
        let list = files(&["README.md", "docs/readme.md", "guide.md"]);

        let insensitive = apply_include_filter(&list, "readme", FilterOptions::default());
        assert_eq!(paths(&insensitive), vec!["README.md", "docs/readme.md"]);

        let sensitive = apply_include_filter(&list, "readme", FilterOptions { case_sensitive: true });
        assert_eq!(paths(&sensitive), vec!["docs/readme.md"]);

        let excluded = apply_exclude_filter(&list, "README", FilterOptions::default());
        assert_eq!(paths(&excluded), vec!["guide.md"]);
    }

    #[test]
    fn test_invalid_include_returns_original_list() {
        let list = files(&["README.md", "docs/a.md"]);
        let result = apply_filters(&list, "(unclosed", "docs", FilterOptions::default());

        assert_eq!(result.files, list);
        let error = result.error.unwrap();
        assert!(!error.is_empty());
    }

    #[test]
    fn test_invalid_exclude_keeps_included_files() {
        let list = files(&["README.md", "docs/a.md"]);
        let result = apply_filters(&list, "docs", "[", FilterOptions::default());

        assert_eq!(paths(&result), vec!["docs/a.md"]);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_input_is_untouched() {
        let list = files(&["a.md", "b.md"]);
        let before = list.clone();
        let _ = apply_filters(&list, "a", "", FilterOptions::default());
        assert_eq!(list, before);
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("").is_ok());
        assert!(validate_pattern(r"^docs/.*\.md$").is_ok());
        assert!(validate_pattern("(").is_err());
    }
}
