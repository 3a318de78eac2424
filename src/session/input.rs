// src/session/input.rs
// =============================================================================
// Turning what the user typed into an owner/repo/ref triple.
//
// Accepted:
//   owner/repo
//   https://github.com/owner/repo           (also .git, http://, www.)
//   https://github.com/owner/repo/tree/<ref>
//
// Anything else is rejected with None; the caller shows the usage hint.
// =============================================================================

use std::fmt;

use url::Url;

use crate::github::validate_repository_input;

/// Shown when `parse_repository_input` gives up
pub const INPUT_HINT: &str = "Invalid format. Use 'owner/repo' or paste a GitHub URL.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: Option<String>,
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)?;
        if let Some(r) = &self.git_ref {
            write!(f, "@{r}")?;
        }
        Ok(())
    }
}

fn is_owner_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn is_repo_char(c: char) -> bool {
    is_owner_char(c) || c == '.'
}

// Parses whatever the user typed into owner/repo/ref
//
// Supported formats:
//   - owner/repo
//   - https://github.com/owner/repo (also .git, http:// and www.)
//   - github.com/owner/repo
//   - https://github.com/owner/repo/tree/<ref>
//
// Returns: None for anything else
//
// Example:
//   "https://github.com/rust-lang/book/tree/main"
//     -> RepoRef { owner: "rust-lang", repo: "book", git_ref: Some("main") }
pub fn parse_repository_input(input: &str) -> Option<RepoRef> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return parse_github_url(trimmed);
    }
    if lower.starts_with("github.com/") || lower.starts_with("www.github.com/") {
        return parse_github_url(&format!("https://{trimmed}"));
    }

    // Plain owner/repo: exactly one '/'
    let (owner, repo) = trimmed.split_once('/')?;
    let valid = !owner.is_empty()
        && !repo.is_empty()
        && owner.chars().all(is_owner_char)
        && repo.chars().all(is_repo_char);
    if !valid {
        return None;
    }
    repo_ref(owner, repo, None)
}

// Last gate for both input shapes: the pair must also be usable in an
// endpoint path
fn repo_ref(owner: &str, repo: &str, git_ref: Option<String>) -> Option<RepoRef> {
    validate_repository_input(&format!("{owner}/{repo}")).ok()?;
    Some(RepoRef {
        owner: owner.to_string(),
        repo: repo.to_string(),
        git_ref,
    })
}

fn parse_github_url(raw: &str) -> Option<RepoRef> {
    let url = Url::parse(raw).ok()?;
    let host = url.host_str()?.trim_start_matches("www.");
    if !host.eq_ignore_ascii_case("github.com") {
        return None;
    }

    // Empty segments come from trailing or doubled slashes
    let mut segments = url.path_segments()?.filter(|s| !s.is_empty());
    let owner = segments.next()?;
    let repo = segments.next()?;
    let repo = repo.strip_suffix(".git").unwrap_or(repo);
    if repo.is_empty() {
        return None;
    }

    // Only /tree/<ref> carries a ref; blob/issues/etc. are ignored
    let git_ref = match (segments.next(), segments.next()) {
        (Some("tree"), Some(r)) => Some(r.to_string()),
        _ => None,
    };

    repo_ref(owner, repo, git_ref)
}
