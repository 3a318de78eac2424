// src/cache/keys.rs
// Cache keys are plain strings derived from the request. Every key that
// belongs to a repository contains "owner/repo", which is what
// `ResponseCache::invalidate_repository` searches for.

pub const RATE_LIMIT: &str = "ratelimit";

fn ref_or_default(git_ref: Option<&str>) -> &str {
    git_ref.filter(|r| !r.is_empty()).unwrap_or("default")
}

pub fn repository(owner: &str, repo: &str) -> String {
    format!("repo:{owner}/{repo}")
}

pub fn file_tree(owner: &str, repo: &str, git_ref: Option<&str>) -> String {
    format!("tree:{owner}/{repo}:{}", ref_or_default(git_ref))
}

// Key for one file's decoded content
//
// Example:
//   ("octo", "docs", "guide/intro.md", None)
//     -> "content:octo/docs:default:guide/intro.md"
pub fn file_content(owner: &str, repo: &str, path: &str, git_ref: Option<&str>) -> String {
    format!("content:{owner}/{repo}:{}:{path}", ref_or_default(git_ref))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(repository("octo", "docs"), "repo:octo/docs");
        assert_eq!(file_tree("octo", "docs", None), "tree:octo/docs:default");
        assert_eq!(file_tree("octo", "docs", Some("")), "tree:octo/docs:default");
        assert_eq!(file_tree("octo", "docs", Some("v1")), "tree:octo/docs:v1");
        assert_eq!(
            file_content("octo", "docs", "docs/a.md", Some("main")),
            "content:octo/docs:main:docs/a.md"
        );
    }
}
