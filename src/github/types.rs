// src/github/types.rs
// =============================================================================
// Data types for the GitHub REST API (v3).
//
// Two kinds of types live here:
// - Wire types: shaped exactly like GitHub's JSON, only used for decoding
// - Domain types: what the rest of markview works with, serialized in
//   camelCase for the JSON API
//
// Endpoints used:
// - GET /repos/:owner/:repo                          -> GitHubRepository
// - GET /repos/:owner/:repo/git/trees/:ref?recursive=1 -> GitHubTree
// - GET /repos/:owner/:repo/contents/:path           -> GitHubFileContent
// - GET /rate_limit                                  -> GitHubRateLimitResponse
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Wire types
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub owner: GitHubOwner,
    pub html_url: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTree {
    pub sha: String,
    pub tree: Vec<GitHubTreeItem>,
    // GitHub cuts off very large recursive listings and sets this flag
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubTreeItem {
    pub path: String,
    /// "blob" for files, "tree" for directories, "commit" for submodules
    #[serde(rename = "type")]
    pub kind: String,
    pub sha: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub url: String,
}

impl GitHubTreeItem {
    // A tree entry counts as Markdown when it is a file ending in .md or .mdx
    pub fn is_markdown_blob(&self) -> bool {
        if self.kind != "blob" {
            return false;
        }
        let path = self.path.to_lowercase();
        path.ends_with(".md") || path.ends_with(".mdx")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubFileContent {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    /// Base64 payload, wrapped with newlines every 60 characters
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimitResponse {
    pub rate: GitHubRateLimit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRateLimit {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp (seconds)
    pub reset: i64,
    #[serde(default)]
    pub used: u32,
}

// -----------------------------------------------------------------------------
// Domain types
// -----------------------------------------------------------------------------

/// Snapshot of a repository, fetched once per repository load
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryMetadata {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub default_branch: String,
    pub is_private: bool,
    pub html_url: String,
}

impl From<GitHubRepository> for RepositoryMetadata {
    fn from(repo: GitHubRepository) -> Self {
        RepositoryMetadata {
            owner: repo.owner.login,
            name: repo.name,
            full_name: repo.full_name,
            description: repo.description,
            default_branch: repo.default_branch,
            is_private: repo.private,
            html_url: repo.html_url,
        }
    }
}

/// A Markdown file in the repository tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownFile {
    /// Repo-relative, forward-slash separated
    pub path: String,
    pub sha: String,
    /// Bytes, 0 when GitHub didn't report a size
    pub size: u64,
    /// API blob url
    pub url: String,
}

impl From<GitHubTreeItem> for MarkdownFile {
    fn from(item: GitHubTreeItem) -> Self {
        MarkdownFile {
            path: item.path,
            sha: item.sha,
            size: item.size.unwrap_or(0),
            url: item.url,
        }
    }
}

/// Decoded contents of a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub path: String,
    pub content: String,
    pub sha: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
    pub used: u32,
}

impl From<GitHubRateLimit> for RateLimitInfo {
    fn from(rate: GitHubRateLimit) -> Self {
        RateLimitInfo {
            limit: rate.limit,
            remaining: rate.remaining,
            reset_at: DateTime::from_timestamp(rate.reset, 0).unwrap_or_else(Utc::now),
            used: rate.used,
        }
    }
}
