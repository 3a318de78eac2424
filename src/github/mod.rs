// src/github/mod.rs
// =============================================================================
// This module talks to the GitHub REST API.
//
// Submodules:
// - client: the HTTP client (ETag-aware conditional requests, rate limits)
// - types: wire types from GitHub and markview's domain types
// - error: the typed failures the client raises
// - validate: owner/repo, ref and path validation shared by the CLI and the
//   API
// =============================================================================

mod client;
mod error;
mod types;
mod validate;

pub use client::{ClientConfig, GitHubClient, DEFAULT_API_URL};
pub use error::{GitHubError, GitHubErrorKind};
pub use types::{FileContent, MarkdownFile, RateLimitInfo, RepositoryMetadata};
pub use validate::{validate_file_path, validate_ref_input, validate_repository_input};
