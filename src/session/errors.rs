// src/session/errors.rs
// =============================================================================
// User-facing error descriptions: a short message, an optional hint, and a
// severity that decides how loudly to show it.
//
// Two entry points:
// - from_github_error: uses the typed kind when we have one
// - from_message: keyword matching over free text (server envelopes, anyhow
//   chains). Unrecognised text falls through to a plain error display.
// =============================================================================

use serde::Serialize;

use crate::github::GitHubError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    pub severity: Severity,
}

const NOT_FOUND_HINT: &str =
    "Double-check the owner/repo format and ensure the repository exists and is public.";
const RATE_LIMIT_HINT: &str =
    "Wait a few minutes before trying again, or add a GitHub token to increase your rate limit.";
const FORBIDDEN_HINT: &str =
    "This repository may be private. Use a GitHub token with appropriate access.";
const NETWORK_HINT: &str = "Check your internet connection and try again.";
const INPUT_HINT: &str = "Please check your input and try again.";
const SERVER_HINT: &str = "This is a temporary issue. Please try again later.";

impl ErrorDetails {
    fn new(message: impl Into<String>, suggestion: Option<&str>, severity: Severity) -> Self {
        ErrorDetails {
            message: message.into(),
            suggestion: suggestion.map(String::from),
            severity,
        }
    }

    fn not_found() -> Self {
        Self::new("Repository not found", Some(NOT_FOUND_HINT), Severity::Error)
    }

    fn rate_limited() -> Self {
        Self::new(
            "GitHub API rate limit exceeded",
            Some(RATE_LIMIT_HINT),
            Severity::Warning,
        )
    }

    fn forbidden() -> Self {
        Self::new(
            "Access denied to this repository",
            Some(FORBIDDEN_HINT),
            Severity::Error,
        )
    }

    /// Classify free-form error text. First matching rule wins.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

        if has(&["not found", "404"]) {
            Self::not_found()
        } else if has(&["rate limit", "429"]) {
            Self::rate_limited()
        } else if has(&["forbidden", "private", "403"]) {
            Self::forbidden()
        } else if has(&["network", "fetch", "connection"]) {
            Self::new("Network error", Some(NETWORK_HINT), Severity::Error)
        } else if has(&["invalid", "validation"]) {
            Self::new(message, Some(INPUT_HINT), Severity::Error)
        } else if has(&["500", "server error"]) {
            Self::new(
                "GitHub is experiencing issues",
                Some(SERVER_HINT),
                Severity::Warning,
            )
        } else if message.trim().is_empty() {
            Self::unexpected()
        } else {
            Self::new(message, None, Severity::Error)
        }
    }

    // Classifies a typed client failure
    //
    // Returns: message, suggestion and severity for display
    //
    // Example:
    //   RateLimited { reset_at } -> Warning, "GitHub API rate limit exceeded.
    //   Resets at ..." with the rate-limit suggestion
    pub fn from_github_error(err: &GitHubError) -> Self {
        match err {
            // The structured kind is enough, no message sniffing needed
            GitHubError::NotFound { .. } => Self::not_found(),
            GitHubError::Forbidden { .. } => Self::forbidden(),
            GitHubError::RateLimited { .. } => {
                let mut details = Self::rate_limited();
                details.message = err.to_string();
                details
            }
            GitHubError::Network(_) => {
                Self::new("Network error", Some(NETWORK_HINT), Severity::Error)
            }
            GitHubError::Api { status: Some(s), .. } if *s >= 500 => Self::new(
                "GitHub is experiencing issues",
                Some(SERVER_HINT),
                Severity::Warning,
            ),
            GitHubError::Api { .. } => Self::from_message(&err.to_string()),
        }
    }

    /// For failures we can't say anything useful about
    pub fn unexpected() -> Self {
        Self::new(
            "An unexpected error occurred",
            Some("Please try again or report this issue if it persists."),
            Severity::Error,
        )
    }
}

impl From<GitHubError> for ErrorDetails {
    fn from(err: GitHubError) -> Self {
        ErrorDetails::from_github_error(&err)
    }
}
