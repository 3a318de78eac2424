// src/github/error.rs
// =============================================================================
// Typed failures raised by the GitHub client.
//
// Instead of a class hierarchy (GitHubAPIError and friends) we use one enum.
// Callers that only care about the broad category use `kind()`; callers that
// need the payload (reset time, upstream body) match on the variant.
// =============================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Discriminant of a [`GitHubError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GitHubErrorKind {
    NotFound,
    Forbidden,
    RateLimited,
    ApiError,
}

#[derive(Debug, Error)]
pub enum GitHubError {
    /// The repository doesn't exist (or is invisible to us)
    #[error("Repository {owner}/{repo} not found")]
    NotFound { owner: String, repo: String },

    /// The repository exists but we may not read it
    #[error("Repository {owner}/{repo} is private or you don't have access")]
    Forbidden { owner: String, repo: String },

    /// 403 with zero remaining quota
    #[error(
        "GitHub API rate limit exceeded. Resets at {}",
        .reset_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )]
    RateLimited { reset_at: DateTime<Utc> },

    /// Any other upstream failure; `status` is None when no response arrived
    #[error("{message}")]
    Api {
        status: Option<u16>,
        message: String,
        body: serde_json::Value,
    },

    /// Transport failure (DNS, TLS, timeout, undecodable body)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl GitHubError {
    // Builds an Api failure that never reached a usable response
    pub fn api(message: impl Into<String>) -> Self {
        GitHubError::Api {
            status: None,
            message: message.into(),
            body: serde_json::Value::Null,
        }
    }

    pub fn kind(&self) -> GitHubErrorKind {
        match self {
            GitHubError::NotFound { .. } => GitHubErrorKind::NotFound,
            GitHubError::Forbidden { .. } => GitHubErrorKind::Forbidden,
            GitHubError::RateLimited { .. } => GitHubErrorKind::RateLimited,
            GitHubError::Api { .. } | GitHubError::Network(_) => GitHubErrorKind::ApiError,
        }
    }

    /// HTTP status as reported by GitHub (rate limiting arrives as 403)
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GitHubError::NotFound { .. } => Some(404),
            GitHubError::Forbidden { .. } | GitHubError::RateLimited { .. } => Some(403),
            GitHubError::Api { status, .. } => *status,
            GitHubError::Network(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_error_kinds() {
        let not_found = GitHubError::NotFound {
            owner: "octo".to_string(),
            repo: "missing".to_string(),
        };
        assert_eq!(not_found.kind(), GitHubErrorKind::NotFound);
        assert_eq!(not_found.status_code(), Some(404));
        assert_eq!(not_found.to_string(), "Repository octo/missing not found");

        let api = GitHubError::api("File content is not base64 encoded");
        assert_eq!(api.kind(), GitHubErrorKind::ApiError);
        assert_eq!(api.status_code(), None);
    }

    #[test]
    fn test_rate_limited_message_includes_reset() {
        let reset_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let error = GitHubError::RateLimited { reset_at };

        assert_eq!(error.kind(), GitHubErrorKind::RateLimited);
        assert_eq!(
            error.to_string(),
            "GitHub API rate limit exceeded. Resets at 2024-05-01T12:30:00.000Z"
        );
    }
}
