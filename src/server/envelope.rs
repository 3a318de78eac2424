// src/server/envelope.rs
// =============================================================================
// JSON envelopes for every API response.
//
//   success: {"data": T, "cached": bool}
//   failure: {"error": <kind>, "message": String, "statusCode": u16, "details"?}
//
// `ApiError` is what handlers return; it knows its own status code and how
// to render itself. Only `message` reaches the client, never the raw cause.
// =============================================================================

use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::github::GitHubError;
use crate::service::Cached;

/// A finished response: status + JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(data: T, cached: bool) -> Self {
        ApiResponse {
            status: 200,
            body: success_envelope(data, cached),
        }
    }

    pub fn from_cached<T: Serialize>(value: Cached<T>) -> Self {
        Self::ok(value.data, value.cached)
    }
}

pub fn success_envelope<T: Serialize>(data: T, cached: bool) -> Value {
    match serde_json::to_value(data) {
        Ok(data) => json!({ "data": data, "cached": cached }),
        // Domain types always serialize; keep the shape anyway
        Err(e) => json!({ "data": Value::Null, "cached": cached, "warning": e.to_string() }),
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed body or field
    #[error("{0}")]
    Validation(String),

    #[error("Route {0} not found")]
    RouteNotFound(String),

    #[error("Method {method} not allowed on {path}")]
    MethodNotAllowed { method: String, path: String },

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::Validation(format!("Missing required field: {field}"))
    }

    /// The `error` string of the envelope
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "ValidationError",
            ApiError::RouteNotFound(_) => "NotFound",
            ApiError::MethodNotAllowed { .. } => "MethodNotAllowed",
            ApiError::GitHub(GitHubError::NotFound { .. }) => "RepositoryNotFound",
            ApiError::GitHub(GitHubError::Forbidden { .. }) => "RepositoryForbidden",
            ApiError::GitHub(GitHubError::RateLimited { .. }) => "RateLimitExceeded",
            ApiError::GitHub(_) => "GitHubAPIError",
            ApiError::Internal(_) => "InternalServerError",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::RouteNotFound(_) => 404,
            ApiError::MethodNotAllowed { .. } => 405,
            ApiError::GitHub(GitHubError::NotFound { .. }) => 404,
            ApiError::GitHub(GitHubError::Forbidden { .. }) => 403,
            // GitHub says 403; we tell our callers 429
            ApiError::GitHub(GitHubError::RateLimited { .. }) => 429,
            ApiError::GitHub(err) => match err.status_code() {
                Some(status) if (400..=599).contains(&status) => status,
                _ => 500,
            },
            ApiError::Internal(_) => 500,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ApiError::GitHub(GitHubError::RateLimited { reset_at }) => Some(json!({
                "resetAt": reset_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            })),
            ApiError::GitHub(GitHubError::Api { body, .. }) if !body.is_null() => {
                Some(body.clone())
            }
            _ => None,
        }
    }

    pub fn to_response(&self) -> ApiResponse {
        let status = self.status_code();
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "statusCode": status,
        });
        if let (Some(details), Some(obj)) = (self.details(), body.as_object_mut()) {
            obj.insert("details".to_string(), details);
        }
        ApiResponse { status, body }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_success_envelope() {
        let resp = ApiResponse::ok(vec!["README.md"], true);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, json!({"data": ["README.md"], "cached": true}));
    }

    #[test]
    fn test_not_found_envelope() {
        let err = ApiError::from(GitHubError::NotFound {
            owner: "octo".to_string(),
            repo: "missing".to_string(),
        });
        let resp = err.to_response();
        assert_eq!(resp.status, 404);
        assert_eq!(
            resp.body,
            json!({
                "error": "RepositoryNotFound",
                "message": "Repository octo/missing not found",
                "statusCode": 404
            })
        );
    }

    #[test]
    fn test_rate_limited_envelope() {
        let reset_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let resp = ApiError::from(GitHubError::RateLimited { reset_at }).to_response();
        assert_eq!(resp.status, 429);
        assert_eq!(resp.body["error"], "RateLimitExceeded");
        assert_eq!(resp.body["statusCode"], 429);
        assert_eq!(resp.body["details"]["resetAt"], "2024-01-02T03:04:05.000Z");
    }

    #[test]
    fn test_api_error_keeps_upstream_status_and_body() {
        let err = ApiError::from(GitHubError::Api {
            status: Some(422),
            message: "Validation Failed".to_string(),
            body: json!({"message": "Validation Failed"}),
        });
        let resp = err.to_response();
        assert_eq!(resp.status, 422);
        assert_eq!(resp.body["error"], "GitHubAPIError");
        assert_eq!(resp.body["details"], json!({"message": "Validation Failed"}));

        // No upstream status: generic 500
        let resp = ApiError::from(GitHubError::api("boom")).to_response();
        assert_eq!(resp.status, 500);
        assert!(resp.body.get("details").is_none());
    }

    #[test]
    fn test_validation_envelope() {
        let resp = ApiError::missing_field("path").to_response();
        assert_eq!(resp.status, 400);
        assert_eq!(resp.body["error"], "ValidationError");
        assert_eq!(resp.body["message"], "Missing required field: path");
    }
}
