// src/server/api.rs
// =============================================================================
// Request routing and handlers.
//
// `Api::handle` is transport-agnostic: it takes a method, a URL and the raw
// body and always produces an `ApiResponse`. The tiny_http loop in mod.rs
// only moves bytes in and out, which keeps the handlers testable without a
// socket.
// =============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::github::{validate_file_path, validate_ref_input, validate_repository_input};
use crate::service::DocsService;

use super::envelope::{ApiError, ApiResponse};

/// Body accepted by every repository endpoint; which fields are required
/// depends on the route.
#[derive(Debug, Default, Deserialize)]
struct RepoRequest {
    owner: Option<String>,
    repo: Option<String>,
    #[serde(rename = "ref")]
    git_ref: Option<String>,
    path: Option<String>,
}

/// Validated owner/repo/ref triple
struct Target {
    owner: String,
    repo: String,
    git_ref: Option<String>,
}

impl Target {
    fn git_ref(&self) -> Option<&str> {
        self.git_ref.as_deref()
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing_field(field))
}

impl RepoRequest {
    fn parse(body: &[u8]) -> Result<Self, ApiError> {
        serde_json::from_slice(body).map_err(|_| ApiError::Validation("Invalid JSON body".into()))
    }

    fn target(&mut self) -> Result<Target, ApiError> {
        let owner = required(self.owner.take(), "owner")?;
        let repo = required(self.repo.take(), "repo")?;
        validate_repository_input(&format!("{owner}/{repo}")).map_err(ApiError::Validation)?;

        let git_ref = self
            .git_ref
            .take()
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if let Some(r) = &git_ref {
            validate_ref_input(r).map_err(ApiError::Validation)?;
        }

        Ok(Target {
            owner,
            repo,
            git_ref,
        })
    }

    fn file_path(&mut self) -> Result<String, ApiError> {
        let path = required(self.path.take(), "path")?;
        validate_file_path(&path).map_err(ApiError::Validation)?;
        Ok(path)
    }
}

pub struct Api {
    service: Arc<DocsService>,
}

impl Api {
    pub fn new(service: Arc<DocsService>) -> Self {
        Api { service }
    }

    pub fn service(&self) -> &DocsService {
        &self.service
    }

    /// Route one request. Never fails: errors become error envelopes.
    pub async fn handle(&self, method: &str, url: &str, body: &[u8]) -> ApiResponse {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        info!(method, path, "api request");

        match self.route(method, path, body).await {
            Ok(resp) => resp,
            Err(err) => {
                error!(method, path, kind = err.kind(), cause = ?err, "api request failed");
                err.to_response()
            }
        }
    }

    async fn route(&self, method: &str, path: &str, body: &[u8]) -> Result<ApiResponse, ApiError> {
        let expected = match path {
            "/api/repository/validate"
            | "/api/repository/files"
            | "/api/repository/content"
            | "/api/cache/invalidate" => "POST",
            "/api/rate-limit" | "/api/cache/stats" => "GET",
            _ => return Err(ApiError::RouteNotFound(path.to_string())),
        };
        if !method.eq_ignore_ascii_case(expected) {
            return Err(ApiError::MethodNotAllowed {
                method: method.to_string(),
                path: path.to_string(),
            });
        }

        match path {
            "/api/repository/validate" => self.validate(body).await,
            "/api/repository/files" => self.files(body).await,
            "/api/repository/content" => self.content(body).await,
            "/api/rate-limit" => self.rate_limit().await,
            "/api/cache/stats" => Ok(ApiResponse::ok(self.service.cache().stats(), false)),
            _ => self.invalidate(body),
        }
    }

    async fn validate(&self, body: &[u8]) -> Result<ApiResponse, ApiError> {
        let target = RepoRequest::parse(body)?.target()?;
        let metadata = self.service.repository(&target.owner, &target.repo).await?;
        Ok(ApiResponse::from_cached(metadata))
    }

    async fn files(&self, body: &[u8]) -> Result<ApiResponse, ApiError> {
        let target = RepoRequest::parse(body)?.target()?;
        let files = self
            .service
            .files(&target.owner, &target.repo, target.git_ref())
            .await?;
        Ok(ApiResponse::from_cached(files))
    }

    async fn content(&self, body: &[u8]) -> Result<ApiResponse, ApiError> {
        let mut req = RepoRequest::parse(body)?;
        let target = req.target()?;
        let path = req.file_path()?;
        let content = self
            .service
            .content(&target.owner, &target.repo, &path, target.git_ref())
            .await?;
        Ok(ApiResponse::from_cached(content))
    }

    async fn rate_limit(&self) -> Result<ApiResponse, ApiError> {
        Ok(ApiResponse::from_cached(self.service.rate_limit().await?))
    }

    fn invalidate(&self, body: &[u8]) -> Result<ApiResponse, ApiError> {
        let target = RepoRequest::parse(body)?.target()?;
        let removed = self
            .service
            .cache()
            .invalidate_repository(&target.owner, &target.repo);
        info!(owner = %target.owner, repo = %target.repo, removed, "invalidated repository cache");
        Ok(ApiResponse::ok(json!({ "invalidated": removed }), false))
    }
}
