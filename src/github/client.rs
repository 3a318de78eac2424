// src/github/client.rs
// =============================================================================
// GitHub REST API client.
//
// Responsibilities:
// - Send every request with the v3 Accept header, a User-Agent and, when
//   configured, a bearer token
// - Conditional requests: remember the last ETag (and decoded body) per
//   endpoint and send it back as If-None-Match; a 304 replays the stored body.
//   The store is an LRU capped at ETAG_STORE_CAPACITY endpoints
// - Parse x-ratelimit-* headers on every response and turn "403 with zero
//   remaining" into a RateLimited failure
// - Map raw GitHub resources into markview's domain types
//
// One client is built at startup and shared (behind an Arc) by every request
// handler. The ETag store is the only mutable state and sits behind a lock.
// =============================================================================

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use lru::LruCache;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, ACCEPT, ETAG, IF_NONE_MATCH};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::GitHubError;
use super::types::{
    FileContent, GitHubFileContent, GitHubRateLimitResponse, GitHubRepository, GitHubTree,
    MarkdownFile, RateLimitInfo, RepositoryMetadata,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("markview/", env!("CARGO_PKG_VERSION"));

// Endpoints whose last body is kept for 304 replays
const ETAG_STORE_CAPACITY: usize = 256;

// Used when GitHub says we're out of quota but doesn't say until when
const RATE_LIMIT_FALLBACK_SECS: i64 = 60 * 60;

/// Settings for [`GitHubClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL without a trailing slash
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// Last successful response for one endpoint string
#[derive(Debug, Clone)]
struct ETagEntry {
    etag: String,
    data: Value,
    fetched_at: DateTime<Utc>,
}

// Rate-limit headers as they appeared on a single response.
// Each header is optional because GitHub omits them on some errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct HeaderRateLimit {
    limit: Option<u32>,
    remaining: Option<u32>,
    reset_at: Option<DateTime<Utc>>,
    used: Option<u32>,
}

impl HeaderRateLimit {
    fn to_info(self) -> Option<RateLimitInfo> {
        let (limit, remaining, reset_at) = (self.limit?, self.remaining?, self.reset_at?);
        Some(RateLimitInfo {
            limit,
            remaining,
            reset_at,
            used: self.used.unwrap_or(limit.saturating_sub(remaining)),
        })
    }
}

fn parse_rate_limit_headers(headers: &HeaderMap) -> HeaderRateLimit {
    let number = |name: &str| -> Option<i64> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    };

    HeaderRateLimit {
        limit: number("x-ratelimit-limit").and_then(|n| u32::try_from(n).ok()),
        remaining: number("x-ratelimit-remaining").and_then(|n| u32::try_from(n).ok()),
        reset_at: number("x-ratelimit-reset").and_then(|secs| DateTime::from_timestamp(secs, 0)),
        used: number("x-ratelimit-used").and_then(|n| u32::try_from(n).ok()),
    }
}

pub struct GitHubClient {
    http: Client,
    base_url: String,
    token: Option<String>,
    etags: Mutex<LruCache<String, ETagEntry>>,
    etag_capacity: usize,
    last_rate_limit: Mutex<Option<RateLimitInfo>>,
}

impl GitHubClient {
    pub fn new(config: ClientConfig) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(GitHubClient {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.filter(|t| !t.trim().is_empty()),
            etags: Mutex::new(LruCache::unbounded()),
            etag_capacity: ETAG_STORE_CAPACITY,
            last_rate_limit: Mutex::new(None),
        })
    }

    // Issues a GET for `endpoint` (a path like "/repos/o/r") and decodes the
    // JSON body into T
    async fn request<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, GitHubError> {
        let value = self.request_value(endpoint).await?;
        serde_json::from_value(value).map_err(|e| {
            GitHubError::api(format!("Unexpected response from GitHub for {endpoint}: {e}"))
        })
    }

    async fn request_value(&self, endpoint: &str) -> Result<Value, GitHubError> {
        let known_etag = self.etags.lock().get(endpoint).map(|e| e.etag.clone());

        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self.http.get(&url).header(ACCEPT, API_ACCEPT);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(etag) = &known_etag {
            request = request.header(IF_NONE_MATCH, etag.as_str());
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(
            endpoint,
            status = status.as_u16(),
            conditional = known_etag.is_some(),
            "github request"
        );

        let rate = parse_rate_limit_headers(response.headers());
        if let Some(info) = rate.to_info() {
            *self.last_rate_limit.lock() = Some(info);
        }

        if status == StatusCode::NOT_MODIFIED {
            if let Some(entry) = self.etags.lock().peek(endpoint) {
                debug!(endpoint, fetched_at = %entry.fetched_at, "not modified, replaying cached body");
                return Ok(entry.data.clone());
            }
        }

        if status == StatusCode::FORBIDDEN && rate.remaining == Some(0) {
            let reset_at = rate
                .reset_at
                .unwrap_or_else(|| Utc::now() + chrono::Duration::seconds(RATE_LIMIT_FALLBACK_SECS));
            warn!(endpoint, %reset_at, "github rate limit exhausted");
            return Err(GitHubError::RateLimited { reset_at });
        }

        if !status.is_success() {
            // Error bodies are usually {"message": ..., "documentation_url": ...}
            // but anything unparsable degrades to an empty object
            let text = response.text().await.unwrap_or_default();
            let body: Value =
                serde_json::from_str(&text).unwrap_or_else(|_| Value::Object(Default::default()));
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| format!("GitHub API error: {}", status.as_u16()));

            return Err(GitHubError::Api {
                status: Some(status.as_u16()),
                message,
                body,
            });
        }

        let etag = response
            .headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let data: Value = response.json().await?;

        if let Some(etag) = etag {
            let mut etags = self.etags.lock();
            etags.put(
                endpoint.to_string(),
                ETagEntry {
                    etag,
                    data: data.clone(),
                    fetched_at: Utc::now(),
                },
            );
            while etags.len() > self.etag_capacity {
                let Some((evicted, _)) = etags.pop_lru() else {
                    break;
                };
                debug!(endpoint = %evicted, "dropped stored etag");
            }
        }

        Ok(data)
    }

    /// Fetches repository metadata, turning 404/403 into NotFound/Forbidden
    pub async fn validate_repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<RepositoryMetadata, GitHubError> {
        let endpoint = format!("/repos/{owner}/{repo}");
        match self.request::<GitHubRepository>(&endpoint).await {
            Ok(data) => Ok(RepositoryMetadata::from(data)),
            Err(GitHubError::Api {
                status: Some(404), ..
            }) => Err(GitHubError::NotFound {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            Err(GitHubError::Api {
                status: Some(403), ..
            }) => Err(GitHubError::Forbidden {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }),
            Err(other) => Err(other),
        }
    }

    /// Lists the Markdown files (.md / .mdx) of a repository.
    ///
    /// Without a ref the repository's default branch is looked up first.
    /// Truncated trees from very large repositories are returned as-is.
    pub async fn get_file_tree(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
    ) -> Result<Vec<MarkdownFile>, GitHubError> {
        let tree_ref = match git_ref.filter(|r| !r.is_empty()) {
            Some(r) => r.to_string(),
            None => self.validate_repository(owner, repo).await?.default_branch,
        };

        let endpoint = format!("/repos/{owner}/{repo}/git/trees/{tree_ref}?recursive=1");
        let data: GitHubTree = self.request(&endpoint).await?;

        if data.truncated {
            warn!(owner, repo, tree = %data.sha, "file tree was truncated by GitHub");
        }

        Ok(data
            .tree
            .into_iter()
            .filter(|item| item.is_markdown_blob())
            .map(MarkdownFile::from)
            .collect())
    }

    /// Fetches and decodes one file
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<FileContent, GitHubError> {
        let endpoint = match git_ref.filter(|r| !r.is_empty()) {
            Some(r) => format!("/repos/{owner}/{repo}/contents/{path}?ref={r}"),
            None => format!("/repos/{owner}/{repo}/contents/{path}"),
        };

        let value = self.request_value(&endpoint).await?;
        // Directories come back as a JSON array of entries
        if value.is_array() {
            return Err(GitHubError::api(format!("{path} is a directory, not a file")));
        }
        let data: GitHubFileContent = serde_json::from_value(value).map_err(|e| {
            GitHubError::api(format!("Unexpected response from GitHub for {endpoint}: {e}"))
        })?;

        let payload = match (&data.content, data.encoding.as_deref()) {
            (Some(content), Some("base64")) => content,
            _ => return Err(GitHubError::api("File content is not base64 encoded")),
        };

        let content = decode_base64_text(payload)
            .map_err(|e| GitHubError::api(format!("Invalid base64 content for {path}: {e}")))?;

        Ok(FileContent {
            path: data.path,
            content,
            sha: data.sha,
            size: data.size,
        })
    }

    /// Current quota for the configured credentials
    pub async fn get_rate_limit(&self) -> Result<RateLimitInfo, GitHubError> {
        let data: GitHubRateLimitResponse = self.request("/rate_limit").await?;
        Ok(RateLimitInfo::from(data.rate))
    }

    /// The most recent rate-limit snapshot seen in response headers
    pub fn observed_rate_limit(&self) -> Option<RateLimitInfo> {
        *self.last_rate_limit.lock()
    }

    pub fn clear_etag_cache(&self) {
        self.etags.lock().clear();
    }

    pub fn etag_cache_len(&self) -> usize {
        self.etags.lock().len()
    }
}

// GitHub wraps base64 payloads at 60 columns
fn decode_base64_text(payload: &str) -> Result<String, base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    let bytes = BASE64.decode(compact.as_bytes())?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
