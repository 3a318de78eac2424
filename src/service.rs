// src/service.rs
// =============================================================================
// The data-fetching path shared by the HTTP API and the CLI.
//
// Every read goes:  cache hit? -> return it (cached = true)
//                   otherwise  -> ask GitHub, store, return (cached = false)
//
// Two requests racing for the same key both go to GitHub and the last one
// to finish wins the cache slot. That's fine: they fetched the same thing.
// =============================================================================

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{keys, ResponseCache};
use crate::github::{
    FileContent, GitHubClient, GitHubError, MarkdownFile, RateLimitInfo, RepositoryMetadata,
};

/// How long the rate-limit snapshot is reused
pub const DEFAULT_RATE_LIMIT_TTL: Duration = Duration::from_secs(60);

/// A value plus whether it came out of the cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cached<T> {
    pub data: T,
    pub cached: bool,
}

pub struct DocsService {
    client: GitHubClient,
    cache: ResponseCache,
    rate_limit_ttl: Duration,
}

impl DocsService {
    pub fn new(client: GitHubClient, cache: ResponseCache, rate_limit_ttl: Duration) -> Self {
        DocsService {
            client,
            cache,
            rate_limit_ttl,
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    async fn cached<T, F, Fut>(
        &self,
        key: String,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<Cached<T>, GitHubError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, GitHubError>>,
    {
        if let Some(data) = self.cache.get::<T>(&key) {
            debug!(key = %key, "cache hit");
            return Ok(Cached { data, cached: true });
        }

        debug!(key = %key, "cache miss");
        let data = fetch().await?;
        match ttl {
            Some(ttl) => self.cache.set_with_ttl(&key, &data, ttl),
            None => self.cache.set(&key, &data),
        }

        Ok(Cached {
            data,
            cached: false,
        })
    }

    pub async fn repository(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Cached<RepositoryMetadata>, GitHubError> {
        self.cached(keys::repository(owner, repo), None, || {
            self.client.validate_repository(owner, repo)
        })
        .await
    }

    // Markdown files at `git_ref`, or at the default branch when None
    //
    // Parameters:
    //   owner, repo: an already validated repository
    //   git_ref: branch/tag/commit; None or "" means the default branch
    //
    // Returns: the file list and whether it came from the cache
    //
    // The default branch comes from the (cached) repository metadata, so
    // listing files right after validating costs one upstream call.
    pub async fn files(
        &self,
        owner: &str,
        repo: &str,
        git_ref: Option<&str>,
    ) -> Result<Cached<Vec<MarkdownFile>>, GitHubError> {
        let git_ref = git_ref.filter(|r| !r.is_empty());
        self.cached(keys::file_tree(owner, repo, git_ref), None, || async move {
            let tree_ref = match git_ref {
                Some(r) => r.to_string(),
                None => self.repository(owner, repo).await?.data.default_branch,
            };
            self.client.get_file_tree(owner, repo, Some(&tree_ref)).await
        })
        .await
    }

    pub async fn content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Cached<FileContent>, GitHubError> {
        let git_ref = git_ref.filter(|r| !r.is_empty());
        self.cached(keys::file_content(owner, repo, path, git_ref), None, || {
            self.client.get_file_content(owner, repo, path, git_ref)
        })
        .await
    }

    pub async fn rate_limit(&self) -> Result<Cached<RateLimitInfo>, GitHubError> {
        self.cached(keys::RATE_LIMIT.to_string(), Some(self.rate_limit_ttl), || {
            self.client.get_rate_limit()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::github::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn service_for(server: &MockServer) -> DocsService {
        let client = GitHubClient::new(ClientConfig {
            api_url: server.uri(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        DocsService::new(
            client,
            ResponseCache::new(CacheConfig::default()),
            DEFAULT_RATE_LIMIT_TTL,
        )
    }

    async fn mount_repository(server: &MockServer, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/repos/octo/docs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "docs",
                "full_name": "octo/docs",
                "description": null,
                "private": false,
                "owner": {"login": "octo"},
                "html_url": "https://github.com/octo/docs",
                "default_branch": "trunk"
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_second_read_is_cached() {
        let server = MockServer::start().await;
        mount_repository(&server, 1).await;
        let service = service_for(&server);

        let first = service.repository("octo", "docs").await.unwrap();
        let second = service.repository("octo", "docs").await.unwrap();

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn test_files_resolve_default_branch_through_cache() {
        let server = MockServer::start().await;
        mount_repository(&server, 1).await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/docs/git/trees/trunk"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "root",
                "truncated": false,
                "tree": [
                    {"path": "README.md", "type": "blob", "sha": "1", "size": 10, "url": "u1"},
                    {"path": "docs/a.md", "type": "blob", "sha": "2", "size": 20, "url": "u2"},
                    {"path": "src/index.ts", "type": "blob", "sha": "3", "size": 30, "url": "u3"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;
        let service = service_for(&server);

        service.repository("octo", "docs").await.unwrap();
        let files = service.files("octo", "docs", None).await.unwrap();
        let again = service.files("octo", "docs", Some("")).await.unwrap();

        let paths: Vec<&str> = files.data.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "docs/a.md"]);
        assert!(!files.cached);
        assert!(again.cached);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/octo/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .expect(2)
            .mount(&server)
            .await;
        let service = service_for(&server);

        assert!(service.repository("octo", "gone").await.is_err());
        assert!(service.repository("octo", "gone").await.is_err());
        assert_eq!(service.cache().stats().entries, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_uses_short_ttl() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rate_limit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "rate": {"limit": 60, "remaining": 59, "reset": 1700000000, "used": 1}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let client = GitHubClient::new(ClientConfig {
            api_url: server.uri(),
            token: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let service = DocsService::new(client, ResponseCache::default(), Duration::from_millis(20));

        assert!(!service.rate_limit().await.unwrap().cached);
        assert!(service.rate_limit().await.unwrap().cached);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(!service.rate_limit().await.unwrap().cached);
    }
}
