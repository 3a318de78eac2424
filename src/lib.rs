// src/lib.rs
// =============================================================================
// markview: browse the Markdown documentation of a GitHub repository.
//
// Layers, bottom up:
// - github: REST client with ETag revalidation and typed failures
// - cache: bounded in-memory response cache
// - service: cache-in-front-of-client reads shared by API and CLI
// - server: JSON HTTP API
// - markdown, filters: pure document and file-list helpers
// - session, scroll_spy: viewer-side state
// =============================================================================

pub mod cache;
pub mod config;
pub mod filters;
pub mod github;
pub mod markdown;
pub mod scroll_spy;
pub mod server;
pub mod service;
pub mod session;
