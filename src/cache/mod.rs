// src/cache/mod.rs
// =============================================================================
// In-memory response cache shared by every request.
//
// - store: the bounded, TTL-based LRU cache
// - keys: how cache keys are derived from a request
//
// Nothing is persisted; restarting the process starts with an empty cache.
// =============================================================================

pub mod keys;
mod store;

pub use store::{
    CacheConfig, CacheStats, ResponseCache, DEFAULT_MAX_BYTES, DEFAULT_MAX_ENTRIES, DEFAULT_TTL,
};
