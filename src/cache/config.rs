//! Cache configuration.
//!
//! Controls the render cache independently of the host's settings loader;
//! [`crate::config::Settings`] converts into this when a file/env config
//! is in play.

use std::num::NonZeroUsize;

use serde::Deserialize;

use crate::config::{
    DEFAULT_CACHE_ENABLED, DEFAULT_CACHE_KEY_PREFIX, DEFAULT_CACHE_MEMORY_ENTRY_LIMIT,
    DEFAULT_CACHE_TTL_SECONDS,
};

/// Render cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Enable the render cache.
    pub enabled: bool,
    /// Entry lifetime in seconds. Zero disables expiry.
    pub ttl_seconds: u64,
    /// Namespace prefix for every key the pipeline writes.
    pub key_prefix: String,
    /// Maximum entries held by the bundled in-memory store.
    pub memory_entry_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: DEFAULT_CACHE_ENABLED,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            key_prefix: DEFAULT_CACHE_KEY_PREFIX.to_string(),
            memory_entry_limit: DEFAULT_CACHE_MEMORY_ENTRY_LIMIT,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enabled: settings.enabled,
            ttl_seconds: settings.ttl_seconds,
            key_prefix: settings.key_prefix.clone(),
            memory_entry_limit: settings.memory_entry_limit,
        }
    }
}

impl CacheConfig {
    /// Returns true if the render cache should be consulted at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the memory entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_entry_limit).unwrap_or(NonZeroUsize::MIN)
    }
}
