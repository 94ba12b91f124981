//! Cache-backed Markdown rendering.
//!
//! The renderer is the crate's front door: read-through caching around a
//! [`Converter`], container wrapping, prefix-sweep invalidation, and cache
//! introspection. Store failures never propagate to callers.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_CONTAINER_CLASS;
use crate::domain::content::ContentId;
use crate::render::Converter;
use crate::util::bytes::format_bytes;

use super::config::CacheConfig;
use super::keys::{CacheKey, content_prefix, namespace_prefix};
use super::store::KeyValueStore;

const SOURCE: &str = "cache::renderer";

const METRIC_RENDER_HIT: &str = "croccante_render_cache_hit_total";
const METRIC_RENDER_MISS: &str = "croccante_render_cache_miss_total";
const METRIC_STORE_ERROR: &str = "croccante_cache_store_error_total";
const METRIC_INVALIDATED: &str = "croccante_cache_invalidated_entries_total";
const METRIC_CONVERT_MS: &str = "croccante_render_convert_ms";

const MAX_KEY_PREFIX_BYTES: usize = 64;

/// Renderer settings: cache behavior plus output wrapping.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub cache: CacheConfig,
    /// CSS class carried by the wrapping `<div>`.
    pub container_class: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            container_class: DEFAULT_CONTAINER_CLASS.to_string(),
        }
    }
}

impl From<&crate::config::Settings> for RendererConfig {
    fn from(settings: &crate::config::Settings) -> Self {
        Self {
            cache: CacheConfig::from(&settings.cache),
            container_class: settings.render.container_class.clone(),
        }
    }
}

/// Errors raised when renderer construction is handed invalid configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RendererBuildError {
    #[error("invalid cache key prefix `{prefix}`: {reason}")]
    InvalidKeyPrefix {
        prefix: String,
        reason: &'static str,
    },
    #[error("invalid container class `{class}`: {reason}")]
    InvalidContainerClass { class: String, reason: &'static str },
}

pub(crate) fn validate_key_prefix(prefix: &str) -> Result<(), RendererBuildError> {
    let invalid = |reason| RendererBuildError::InvalidKeyPrefix {
        prefix: prefix.to_string(),
        reason,
    };

    if prefix.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if prefix.len() > MAX_KEY_PREFIX_BYTES {
        return Err(invalid("exceeds 64 bytes"));
    }
    if prefix.ends_with('_') {
        return Err(invalid("must not end with `_`"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-'))
    {
        return Err(invalid(
            "allowed characters are ASCII alphanumerics, `_` and `-`",
        ));
    }

    Ok(())
}

pub(crate) fn validate_container_class(class: &str) -> Result<(), RendererBuildError> {
    let invalid = |reason| RendererBuildError::InvalidContainerClass {
        class: class.to_string(),
        reason,
    };

    if class.trim().is_empty() {
        return Err(invalid("must not be empty"));
    }
    if !class
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        return Err(invalid(
            "allowed characters are ASCII alphanumerics, space, `_` and `-`",
        ));
    }

    Ok(())
}

/// Cache usage snapshot under the configured namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub total_size_bytes: u64,
}

impl Display for CacheStats {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries, {}",
            self.entry_count,
            format_bytes(self.total_size_bytes)
        )
    }
}

/// Read-through render cache around a [`Converter`].
///
/// A hit returns the stored HTML verbatim; a miss converts, wraps, stores
/// with the configured TTL, and returns. Store failures degrade: a failing
/// read renders fresh, a failing write skips caching, sweeps report zero.
/// The converter being deterministic makes at-least-once computation safe
/// when two threads race on a cold key.
pub struct CachedRenderer {
    converter: Arc<dyn Converter>,
    store: Arc<dyn KeyValueStore>,
    config: RendererConfig,
}

impl fmt::Debug for CachedRenderer {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedRenderer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CachedRenderer {
    /// Create a renderer. Collaborators are injected; configuration is
    /// validated here so later operations never have to escape anything.
    pub fn new(
        converter: Arc<dyn Converter>,
        store: Arc<dyn KeyValueStore>,
        config: RendererConfig,
    ) -> Result<Self, RendererBuildError> {
        validate_key_prefix(&config.cache.key_prefix)?;
        validate_container_class(&config.container_class)?;

        Ok(Self {
            converter,
            store,
            config,
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Render through the cache.
    pub fn render(&self, content_id: &ContentId, markdown: &str) -> String {
        if !self.config.cache.is_enabled() {
            debug!(source = SOURCE, content_id = %content_id, "Cache disabled, rendering fresh");
            return self.render_without_cache(markdown);
        }

        let key = CacheKey::for_revision(&self.config.cache.key_prefix, content_id, markdown);

        match self.store.get(key.as_str()) {
            Ok(Some(html)) => {
                counter!(METRIC_RENDER_HIT).increment(1);
                debug!(source = SOURCE, key = %key, outcome = "hit", "Serving cached render");
                return html;
            }
            Ok(None) => {
                counter!(METRIC_RENDER_MISS).increment(1);
                debug!(source = SOURCE, key = %key, outcome = "miss", "Rendering and caching");
            }
            Err(err) => {
                counter!(METRIC_STORE_ERROR).increment(1);
                warn!(
                    source = SOURCE,
                    op = "get",
                    key = %key,
                    error = %err,
                    "Store read failed, rendering fresh"
                );
            }
        }

        let html = self.convert_and_wrap(markdown);

        if let Err(err) = self
            .store
            .set(key.as_str(), &html, self.config.cache.ttl_seconds)
        {
            counter!(METRIC_STORE_ERROR).increment(1);
            warn!(
                source = SOURCE,
                op = "set",
                key = %key,
                error = %err,
                "Store write failed, serving uncached result"
            );
        }

        html
    }

    /// Convert and wrap without touching the store in any way.
    pub fn render_without_cache(&self, markdown: &str) -> String {
        self.convert_and_wrap(markdown)
    }

    /// Remove every cached revision of one content item. Returns the number
    /// of entries removed; an already-empty result is 0, not an error.
    pub fn invalidate(&self, content_id: &ContentId) -> usize {
        let prefix = content_prefix(&self.config.cache.key_prefix, content_id);
        self.sweep(&prefix, "invalidate")
    }

    /// Remove every entry under the configured namespace.
    pub fn clear_all(&self) -> usize {
        let prefix = namespace_prefix(&self.config.cache.key_prefix);
        self.sweep(&prefix, "clear_all")
    }

    /// Snapshot live entry count and total stored bytes.
    pub fn stats(&self) -> CacheStats {
        let prefix = namespace_prefix(&self.config.cache.key_prefix);

        let keys = match self.store.keys_with_prefix(&prefix) {
            Ok(keys) => keys,
            Err(err) => {
                counter!(METRIC_STORE_ERROR).increment(1);
                warn!(
                    source = SOURCE,
                    op = "stats",
                    prefix = %prefix,
                    error = %err,
                    "Store scan failed, reporting empty stats"
                );
                return CacheStats {
                    entry_count: 0,
                    total_size_bytes: 0,
                };
            }
        };

        let mut entry_count = 0usize;
        let mut total_size_bytes = 0u64;
        for key in keys {
            match self.store.get(&key) {
                Ok(Some(value)) => {
                    entry_count += 1;
                    total_size_bytes += value.len() as u64;
                }
                Ok(None) => {}
                Err(err) => {
                    counter!(METRIC_STORE_ERROR).increment(1);
                    warn!(
                        source = SOURCE,
                        op = "stats",
                        key = %key,
                        error = %err,
                        "Store read failed, entry skipped"
                    );
                }
            }
        }

        CacheStats {
            entry_count,
            total_size_bytes,
        }
    }

    fn convert_and_wrap(&self, markdown: &str) -> String {
        let convert_started_at = Instant::now();
        let html = self.converter.convert(markdown);
        histogram!(METRIC_CONVERT_MS).record(convert_started_at.elapsed().as_secs_f64() * 1000.0);

        format!(
            "<div class=\"{}\">{}</div>",
            self.config.container_class, html
        )
    }

    fn sweep(&self, prefix: &str, op: &'static str) -> usize {
        let keys = match self.store.keys_with_prefix(prefix) {
            Ok(keys) => keys,
            Err(err) => {
                counter!(METRIC_STORE_ERROR).increment(1);
                warn!(
                    source = SOURCE,
                    op,
                    prefix,
                    error = %err,
                    "Store scan failed, nothing invalidated"
                );
                return 0;
            }
        };

        let mut removed = 0usize;
        for key in keys {
            match self.store.delete(&key) {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(err) => {
                    counter!(METRIC_STORE_ERROR).increment(1);
                    warn!(
                        source = SOURCE,
                        op,
                        key = %key,
                        error = %err,
                        "Store delete failed, entry left behind"
                    );
                }
            }
        }

        counter!(METRIC_INVALIDATED).increment(removed as u64);
        info!(source = SOURCE, op, prefix, removed, "Cache sweep complete");

        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::MemoryStore;
    use crate::render::ComrakConverter;

    fn renderer_with(config: RendererConfig) -> (CachedRenderer, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new(&config.cache));
        let renderer = CachedRenderer::new(
            Arc::new(ComrakConverter::default()),
            Arc::clone(&store) as Arc<dyn KeyValueStore>,
            config,
        )
        .expect("valid renderer config");

        (renderer, store)
    }

    fn renderer() -> (CachedRenderer, Arc<MemoryStore>) {
        renderer_with(RendererConfig::default())
    }

    fn id(raw: &str) -> ContentId {
        ContentId::new(raw).expect("valid test id")
    }

    #[test]
    fn rejects_invalid_key_prefix() {
        for (prefix, reason_fragment) in [
            ("", "empty"),
            ("bad prefix", "allowed characters"),
            ("trailing_", "end with"),
        ] {
            let config = RendererConfig {
                cache: CacheConfig {
                    key_prefix: prefix.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            };
            let store = Arc::new(MemoryStore::default());
            let err = CachedRenderer::new(Arc::new(ComrakConverter::default()), store, config)
                .expect_err("prefix should be rejected");

            assert!(
                err.to_string().contains(reason_fragment),
                "`{prefix}` -> {err}"
            );
        }
    }

    #[test]
    fn rejects_invalid_container_class() {
        let config = RendererConfig {
            container_class: "bad\"class".to_string(),
            ..Default::default()
        };
        let store = Arc::new(MemoryStore::default());
        let result = CachedRenderer::new(Arc::new(ComrakConverter::default()), store, config);

        assert!(matches!(
            result,
            Err(RendererBuildError::InvalidContainerClass { .. })
        ));
    }

    #[test]
    fn wraps_output_in_container() {
        let (renderer, _) = renderer();
        let html = renderer.render(&id("1"), "# Hello World");

        assert!(html.starts_with("<div class=\"markdown-body\">"));
        assert!(html.ends_with("</div>"));
        assert!(html.contains("<h1>Hello World</h1>"));
    }

    #[test]
    fn empty_markdown_still_gets_a_container() {
        let (renderer, _) = renderer();

        assert_eq!(
            renderer.render_without_cache(""),
            "<div class=\"markdown-body\"></div>"
        );
    }

    #[test]
    fn repeated_renders_reuse_one_entry() {
        let (renderer, store) = renderer();
        let source = "Some **bold** text.";

        let first = renderer.render(&id("7"), source);
        let second = renderer.render(&id("7"), source);

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn disabled_cache_never_touches_the_store() {
        let config = RendererConfig {
            cache: CacheConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let (renderer, store) = renderer_with(config);

        let html = renderer.render(&id("7"), "# Title");

        assert!(html.contains("<h1>Title</h1>"));
        assert!(store.is_empty());
    }

    #[test]
    fn invalidate_removes_only_that_content() {
        let (renderer, _) = renderer();

        renderer.render(&id("1"), "first");
        renderer.render(&id("1"), "first, revised");
        renderer.render(&id("1"), "first, revised again");
        renderer.render(&id("2"), "second");

        assert_eq!(renderer.invalidate(&id("1")), 3);
        assert_eq!(renderer.invalidate(&id("1")), 0);
        assert_eq!(renderer.stats().entry_count, 1);
    }

    #[test]
    fn clear_all_empties_the_namespace() {
        let (renderer, store) = renderer();

        renderer.render(&id("1"), "one");
        renderer.render(&id("2"), "two");

        assert_eq!(renderer.clear_all(), 2);
        assert!(store.is_empty());
        assert_eq!(renderer.clear_all(), 0);
    }

    #[test]
    fn stats_report_count_and_bytes() {
        let (renderer, _) = renderer();

        let html = renderer.render(&id("1"), "counted");
        let stats = renderer.stats();

        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.total_size_bytes, html.len() as u64);
    }

    #[test]
    fn stats_display_is_human_readable() {
        let stats = CacheStats {
            entry_count: 2,
            total_size_bytes: 2048,
        };

        assert_eq!(stats.to_string(), "2 entries, 2.0 KiB");
    }
}
