//! Cache key construction.
//!
//! Keys embed the content id readably: `{prefix}_{content_id}_{hash}`.
//! Invalidation never parses keys back apart; it builds a forward prefix
//! and asks the store for everything under it.

use std::collections::hash_map::DefaultHasher;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

use crate::domain::content::ContentId;

/// Fingerprint hash for one revision of one content item.
///
/// Fast and non-cryptographic on purpose: key derivation sits on the hot
/// render path, and the cache tolerates the 2^-64 collision band.
pub fn hash_content(content_id: &ContentId, markdown: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content_id.as_str().hash(&mut hasher);
    markdown.hash(&mut hasher);
    hasher.finish()
}

/// Sweep prefix matching every cached revision of one content item.
pub fn content_prefix(key_prefix: &str, content_id: &ContentId) -> String {
    format!("{key_prefix}_{content_id}_")
}

/// Sweep prefix matching every entry the pipeline owns.
pub fn namespace_prefix(key_prefix: &str) -> String {
    format!("{key_prefix}_")
}

/// Fully assembled store key for a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build the key for a (content, revision) pair. The hash covers both
    /// the id and the Markdown source, rendered as 16 lowercase hex digits.
    pub fn for_revision(key_prefix: &str, content_id: &ContentId, markdown: &str) -> Self {
        let hash = hash_content(content_id, markdown);
        Self(format!("{key_prefix}_{content_id}_{hash:016x}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::MAX_CONTENT_ID_BYTES;

    const PREFIX: &str = "croccante_md";

    fn id(raw: &str) -> ContentId {
        ContentId::new(raw).expect("valid test id")
    }

    #[test]
    fn same_inputs_produce_same_key() {
        let first = CacheKey::for_revision(PREFIX, &id("42"), "# Hello");
        let second = CacheKey::for_revision(PREFIX, &id("42"), "# Hello");

        assert_eq!(first, second);
    }

    #[test]
    fn changed_text_changes_the_key() {
        let original = CacheKey::for_revision(PREFIX, &id("42"), "# Hello");
        let revised = CacheKey::for_revision(PREFIX, &id("42"), "# Hello!");

        assert_ne!(original, revised);
    }

    #[test]
    fn different_ids_get_disjoint_prefixes() {
        let key_a = CacheKey::for_revision(PREFIX, &id("7"), "same text");
        let key_b = CacheKey::for_revision(PREFIX, &id("72"), "same text");

        assert_ne!(key_a, key_b);
        assert!(key_a.as_str().starts_with(&content_prefix(PREFIX, &id("7"))));
        assert!(!key_b.as_str().starts_with(&content_prefix(PREFIX, &id("7"))));
    }

    #[test]
    fn key_embeds_id_under_the_namespace() {
        let key = CacheKey::for_revision(PREFIX, &id("post-9"), "body");

        assert!(key.as_str().starts_with(&namespace_prefix(PREFIX)));
        assert!(key.as_str().contains("post-9"));
    }

    #[test]
    fn key_length_stays_bounded() {
        let long_id = id(&"x".repeat(MAX_CONTENT_ID_BYTES));
        let key = CacheKey::for_revision(PREFIX, &long_id, &"y".repeat(100_000));

        assert!(key.as_str().len() <= PREFIX.len() + 1 + MAX_CONTENT_ID_BYTES + 1 + 16);
    }

    #[test]
    fn hash_is_stable_across_calls() {
        let content_id = id("stable");
        assert_eq!(
            hash_content(&content_id, "text"),
            hash_content(&content_id, "text")
        );
    }
}
