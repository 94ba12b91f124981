//! Croccante Cache Subsystem
//!
//! Read-through caching for rendered Markdown:
//!
//! - **Fingerprint keys**: `{prefix}_{content_id}_{content_hash}`, with the
//!   id kept readable so invalidation is a forward prefix sweep
//! - **Fail-open semantics**: store trouble degrades to fresh conversion
//! - **Direct lifecycle dispatch**: hosts call [`ContentTrigger`] methods
//!   at their write points, no hook registration
//!
//! ## Configuration
//!
//! Cache behavior is controlled via the `[cache]` settings table:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 86400
//! key_prefix = "croccante_md"
//! memory_entry_limit = 1024
//! ```

mod config;
mod events;
mod keys;
mod renderer;
mod store;

pub use config::CacheConfig;
pub use events::{ContentEvent, ContentTrigger, EventKind};
pub use keys::{CacheKey, content_prefix, hash_content, namespace_prefix};
pub use renderer::{CacheStats, CachedRenderer, RendererBuildError, RendererConfig};
pub use store::{KeyValueStore, MemoryStore, StoreError};

pub(crate) use renderer::{validate_container_class, validate_key_prefix};
