//! Croccante Markdown Render Cache
//!
//! Converts Markdown to HTML exactly once per distinct content revision and
//! serves every subsequent request for that revision from a key-value cache.
//! Conversion is delegated to a deterministic [`render::Converter`]; the value
//! of the crate is the keying, caching, and invalidation discipline around it:
//!
//! - **Fingerprint keys**: `{prefix}_{content_id}_{content_hash}` keeps the
//!   content id readable inside the key, so invalidating an item is a prefix
//!   sweep with no reverse index.
//! - **Fail-open caching**: a broken store degrades to fresh conversion,
//!   never to an error surfaced to render callers.
//! - **Explicit lifecycle dispatch**: content save/delete events arrive as
//!   direct method calls on [`cache::ContentTrigger`], not hook registration.
//!
//! ## Configuration
//!
//! Hosts that want file/environment configuration use [`config::Settings`]:
//!
//! ```toml
//! [cache]
//! enabled = true
//! ttl_seconds = 86400
//! key_prefix = "croccante_md"
//!
//! [render]
//! dialect = "extended"
//! allow_unsafe_html = true
//! ```
//!
//! Everything is also constructible directly with plain config structs, so
//! embedding the pipeline requires no loader and no global state.

pub mod cache;
pub mod config;
pub mod content;
pub mod domain;
pub mod render;
pub mod telemetry;
pub mod util;
