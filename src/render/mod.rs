//! Markdown-to-HTML conversion.
//!
//! The converter is the pure half of the pipeline: same input, same output,
//! no side effects, no failure mode. Everything stateful (caching, keying,
//! invalidation) lives in [`crate::cache`] and treats the converter as a
//! black box behind the [`Converter`] trait.

mod config;

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use comrak::{Arena, format_html, parse_document};
use tracing::warn;

use config::{build_options, build_sanitizer};

pub use config::ConverterConfig;

const SOURCE: &str = "render";

/// Contract for Markdown conversion.
///
/// Implementations must be deterministic and total: identical input produces
/// byte-identical output, and malformed input degrades to literal text or
/// dropped constructs instead of raising. The cache layer relies on both
/// properties when it recomputes entries concurrently.
pub trait Converter: Send + Sync {
    /// Convert Markdown source into an HTML fragment.
    fn convert(&self, markdown: &str) -> String;
}

/// Markdown dialect profile selecting the enabled extension set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Bare CommonMark, no extensions.
    Basic,
    /// CommonMark plus the GitHub-flavored set: strikethrough, tables,
    /// autolinks, task lists, footnotes, description lists, superscript.
    #[default]
    Extended,
}

impl Dialect {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Extended => "extended",
        }
    }
}

impl Display for Dialect {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "extended" => Ok(Self::Extended),
            _ => Err(()),
        }
    }
}

/// Default Comrak-based converter with optional Ammonia sanitisation.
///
/// With `allow_unsafe_html` (the default) raw HTML blocks and inline HTML
/// pass through untouched; authors are trusted. Without it, Comrak escapes
/// raw HTML and the output additionally runs through an allowlist sanitizer
/// covering the elements Markdown itself can produce.
pub struct ComrakConverter {
    options: comrak::Options<'static>,
    sanitizer: Option<ammonia::Builder<'static>>,
}

impl ComrakConverter {
    pub fn new(config: ConverterConfig) -> Self {
        let options = build_options(&config);
        let sanitizer = (!config.allow_unsafe_html).then(build_sanitizer);

        Self { options, sanitizer }
    }
}

impl Default for ComrakConverter {
    fn default() -> Self {
        Self::new(ConverterConfig::default())
    }
}

impl Converter for ComrakConverter {
    fn convert(&self, markdown: &str) -> String {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let mut html = String::new();
        if let Err(err) = format_html(root, &self.options, &mut html) {
            warn!(
                source = SOURCE,
                error = %err,
                "HTML formatting failed, emitting escaped source text"
            );
            return ammonia::clean_text(markdown);
        }

        match &self.sanitizer {
            Some(sanitizer) => sanitizer.clean(&html).to_string(),
            None => html,
        }
    }
}
