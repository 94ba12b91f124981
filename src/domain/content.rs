//! Identifiers for host-owned content items.
//!
//! The host system (a CMS, a blog engine) owns content storage and hands the
//! pipeline an identifier plus the Markdown source. The identifier is kept
//! readable inside cache keys, so its charset is restricted up front rather
//! than escaped at every use site.

use std::fmt::{self, Display, Formatter};

use thiserror::Error;
use uuid::Uuid;

/// Longest accepted identifier, in bytes.
pub const MAX_CONTENT_ID_BYTES: usize = 128;

/// Errors raised when a content identifier fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentIdError {
    #[error("content id is empty")]
    Empty,
    #[error("content id is {length} bytes, limit is {MAX_CONTENT_ID_BYTES}")]
    TooLong { length: usize },
    #[error("content id contains disallowed character `{character}`")]
    InvalidCharacter { character: char },
}

/// Identifier of a content item (post, page) in the host system.
///
/// Allowed characters are ASCII alphanumerics plus `-`, `.` and `:`. The
/// cache-key segment separator `_` is deliberately excluded: with it gone, a
/// per-id sweep prefix can never match keys belonging to a different id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    /// Validates and wraps an identifier. Fails fast on anything outside the
    /// charset contract; runtime inputs should be checked at the boundary.
    pub fn new(id: impl Into<String>) -> Result<Self, ContentIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ContentIdError::Empty);
        }
        if id.len() > MAX_CONTENT_ID_BYTES {
            return Err(ContentIdError::TooLong { length: id.len() });
        }
        if let Some(character) = id.chars().find(|c| !is_allowed(*c)) {
            return Err(ContentIdError::InvalidCharacter { character });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':')
}

impl Display for ContentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for ContentId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<Uuid> for ContentId {
    fn from(id: Uuid) -> Self {
        Self(id.hyphenated().to_string())
    }
}

impl TryFrom<&str> for ContentId {
    type Error = ContentIdError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl TryFrom<String> for ContentId {
    type Error = ContentIdError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}
