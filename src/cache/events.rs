//! Content lifecycle events.
//!
//! The host calls the trigger directly at its write points; each call
//! produces an observable event record and dispatches the matching cache
//! operation synchronously. There is no queue and no hook registry.

use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::content::ContentId;

use super::renderer::CachedRenderer;

const SOURCE: &str = "cache::events";

/// Lifecycle notifications the render cache reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Content was created or edited.
    ContentSaved { content_id: ContentId },
    /// Content was removed entirely.
    ContentDeleted { content_id: ContentId },
    /// The Markdown source field was removed while the content remains.
    MarkdownFieldDeleted { content_id: ContentId },
    /// The host asked for a full reset of the cache namespace.
    CacheReset,
}

/// Observable record of one lifecycle notification.
#[derive(Debug, Clone)]
pub struct ContentEvent {
    /// Unique identifier for log correlation (UUIDv4).
    pub id: Uuid,
    pub kind: EventKind,
    /// When the notification arrived.
    pub timestamp: OffsetDateTime,
}

impl ContentEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}

/// Dispatches lifecycle notifications to the render cache.
///
/// Every save-shaped event invalidates; nothing re-renders eagerly. The
/// next read repopulates the cache lazily, which keeps write paths cheap
/// no matter how large the content is.
///
/// # Usage
///
/// ```ignore
/// // After the host persists an edit:
/// trigger.content_saved(&content_id);
/// ```
pub struct ContentTrigger {
    renderer: Arc<CachedRenderer>,
}

impl ContentTrigger {
    pub fn new(renderer: Arc<CachedRenderer>) -> Self {
        Self { renderer }
    }

    /// Content was created or edited. Returns entries removed.
    pub fn content_saved(&self, content_id: &ContentId) -> usize {
        self.dispatch(EventKind::ContentSaved {
            content_id: content_id.clone(),
        })
    }

    /// Content was removed entirely. Returns entries removed.
    pub fn content_deleted(&self, content_id: &ContentId) -> usize {
        self.dispatch(EventKind::ContentDeleted {
            content_id: content_id.clone(),
        })
    }

    /// The Markdown source field was removed while the content remains.
    /// Cached HTML no longer corresponds to anything; drop it.
    pub fn markdown_field_deleted(&self, content_id: &ContentId) -> usize {
        self.dispatch(EventKind::MarkdownFieldDeleted {
            content_id: content_id.clone(),
        })
    }

    /// Full reset of the pipeline's namespace. Returns entries removed.
    pub fn cache_reset(&self) -> usize {
        self.dispatch(EventKind::CacheReset)
    }

    fn dispatch(&self, kind: EventKind) -> usize {
        if !self.renderer.config().cache.is_enabled() {
            debug!(source = SOURCE, event_kind = ?kind, "Event ignored: cache disabled");
            return 0;
        }

        let event = ContentEvent::new(kind);
        info!(
            source = SOURCE,
            event_id = %event.id,
            event_kind = ?event.kind,
            "Content event dispatched"
        );

        match &event.kind {
            EventKind::ContentSaved { content_id }
            | EventKind::ContentDeleted { content_id }
            | EventKind::MarkdownFieldDeleted { content_id } => {
                self.renderer.invalidate(content_id)
            }
            EventKind::CacheReset => self.renderer.clear_all(),
        }
    }
}
