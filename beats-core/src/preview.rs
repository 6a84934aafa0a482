//! Exclusive preview playback slot.
//!
//! The store plays at most one preview at a time. This tracks which item
//! holds the slot and hands the displaced item back so the embedder can
//! stop its audio before starting the next one.

use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewHandle {
    pub item_id: String,
    pub url: String,
}

#[derive(Debug, Default)]
pub struct PreviewPlayer {
    current: Option<PreviewHandle>,
}

impl PreviewPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for an item. Returns the previously playing handle,
    /// if any, which the caller must stop.
    pub fn start(&mut self, item_id: impl Into<String>, url: impl Into<String>) -> Option<PreviewHandle> {
        let handle = PreviewHandle {
            item_id: item_id.into(),
            url: url.into(),
        };
        debug!("preview start: {}", handle.item_id);
        self.current.replace(handle)
    }

    /// Release the slot, returning the handle that was playing.
    pub fn stop(&mut self) -> Option<PreviewHandle> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    pub fn is_playing(&self, item_id: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|h| h.item_id == item_id)
    }
}
