//! Catalog fetch lifecycle.
//!
//! Wraps a catalog fetch in an explicit state machine so views can render
//! loading and failure states. A failed load keeps its message until the
//! next attempt; timeouts get a dedicated message since they are the
//! common failure against a cold-started server.

use tracing::warn;

use beats_common::{CatalogItem, ItemKind};

use crate::client::StoreClient;
use crate::error::StoreError;

const TIMEOUT_MESSAGE: &str = "request timed out";

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready(Vec<CatalogItem>),
    Failed(String),
}

pub struct CatalogLoader {
    kind: ItemKind,
    state: LoadState,
}

impl CatalogLoader {
    pub fn new(kind: ItemKind) -> Self {
        Self {
            kind,
            state: LoadState::Idle,
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn items(&self) -> &[CatalogItem] {
        match &self.state {
            LoadState::Ready(items) => items,
            _ => &[],
        }
    }

    /// Fetch the catalog for this loader's item kind. Every exit path
    /// lands in `Ready` or `Failed`; the loader is never stuck `Loading`.
    pub async fn load(&mut self, client: &StoreClient) -> Result<&[CatalogItem], StoreError> {
        self.state = LoadState::Loading;
        let fetched = match self.kind {
            ItemKind::Beat => client.fetch_beats(None).await,
            ItemKind::SoundPack => client.fetch_sound_packs().await,
        };
        match fetched {
            Ok(items) => {
                self.state = LoadState::Ready(items);
                Ok(self.items())
            }
            Err(e) => {
                let message = if e.is_timeout() {
                    TIMEOUT_MESSAGE.to_string()
                } else {
                    e.to_string()
                };
                warn!("{} catalog load failed: {}", self.kind.as_str(), message);
                self.state = LoadState::Failed(message);
                Err(e)
            }
        }
    }
}
