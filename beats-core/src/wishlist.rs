//! Optimistic wishlist state kept in step with the server.
//!
//! Local state updates immediately on add/remove and reverts if the server
//! rejects the mutation. At most one mutation per item is in flight at a
//! time; a second concurrent mutation for the same item fails fast with
//! `Busy` instead of queueing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tracing::{debug, info, warn};

use beats_common::ItemKind;

use crate::client::{StoreClient, WishlistAdd, WishlistEntry};
use crate::error::StoreError;

type ItemKey = (ItemKind, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingOp {
    Add,
    Remove,
}

#[derive(Default)]
struct SyncState {
    entries: HashMap<ItemKey, WishlistEntry>,
    in_flight: HashMap<ItemKey, PendingOp>,
}

/// Result of [`WishlistSync::clear`]: which items came off the wishlist and
/// which removals the server rejected (those stay on the local list).
#[derive(Debug, Default)]
pub struct ClearReport {
    pub removed: Vec<ItemKey>,
    pub failed: Vec<(ItemKey, StoreError)>,
}

impl ClearReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct WishlistSync {
    client: Arc<StoreClient>,
    state: Mutex<SyncState>,
}

impl WishlistSync {
    pub fn new(client: Arc<StoreClient>) -> Self {
        Self {
            client,
            state: Mutex::new(SyncState::default()),
        }
    }

    // The lock is only ever held across state mutation, never across an
    // await, so poisoning can only leave consistent state behind.
    fn locked(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether the item reads as wishlisted right now. Pending adds count,
    /// pending removes do not; that is the optimistic view.
    pub fn contains(&self, kind: ItemKind, item_id: &str) -> bool {
        let key = (kind, item_id.to_string());
        let state = self.locked();
        state.entries.contains_key(&key) || state.in_flight.get(&key) == Some(&PendingOp::Add)
    }

    /// Whether a mutation for this item is currently in flight.
    pub fn is_busy(&self, kind: ItemKind, item_id: &str) -> bool {
        self.locked()
            .in_flight
            .contains_key(&(kind, item_id.to_string()))
    }

    pub fn entry(&self, kind: ItemKind, item_id: &str) -> Option<WishlistEntry> {
        self.locked()
            .entries
            .get(&(kind, item_id.to_string()))
            .cloned()
    }

    pub fn entries(&self) -> Vec<WishlistEntry> {
        self.locked().entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.locked().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locked().entries.is_empty()
    }

    /// Replace local state with the server's authoritative list. Pending
    /// mutations keep their in-flight marks and settle on their own.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let fetched = self.client.fetch_wishlist().await?;
        let mut state = self.locked();
        state.entries = index_entries(fetched);
        debug!("wishlist refreshed, {} entries", state.entries.len());
        Ok(())
    }

    /// Drop all local state without touching the server. For sign-out.
    pub fn reset(&self) {
        let mut state = self.locked();
        state.entries.clear();
        state.in_flight.clear();
    }

    /// Add an item to the wishlist. Already-present items succeed as a
    /// no-op. If the server reports the item was already there (added from
    /// another device), the authoritative list is re-fetched so the local
    /// entry carries a real entry id.
    pub async fn add(&self, kind: ItemKind, item_id: &str) -> Result<(), StoreError> {
        let key = (kind, item_id.to_string());
        {
            let mut state = self.locked();
            if state.entries.contains_key(&key) {
                return Ok(());
            }
            if state.in_flight.contains_key(&key) {
                return Err(StoreError::Busy(item_id.to_string()));
            }
            state.in_flight.insert(key.clone(), PendingOp::Add);
        }

        let outcome = self.client.add_wishlist(kind, item_id).await;
        match outcome {
            Ok(WishlistAdd::Created(entry)) => {
                let mut state = self.locked();
                state.in_flight.remove(&key);
                state.entries.insert(key, entry);
                Ok(())
            }
            Ok(WishlistAdd::AlreadyExists) => {
                info!("item {} already wishlisted elsewhere, re-syncing", item_id);
                let refetched = self.client.fetch_wishlist().await;
                let mut state = self.locked();
                state.in_flight.remove(&key);
                match refetched {
                    Ok(fetched) => {
                        state.entries = index_entries(fetched);
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => {
                warn!("wishlist add for item {} failed: {}", item_id, e);
                self.locked().in_flight.remove(&key);
                Err(e)
            }
        }
    }

    /// Remove an item. The local entry disappears immediately and comes
    /// back if the server rejects the delete. Items not on the local list
    /// fail with `NotFound`.
    pub async fn remove(&self, kind: ItemKind, item_id: &str) -> Result<(), StoreError> {
        let key = (kind, item_id.to_string());
        let entry = {
            let mut state = self.locked();
            if state.in_flight.contains_key(&key) {
                return Err(StoreError::Busy(item_id.to_string()));
            }
            let entry = state
                .entries
                .remove(&key)
                .ok_or_else(|| StoreError::NotFound(format!("wishlist entry for {}", item_id)))?;
            state.in_flight.insert(key.clone(), PendingOp::Remove);
            entry
        };

        match self.client.remove_wishlist(&entry.id).await {
            Ok(()) => {
                // A refresh that landed while the delete was in flight has
                // reinstated the entry from the server's pre-delete list;
                // drop it again so the result applies to current state.
                let mut state = self.locked();
                state.in_flight.remove(&key);
                state.entries.remove(&key);
                Ok(())
            }
            Err(e) => {
                warn!("wishlist remove for item {} failed: {}", item_id, e);
                let mut state = self.locked();
                state.in_flight.remove(&key);
                state.entries.insert(key, entry);
                Err(e)
            }
        }
    }

    /// Remove everything on the wishlist, fanning the deletes out
    /// concurrently. Partial failure is reported, not collapsed into a
    /// single error: rejected entries stay on the local list.
    pub async fn clear(&self) -> ClearReport {
        let targets: Vec<(ItemKey, WishlistEntry)> = {
            let mut state = self.locked();
            let keys: Vec<ItemKey> = state
                .entries
                .keys()
                .filter(|k| !state.in_flight.contains_key(*k))
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|key| {
                    let entry = state.entries.remove(&key)?;
                    state.in_flight.insert(key.clone(), PendingOp::Remove);
                    Some((key, entry))
                })
                .collect()
        };

        let results = join_all(
            targets
                .iter()
                .map(|(_, entry)| self.client.remove_wishlist(&entry.id)),
        )
        .await;

        let mut report = ClearReport::default();
        let mut state = self.locked();
        for ((key, entry), result) in targets.into_iter().zip(results) {
            state.in_flight.remove(&key);
            match result {
                Ok(()) => {
                    // Same as remove: a concurrent refresh may have put the
                    // entry back while the delete was in flight.
                    state.entries.remove(&key);
                    report.removed.push(key);
                }
                Err(e) => {
                    state.entries.insert(key.clone(), entry);
                    report.failed.push((key, e));
                }
            }
        }
        if !report.is_complete() {
            warn!(
                "wishlist clear incomplete: {} removed, {} failed",
                report.removed.len(),
                report.failed.len()
            );
        }
        report
    }
}

fn index_entries(entries: Vec<WishlistEntry>) -> HashMap<ItemKey, WishlistEntry> {
    entries
        .into_iter()
        .map(|e| ((e.kind, e.item_id.clone()), e))
        .collect()
}
