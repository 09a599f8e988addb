//! Concurrent voting item storage with per-item fine-grained locking.
//!
//! [`VoteLedger`] stores all voting items in a `HashMap` where each
//! entry is individually protected by a [`tokio::sync::RwLock`]. The
//! duplicate-vote check-then-write therefore runs inside a critical
//! section scoped to one item, while votes on distinct items proceed
//! concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::ItemId;
use super::vote_item::{ItemKind, ItemView, VoteItem};
use crate::error::FanstageError;

/// Central store for all voting items (polls, predictions, wagers).
///
/// # Concurrency
///
/// - Multiple tasks may read the same item concurrently.
/// - Writes to different items are concurrent.
/// - Writes to the same item are serialized, which is what upholds the
///   at-most-once voting invariant under interleaving.
#[derive(Debug)]
pub struct VoteLedger {
    items: RwLock<HashMap<ItemId, Arc<RwLock<VoteItem>>>>,
}

impl VoteLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Inserts a new item into the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::InvalidRequest`] if an item with the
    /// same ID already exists (should never happen with UUID v4).
    pub async fn insert(&self, item: VoteItem) -> Result<ItemId, FanstageError> {
        let item_id = item.item_id;
        let mut map = self.items.write().await;
        if map.contains_key(&item_id) {
            return Err(FanstageError::InvalidRequest(format!(
                "item {item_id} already exists"
            )));
        }
        map.insert(item_id, Arc::new(RwLock::new(item)));
        Ok(item_id)
    }

    /// Returns a shared reference to the item behind its per-item lock.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if no item with the given ID
    /// exists.
    pub async fn get(&self, item_id: ItemId) -> Result<Arc<RwLock<VoteItem>>, FanstageError> {
        let map = self.items.read().await;
        map.get(&item_id)
            .cloned()
            .ok_or_else(|| FanstageError::NotFound(format!("item {item_id}")))
    }

    /// Removes an item from the ledger, returning it together with its
    /// vote registry.
    ///
    /// # Errors
    ///
    /// Returns [`FanstageError::NotFound`] if no item with the given ID
    /// exists.
    pub async fn remove(&self, item_id: ItemId) -> Result<VoteItem, FanstageError> {
        let arc = {
            let mut map = self.items.write().await;
            map.remove(&item_id)
                .ok_or_else(|| FanstageError::NotFound(format!("item {item_id}")))?
        };
        // In-flight readers may still hold the entry; taking its write
        // lock waits them out instead of failing on the refcount.
        let item = arc.write().await.clone();
        Ok(item)
    }

    /// Returns public views of all items, optionally filtered by kind
    /// and/or restricted to active items.
    pub async fn list(&self, kind: Option<ItemKind>, active_only: bool) -> Vec<ItemView> {
        let map = self.items.read().await;
        let mut views = Vec::with_capacity(map.len());
        for entry in map.values() {
            let item = entry.read().await;
            if let Some(wanted) = kind
                && item.kind != wanted
            {
                continue;
            }
            let view = item.view();
            if active_only && !view.active {
                continue;
            }
            views.push(view);
        }
        views.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        views
    }

    /// Returns the number of items in the ledger.
    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    /// Returns `true` if the ledger contains no items.
    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn make_item(kind: ItemKind) -> VoteItem {
        let Ok(item) = VoteItem::new(
            kind,
            "q".to_string(),
            vec!["a".to_string(), "b".to_string()],
        ) else {
            panic!("valid item definition");
        };
        item
    }

    #[tokio::test]
    async fn insert_and_get() {
        let ledger = VoteLedger::new();
        let item = make_item(ItemKind::Poll);
        let id = item.item_id;

        let result = ledger.insert(item).await;
        assert!(result.is_ok());

        let fetched = ledger.get(id).await;
        assert!(fetched.is_ok());
    }

    #[tokio::test]
    async fn get_nonexistent_returns_error() {
        let ledger = VoteLedger::new();
        let result = ledger.get(ItemId::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn remove_returns_item_with_registry() {
        let ledger = VoteLedger::new();
        let item = make_item(ItemKind::Poll);
        let id = item.item_id;
        let _ = ledger.insert(item).await;

        {
            let Ok(entry) = ledger.get(id).await else {
                panic!("item not found");
            };
            let mut item = entry.write().await;
            assert!(item.register_vote("user-a", 0).is_ok());
        }

        let Ok(removed) = ledger.remove(id).await else {
            panic!("remove failed");
        };
        assert_eq!(removed.registry_len(), 1);
        assert!(ledger.get(id).await.is_err());
    }

    #[tokio::test]
    async fn remove_succeeds_while_a_reader_holds_the_entry() {
        let ledger = VoteLedger::new();
        let item = make_item(ItemKind::Poll);
        let id = item.item_id;
        let _ = ledger.insert(item).await;

        let Ok(held) = ledger.get(id).await else {
            panic!("item not found");
        };

        let Ok(removed) = ledger.remove(id).await else {
            panic!("remove should not depend on the entry refcount");
        };
        assert_eq!(removed.item_id, id);
        assert!(ledger.get(id).await.is_err());
        drop(held);
    }

    #[tokio::test]
    async fn remove_nonexistent_returns_error() {
        let ledger = VoteLedger::new();
        let result = ledger.remove(ItemId::new()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn list_filters_by_kind_and_active() {
        let ledger = VoteLedger::new();
        let _ = ledger.insert(make_item(ItemKind::Poll)).await;
        let mut closed = make_item(ItemKind::Wager);
        closed.close();
        let _ = ledger.insert(closed).await;

        assert_eq!(ledger.list(None, false).await.len(), 2);
        assert_eq!(ledger.list(Some(ItemKind::Poll), false).await.len(), 1);
        assert_eq!(ledger.list(Some(ItemKind::Wager), true).await.len(), 0);
        assert_eq!(ledger.list(None, true).await.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_duplicate_votes_admit_exactly_one() {
        let ledger = Arc::new(VoteLedger::new());
        let item = make_item(ItemKind::Poll);
        let id = item.item_id;
        let _ = ledger.insert(item).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                let Ok(entry) = ledger.get(id).await else {
                    return false;
                };
                let mut item = entry.write().await;
                item.register_vote("racer", 0).is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            let Ok(won) = handle.await else {
                panic!("task panicked");
            };
            if won {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);

        let Ok(entry) = ledger.get(id).await else {
            panic!("item not found");
        };
        let item = entry.read().await;
        assert_eq!(item.total_votes(), 1);
        assert_eq!(item.registry_len(), 1);
    }
}
