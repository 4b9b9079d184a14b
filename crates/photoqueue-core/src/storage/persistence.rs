//! Catalog persistence
//!
//! Saves and restores the full catalog through a `KeyValueStore`.
//! Each entity collection is one JSON array entry; each id counter is one
//! decimal string entry:
//!
//! - `queues`, `items`, `itemImages`
//! - `nextQueueId`, `nextItemId`, `nextImageId`
//!
//! Loading never fails. A missing or unreadable entry degrades to an empty
//! collection (or a counter of 1) for that entry alone.

use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::error::StorageResult;
use super::kv::KeyValueStore;
use crate::models::{EntityId, Image, Item, Queue};

pub const QUEUES_KEY: &str = "queues";
pub const ITEMS_KEY: &str = "items";
pub const IMAGES_KEY: &str = "itemImages";
pub const NEXT_QUEUE_ID_KEY: &str = "nextQueueId";
pub const NEXT_ITEM_ID_KEY: &str = "nextItemId";
pub const NEXT_IMAGE_ID_KEY: &str = "nextImageId";

/// The three monotonically increasing id counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdCounters {
    pub next_queue_id: EntityId,
    pub next_item_id: EntityId,
    pub next_image_id: EntityId,
}

impl Default for IdCounters {
    fn default() -> Self {
        Self {
            next_queue_id: 1,
            next_item_id: 1,
            next_image_id: 1,
        }
    }
}

/// Everything the store owns, in persistable form
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub queues: Vec<Queue>,
    pub items: Vec<Item>,
    pub images: Vec<Image>,
    pub counters: IdCounters,
}

/// Persistence codec; the only component that touches the key-value store
pub struct CatalogPersistence {
    backend: Box<dyn KeyValueStore + Send>,
}

impl CatalogPersistence {
    pub fn new(backend: Box<dyn KeyValueStore + Send>) -> Self {
        Self { backend }
    }

    /// Write every collection and counter in a single batch
    pub fn save(&mut self, snapshot: &CatalogSnapshot) -> StorageResult<()> {
        let entries = [
            (QUEUES_KEY, serde_json::to_string(&snapshot.queues)?),
            (ITEMS_KEY, serde_json::to_string(&snapshot.items)?),
            (IMAGES_KEY, serde_json::to_string(&snapshot.images)?),
            (
                NEXT_QUEUE_ID_KEY,
                snapshot.counters.next_queue_id.to_string(),
            ),
            (NEXT_ITEM_ID_KEY, snapshot.counters.next_item_id.to_string()),
            (
                NEXT_IMAGE_ID_KEY,
                snapshot.counters.next_image_id.to_string(),
            ),
        ];

        self.backend.set_many(&entries)?;
        debug!(
            "Saved catalog: {} queues, {} items, {} images",
            snapshot.queues.len(),
            snapshot.items.len(),
            snapshot.images.len()
        );
        Ok(())
    }

    /// Restore the catalog, tolerating missing and malformed entries
    pub fn load(&self) -> CatalogSnapshot {
        let queues: Vec<Queue> = self.load_collection(QUEUES_KEY);
        let items: Vec<Item> = self.load_collection(ITEMS_KEY);
        let images: Vec<Image> = self.load_collection(IMAGES_KEY);

        // A lost counter must not let ids be handed out twice
        let counters = IdCounters {
            next_queue_id: self
                .load_counter(NEXT_QUEUE_ID_KEY)
                .max(next_after(queues.iter().map(|q| q.id))),
            next_item_id: self
                .load_counter(NEXT_ITEM_ID_KEY)
                .max(next_after(items.iter().map(|i| i.id))),
            next_image_id: self
                .load_counter(NEXT_IMAGE_ID_KEY)
                .max(next_after(images.iter().map(|i| i.id))),
        };

        CatalogSnapshot {
            queues,
            items,
            images,
            counters,
        }
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read '{}', starting empty: {}", key, e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Malformed '{}' entry, starting empty: {}", key, e);
                Vec::new()
            }
        }
    }

    fn load_counter(&self, key: &str) -> EntityId {
        match self.backend.get(key) {
            Ok(Some(raw)) => match raw.trim().parse::<EntityId>() {
                Ok(value) if value >= 1 => value,
                _ => {
                    warn!("Malformed '{}' counter {:?}, resetting to 1", key, raw);
                    1
                }
            },
            Ok(None) => 1,
            Err(e) => {
                warn!("Failed to read '{}', resetting to 1: {}", key, e);
                1
            }
        }
    }
}

fn next_after(ids: impl Iterator<Item = EntityId>) -> EntityId {
    ids.max().map_or(1, |max| max + 1)
}
