//! Catalog store
//!
//! The `Store` owns every queue, item and image, hands out ids, keeps
//! cascade deletes consistent and persists after every mutation.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = Store::open(&config)?;
//!
//! let queue = store.create_queue("Widgets")?;
//! let item = store.create_item(queue.id, "Bolt", None)?;
//! store.add_image_to_item(item.id, "/photos/bolt.jpg", 0)?;
//!
//! assert_eq!(store.get_queue_image_count(queue.id), 1);
//! ```
//!
//! Everything returned is a snapshot copy. Mutations take `&mut self`, so a
//! store shared between threads has to sit behind a `Mutex`.
//!
//! If saving fails after a mutation, the change stays in memory and the
//! call returns `CatalogError::Persistence`.

use std::collections::HashSet;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{CatalogError, CatalogResult};
use crate::models::{EntityId, Image, Item, Queue};
use crate::storage::{
    CatalogPersistence, CatalogSnapshot, KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore,
};

/// Entity totals across the whole catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStats {
    pub queues: usize,
    pub items: usize,
    pub images: usize,
}

/// Single source of truth for catalog data
pub struct Store {
    data: CatalogSnapshot,
    persistence: CatalogPersistence,
}

impl Store {
    /// Open the SQLite-backed store under the configured data directory
    pub fn open(config: &Config) -> CatalogResult<Self> {
        let path = config.database_path();
        let backend = SqliteKeyValueStore::open(&path)
            .map_err(|source| CatalogError::Open { path, source })?;
        let store = Self::with_backend(Box::new(backend));
        info!(
            "Opened catalog at {:?} ({} queues)",
            config.database_path(),
            store.data.queues.len()
        );
        Ok(store)
    }

    /// Build a store over any key-value backend, loading whatever it holds
    pub fn with_backend(backend: Box<dyn KeyValueStore + Send>) -> Self {
        let persistence = CatalogPersistence::new(backend);
        let data = persistence.load();
        Self { data, persistence }
    }

    /// A store that persists to memory only
    pub fn in_memory() -> Self {
        Self::with_backend(Box::new(MemoryKeyValueStore::new()))
    }

    /// Discard in-memory state and load again from storage
    pub fn reload(&mut self) {
        self.data = self.persistence.load();
    }

    /// Entity totals
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            queues: self.data.queues.len(),
            items: self.data.items.len(),
            images: self.data.images.len(),
        }
    }

    fn persist(&mut self) -> CatalogResult<()> {
        self.persistence.save(&self.data).map_err(|e| {
            warn!("Catalog change not saved: {}", e);
            CatalogError::from(e)
        })
    }

    // ==================== Queue Operations ====================

    /// Create a queue; the name must not be blank
    pub fn create_queue(&mut self, name: &str) -> CatalogResult<Queue> {
        let name = required(name, "queue name")?;

        let id = self.data.counters.next_queue_id;
        self.data.counters.next_queue_id += 1;

        let queue = Queue::new(id, name);
        self.data.queues.push(queue.clone());
        debug!("Created queue {} ({})", queue.id, queue.name);

        self.persist()?;
        Ok(queue)
    }

    /// All queues in creation order
    pub fn get_all_queues(&self) -> Vec<Queue> {
        self.data.queues.clone()
    }

    /// Get a queue by ID
    pub fn get_queue_by_id(&self, id: EntityId) -> Option<Queue> {
        self.data.queues.iter().find(|q| q.id == id).cloned()
    }

    /// Replace the stored queue with the same id
    ///
    /// `created_at` is kept and `updated_at` refreshed. Returns the stored
    /// record, or `None` when no queue has that id.
    pub fn update_queue(&mut self, queue: &Queue) -> CatalogResult<Option<Queue>> {
        let name = required(&queue.name, "queue name")?;

        let Some(stored) = self.data.queues.iter_mut().find(|q| q.id == queue.id) else {
            warn!("Update skipped: queue {} not found", queue.id);
            return Ok(None);
        };

        stored.name = name.to_string();
        stored.is_synced = queue.is_synced;
        stored.last_synced_at = queue.last_synced_at;
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        debug!("Updated queue {}", updated.id);

        self.persist()?;
        Ok(Some(updated))
    }

    /// Delete a queue along with its items and their images
    ///
    /// Returns `false` without touching storage when the queue is missing.
    pub fn delete_queue(&mut self, id: EntityId) -> CatalogResult<bool> {
        let before = self.data.queues.len();
        self.data.queues.retain(|q| q.id != id);
        if self.data.queues.len() == before {
            debug!("Delete skipped: queue {} not found", id);
            return Ok(false);
        }

        // Collect first, then filter
        let item_ids: HashSet<EntityId> = self
            .data
            .items
            .iter()
            .filter(|i| i.queue_id == id)
            .map(|i| i.id)
            .collect();

        self.data.items.retain(|i| i.queue_id != id);
        self.data
            .images
            .retain(|img| !item_ids.contains(&img.item_id));
        debug!("Deleted queue {} and {} item(s)", id, item_ids.len());

        self.persist()?;
        Ok(true)
    }

    /// Number of items in a queue
    pub fn get_queue_item_count(&self, id: EntityId) -> usize {
        self.data.items.iter().filter(|i| i.queue_id == id).count()
    }

    /// Number of images across all items of a queue
    pub fn get_queue_image_count(&self, id: EntityId) -> usize {
        let item_ids: HashSet<EntityId> = self
            .data
            .items
            .iter()
            .filter(|i| i.queue_id == id)
            .map(|i| i.id)
            .collect();

        self.data
            .images
            .iter()
            .filter(|img| item_ids.contains(&img.item_id))
            .count()
    }

    // ==================== Item Operations ====================

    /// Create an item in a queue
    ///
    /// The queue id is not checked; items whose queue does not exist are
    /// accepted.
    pub fn create_item(
        &mut self,
        queue_id: EntityId,
        name: &str,
        description: Option<String>,
    ) -> CatalogResult<Item> {
        let name = required(name, "item name")?;

        let id = self.data.counters.next_item_id;
        self.data.counters.next_item_id += 1;

        let item = Item::new(id, queue_id, name, description);
        self.data.items.push(item.clone());
        debug!("Created item {} in queue {}", item.id, queue_id);

        self.persist()?;
        Ok(item)
    }

    /// Items of a queue in creation order
    pub fn get_items_by_queue_id(&self, queue_id: EntityId) -> Vec<Item> {
        self.data
            .items
            .iter()
            .filter(|i| i.queue_id == queue_id)
            .cloned()
            .collect()
    }

    /// Get an item by ID
    pub fn get_item_by_id(&self, id: EntityId) -> Option<Item> {
        self.data.items.iter().find(|i| i.id == id).cloned()
    }

    /// Replace the stored item with the same id
    ///
    /// `queue_id` and `created_at` are kept; `updated_at` is refreshed.
    pub fn update_item(&mut self, item: &Item) -> CatalogResult<Option<Item>> {
        let name = required(&item.name, "item name")?;

        let Some(stored) = self.data.items.iter_mut().find(|i| i.id == item.id) else {
            warn!("Update skipped: item {} not found", item.id);
            return Ok(None);
        };

        if stored.queue_id != item.queue_id {
            warn!(
                "Ignoring queue change for item {} ({} -> {})",
                item.id, stored.queue_id, item.queue_id
            );
        }

        stored.name = name.to_string();
        stored.description = item.description.clone();
        stored.updated_at = Utc::now();
        let updated = stored.clone();
        debug!("Updated item {}", updated.id);

        self.persist()?;
        Ok(Some(updated))
    }

    /// Delete an item along with its images
    pub fn delete_item(&mut self, id: EntityId) -> CatalogResult<bool> {
        let before = self.data.items.len();
        self.data.items.retain(|i| i.id != id);
        if self.data.items.len() == before {
            debug!("Delete skipped: item {} not found", id);
            return Ok(false);
        }

        self.data.images.retain(|img| img.item_id != id);
        debug!("Deleted item {}", id);

        self.persist()?;
        Ok(true)
    }

    // ==================== Image Operations ====================

    /// Attach a photo to an item
    ///
    /// The item id is not checked, same as `create_item`.
    pub fn add_image_to_item(
        &mut self,
        item_id: EntityId,
        image_path: &str,
        order_index: i32,
    ) -> CatalogResult<Image> {
        if image_path.trim().is_empty() {
            return Err(CatalogError::blank("image path"));
        }

        let id = self.data.counters.next_image_id;
        self.data.counters.next_image_id += 1;

        let image = Image::new(id, item_id, image_path, order_index);
        self.data.images.push(image.clone());
        debug!("Added image {} to item {}", image.id, item_id);

        self.persist()?;
        Ok(image)
    }

    /// Images of an item, ascending by `order_index`, ties in insertion order
    pub fn get_images_by_item_id(&self, item_id: EntityId) -> Vec<Image> {
        let mut images: Vec<Image> = self
            .data
            .images
            .iter()
            .filter(|img| img.item_id == item_id)
            .cloned()
            .collect();
        images.sort_by_key(|img| img.order_index);
        images
    }

    /// Get an image by ID
    pub fn get_image_by_id(&self, id: EntityId) -> Option<Image> {
        self.data.images.iter().find(|img| img.id == id).cloned()
    }

    /// Remove an image
    pub fn delete_image(&mut self, id: EntityId) -> CatalogResult<bool> {
        let before = self.data.images.len();
        self.data.images.retain(|img| img.id != id);
        if self.data.images.len() == before {
            debug!("Delete skipped: image {} not found", id);
            return Ok(false);
        }

        debug!("Deleted image {}", id);
        self.persist()?;
        Ok(true)
    }
}

/// Trimmed value of a required text field
fn required<'a>(value: &'a str, field: &'static str) -> CatalogResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::blank(field));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageError, StorageResult};
    use std::io;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        }
    }

    /// Backend whose writes always fail
    struct FullDisk;

    impl KeyValueStore for FullDisk {
        fn get(&self, _key: &str) -> StorageResult<Option<String>> {
            Ok(None)
        }

        fn set_many(&mut self, _entries: &[(&str, String)]) -> StorageResult<()> {
            Err(disk_full())
        }
    }

    fn disk_full() -> StorageError {
        StorageError::from_io(
            io::Error::new(io::ErrorKind::Other, "No space left on device"),
            PathBuf::from("/data/catalog.db"),
        )
    }

    #[test]
    fn test_worked_example() {
        let mut store = Store::in_memory();

        let queue = store.create_queue("Widgets").unwrap();
        assert_eq!(queue.id, 1);

        let item = store.create_item(1, "Bolt", None).unwrap();
        assert_eq!(item.id, 1);

        let a = store.add_image_to_item(1, "/tmp/a.jpg", 0).unwrap();
        let b = store.add_image_to_item(1, "/tmp/b.jpg", 1).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);

        assert_eq!(store.get_queue_item_count(1), 1);
        assert_eq!(store.get_queue_image_count(1), 2);
    }

    #[test]
    fn test_queue_ids_strictly_increase() {
        let mut store = Store::in_memory();

        let mut last = 0;
        for n in 0..5 {
            let queue = store.create_queue(&format!("Queue {}", n)).unwrap();
            assert!(queue.id > last);
            last = queue.id;
        }

        // Deleting does not free ids for reuse
        store.delete_queue(last).unwrap();
        let next = store.create_queue("After delete").unwrap();
        assert_eq!(next.id, last + 1);
    }

    #[test]
    fn test_create_queue_rejects_blank_name() {
        let mut store = Store::in_memory();

        let err = store.create_queue("   ").unwrap_err();
        assert!(matches!(err, CatalogError::Validation { .. }));
        assert!(store.get_all_queues().is_empty());

        // Failed create does not consume an id
        assert_eq!(store.create_queue("Real").unwrap().id, 1);
    }

    #[test]
    fn test_create_queue_trims_name() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("  Shelf A  ").unwrap();
        assert_eq!(queue.name, "Shelf A");
        assert_eq!(queue.created_at, queue.updated_at);
    }

    #[test]
    fn test_get_all_queues_in_insertion_order() {
        let mut store = Store::in_memory();
        store.create_queue("b").unwrap();
        store.create_queue("a").unwrap();
        store.create_queue("c").unwrap();

        let names: Vec<_> = store
            .get_all_queues()
            .into_iter()
            .map(|q| q.name)
            .collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_get_queue_by_id_missing() {
        let store = Store::in_memory();
        assert!(store.get_queue_by_id(42).is_none());
    }

    #[test]
    fn test_returned_values_are_snapshots() {
        let mut store = Store::in_memory();
        let mut queue = store.create_queue("Original").unwrap();

        queue.set_name("Changed locally");

        assert_eq!(store.get_queue_by_id(queue.id).unwrap().name, "Original");
    }

    #[test]
    fn test_update_queue() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("Original").unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let mut edited = queue.clone();
        edited.set_name("Renamed");
        edited.mark_synced(Utc::now());
        edited.created_at = Utc::now();

        let updated = store.update_queue(&edited).unwrap().unwrap();
        assert_eq!(updated.name, "Renamed");
        assert!(updated.is_synced);
        assert!(updated.updated_at > queue.updated_at);
        assert_eq!(updated.created_at, queue.created_at);

        assert_eq!(store.get_queue_by_id(queue.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing_queue_is_noop() {
        let mut store = Store::in_memory();
        let mut ghost = store.create_queue("Ghost").unwrap();
        store.delete_queue(ghost.id).unwrap();

        ghost.set_name("Still ghost");
        assert!(store.update_queue(&ghost).unwrap().is_none());
        assert!(store.get_all_queues().is_empty());
    }

    #[test]
    fn test_update_queue_rejects_blank_name() {
        let mut store = Store::in_memory();
        let mut queue = store.create_queue("Keep").unwrap();
        queue.set_name("");

        assert!(store.update_queue(&queue).is_err());
        assert_eq!(store.get_queue_by_id(queue.id).unwrap().name, "Keep");
    }

    #[test]
    fn test_delete_queue_cascades() {
        let mut store = Store::in_memory();
        let doomed = store.create_queue("Doomed").unwrap();
        let kept = store.create_queue("Kept").unwrap();

        let i1 = store.create_item(doomed.id, "One", None).unwrap();
        let i2 = store.create_item(doomed.id, "Two", None).unwrap();
        let other = store.create_item(kept.id, "Other", None).unwrap();
        store.add_image_to_item(i1.id, "/p/1.jpg", 0).unwrap();
        store.add_image_to_item(i2.id, "/p/2.jpg", 0).unwrap();
        store.add_image_to_item(other.id, "/p/3.jpg", 0).unwrap();

        assert!(store.delete_queue(doomed.id).unwrap());

        assert!(store.get_queue_by_id(doomed.id).is_none());
        assert!(store.get_items_by_queue_id(doomed.id).is_empty());
        assert!(store.get_images_by_item_id(i1.id).is_empty());
        assert!(store.get_images_by_item_id(i2.id).is_empty());

        assert_eq!(store.get_items_by_queue_id(kept.id).len(), 1);
        assert_eq!(store.get_images_by_item_id(other.id).len(), 1);
        assert_eq!(
            store.stats(),
            StoreStats {
                queues: 1,
                items: 1,
                images: 1
            }
        );
    }

    #[test]
    fn test_delete_missing_queue_is_noop() {
        let mut store = Store::in_memory();
        store.create_queue("Stays").unwrap();

        assert!(!store.delete_queue(99).unwrap());
        assert_eq!(store.get_all_queues().len(), 1);
    }

    #[test]
    fn test_create_item_allows_unknown_queue() {
        let mut store = Store::in_memory();
        let item = store.create_item(77, "Orphan", None).unwrap();

        assert_eq!(item.queue_id, 77);
        assert_eq!(store.get_items_by_queue_id(77).len(), 1);
    }

    #[test]
    fn test_create_item_rejects_blank_name() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("Q").unwrap();

        let err = store.create_item(queue.id, "\t", None).unwrap_err();
        assert!(matches!(err, CatalogError::Validation { field: "item name", .. }));
        assert_eq!(store.get_queue_item_count(queue.id), 0);
    }

    #[test]
    fn test_update_item_keeps_queue_and_created_at() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("Q").unwrap();
        let item = store.create_item(queue.id, "Bolt", None).unwrap();

        let mut edited = item.clone();
        edited.set_name("Hex bolt");
        edited.set_description(Some("M8".to_string()));
        edited.queue_id = 999;

        let updated = store.update_item(&edited).unwrap().unwrap();
        assert_eq!(updated.name, "Hex bolt");
        assert_eq!(updated.description.as_deref(), Some("M8"));
        assert_eq!(updated.queue_id, queue.id);
        assert_eq!(updated.created_at, item.created_at);
        assert!(updated.updated_at >= item.updated_at);
    }

    #[test]
    fn test_update_missing_item_is_noop() {
        let mut store = Store::in_memory();
        let mut item = store.create_item(1, "Gone", None).unwrap();
        store.delete_item(item.id).unwrap();

        item.set_name("Back?");
        assert!(store.update_item(&item).unwrap().is_none());
    }

    #[test]
    fn test_delete_item_cascades_to_images() {
        let mut store = Store::in_memory();
        let queue = store.create_queue("Q").unwrap();
        let item = store.create_item(queue.id, "Bolt", None).unwrap();
        let keep = store.create_item(queue.id, "Nut", None).unwrap();
        store.add_image_to_item(item.id, "/p/a.jpg", 0).unwrap();
        store.add_image_to_item(keep.id, "/p/b.jpg", 0).unwrap();

        assert!(store.delete_item(item.id).unwrap());

        assert!(store.get_item_by_id(item.id).is_none());
        assert!(store.get_images_by_item_id(item.id).is_empty());
        assert_eq!(store.get_queue_image_count(queue.id), 1);
        assert!(!store.delete_item(item.id).unwrap());
    }

    #[test]
    fn test_images_sorted_by_order_index_stable() {
        let mut store = Store::in_memory();
        let item = store.create_item(1, "Bolt", None).unwrap();

        let late = store.add_image_to_item(item.id, "/p/late.jpg", 5).unwrap();
        let tie_first = store.add_image_to_item(item.id, "/p/tie1.jpg", 2).unwrap();
        let early = store.add_image_to_item(item.id, "/p/early.jpg", -1).unwrap();
        let tie_second = store.add_image_to_item(item.id, "/p/tie2.jpg", 2).unwrap();

        let ids: Vec<_> = store
            .get_images_by_item_id(item.id)
            .into_iter()
            .map(|img| img.id)
            .collect();
        assert_eq!(ids, vec![early.id, tie_first.id, tie_second.id, late.id]);
    }

    #[test]
    fn test_add_image_rejects_blank_path() {
        let mut store = Store::in_memory();
        assert!(store.add_image_to_item(1, "  ", 0).is_err());
        assert_eq!(store.stats().images, 0);
    }

    #[test]
    fn test_delete_image() {
        let mut store = Store::in_memory();
        let image = store.add_image_to_item(1, "/p/a.jpg", 0).unwrap();

        assert!(store.get_image_by_id(image.id).is_some());
        assert!(store.delete_image(image.id).unwrap());
        assert!(store.get_image_by_id(image.id).is_none());
        assert!(!store.delete_image(image.id).unwrap());
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        {
            let mut store = Store::open(&config).unwrap();
            let queue = store.create_queue("Persistent").unwrap();
            let item = store
                .create_item(queue.id, "Lamp", Some("brass".to_string()))
                .unwrap();
            store.add_image_to_item(item.id, "/p/lamp.jpg", 0).unwrap();
        }

        let mut store = Store::open(&config).unwrap();
        let queues = store.get_all_queues();
        assert_eq!(queues.len(), 1);
        assert_eq!(queues[0].name, "Persistent");

        let items = store.get_items_by_queue_id(queues[0].id);
        assert_eq!(items[0].description.as_deref(), Some("brass"));
        assert_eq!(store.get_queue_image_count(queues[0].id), 1);

        // Counters survive too
        assert_eq!(store.create_queue("Second").unwrap().id, 2);
    }

    #[test]
    fn test_open_recovers_from_unreadable_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        std::fs::write(config.database_path(), vec![0x42_u8; 4096]).unwrap();

        let mut store = Store::open(&config).unwrap();
        assert_eq!(store.stats(), StoreStats::default());
        assert!(temp_dir.path().join("catalog.db.corrupt.backup").exists());

        store.create_queue("Fresh start").unwrap();
        drop(store);

        let store = Store::open(&config).unwrap();
        assert_eq!(store.get_all_queues()[0].name, "Fresh start");
    }

    #[test]
    fn test_open_failure_reports_open_error() {
        let temp_dir = TempDir::new().unwrap();
        // A file where the data directory should be
        let blocked = temp_dir.path().join("data");
        std::fs::write(&blocked, "not a directory").unwrap();
        let config = Config {
            data_dir: blocked.join("nested"),
            ..Config::default()
        };

        let err = Store::open(&config).err().unwrap();
        assert!(matches!(err, CatalogError::Open { .. }));
        assert!(!err.change_applied());
    }

    #[test]
    fn test_reload_discards_unsaved_state() {
        let mut store = Store::with_backend(Box::new(FullDisk));

        let err = store.create_queue("Unsaved").unwrap_err();
        assert!(err.change_applied());
        assert_eq!(store.get_all_queues().len(), 1);

        store.reload();
        assert!(store.get_all_queues().is_empty());
    }

    #[test]
    fn test_save_failure_keeps_in_memory_change() {
        let mut store = Store::with_backend(Box::new(FullDisk));

        assert!(matches!(
            store.create_item(1, "Kept anyway", None),
            Err(CatalogError::Persistence(_))
        ));
        assert_eq!(store.get_items_by_queue_id(1).len(), 1);
    }
}
