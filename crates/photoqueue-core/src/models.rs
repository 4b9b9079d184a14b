//! Data models for photoqueue
//!
//! Defines the catalog hierarchy: a `Queue` owns `Item`s, an `Item` owns `Image`s.
//! Instances are created by the `Store`; anything handed out is a snapshot copy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier type shared by all entities
pub type EntityId = i64;

/// A named collection of catalog items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Queue {
    /// Unique identifier, assigned by the store
    pub id: EntityId,
    /// Display name (never blank)
    pub name: String,
    /// When this queue was created
    pub created_at: DateTime<Utc>,
    /// When this queue was last updated
    pub updated_at: DateTime<Utc>,
    /// Whether the queue has been pushed off-device
    #[serde(default)]
    pub is_synced: bool,
    /// When the queue was last pushed off-device
    #[serde(default)]
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl Queue {
    pub(crate) fn new(id: EntityId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            created_at: now,
            updated_at: now,
            is_synced: false,
            last_synced_at: None,
        }
    }

    /// Rename the queue (persist with `Store::update_queue`)
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Record a successful off-device sync
    pub fn mark_synced(&mut self, at: DateTime<Utc>) {
        self.is_synced = true;
        self.last_synced_at = Some(at);
    }
}

/// A catalogued object within a queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier, assigned by the store
    pub id: EntityId,
    /// Owning queue
    pub queue_id: EntityId,
    /// Display name
    pub name: String,
    /// Optional free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// When this item was created
    pub created_at: DateTime<Utc>,
    /// When this item was last updated
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub(crate) fn new(
        id: EntityId,
        queue_id: EntityId,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            queue_id,
            name: name.into(),
            description,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Update the description
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }
}

/// A photo attached to an item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Unique identifier, assigned by the store
    pub id: EntityId,
    /// Owning item
    pub item_id: EntityId,
    /// Path of the externally stored photo file
    pub image_path: String,
    /// Display position within the item; need not be unique or contiguous
    pub order_index: i32,
    /// When this image was attached
    pub created_at: DateTime<Utc>,
}

impl Image {
    pub(crate) fn new(
        id: EntityId,
        item_id: EntityId,
        image_path: impl Into<String>,
        order_index: i32,
    ) -> Self {
        Self {
            id,
            item_id,
            image_path: image_path.into(),
            order_index,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_new() {
        let queue = Queue::new(1, "Widgets");
        assert_eq!(queue.id, 1);
        assert_eq!(queue.name, "Widgets");
        assert_eq!(queue.created_at, queue.updated_at);
        assert!(!queue.is_synced);
        assert!(queue.last_synced_at.is_none());
    }

    #[test]
    fn test_queue_mark_synced() {
        let mut queue = Queue::new(1, "Widgets");
        let at = Utc::now();
        queue.mark_synced(at);
        assert!(queue.is_synced);
        assert_eq!(queue.last_synced_at, Some(at));
    }

    #[test]
    fn test_item_new() {
        let item = Item::new(3, 1, "Bolt", Some("M6 x 20".to_string()));
        assert_eq!(item.id, 3);
        assert_eq!(item.queue_id, 1);
        assert_eq!(item.description.as_deref(), Some("M6 x 20"));
    }

    #[test]
    fn test_queue_serializes_camel_case() {
        let queue = Queue::new(1, "Widgets");
        let json = serde_json::to_value(&queue).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("isSynced").is_some());
        assert!(json.get("lastSyncedAt").is_some());
    }

    #[test]
    fn test_image_serialization() {
        let image = Image::new(2, 1, "/tmp/a.jpg", 4);
        let json = serde_json::to_string(&image).unwrap();
        assert!(json.contains("\"imagePath\":\"/tmp/a.jpg\""));
        let deserialized: Image = serde_json::from_str(&json).unwrap();
        assert_eq!(image, deserialized);
    }
}
