//! Export documents
//!
//! Builds a versioned, timestamped JSON snapshot of one queue or the whole
//! catalog and writes it under the exports directory as
//! `<prefix>_<yyyyMMdd_HHmmss>.json`.
//!
//! Document shape:
//!
//! ```text
//! {
//!   "version": "2.0",
//!   "exportDate": "2024-03-01T09:30:00.123Z",
//!   "deviceInfo": { "platform": "linux", ... },
//!   "queues": [
//!     { "id", "name", "createdAt", "updatedAt", "isSynced",
//!       "items": [
//!         { "id", "name", "description"?, "createdAt", "updatedAt",
//!           "images": [ { "id", "imagePath", "orderIndex" } ] } ] } ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::models::{EntityId, Image, Item, Queue};
use crate::storage::fs::{atomic_write, ensure_dir, unique_path};
use crate::storage::StorageError;
use crate::store::Store;

/// Format version written into every export document
pub const EXPORT_FORMAT_VERSION: &str = "2.0";

const EXPORT_EXTENSION: &str = "json";
const QUEUE_EXPORT_PREFIX: &str = "queue";
const CATALOG_EXPORT_PREFIX: &str = "catalog_export";

/// Errors that can occur while exporting
#[derive(Error, Debug)]
pub enum ExportError {
    /// The requested queue does not exist
    #[error("Queue {0} not found")]
    QueueNotFound(EntityId),

    /// The document could not be encoded
    #[error("Failed to encode export document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing, listing or deleting export files failed
    #[error(transparent)]
    Io(#[from] StorageError),
}

/// Top-level export document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub version: String,
    pub export_date: String,
    pub device_info: BTreeMap<String, String>,
    pub queues: Vec<ExportQueue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportQueue {
    pub id: EntityId,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub is_synced: bool,
    pub items: Vec<ExportItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportItem {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub images: Vec<ExportImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportImage {
    pub id: EntityId,
    pub image_path: String,
    pub order_index: i32,
}

impl ExportDocument {
    /// Total items across all queues
    pub fn item_count(&self) -> usize {
        self.queues.iter().map(|q| q.items.len()).sum()
    }

    /// Total images across all items
    pub fn image_count(&self) -> usize {
        self.queues
            .iter()
            .flat_map(|q| &q.items)
            .map(|i| i.images.len())
            .sum()
    }
}

impl From<&Image> for ExportImage {
    fn from(image: &Image) -> Self {
        Self {
            id: image.id,
            image_path: image.image_path.clone(),
            order_index: image.order_index,
        }
    }
}

/// UTC ISO-8601 with millisecond precision, e.g. `2024-03-01T09:30:00.123Z`
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// A written export: where it went and exactly what was written
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub document: ExportDocument,
}

/// Writes export documents for a store
pub struct Exporter {
    exports_dir: PathBuf,
    device_info: BTreeMap<String, String>,
}

impl Exporter {
    /// Create an exporter writing into `exports_dir`
    ///
    /// `device_info` is copied verbatim into every document.
    pub fn new(exports_dir: impl Into<PathBuf>, device_info: BTreeMap<String, String>) -> Self {
        Self {
            exports_dir: exports_dir.into(),
            device_info,
        }
    }

    /// Exporter for the configured exports directory
    pub fn from_config(config: &Config, device_info: BTreeMap<String, String>) -> Self {
        Self::new(config.exports_dir(), device_info)
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    // ==================== Document Building ====================

    /// Document holding a single queue, or `None` if it does not exist
    pub fn build_queue_document(&self, store: &Store, queue_id: EntityId) -> Option<ExportDocument> {
        let queue = store.get_queue_by_id(queue_id)?;
        Some(self.document(vec![queue_tree(store, &queue)]))
    }

    /// Document holding every queue in the store
    pub fn build_catalog_document(&self, store: &Store) -> ExportDocument {
        let queues = store
            .get_all_queues()
            .iter()
            .map(|queue| queue_tree(store, queue))
            .collect();
        self.document(queues)
    }

    fn document(&self, queues: Vec<ExportQueue>) -> ExportDocument {
        ExportDocument {
            version: EXPORT_FORMAT_VERSION.to_string(),
            export_date: format_timestamp(&Utc::now()),
            device_info: self.device_info.clone(),
            queues,
        }
    }

    // ==================== File Operations ====================

    /// Export one queue; fails without creating a file if it does not exist
    pub fn export_queue(&self, store: &Store, queue_id: EntityId) -> Result<ExportedFile, ExportError> {
        let Some(document) = self.build_queue_document(store, queue_id) else {
            error!("Export failed: queue {} not found", queue_id);
            return Err(ExportError::QueueNotFound(queue_id));
        };

        let prefix = format!(
            "{}_{}",
            QUEUE_EXPORT_PREFIX,
            sanitize_file_component(&document.queues[0].name)
        );
        self.write_document(document, &prefix)
    }

    /// Export every queue in the store
    pub fn export_all_queues(&self, store: &Store) -> Result<ExportedFile, ExportError> {
        let document = self.build_catalog_document(store);
        self.write_document(document, CATALOG_EXPORT_PREFIX)
    }

    fn write_document(
        &self,
        document: ExportDocument,
        prefix: &str,
    ) -> Result<ExportedFile, ExportError> {
        let result = self.try_write_document(&document, prefix);
        match &result {
            Ok(path) => info!(
                "Exported {} queue(s), {} item(s), {} image(s) to {:?}",
                document.queues.len(),
                document.item_count(),
                document.image_count(),
                path
            ),
            Err(e) => error!("Failed to export data: {}", e),
        }
        result.map(|path| ExportedFile { path, document })
    }

    fn try_write_document(
        &self,
        document: &ExportDocument,
        prefix: &str,
    ) -> Result<PathBuf, ExportError> {
        let json = serde_json::to_string_pretty(document)?;

        ensure_dir(&self.exports_dir)?;
        let stem = format!("{}_{}", prefix, Local::now().format("%Y%m%d_%H%M%S"));
        let path = unique_path(&self.exports_dir, &stem, EXPORT_EXTENSION);

        atomic_write(&path, json.as_bytes())?;
        Ok(path)
    }

    /// Previously written export documents, most recent first
    pub fn get_exported_files(&self) -> Vec<PathBuf> {
        if !self.exports_dir.exists() {
            return Vec::new();
        }

        let entries = match fs::read_dir(&self.exports_dir) {
            Ok(entries) => entries,
            Err(e) => {
                let err = StorageError::from_read_io(e, self.exports_dir.clone());
                warn!("Cannot list exports: {}", err);
                return Vec::new();
            }
        };

        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path.extension().and_then(|ext| ext.to_str()) == Some(EXPORT_EXTENSION)
            })
            .map(|path| (created_time(&path), path))
            .collect();

        files.sort_by(|a, b| b.cmp(a));
        files.into_iter().map(|(_, path)| path).collect()
    }

    /// Remove an export document
    ///
    /// Only `*.json` files directly inside the exports directory are
    /// removed. Anything else, including a path that no longer exists,
    /// yields `Ok(false)`.
    pub fn delete_export_file(&self, path: &Path) -> Result<bool, ExportError> {
        if !path.exists() {
            warn!("Export file {:?} does not exist", path);
            return Ok(false);
        }
        if !self.is_export_file(path) {
            warn!(
                "Refusing to delete {:?}: not an export document in {:?}",
                path, self.exports_dir
            );
            return Ok(false);
        }

        fs::remove_file(path).map_err(|e| {
            let err = StorageError::from_io(e, path.to_path_buf());
            error!("Failed to delete export file: {}", err);
            err
        })?;

        info!("Deleted export file: {:?}", path);
        Ok(true)
    }

    fn is_export_file(&self, path: &Path) -> bool {
        let (Ok(file), Ok(dir)) = (fs::canonicalize(path), fs::canonicalize(&self.exports_dir))
        else {
            return false;
        };

        file.is_file()
            && file.parent() == Some(dir.as_path())
            && file.extension().and_then(|ext| ext.to_str()) == Some(EXPORT_EXTENSION)
    }
}

fn queue_tree(store: &Store, queue: &Queue) -> ExportQueue {
    let items = store
        .get_items_by_queue_id(queue.id)
        .iter()
        .map(|item| item_tree(store, item))
        .collect();

    ExportQueue {
        id: queue.id,
        name: queue.name.clone(),
        created_at: format_timestamp(&queue.created_at),
        updated_at: format_timestamp(&queue.updated_at),
        is_synced: queue.is_synced,
        items,
    }
}

fn item_tree(store: &Store, item: &Item) -> ExportItem {
    ExportItem {
        id: item.id,
        name: item.name.clone(),
        description: item.description.clone(),
        created_at: format_timestamp(&item.created_at),
        updated_at: format_timestamp(&item.updated_at),
        images: store
            .get_images_by_item_id(item.id)
            .iter()
            .map(ExportImage::from)
            .collect(),
    }
}

/// Creation time, falling back to modification time where unsupported
fn created_time(path: &Path) -> SystemTime {
    fs::metadata(path)
        .and_then(|meta| meta.created().or_else(|_| meta.modified()))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Make a queue name safe to embed in a file name
fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
