//! photoqueue Core Library
//!
//! This crate provides the core functionality for photoqueue, a local
//! photo-cataloguing store: items are grouped into queues, photos are
//! attached to items, and queues are exported as portable JSON snapshots.
//!
//! # Quick Start
//!
//! ```text
//! let mut store = Store::open(&Config::load()?)?;
//!
//! let queue = store.create_queue("Widgets")?;
//! let item = store.create_item(queue.id, "Bolt", None)?;
//! store.add_image_to_item(item.id, "/photos/bolt.jpg", 0)?;
//!
//! let exporter = Exporter::from_config(&config, device_info);
//! let exported = exporter.export_queue(&store, queue.id)?;
//! ```
//!
//! # Modules
//!
//! - `store`: Catalog store (main entry point)
//! - `models`: Queue, Item and Image
//! - `storage`: Key-value persistence of the catalog
//! - `orientation`: Quarter-turn rotation of pixel buffers
//! - `capture`: Importing photos from disk with orientation correction
//! - `export`: Export documents
//! - `config`: Application configuration

pub mod capture;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod orientation;
pub mod storage;
pub mod store;

pub use capture::{import_photo, CaptureError};
pub use config::Config;
pub use error::{CatalogError, CatalogResult};
pub use export::{ExportDocument, ExportError, ExportedFile, Exporter, EXPORT_FORMAT_VERSION};
pub use models::{EntityId, Image, Item, Queue};
pub use orientation::{rotate, PixelBuffer, Rotation};
pub use storage::{KeyValueStore, StorageError};
pub use store::{Store, StoreStats};
