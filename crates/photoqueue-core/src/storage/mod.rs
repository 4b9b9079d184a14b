//! Storage layer
//!
//! ## Architecture
//!
//! - **Key-value store**: durable string storage, SQLite-backed on disk
//! - **Persistence**: encodes the catalog into key-value entries and back
//! - **Filesystem helpers**: atomic writes for exports and imported photos

pub mod error;
pub mod fs;
pub mod kv;
pub mod persistence;
pub mod schema;

pub use error::{StorageError, StorageResult};
pub use kv::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use persistence::{CatalogPersistence, CatalogSnapshot, IdCounters};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
