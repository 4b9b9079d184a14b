//! Catalog store errors

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by `Store` operations
///
/// A missing id is not an error: lookups return `None` and updates or
/// deletes of a missing id are no-ops.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// A required text field was empty or blank; nothing was changed
    #[error("Invalid {field}: {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    /// The catalog database could not be opened; no change was made
    #[error("Failed to open catalog at '{path}': {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: StorageError,
    },

    /// The in-memory change was applied but could not be written to storage,
    /// so it may not survive a restart
    #[error("Change applied but not saved: {0}")]
    Persistence(#[from] StorageError),
}

impl CatalogError {
    pub(crate) fn blank(field: &'static str) -> Self {
        CatalogError::Validation {
            field,
            reason: "must not be empty",
        }
    }

    /// True when the requested change is in memory despite the error
    pub fn change_applied(&self) -> bool {
        matches!(self, CatalogError::Persistence(_))
    }
}

/// Result type for store operations
pub type CatalogResult<T> = Result<T, CatalogError>;
