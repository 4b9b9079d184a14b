//! Storage errors
//!
//! I/O failures are classified by kind so the CLI can tell a full disk
//! from a permissions problem and print a hint.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the key-value store and the filesystem helpers
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Permission denied for '{path}'")]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No space left while writing '{path}'")]
    DiskFull {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write '{path}': {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("No such file: '{path}'")]
    NotFound { path: PathBuf },

    /// The temp file was written but could not replace the target
    #[error("Could not move '{from}' into place at '{to}': {source}")]
    AtomicWriteFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The catalog database was unreadable and has been moved aside
    #[error("Catalog database '{path}' is unreadable ({details}); moved to '{backup_path}'")]
    CorruptDatabase {
        path: PathBuf,
        backup_path: PathBuf,
        details: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Classify an I/O error raised while writing `path`
    pub fn from_io(error: io::Error, path: PathBuf) -> Self {
        Self::classify(error, path, |path, source| StorageError::WriteError { path, source })
    }

    /// Classify an I/O error raised while reading `path`
    pub fn from_read_io(error: io::Error, path: PathBuf) -> Self {
        Self::classify(error, path, |path, source| StorageError::ReadError { path, source })
    }

    fn classify(
        error: io::Error,
        path: PathBuf,
        otherwise: fn(PathBuf, io::Error) -> Self,
    ) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied => StorageError::PermissionDenied {
                path,
                source: error,
            },
            io::ErrorKind::NotFound => StorageError::NotFound { path },
            _ if is_out_of_space(&error) => StorageError::DiskFull {
                path,
                source: error,
            },
            _ => otherwise(path, error),
        }
    }

    /// What the user can do about it, when there is something to do
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::DiskFull { .. } => Some("Free up disk space and try again."),
            StorageError::PermissionDenied { .. } | StorageError::CreateDirectory { .. } => {
                Some("Check that the data directory exists and is writable by this user.")
            }
            StorageError::CorruptDatabase { .. } => {
                Some("Entries may still be recoverable from the backup file with the sqlite3 shell.")
            }
            StorageError::Database(_) => {
                Some("The catalog database may be locked by another process.")
            }
            _ => None,
        }
    }
}

fn is_out_of_space(error: &io::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    ["no space left", "disk full", "quota exceeded", "not enough space"]
        .iter()
        .any(|needle| msg.contains(needle))
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
