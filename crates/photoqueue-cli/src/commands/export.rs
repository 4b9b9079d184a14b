//! Export command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use photoqueue_core::{EntityId, ExportError, Exporter, Store};

use crate::output::Output;

/// Export a single queue
pub fn queue(store: &Store, exporter: &Exporter, id: EntityId, output: &Output) -> Result<()> {
    let exported = match exporter.export_queue(store, id) {
        Err(ExportError::QueueNotFound(_)) => anyhow::bail!("Queue not found: {}", id),
        result => result.context("Failed to export queue")?,
    };

    output.print_export(&exported.path, &exported.document);
    Ok(())
}

/// Export every queue into one document
pub fn all(store: &Store, exporter: &Exporter, output: &Output) -> Result<()> {
    let exported = exporter
        .export_all_queues(store)
        .context("Failed to export catalog")?;

    output.print_export(&exported.path, &exported.document);
    Ok(())
}

/// List export files, most recent first
pub fn list(exporter: &Exporter, output: &Output) -> Result<()> {
    output.print_export_files(&exporter.get_exported_files());
    Ok(())
}

/// Delete an export file
pub fn delete(exporter: &Exporter, path: PathBuf, output: &Output) -> Result<()> {
    // Bare file names are resolved against the exports directory
    let path = if path.components().count() == 1 {
        exporter.exports_dir().join(path)
    } else {
        path
    };

    let deleted = exporter
        .delete_export_file(&path)
        .context("Failed to delete export")?;
    if !deleted {
        anyhow::bail!(
            "Export not found in {}: {}",
            exporter.exports_dir().display(),
            path.display()
        );
    }

    output.success(&format!("Deleted export: {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_export_queue_then_delete_by_name() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path().join("exports"), BTreeMap::new());
        let mut store = Store::in_memory();
        let q = store.create_queue("Widgets").unwrap();

        queue(&store, &exporter, q.id, &quiet()).unwrap();
        let files = exporter.get_exported_files();
        assert_eq!(files.len(), 1);

        let name = PathBuf::from(files[0].file_name().unwrap());
        delete(&exporter, name, &quiet()).unwrap();
        assert!(exporter.get_exported_files().is_empty());
    }

    #[test]
    fn test_export_missing_queue_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path().join("exports"), BTreeMap::new());
        let store = Store::in_memory();

        let err = queue(&store, &exporter, 3, &quiet()).unwrap_err();
        assert_eq!(err.to_string(), "Queue not found: 3");
        assert!(exporter.get_exported_files().is_empty());
    }

    #[test]
    fn test_export_all_on_empty_catalog() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path().join("exports"), BTreeMap::new());
        let store = Store::in_memory();

        all(&store, &exporter, &quiet()).unwrap();
        assert_eq!(exporter.get_exported_files().len(), 1);
    }

    #[test]
    fn test_delete_refuses_files_outside_exports_dir() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path().join("exports"), BTreeMap::new());
        let victim = temp_dir.path().join("notes.txt");
        std::fs::write(&victim, "keep").unwrap();

        assert!(delete(&exporter, victim.clone(), &quiet()).is_err());
        assert!(victim.exists());
    }

    #[test]
    fn test_delete_missing_export_errors() {
        let temp_dir = TempDir::new().unwrap();
        let exporter = Exporter::new(temp_dir.path(), BTreeMap::new());

        let err = delete(&exporter, temp_dir.path().join("gone.json"), &quiet()).unwrap_err();
        assert!(err.to_string().contains("Export not found"));
    }
}
