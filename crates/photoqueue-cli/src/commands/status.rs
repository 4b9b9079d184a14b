//! Status command handler

use anyhow::Result;

use photoqueue_core::{Config, Exporter, Store, EXPORT_FORMAT_VERSION};

use crate::output::{Output, OutputFormat};

/// Show catalog status
pub fn show(store: &Store, config: &Config, exporter: &Exporter, output: &Output) -> Result<()> {
    let stats = store.stats();
    let exports = exporter.get_exported_files();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "database": config.database_path(),
                    "exports_dir": exporter.exports_dir(),
                    "export_version": EXPORT_FORMAT_VERSION,
                    "counts": {
                        "queues": stats.queues,
                        "items": stats.items,
                        "images": stats.images,
                        "exports": exports.len()
                    },
                    "latest_export": exports.first()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{} {} {}", stats.queues, stats.items, stats.images);
        }
        OutputFormat::Human => {
            println!("photoqueue Status");
            println!("=================");
            println!();
            println!("Storage:");
            println!("  Data dir: {}", config.data_dir.display());
            println!("  Database: {}", config.database_path().display());
            println!("  Exports:  {}", exporter.exports_dir().display());
            println!();
            println!("Catalog:");
            println!("  Queues: {}", stats.queues);
            println!("  Items:  {}", stats.items);
            println!("  Images: {}", stats.images);
            println!();
            println!("Exports (format {}):", EXPORT_FORMAT_VERSION);
            println!("  Files:  {}", exports.len());
            if let Some(latest) = exports.first() {
                println!("  Latest: {}", latest.display());
            }
        }
    }

    Ok(())
}
