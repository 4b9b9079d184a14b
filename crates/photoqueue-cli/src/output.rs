//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use std::path::PathBuf;

use serde::Serialize;

use photoqueue_core::{ExportDocument, Image, Item, Queue};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// A queue with its aggregate counts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueSummary {
    #[serde(flatten)]
    pub queue: Queue,
    pub item_count: usize,
    pub image_count: usize,
}

/// An item with its images, in display order
#[derive(Debug, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub images: Vec<Image>,
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print a single queue
    pub fn print_queue(&self, queue: &Queue) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", queue.id);
                println!("Name:     {}", queue.name);
                println!("Created:  {}", queue.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", queue.updated_at.format("%Y-%m-%d %H:%M"));
                match queue.last_synced_at {
                    Some(at) if queue.is_synced => {
                        println!("Synced:   {}", at.format("%Y-%m-%d %H:%M"))
                    }
                    _ => println!("Synced:   no"),
                }
            }
            OutputFormat::Json => print_json(queue),
            OutputFormat::Quiet => println!("{}", queue.id),
        }
    }

    /// Print queues with their item and image counts
    pub fn print_queues(&self, queues: &[QueueSummary]) {
        match self.format {
            OutputFormat::Human => {
                if queues.is_empty() {
                    println!("No queues found.");
                    return;
                }
                for summary in queues {
                    println!(
                        "{:>4} | {} | {} item(s), {} image(s)",
                        summary.queue.id,
                        truncate(&summary.queue.name, 40),
                        summary.item_count,
                        summary.image_count
                    );
                }
                println!("\n{} queue(s)", queues.len());
            }
            OutputFormat::Json => print_json(&queues),
            OutputFormat::Quiet => {
                for summary in queues {
                    println!("{}", summary.queue.id);
                }
            }
        }
    }

    /// Print a queue with all its items and images
    pub fn print_queue_tree(&self, queue: &Queue, items: &[ItemDetail]) {
        match self.format {
            OutputFormat::Human => {
                self.print_queue(queue);
                println!();
                if items.is_empty() {
                    println!("No items in this queue.");
                    return;
                }
                println!("── Items ({}) ──", items.len());
                for detail in items {
                    println!("{:>4} | {}", detail.item.id, detail.item.name);
                    for image in &detail.images {
                        println!(
                            "       [{}] #{} {}",
                            image.order_index, image.id, image.image_path
                        );
                    }
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "queue": queue,
                "items": items,
            })),
            OutputFormat::Quiet => println!("{}", queue.id),
        }
    }

    /// Print a single item with its images
    pub fn print_item(&self, detail: &ItemDetail) {
        match self.format {
            OutputFormat::Human => {
                let item = &detail.item;
                println!("ID:          {}", item.id);
                println!("Queue:       {}", item.queue_id);
                println!("Name:        {}", item.name);
                if let Some(ref desc) = item.description {
                    println!("Description: {}", desc);
                }
                println!("Created:     {}", item.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:     {}", item.updated_at.format("%Y-%m-%d %H:%M"));

                if !detail.images.is_empty() {
                    println!();
                    println!("── Images ({}) ──", detail.images.len());
                    for image in &detail.images {
                        println!("[{}] #{} {}", image.order_index, image.id, image.image_path);
                    }
                }
            }
            OutputFormat::Json => print_json(detail),
            OutputFormat::Quiet => println!("{}", detail.item.id),
        }
    }

    /// Print a list of items
    pub fn print_items(&self, items: &[Item]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("No items found.");
                    return;
                }
                for item in items {
                    println!(
                        "{:>4} | {} | {}",
                        item.id,
                        truncate(&item.name, 30),
                        truncate_line(item.description.as_deref().unwrap_or(""), 45)
                    );
                }
                println!("\n{} item(s)", items.len());
            }
            OutputFormat::Json => print_json(&items),
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id);
                }
            }
        }
    }

    /// Print images of an item
    pub fn print_images(&self, images: &[Image]) {
        match self.format {
            OutputFormat::Human => {
                if images.is_empty() {
                    println!("No images found.");
                    return;
                }
                for image in images {
                    println!(
                        "{:>4} | order {:>3} | {}",
                        image.id, image.order_index, image.image_path
                    );
                }
                println!("\n{} image(s)", images.len());
            }
            OutputFormat::Json => print_json(&images),
            OutputFormat::Quiet => {
                for image in images {
                    println!("{}", image.id);
                }
            }
        }
    }

    /// Print the result of an export
    pub fn print_export(&self, path: &std::path::Path, document: &ExportDocument) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Exported to {}", path.display());
                println!(
                    "  {} queue(s), {} item(s), {} image(s)",
                    document.queues.len(),
                    document.item_count(),
                    document.image_count()
                );
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "path": path,
                "queues": document.queues.len(),
                "items": document.item_count(),
                "images": document.image_count(),
            })),
            OutputFormat::Quiet => println!("{}", path.display()),
        }
    }

    /// Print export files, most recent first
    pub fn print_export_files(&self, files: &[PathBuf]) {
        match self.format {
            OutputFormat::Human => {
                if files.is_empty() {
                    println!("No exports found.");
                    return;
                }
                for file in files {
                    println!("{}", file.display());
                }
                println!("\n{} export(s)", files.len());
            }
            OutputFormat::Json => print_json(&files),
            OutputFormat::Quiet => {
                for file in files {
                    println!("{}", file.display());
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning (stderr, suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode JSON output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
