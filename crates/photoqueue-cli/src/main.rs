//! photoqueue CLI
//!
//! Command-line interface for photoqueue - queues of items, each with photos,
//! exported as JSON snapshots.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use photoqueue_core::{
    CaptureError, CatalogError, Config, EntityId, ExportError, Exporter, StorageError, Store,
};

mod commands;
mod output;
mod prompt;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "pq")]
#[command(about = "photoqueue - Local photo catalog for item queues")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage queues
    Queue {
        #[command(subcommand)]
        command: QueueCommands,
    },
    /// Manage items within a queue
    Item {
        #[command(subcommand)]
        command: ItemCommands,
    },
    /// Manage images attached to an item
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },
    /// Export queues as JSON documents
    Export {
        #[command(subcommand)]
        command: ExportCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show catalog status
    Status,
}

#[derive(Subcommand)]
enum QueueCommands {
    /// Create a new queue
    #[command(alias = "add")]
    Create {
        /// Queue name
        name: String,
    },
    /// List all queues
    #[command(alias = "ls")]
    List,
    /// Show a queue with its items and images
    Show {
        /// Queue ID
        id: EntityId,
    },
    /// Rename a queue
    Rename {
        /// Queue ID
        id: EntityId,
        /// New name
        name: String,
    },
    /// Delete a queue along with its items and images
    #[command(alias = "rm")]
    Delete {
        /// Queue ID
        id: EntityId,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ItemCommands {
    /// Add an item to a queue
    #[command(alias = "add")]
    Create {
        /// Queue ID
        queue_id: EntityId,
        /// Item name
        name: String,
        /// Item description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// List items in a queue
    #[command(alias = "ls")]
    List {
        /// Queue ID
        queue_id: EntityId,
    },
    /// Show item details (including images)
    Show {
        /// Item ID
        id: EntityId,
    },
    /// Edit an item (prompts when no flags are given)
    Edit {
        /// Item ID
        id: EntityId,
        /// New name
        #[arg(short, long)]
        name: Option<String>,
        /// New description (empty string clears it)
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Delete an item along with its images
    #[command(alias = "rm")]
    Delete {
        /// Item ID
        id: EntityId,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum ImageCommands {
    /// Attach a photo to an item
    Add {
        /// Item ID
        item_id: EntityId,
        /// Path to the photo
        path: PathBuf,
        /// Display order (defaults to after the last image)
        #[arg(short, long)]
        order: Option<i32>,
        /// Clockwise rotation in degrees (0, 90, 180, 270); implies --import
        #[arg(short, long, default_value_t = 0)]
        rotate: i32,
        /// Copy the photo into the catalog's photos directory
        #[arg(short, long)]
        import: bool,
    },
    /// List images of an item
    #[command(alias = "ls")]
    List {
        /// Item ID
        item_id: EntityId,
    },
    /// Detach an image from its item
    #[command(alias = "rm")]
    Delete {
        /// Image ID
        id: EntityId,
    },
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export a single queue
    Queue {
        /// Queue ID
        id: EntityId,
    },
    /// Export every queue into one document
    All,
    /// List export files, most recent first
    #[command(alias = "ls")]
    List,
    /// Delete an export file
    #[command(alias = "rm")]
    Delete {
        /// Path to the export file
        path: PathBuf,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, log_file, device_name, jpeg_quality)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    let result = run(cli, &output);
    if let Some(hint) = result.as_ref().err().and_then(recovery_hint) {
        output.warning(hint);
    }
    result
}

fn run(cli: Cli, output: &Output) -> Result<()> {
    let config_path = cli.config.as_ref();

    // Config commands work without opening the catalog
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, output)
            }
        };
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let mut store = Store::open(&config).context("Failed to open catalog")?;
    let exporter = Exporter::from_config(&config, device_info(&config));

    match cli.command {
        Commands::Queue { command } => handle_queue_command(command, &mut store, output),
        Commands::Item { command } => handle_item_command(command, &mut store, output),
        Commands::Image { command } => {
            handle_image_command(command, &mut store, &config, output)
        }
        Commands::Export { command } => handle_export_command(command, &store, &exporter, output),
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&store, &config, &exporter, output),
    }
}

fn handle_queue_command(command: QueueCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        QueueCommands::Create { name } => commands::queue::create(store, name, output),
        QueueCommands::List => commands::queue::list(store, output),
        QueueCommands::Show { id } => commands::queue::show(store, id, output),
        QueueCommands::Rename { id, name } => commands::queue::rename(store, id, name, output),
        QueueCommands::Delete { id, yes } => commands::queue::delete(store, id, yes, output),
    }
}

fn handle_item_command(command: ItemCommands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        ItemCommands::Create {
            queue_id,
            name,
            description,
        } => commands::item::create(store, queue_id, name, description, output),
        ItemCommands::List { queue_id } => commands::item::list(store, queue_id, output),
        ItemCommands::Show { id } => commands::item::show(store, id, output),
        ItemCommands::Edit {
            id,
            name,
            description,
        } => commands::item::edit(store, id, name, description, output),
        ItemCommands::Delete { id, yes } => commands::item::delete(store, id, yes, output),
    }
}

fn handle_image_command(
    command: ImageCommands,
    store: &mut Store,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        ImageCommands::Add {
            item_id,
            path,
            order,
            rotate,
            import,
        } => {
            let options = commands::image::AddOptions {
                order,
                rotate,
                import,
            };
            commands::image::add(store, config, item_id, path, options, output)
        }
        ImageCommands::List { item_id } => commands::image::list(store, item_id, output),
        ImageCommands::Delete { id } => commands::image::delete(store, id, output),
    }
}

fn handle_export_command(
    command: ExportCommands,
    store: &Store,
    exporter: &Exporter,
    output: &Output,
) -> Result<()> {
    match command {
        ExportCommands::Queue { id } => commands::export::queue(store, exporter, id, output),
        ExportCommands::All => commands::export::all(store, exporter, output),
        ExportCommands::List => commands::export::list(exporter, output),
        ExportCommands::Delete { path } => commands::export::delete(exporter, path, output),
    }
}

/// First storage-level recovery hint found in the error chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        let storage = if let Some(e) = cause.downcast_ref::<StorageError>() {
            e
        } else if let Some(e) = cause.downcast_ref::<CatalogError>() {
            match e {
                CatalogError::Persistence(source) | CatalogError::Open { source, .. } => source,
                CatalogError::Validation { .. } => return None,
            }
        } else if let Some(ExportError::Io(e)) = cause.downcast_ref::<ExportError>() {
            e
        } else if let Some(CaptureError::Io(e)) = cause.downcast_ref::<CaptureError>() {
            e
        } else {
            return None;
        };
        storage.recovery_suggestion()
    })
}

/// Device metadata embedded in export documents
fn device_info(config: &Config) -> BTreeMap<String, String> {
    let device_name = config
        .device_name
        .clone()
        .or_else(|| std::env::var("HOSTNAME").ok())
        .unwrap_or_else(|| "unknown".to_string());

    BTreeMap::from([
        ("deviceName".to_string(), device_name),
        ("platform".to_string(), std::env::consts::OS.to_string()),
        ("arch".to_string(), std::env::consts::ARCH.to_string()),
        (
            "appVersion".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        ),
    ])
}

/// Initialize logging when PHOTOQUEUE_LOG is set.
///
/// Logs to config.log_file when set, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("PHOTOQUEUE_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "photoqueue_core={},photoqueue_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
