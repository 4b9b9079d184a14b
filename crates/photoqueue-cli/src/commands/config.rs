//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use photoqueue_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "device_name": config.device_name,
                    "jpeg_quality": config.jpeg_quality
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:     {}", config.data_dir.display());
            println!(
                "  log_file:     {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!(
                "  device_name:  {}",
                config.device_name.as_deref().unwrap_or("(not set)")
            );
            println!("  jpeg_quality: {}", config.jpeg_quality);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    apply(&mut config, &key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "data_dir" => {
            config.data_dir = value.into();
        }
        "log_file" => {
            config.log_file = optional(value).map(PathBuf::from);
        }
        "device_name" => {
            config.device_name = optional(value).map(str::to_string);
        }
        "jpeg_quality" => {
            let quality: u8 = value
                .parse()
                .context("Invalid value for jpeg_quality. Use a number from 1 to 100.")?;
            if !(1..=100).contains(&quality) {
                bail!("jpeg_quality must be between 1 and 100");
            }
            config.jpeg_quality = quality;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, log_file, device_name, jpeg_quality",
                key
            );
        }
    }
    Ok(())
}

/// Empty or "none" clears an optional setting
fn optional(value: &str) -> Option<&str> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value)
    }
}
