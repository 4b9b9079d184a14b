//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/photoqueue/config.toml)
//! 3. Environment variables (PHOTOQUEUE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "PHOTOQUEUE";

/// JPEG quality used when re-encoding imported photos
pub const DEFAULT_JPEG_QUALITY: u8 = 85;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage (catalog database, exports, photos)
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log file path (stderr when unset)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Device name reported in export documents
    #[serde(default)]
    pub device_name: Option<String>,

    /// JPEG quality for imported photos (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: None,
            device_name: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PHOTOQUEUE_DATA_DIR, PHOTOQUEUE_LOG_FILE, PHOTOQUEUE_DEVICE_NAME)
    /// 2. Config file (~/.config/photoqueue/config.toml or PHOTOQUEUE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring an explicit path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // Empty string clears it
        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }

        if let Ok(val) = std::env::var(format!("{}_DEVICE_NAME", ENV_PREFIX)) {
            self.device_name = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PHOTOQUEUE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("photoqueue")
            .join("config.toml")
    }

    /// Path to the SQLite database backing the key-value store
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("catalog.db")
    }

    /// Directory export documents are written to
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    /// Directory imported photos are copied into
    pub fn photos_dir(&self) -> PathBuf {
        self.data_dir.join("photos")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("photoqueue")
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "PHOTOQUEUE_DATA_DIR",
        "PHOTOQUEUE_LOG_FILE",
        "PHOTOQUEUE_DEVICE_NAME",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.log_file.is_none());
        assert!(config.device_name.is_none());
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert!(config.data_dir.ends_with("photoqueue"));
    }

    #[test]
    fn test_file_paths() {
        let config = Config::default();

        assert!(config.database_path().ends_with("catalog.db"));
        assert!(config.exports_dir().ends_with("exports"));
        assert!(config.photos_dir().ends_with("photos"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("PHOTOQUEUE_DATA_DIR", "/tmp/photoqueue-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/photoqueue-test"));
    }

    #[test]
    fn test_env_override_device_name() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();

        env::set_var("PHOTOQUEUE_DEVICE_NAME", "bench-camera");
        config.apply_env_overrides();
        assert_eq!(config.device_name.as_deref(), Some("bench-camera"));

        env::set_var("PHOTOQUEUE_DEVICE_NAME", "");
        config.apply_env_overrides();
        assert!(config.device_name.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            data_dir: PathBuf::from("/data/photoqueue"),
            log_file: Some(PathBuf::from("/var/log/pq.log")),
            device_name: Some("pixel".to_string()),
            jpeg_quality: 70,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("data_dir"));
        assert!(toml_str.contains("jpeg_quality"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.data_dir, config.data_dir);
        assert_eq!(parsed.log_file, config.log_file);
        assert_eq!(parsed.device_name, config.device_name);
        assert_eq!(parsed.jpeg_quality, 70);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            data_dir = "/custom/data"
            device_name = "workbench"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.device_name.as_deref(), Some("workbench"));
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
    }

    #[test]
    fn test_load_from_path_missing_file_creates_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("data");

        env::set_var("PHOTOQUEUE_DATA_DIR", &data_dir);
        let config = Config::load_from_path(&temp_dir.path().join("missing.toml")).unwrap();

        assert_eq!(config.data_dir, data_dir);
        assert!(data_dir.exists());
    }

    #[test]
    fn test_save_to_path_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            device_name: Some("tablet".to_string()),
            ..Config::default()
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded.data_dir, config.data_dir);
        assert_eq!(loaded.device_name.as_deref(), Some("tablet"));
    }
}
