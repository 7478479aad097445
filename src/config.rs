//! Configuration system for Switchboard
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (SWITCHBOARD_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// File name of the JSON relationship store inside `storage.data_dir`
pub const RELATIONSHIP_FILE: &str = "relationships.json";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Persona catalog source
    pub catalog: CatalogSettings,

    /// Relationship scoring parameters
    pub relationship: RelationshipSettings,

    /// Relationship persistence
    pub storage: StorageSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Persona catalog settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path to a persona catalog TOML (bundled executive catalog if unset)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// Relationship scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipSettings {
    /// Score lost per whole day of inactivity
    pub decay_per_day: u32,

    /// Upper bound on decay applied by a single message
    pub max_decay: u32,

    /// Sentiment deltas with an absolute value above this are audited
    pub audit_threshold: u32,

    /// Compare-and-swap attempts before giving up on persisting an update
    pub max_update_attempts: u32,
}

/// Storage backend for relationship records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local map, lost on exit
    Memory,
    /// JSON document under `data_dir`
    Json,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Json => write!(f, "json"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StorageBackend::Memory),
            "json" | "file" => Ok(StorageBackend::Json),
            _ => Err(format!("Unknown storage backend '{}'. Valid: memory, json", s)),
        }
    }
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Which store implementation to use
    pub backend: StorageBackend,

    /// Base data directory (used by the json backend)
    pub data_dir: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Rotation period for the log file: hourly, daily, never
    pub rotation: String,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for RelationshipSettings {
    fn default() -> Self {
        Self {
            decay_per_day: 2,
            max_decay: 10,
            audit_threshold: 2,
            max_update_attempts: 3,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Json,
            data_dir: "~/.switchboard".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: "daily".to_string(),
            max_files: 5,
            json_format: false,
        }
    }
}

impl SwitchboardConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // If explicit path provided, use it (error if not found)
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        let search_paths = [
            PathBuf::from("switchboard.toml"),
            dirs::config_dir()
                .map(|p| p.join("switchboard").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".switchboard").join("config.toml"))
                .unwrap_or_default(),
            PathBuf::from("/etc/switchboard/config.toml"),
        ];

        for path in &search_paths {
            if path.is_file() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Catalog settings
        if let Ok(val) = std::env::var("SWITCHBOARD_CATALOG_FILE") {
            self.catalog.file = Some(val);
        }

        // Relationship settings
        if let Ok(val) = std::env::var("SWITCHBOARD_DECAY_PER_DAY") {
            if let Ok(n) = val.parse() {
                self.relationship.decay_per_day = n;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_MAX_DECAY") {
            if let Ok(n) = val.parse() {
                self.relationship.max_decay = n;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_AUDIT_THRESHOLD") {
            if let Ok(n) = val.parse() {
                self.relationship.audit_threshold = n;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_MAX_UPDATE_ATTEMPTS") {
            if let Ok(n) = val.parse() {
                self.relationship.max_update_attempts = n;
            }
        }

        // Storage settings
        if let Ok(val) = std::env::var("SWITCHBOARD_STORAGE_BACKEND") {
            if let Ok(backend) = val.parse() {
                self.storage.backend = backend;
            }
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_DATA_DIR") {
            self.storage.data_dir = val;
        }

        // Logging settings
        if let Ok(val) = std::env::var("SWITCHBOARD_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("SWITCHBOARD_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.storage.data_dir = expand_path(&self.storage.data_dir);

        if let Some(ref file) = self.catalog.file {
            self.catalog.file = Some(expand_path(file));
        }
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.relationship.max_update_attempts == 0 {
            return Err(Error::config_field_invalid(
                "relationship.max_update_attempts",
                "max_update_attempts must be at least 1",
            ));
        }

        if self.relationship.max_decay > 100 {
            return Err(Error::config_field_invalid(
                "relationship.max_decay",
                "max_decay must be between 0 and 100",
            ));
        }

        if self.storage.backend == StorageBackend::Json && self.storage.data_dir.trim().is_empty() {
            return Err(Error::config_field_invalid(
                "storage.data_dir",
                "data_dir cannot be empty when the json backend is selected",
            ));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        let valid_rotations = ["hourly", "daily", "never"];
        if !valid_rotations.contains(&self.logging.rotation.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.rotation",
                format!(
                    "Invalid rotation '{}'. Must be one of: {}",
                    self.logging.rotation,
                    valid_rotations.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Get the data directory as a PathBuf
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// Path of the JSON relationship document
    pub fn relationship_file(&self) -> PathBuf {
        self.data_dir().join(RELATIONSHIP_FILE)
    }
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".switchboard")
                .join("config.toml")
        });

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Switchboard Configuration

[catalog]
# Persona catalog TOML (comment out to use the bundled executive catalog)
# file = "~/.switchboard/personas.toml"

[relationship]
# Score lost per whole day without a message to the same persona
decay_per_day = 2

# Maximum decay applied by a single message
max_decay = 10

# Sentiment changes larger than this (in absolute value) are written to the audit log
audit_threshold = 2

# Compare-and-swap attempts before an update is given up (and only logged)
max_update_attempts = 3

[storage]
# Relationship store: "json" (file under data_dir) or "memory" (per process)
backend = "json"

# Base data directory
data_dir = "~/.switchboard"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.switchboard/logs/switchboard.log"

# Rotation period for the log file: hourly, daily, never
rotation = "daily"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
