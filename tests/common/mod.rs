//! Common test utilities and fixtures
//!
//! Every CLI test runs against its own config file and data directory so
//! that nothing under the real home directory is read or written.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

/// Isolated configuration plus data directory
pub struct TestEnv {
    pub dir: TempDir,
    pub config_path: PathBuf,
}

impl TestEnv {
    /// JSON-backed store under the temp directory
    pub fn new() -> Self {
        Self::with_storage("json")
    }

    pub fn with_storage(backend: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("switchboard.toml");
        let data_dir = dir.path().join("data");
        fs::write(
            &config_path,
            format!(
                "[storage]\nbackend = \"{}\"\ndata_dir = \"{}\"\n\n[logging]\nlevel = \"warn\"\n",
                backend,
                data_dir.display()
            ),
        )
        .unwrap();
        Self { dir, config_path }
    }

    /// Write an arbitrary config file, replacing the default one
    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    pub fn config(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    pub fn relationship_file(&self) -> PathBuf {
        self.data_dir().join("relationships.json")
    }

    /// Command for the binary pointed at this environment's config
    pub fn cmd(&self) -> Command {
        let mut cmd = switchboard_cmd();
        cmd.arg("--config").arg(self.config());
        cmd
    }
}

/// Command for the switchboard binary with inherited overrides cleared
pub fn switchboard_cmd() -> Command {
    let mut cmd = Command::cargo_bin("switchboard").unwrap();
    for var in [
        "SWITCHBOARD_CONFIG",
        "SWITCHBOARD_USER",
        "SWITCHBOARD_CATALOG_FILE",
        "SWITCHBOARD_DECAY_PER_DAY",
        "SWITCHBOARD_MAX_DECAY",
        "SWITCHBOARD_AUDIT_THRESHOLD",
        "SWITCHBOARD_MAX_UPDATE_ATTEMPTS",
        "SWITCHBOARD_STORAGE_BACKEND",
        "SWITCHBOARD_DATA_DIR",
        "SWITCHBOARD_LOG_LEVEL",
        "SWITCHBOARD_LOG_FILE",
        "SWITCHBOARD_LOG_JSON",
    ] {
        cmd.env_remove(var);
    }
    cmd
}
