//! Test environment management
//!
//! Temporary legacy and live store directories with automatic cleanup using RAII.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use varacc_core::Config;

/// Isolated directory tree holding both stores of one test
pub struct TestEnvironment {
    temp_dir: Option<TempDir>,
    root_path: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::with_prefix("varacc-test")
            .context("Failed to create temporary directory")?;
        let root_path = temp_dir.path().to_path_buf();

        std::fs::create_dir_all(root_path.join("legacy"))?;
        std::fs::create_dir_all(root_path.join("live"))?;

        Ok(Self {
            temp_dir: Some(temp_dir),
            root_path,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    pub fn legacy_dir(&self) -> PathBuf {
        self.root_path.join("legacy")
    }

    pub fn live_dir(&self) -> PathBuf {
        self.root_path.join("live")
    }

    /// Default configuration pointed at this environment's stores
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.storage.legacy_path = Some(self.legacy_dir());
        config.storage.live_path = Some(self.live_dir());
        config.storage.write_buffer_size_mb = 4;
        config.storage.block_cache_size_mb = 8;
        config.accessioning.block_size = 10;
        config
    }

    /// Write a file relative to the environment root
    pub fn write_file(&self, path: impl AsRef<Path>, content: &[u8]) -> Result<PathBuf> {
        let full_path = self.root_path.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&full_path, content)?;
        Ok(full_path)
    }

    /// Keep the directory after the test (for debugging)
    pub fn preserve(&mut self) {
        if let Some(temp_dir) = self.temp_dir.take() {
            let path = temp_dir.keep();
            println!("Test environment preserved at: {}", path.display());
        }
    }
}
