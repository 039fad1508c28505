//! Configuration types for varacc

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::VarAccError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub accessioning: AccessioningConfig,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of the frozen legacy store (defaults to $VARACC_HOME/legacy)
    #[serde(default)]
    pub legacy_path: Option<PathBuf>,
    /// Directory of the live store (defaults to $VARACC_HOME/live)
    #[serde(default)]
    pub live_path: Option<PathBuf>,
    #[serde(default = "default_write_buffer_size_mb")]
    pub write_buffer_size_mb: usize,
    #[serde(default = "default_block_cache_size_mb")]
    pub block_cache_size_mb: usize,
    #[serde(default = "default_bloom_filter_bits")]
    pub bloom_filter_bits: f64,
    #[serde(default = "default_compression")]
    pub compression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessioningConfig {
    /// Number of accessions durably reserved per counter round-trip
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    /// Optional exclusive ceiling for newly issued accessions
    #[serde(default)]
    pub max_accession: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusteringConfig {
    #[serde(default)]
    pub assembly_accession: Option<String>,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default)]
    pub assembly_accession: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_write_buffer_size_mb() -> usize { 64 }
fn default_block_cache_size_mb() -> usize { 256 }
fn default_bloom_filter_bits() -> f64 { 10.0 }
fn default_compression() -> String { "zstd".to_string() }
fn default_block_size() -> u64 { 1000 }
fn default_chunk_size() -> usize { 1000 }
fn default_page_size() -> usize { 1000 }
fn default_log_level() -> String { "info".to_string() }

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            legacy_path: None,
            live_path: None,
            write_buffer_size_mb: default_write_buffer_size_mb(),
            block_cache_size_mb: default_block_cache_size_mb(),
            bloom_filter_bits: default_bloom_filter_bits(),
            compression: default_compression(),
        }
    }
}

impl StorageConfig {
    pub fn legacy_path(&self) -> PathBuf {
        self.legacy_path
            .clone()
            .unwrap_or_else(|| crate::system::paths::legacy_store_dir())
    }

    pub fn live_path(&self) -> PathBuf {
        self.live_path
            .clone()
            .unwrap_or_else(|| crate::system::paths::live_store_dir())
    }
}

impl Default for AccessioningConfig {
    fn default() -> Self {
        Self {
            block_size: default_block_size(),
            max_accession: None,
        }
    }
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            assembly_accession: None,
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            assembly_accession: None,
            page_size: default_page_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Reject values no component can work with
    pub fn validate(&self) -> Result<(), VarAccError> {
        if self.accessioning.block_size == 0 {
            return Err(VarAccError::Configuration(
                "accessioning.block_size must be greater than 0".to_string(),
            ));
        }
        if self.clustering.chunk_size == 0 {
            return Err(VarAccError::Configuration(
                "clustering.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.release.page_size == 0 {
            return Err(VarAccError::Configuration(
                "release.page_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn default_config() -> Config {
    Config::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, VarAccError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| VarAccError::Configuration(format!("Failed to parse config: {}", e)))?;
    config.validate()?;
    tracing::debug!("Loaded configuration from {}", path.display());
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &Config) -> Result<(), VarAccError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| VarAccError::Configuration(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}
