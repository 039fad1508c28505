/// RocksDB storage backend shared by the accession and history repositories
///
/// One database holds one store (legacy or live). Each entity kind gets its own set of
/// column families so clustered and submitted accessions never share a key space.
use anyhow::{anyhow, Context, Result};
use parking_lot::{Mutex, MutexGuard};
use rocksdb::{
    BlockBasedOptions, BoundColumnFamily, Cache, ColumnFamilyDescriptor, DBWithThreadMode,
    IteratorMode, MultiThreaded, Options, WriteBatch, WriteOptions, DB,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use varacc_core::config::StorageConfig;
use varacc_core::EntityKind;

/// Column family names for different data types
pub mod cf_names {
    use varacc_core::EntityKind;

    pub const DEFAULT: &str = "default";
    pub const COUNTERS: &str = "counters";

    pub const CLUSTERED_DOCUMENTS: &str = "clustered_documents";
    pub const CLUSTERED_ACCESSIONS: &str = "clustered_accessions";
    pub const CLUSTERED_HISTORY: &str = "clustered_history";
    pub const CLUSTERED_RETIRED: &str = "clustered_retired";

    pub const SUBMITTED_DOCUMENTS: &str = "submitted_documents";
    pub const SUBMITTED_ACCESSIONS: &str = "submitted_accessions";
    pub const SUBMITTED_HISTORY: &str = "submitted_history";
    pub const SUBMITTED_RETIRED: &str = "submitted_retired";

    pub const ALL: [&str; 10] = [
        DEFAULT,
        COUNTERS,
        CLUSTERED_DOCUMENTS,
        CLUSTERED_ACCESSIONS,
        CLUSTERED_HISTORY,
        CLUSTERED_RETIRED,
        SUBMITTED_DOCUMENTS,
        SUBMITTED_ACCESSIONS,
        SUBMITTED_HISTORY,
        SUBMITTED_RETIRED,
    ];

    /// Documents keyed by content hash
    pub fn documents(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::ClusteredVariant => CLUSTERED_DOCUMENTS,
            EntityKind::SubmittedVariant => SUBMITTED_DOCUMENTS,
        }
    }

    /// `(accession, version)` to content hash
    pub fn accessions(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::ClusteredVariant => CLUSTERED_ACCESSIONS,
            EntityKind::SubmittedVariant => SUBMITTED_ACCESSIONS,
        }
    }

    /// Deprecated or merged documents keyed by `(accession, version)`
    pub fn retired(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::ClusteredVariant => CLUSTERED_RETIRED,
            EntityKind::SubmittedVariant => SUBMITTED_RETIRED,
        }
    }

    /// History operations keyed by origin accession
    pub fn history(kind: EntityKind) -> &'static str {
        match kind {
            EntityKind::ClusteredVariant => CLUSTERED_HISTORY,
            EntityKind::SubmittedVariant => SUBMITTED_HISTORY,
        }
    }
}

/// RocksDB configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Base path for RocksDB data
    pub path: PathBuf,

    /// Write buffer size in MB (default: 64)
    pub write_buffer_size_mb: usize,

    /// Maximum number of write buffers (default: 4)
    pub max_write_buffer_number: usize,

    /// Maximum background jobs (default: 4)
    pub max_background_jobs: i32,

    /// Block cache size in MB (default: 256)
    pub block_cache_size_mb: usize,

    /// Bloom filter bits per key (default: 10)
    pub bloom_filter_bits: f64,

    /// Compression algorithm (default: "zstd")
    pub compression: String,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("~/.varacc/live"),
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
            block_cache_size_mb: 256,
            bloom_filter_bits: 10.0,
            compression: "zstd".to_string(),
        }
    }
}

impl RocksDBConfig {
    /// Tuning from the `[storage]` section, opened at `path`
    pub fn from_storage_config(storage: &StorageConfig, path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_buffer_size_mb: storage.write_buffer_size_mb,
            block_cache_size_mb: storage.block_cache_size_mb,
            bloom_filter_bits: storage.bloom_filter_bits,
            compression: storage.compression.clone(),
            ..Default::default()
        }
    }
}

/// RocksDB storage backend
pub struct RocksDBBackend {
    /// RocksDB instance with multi-threaded column family support
    pub db: Arc<DBWithThreadMode<MultiThreaded>>,

    config: RocksDBConfig,

    /// Write options for batch operations
    write_opts: WriteOptions,

    /// Serializes check-then-write sequences (hash uniqueness, counter blocks)
    write_lock: Mutex<()>,
}

impl RocksDBBackend {
    pub fn new(path: &Path) -> Result<Self> {
        let config = RocksDBConfig {
            path: path.to_path_buf(),
            ..Default::default()
        };
        Self::with_config(config)
    }

    pub fn with_config(config: RocksDBConfig) -> Result<Self> {
        let path = Self::expand_path(&config.path)?;
        std::fs::create_dir_all(&path)?;

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = cf_names::ALL
            .iter()
            .map(|name| {
                let cf_opts = Self::create_cf_options(&config, name);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db_opts = Self::create_db_options(&config)?;

        let db = DB::open_cf_descriptors(&db_opts, &path, cf_descriptors).map_err(|e| {
            anyhow!(
                "Failed to open RocksDB at path: {}. Error: {}",
                path.display(),
                e
            )
        })?;
        info!("Opened accession store at {}", path.display());

        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(false);
        write_opts.disable_wal(false);

        Ok(Self {
            db: Arc::new(db),
            config,
            write_opts,
            write_lock: Mutex::new(()),
        })
    }

    /// Open the store at `path` tuned by the `[storage]` section
    pub fn open(storage: &StorageConfig, path: &Path) -> Result<Self> {
        Self::with_config(RocksDBConfig::from_storage_config(storage, path))
    }

    fn create_db_options(config: &RocksDBConfig) -> Result<Options> {
        let mut opts = Options::default();

        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(1000);

        opts.set_max_background_jobs(config.max_background_jobs);
        opts.set_bytes_per_sync(1024 * 1024);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_level_compaction_dynamic_level_bytes(true);

        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number as i32);
        opts.set_compression_type(Self::compression_type(&config.compression));

        Ok(opts)
    }

    fn create_cf_options(config: &RocksDBConfig, cf_name: &str) -> Options {
        let mut opts = Options::default();
        opts.set_write_buffer_size(config.write_buffer_size_mb * 1024 * 1024);
        opts.set_max_write_buffer_number(config.max_write_buffer_number as i32);
        opts.set_compression_type(Self::compression_type(&config.compression));

        let mut block_opts = BlockBasedOptions::default();
        let cache = Cache::new_lru_cache(config.block_cache_size_mb * 1024 * 1024);
        block_opts.set_block_cache(&cache);
        if config.bloom_filter_bits > 0.0 {
            block_opts.set_bloom_filter(config.bloom_filter_bits, false);
        }
        opts.set_block_based_table_factory(&block_opts);

        // Hash lookups dominate on document families; history is scanned
        if cf_name.ends_with("_documents") {
            opts.optimize_for_point_lookup(config.block_cache_size_mb as u64);
        }

        opts
    }

    fn compression_type(name: &str) -> rocksdb::DBCompressionType {
        match name {
            "zstd" => rocksdb::DBCompressionType::Zstd,
            "lz4" => rocksdb::DBCompressionType::Lz4,
            "snappy" => rocksdb::DBCompressionType::Snappy,
            "none" => rocksdb::DBCompressionType::None,
            _ => rocksdb::DBCompressionType::Zstd,
        }
    }

    /// Expand tilde in path
    fn expand_path(path: &Path) -> Result<PathBuf> {
        let path_str = path.to_str().ok_or_else(|| anyhow!("Invalid path"))?;

        if path_str.starts_with('~') {
            let home = dirs::home_dir().context("Could not determine home directory")?;
            let expanded = path_str.replacen('~', &home.to_string_lossy(), 1);
            Ok(PathBuf::from(expanded))
        } else {
            Ok(path.to_path_buf())
        }
    }

    /// Get a column family handle
    pub(crate) fn cf_handle(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| anyhow!("Column family '{}' not found", name))
    }

    /// Hold while reading state that a following write depends on
    pub(crate) fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).context("Failed to serialize value")
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
        rmp_serde::from_slice(data).context("Failed to deserialize value")
    }

    pub(crate) fn get(&self, cf_name: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.get_cf(&cf, key)?)
    }

    pub(crate) fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write_opt(batch, &self.write_opts)?;
        Ok(())
    }

    /// Write and fsync; used where losing the write could hand out a value twice
    pub(crate) fn write_synced(&self, batch: WriteBatch) -> Result<()> {
        let mut opts = WriteOptions::default();
        opts.set_sync(true);
        self.db.write_opt(batch, &opts)?;
        Ok(())
    }

    /// All `(key, value)` pairs whose key starts with `prefix`, in key order
    pub(crate) fn scan_prefix(&self, cf_name: &str, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf_handle(cf_name)?;
        let mut results = Vec::new();

        let iter = self.db.prefix_iterator_cf(&cf, prefix);
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break; // Reached end of prefix range
            }
            results.push((key.to_vec(), value.to_vec()));
        }

        Ok(results)
    }

    /// Every value of a column family, in key order
    pub(crate) fn scan_values(&self, cf_name: &str) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf_handle(cf_name)?;
        let mut values = Vec::new();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(value.to_vec());
        }

        Ok(values)
    }

    pub(crate) fn count_keys(&self, cf_name: &str) -> Result<usize> {
        let cf = self.cf_handle(cf_name)?;
        let mut count = 0;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    /// Number of stored documents of `kind`
    pub fn document_count(&self, kind: EntityKind) -> Result<usize> {
        self.count_keys(cf_names::documents(kind))
    }

    /// Number of recorded history operations of `kind`
    pub fn history_count(&self, kind: EntityKind) -> Result<usize> {
        self.count_keys(cf_names::history(kind))
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<()> {
        for cf_name in cf_names::ALL.iter().skip(1) {
            let cf = self.cf_handle(cf_name)?;
            self.db.flush_cf(&cf)?;
        }
        debug!("Flushed {}", self.config.path.display());
        Ok(())
    }

    pub fn db_path(&self) -> &Path {
        &self.config.path
    }
}
