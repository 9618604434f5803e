//! Configuration for xdagkv
//!
//! Centralized configuration with sensible defaults.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::XdagError;

/// Main configuration for block loading and store benchmarks
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Block Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the block storage namespaces
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── storage/            (mainnet shards)
    ///     └── storage-testnet/    (testnet shards)
    pub data_dir: PathBuf,

    /// Which namespace under `data_dir` shards are read from
    pub network: NetworkMode,

    // -------------------------------------------------------------------------
    // Key-Value Store Configuration
    // -------------------------------------------------------------------------
    /// Backend the benchmark writes blocks into
    pub store_kind: StoreKind,

    /// Location of the backend's files (ignored by the memory store)
    pub store_path: PathBuf,

    /// fsync after every mutation
    pub fsync: bool,

    // -------------------------------------------------------------------------
    // Workload Configuration
    // -------------------------------------------------------------------------
    /// Number of worker threads per benchmark phase
    pub concurrency: usize,
}

/// Selects the storage namespace a node writes its shards to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    /// Production network, shards under `storage/`
    Mainnet,

    /// Test network, shards under `storage-testnet/`
    #[default]
    Testnet,
}

impl NetworkMode {
    /// Name of the root folder for this network's shards
    pub fn storage_folder(self) -> &'static str {
        match self {
            NetworkMode::Mainnet => "storage",
            NetworkMode::Testnet => "storage-testnet",
        }
    }
}

/// Key-value backends available to the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    /// Ordered in-memory map, nothing persisted
    #[default]
    Memory,

    /// Append-only log file with an in-memory index
    Log,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Memory => "memory",
            StoreKind::Log => "log",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = XdagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "memory" => Ok(StoreKind::Memory),
            "log" => Ok(StoreKind::Log),
            other => Err(XdagError::Config(format!("unknown store type: {}", other))),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            network: NetworkMode::default(),
            store_kind: StoreKind::default(),
            store_path: PathBuf::from("./xdagkv.db"),
            fsync: true,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Root folder of the configured network's shards
    pub fn storage_root(&self) -> PathBuf {
        self.data_dir.join(self.network.storage_folder())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the directory containing the storage namespaces
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the network mode
    pub fn network(mut self, network: NetworkMode) -> Self {
        self.config.network = network;
        self
    }

    /// Set the key-value backend
    pub fn store_kind(mut self, kind: StoreKind) -> Self {
        self.config.store_kind = kind;
        self
    }

    /// Set the key-value backend's path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Enable or disable fsync on every mutation
    pub fn fsync(mut self, fsync: bool) -> Self {
        self.config.fsync = fsync;
        self
    }

    /// Set the number of benchmark worker threads
    pub fn concurrency(mut self, threads: usize) -> Self {
        self.config.concurrency = threads;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Parse a timestamp given as `0x`-prefixed hex or as decimal
pub fn parse_timestamp(s: &str) -> Result<u64, XdagError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| XdagError::Config(format!("invalid timestamp {:?}: {}", s, e)))
}
