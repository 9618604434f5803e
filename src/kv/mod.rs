//! Key-Value Store Module
//!
//! Backends the benchmark replays loaded blocks against.
//!
//! ## Backends
//! - `MemoryStore`: BTreeMap behind a RwLock, nothing persisted
//! - `LogStore`: append-only log with CRC-checked entries, replayed on open
//!
//! Both keep keys ordered so prefix scans are range reads.

mod log;
mod memory;

use std::path::Path;

use crate::config::{Config, StoreKind};
use crate::error::Result;

pub use self::log::{LogStore, LOG_FILENAME};
pub use self::memory::MemoryStore;

/// A key-value pair as returned by scans
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Operations every backend provides
///
/// Implementations are shared across benchmark threads.
pub trait KvStore: Send + Sync {
    /// Short backend name for reports
    fn name(&self) -> &'static str;

    /// Insert or overwrite a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Insert or overwrite several keys in one batch
    fn pset(&self, pairs: &[(&[u8], &[u8])]) -> Result<()>;

    /// Look up a key
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Look up several keys, results in input order
    fn pget(&self, keys: &[&[u8]]) -> Result<Vec<Option<Vec<u8>>>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Remove a key, returning whether it was present
    fn del(&self, key: &[u8]) -> Result<bool>;

    /// Pairs whose key starts with `prefix`, in key order
    fn scan_prefix(&self, prefix: &[u8], limit: Option<usize>) -> Result<Vec<KvPair>>;

    /// Keys starting with `prefix`, in key order
    fn keys(&self, prefix: &[u8], limit: Option<usize>) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .scan_prefix(prefix, limit)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Make every acknowledged write durable
    fn flush(&self) -> Result<()>;

    /// Number of live keys
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Open a backend by kind
pub fn open_store(kind: StoreKind, path: &Path, fsync: bool) -> Result<Box<dyn KvStore>> {
    let store: Box<dyn KvStore> = match kind {
        StoreKind::Memory => Box::new(MemoryStore::new()),
        StoreKind::Log => Box::new(LogStore::open(path, fsync)?),
    };
    tracing::debug!("Opened {} store", store.name());
    Ok(store)
}

/// Open the backend described by `config`
pub fn open_from_config(config: &Config) -> Result<Box<dyn KvStore>> {
    open_store(config.store_kind, &config.store_path, config.fsync)
}
