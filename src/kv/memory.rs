//! In-memory store
//!
//! BTreeMap-based store with a RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::error::Result;

use super::{KvPair, KvStore};

/// Ordered in-memory map
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        self.data.write().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn pset(&self, pairs: &[(&[u8], &[u8])]) -> Result<()> {
        let mut data = self.data.write();
        for (key, value) in pairs {
            data.insert(key.to_vec(), value.to_vec());
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn pget(&self, keys: &[&[u8]]) -> Result<Vec<Option<Vec<u8>>>> {
        let data = self.data.read();
        Ok(keys.iter().map(|key| data.get(*key).cloned()).collect())
    }

    fn del(&self, key: &[u8]) -> Result<bool> {
        Ok(self.data.write().remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &[u8], limit: Option<usize>) -> Result<Vec<KvPair>> {
        let data = self.data.read();
        Ok(prefix_range(&*data, prefix)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.data.read().len()
    }
}

/// Entries of `map` whose key starts with `prefix`
pub(super) fn prefix_range<'a, V>(
    map: &'a BTreeMap<Vec<u8>, V>,
    prefix: &'a [u8],
) -> impl Iterator<Item = (&'a Vec<u8>, &'a V)> + 'a {
    map.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(key, _)| key.starts_with(prefix))
}
