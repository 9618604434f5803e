//! Shard locator
//!
//! Maps a timestamp to the shard file that holds it.
//!
//! ```text
//! timestamp (u64):  [ 63..48 ][ 47..40 ][ 39..32 ][ 31..24 ][ 23..16 ][ 15..0 ]
//!                     unused      L1        L2        L3       file     unused
//!
//! {data_dir}/{storage|storage-testnet}/{L1}/{L2}/{L3}/{file}.dat
//! ```

use std::path::{Path, PathBuf};

use crate::config::{Config, NetworkMode};

/// Extension of shard files
pub const SHARD_FILE_EXT: &str = "dat";

/// Bit offsets of the four path components, most significant first
const COMPONENT_SHIFTS: [u32; 4] = [40, 32, 24, 16];

/// Directory depth below the storage root
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ShardLevel {
    /// `{root}/{L1}`
    One = 1,
    /// `{root}/{L1}/{L2}`
    Two = 2,
    /// `{root}/{L1}/{L2}/{L3}`
    Three = 3,
}

impl ShardLevel {
    /// Narrowest first, the order the loader probes in
    pub const PROBE_ORDER: [ShardLevel; 3] = [ShardLevel::Three, ShardLevel::Two, ShardLevel::One];

    /// Low-bit mask to skip when this is the deepest directory that exists
    pub fn skip_mask(self) -> u64 {
        match self {
            ShardLevel::Three => FILE_SKIP_MASK,
            ShardLevel::Two => (1 << 24) - 1,
            ShardLevel::One => (1 << 32) - 1,
        }
    }
}

/// Skip past the rest of one file-sized bucket
pub(crate) const FILE_SKIP_MASK: u64 = (1 << 16) - 1;

/// Skip past a whole missing top-level directory
pub(crate) const ROOT_SKIP_MASK: u64 = (1 << 40) - 1;

/// The four bytes of `timestamp` that select its shard, most significant first
pub fn shard_components(timestamp: u64) -> [u8; 4] {
    COMPONENT_SHIFTS.map(|shift| (timestamp >> shift) as u8)
}

/// Resolves shard paths for one network namespace
#[derive(Debug, Clone)]
pub struct StoreLocator {
    root: PathBuf,
    network: NetworkMode,
}

impl StoreLocator {
    /// Locate shards under `{data_dir}/{network folder}`
    pub fn new(data_dir: impl AsRef<Path>, network: NetworkMode) -> Self {
        Self {
            root: data_dir.as_ref().join(network.storage_folder()),
            network,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.data_dir, config.network)
    }

    /// Path of the shard file holding `timestamp`
    pub fn locate(&self, timestamp: u64) -> PathBuf {
        let [l1, l2, l3, file] = shard_components(timestamp);
        self.root
            .join(hex2(l1))
            .join(hex2(l2))
            .join(hex2(l3))
            .join(format!("{}.{}", hex2(file), SHARD_FILE_EXT))
    }

    /// Directory at `level` on the way to `timestamp`'s shard
    pub fn ancestor(&self, timestamp: u64, level: ShardLevel) -> PathBuf {
        shard_components(timestamp)
            .iter()
            .take(level as usize)
            .fold(self.root.clone(), |path, byte| path.join(hex2(*byte)))
    }

    /// Namespace root, e.g. `{data_dir}/storage-testnet`
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn network(&self) -> NetworkMode {
        self.network
    }
}

fn hex2(byte: u8) -> String {
    format!("{:02x}", byte)
}
