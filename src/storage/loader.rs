//! Range loader
//!
//! Walks the shard tree from `start` to `end` and returns every block found,
//! oldest shard first.
//!
//! ## Skipping
//! Each iteration visits the bucket containing `cursor`. When the shard file
//! is missing, the deepest existing ancestor decides how far to jump:
//!
//! | deepest existing dir | mask        | jump covers            |
//! |----------------------|-------------|------------------------|
//! | shard file / L3      | `2^16 - 1`  | one file               |
//! | L2                   | `2^24 - 1`  | one L3 directory       |
//! | L1                   | `2^32 - 1`  | one L2 directory       |
//! | none                 | `2^40 - 1`  | one L1 directory       |
//!
//! and the cursor advances to `(cursor | mask) + 1`. A range with no shards at
//! all costs at most 256 iterations per 2^48 of timestamp space.

use std::fs;
use std::path::Path;
use std::time::Instant;

use crate::block::RawBlock;
use crate::config::Config;
use crate::error::Result;

use super::locator::{ShardLevel, StoreLocator, FILE_SKIP_MASK, ROOT_SKIP_MASK};
use super::shard::{is_absent, ShardReader};

/// Counters collected during one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Loop iterations (one per visited bucket)
    pub iterations: u64,

    /// Shard files opened and read
    pub shards_read: u64,

    /// Ancestor directory existence checks
    pub dir_probes: u64,

    /// Blocks returned
    pub blocks_loaded: u64,
}

/// Blocks and counters from one load
#[derive(Debug)]
pub struct LoadOutcome {
    pub blocks: Vec<RawBlock>,
    pub stats: LoadStats,
}

/// Loads blocks for a time range from shard storage
#[derive(Debug, Clone)]
pub struct BlockLoader {
    locator: StoreLocator,
}

impl BlockLoader {
    pub fn new(locator: StoreLocator) -> Self {
        Self { locator }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(StoreLocator::from_config(config))
    }

    pub fn locator(&self) -> &StoreLocator {
        &self.locator
    }

    /// All blocks with shards in `[start, end)`, in chronological order
    ///
    /// Fails on the first corrupt shard or I/O error; blocks read before the
    /// failure are dropped.
    pub fn load_blocks(&self, start: u64, end: u64) -> Result<Vec<RawBlock>> {
        self.load(start, end).map(|outcome| outcome.blocks)
    }

    /// Same as `load_blocks`, also reporting what the walk touched
    pub fn load(&self, start: u64, end: u64) -> Result<LoadOutcome> {
        let started = Instant::now();
        let mut blocks = Vec::new();
        let mut stats = LoadStats::default();
        let mut cursor = start;

        while cursor < end {
            stats.iterations += 1;

            let path = self.locator.locate(cursor);
            let mask = match ShardReader::open(&path)? {
                Some(shard) => {
                    tracing::debug!(
                        "Reading {} blocks from {}",
                        shard.record_count(),
                        shard.path().display()
                    );
                    let read = shard.read_blocks()?;
                    stats.shards_read += 1;
                    blocks.extend(read);
                    FILE_SKIP_MASK
                }
                None => self.skip_mask(cursor, &mut stats)?,
            };

            cursor = match (cursor | mask).checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        stats.blocks_loaded = blocks.len() as u64;
        tracing::info!(
            "Loaded {} blocks from {} shards in {} iterations ({:?})",
            stats.blocks_loaded,
            stats.shards_read,
            stats.iterations,
            started.elapsed()
        );

        Ok(LoadOutcome { blocks, stats })
    }

    /// Mask for a bucket whose shard file is missing
    fn skip_mask(&self, cursor: u64, stats: &mut LoadStats) -> Result<u64> {
        for level in ShardLevel::PROBE_ORDER {
            stats.dir_probes += 1;
            let dir = self.locator.ancestor(cursor, level);
            if dir_exists(&dir)? {
                tracing::trace!("{:#x}: deepest directory {}", cursor, dir.display());
                return Ok(level.skip_mask());
            }
        }

        tracing::trace!("{:#x}: no shard directories", cursor);
        Ok(ROOT_SKIP_MASK)
    }
}

/// Missing paths and stray non-directories count as absent; any other
/// failure is an error
fn dir_exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(metadata) => Ok(metadata.is_dir()),
        Err(e) if is_absent(&e) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
