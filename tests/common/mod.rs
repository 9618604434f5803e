//! Shared fixtures for integration tests
//!
//! Builds synthetic 512-byte records and lays them out as shard files.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use xdagkv::block::RAW_BLOCK_SIZE;
use xdagkv::{NetworkMode, RawBlock, StoreLocator};

/// A record with `timestamp` at bytes 16..24 and `seed`-derived content
///
/// The transport header (bytes 0..8) is filled with `0xEE` so tests can tell
/// it apart from the body.
pub fn make_record(timestamp: u64, seed: u8) -> Vec<u8> {
    let mut record = vec![0u8; RAW_BLOCK_SIZE];
    record[..8].fill(0xEE);
    record[8..16].copy_from_slice(&0x0000_0000_0000_0001u64.to_le_bytes());
    record[16..24].copy_from_slice(&timestamp.to_le_bytes());
    for (i, byte) in record[24..].iter_mut().enumerate() {
        *byte = seed.wrapping_mul(31).wrapping_add(i as u8);
    }
    record
}

/// `count` records starting at `timestamp`, one time unit apart
pub fn make_records(timestamp: u64, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| make_record(timestamp + i as u64, i as u8))
        .collect()
}

/// Write `records` as the shard file holding `timestamp`
pub fn write_shard(data_dir: &Path, network: NetworkMode, timestamp: u64, records: &[Vec<u8>]) {
    let path = StoreLocator::new(data_dir, network).locate(timestamp);
    write_raw(&path, &records.concat());
}

/// Write arbitrary bytes at `path`, creating parent directories
pub fn write_raw(path: &Path, bytes: &[u8]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, bytes).unwrap();
}

/// Canonicalized blocks for a set of records
pub fn make_blocks(count: usize) -> Vec<RawBlock> {
    make_records(0x016e_f93e_0000, count)
        .iter()
        .map(|r| RawBlock::from_slice(r).unwrap())
        .collect()
}
