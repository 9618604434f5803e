//! Tests for block canonicalization
//!
//! These tests verify:
//! - The content hash is the double SHA-256 of the header-zeroed record
//! - The transport header never affects the hash and is never modified
//! - Timestamp extraction from bytes 16..24
//! - Size validation

mod common;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use xdagkv::block::{content_hash, RAW_BLOCK_SIZE, TRANSPORT_HEADER_SIZE};
use xdagkv::{encode_address, RawBlock, XdagError};

use common::make_record;

// =============================================================================
// Helper Functions
// =============================================================================

fn expected_hash(record: &[u8]) -> [u8; 32] {
    let mut zeroed = record.to_vec();
    zeroed[..TRANSPORT_HEADER_SIZE].fill(0);
    let first = Sha256::digest(&zeroed);
    Sha256::digest(first).into()
}

// =============================================================================
// Hashing Tests
// =============================================================================

#[test]
fn test_hash_matches_double_sha256_of_zeroed_record() {
    let record = make_record(0x016e_f93e_1234, 7);

    let block = RawBlock::from_slice(&record).unwrap();

    assert_eq!(block.hash(), &expected_hash(&record));
    assert_eq!(content_hash(&record).unwrap(), expected_hash(&record));
}

#[test]
fn test_canonicalization_is_deterministic() {
    let record = make_record(0x0172_4081_0000, 3);

    let a = RawBlock::from_slice(&record).unwrap();
    let b = RawBlock::from_slice(&record).unwrap();

    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.address(), b.address());
    assert_eq!(a.timestamp(), b.timestamp());
    assert_eq!(a, b);
}

#[test]
fn test_transport_header_does_not_affect_hash() {
    let record = make_record(0x016e_f93e_0000, 1);
    let mut other = record.clone();
    other[..TRANSPORT_HEADER_SIZE].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);

    let a = RawBlock::from_slice(&record).unwrap();
    let b = RawBlock::from_slice(&other).unwrap();

    assert_eq!(a.hash(), b.hash());
    assert_eq!(a.address(), b.address());
    assert_ne!(a.raw_bytes(), b.raw_bytes());
}

#[test]
fn test_body_change_affects_hash() {
    let record = make_record(0x016e_f93e_0000, 1);
    let mut other = record.clone();
    other[TRANSPORT_HEADER_SIZE] ^= 0x01;

    let a = RawBlock::from_slice(&record).unwrap();
    let b = RawBlock::from_slice(&other).unwrap();

    assert_ne!(a.hash(), b.hash());
}

#[test]
fn test_raw_bytes_preserved() {
    let record = make_record(0x016e_f93e_0000, 5);
    let raw = Bytes::from(record.clone());

    let block = RawBlock::from_bytes(raw.clone()).unwrap();

    assert_eq!(block.raw_bytes(), &raw);
    assert_eq!(block.raw_bytes().as_ref(), record.as_slice());
    assert_eq!(block.transport_header(), [0xEE; 8]);
}

#[test]
fn test_address_encodes_hash() {
    let block = RawBlock::from_slice(&make_record(42, 42)).unwrap();

    assert_eq!(block.address(), encode_address(block.hash()));
    assert_eq!(block.address().len(), 32);
}

// =============================================================================
// Timestamp Tests
// =============================================================================

#[test]
fn test_timestamp_little_endian_at_offset_16() {
    let mut record = vec![0u8; RAW_BLOCK_SIZE];
    record[16..24].copy_from_slice(&[0x00, 0x00, 0x3e, 0xf9, 0x6e, 0x01, 0x00, 0x00]);

    let block = RawBlock::from_slice(&record).unwrap();

    assert_eq!(block.timestamp(), 0x016e_f93e_0000);
}

#[test]
fn test_timestamp_read_from_original_record() {
    // Header bytes must not bleed into the timestamp
    let mut record = make_record(0xdead_beef, 0);
    record[..8].fill(0xFF);

    let block = RawBlock::from_slice(&record).unwrap();

    assert_eq!(block.timestamp(), 0xdead_beef);
}

// =============================================================================
// Size Validation Tests
// =============================================================================

#[test]
fn test_size_mismatch_rejected() {
    for len in [0, 1, 511, 513, 1024] {
        let result = RawBlock::from_slice(&vec![0u8; len]);
        match result {
            Err(XdagError::SizeMismatch { expected, actual }) => {
                assert_eq!(expected, RAW_BLOCK_SIZE);
                assert_eq!(actual, len);
            }
            other => panic!("expected SizeMismatch for {} bytes, got {:?}", len, other),
        }
    }
}

#[test]
fn test_content_hash_size_mismatch() {
    assert!(matches!(
        content_hash(&[0u8; 100]),
        Err(XdagError::SizeMismatch { .. })
    ));
}
