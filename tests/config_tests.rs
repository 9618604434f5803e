//! Tests for Config
//!
//! These tests verify:
//! - Defaults match the benchmark's usual setup
//! - Builder overrides and the derived storage root
//! - Timestamp parsing for command-line ranges

use std::path::PathBuf;

use xdagkv::config::parse_timestamp;
use xdagkv::{Config, NetworkMode, StoreKind, XdagError};

// =============================================================================
// Default Tests
// =============================================================================

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.data_dir, PathBuf::from("."));
    assert_eq!(config.network, NetworkMode::Testnet);
    assert_eq!(config.store_kind, StoreKind::Memory);
    assert!(config.fsync);
    assert!(config.concurrency >= 1);
    assert_eq!(config.storage_root(), PathBuf::from("./storage-testnet"));
}

#[test]
fn test_storage_folders() {
    assert_eq!(NetworkMode::Mainnet.storage_folder(), "storage");
    assert_eq!(NetworkMode::Testnet.storage_folder(), "storage-testnet");
}

// =============================================================================
// Builder Tests
// =============================================================================

#[test]
fn test_builder_overrides() {
    let config = Config::builder()
        .data_dir("/srv/xdag")
        .network(NetworkMode::Mainnet)
        .store_kind(StoreKind::Log)
        .store_path("/tmp/kv")
        .fsync(false)
        .concurrency(7)
        .build();

    assert_eq!(config.storage_root(), PathBuf::from("/srv/xdag/storage"));
    assert_eq!(config.store_kind, StoreKind::Log);
    assert_eq!(config.store_path, PathBuf::from("/tmp/kv"));
    assert!(!config.fsync);
    assert_eq!(config.concurrency, 7);
}

// =============================================================================
// Timestamp Parsing Tests
// =============================================================================

#[test]
fn test_parse_timestamp() {
    assert_eq!(parse_timestamp("0x16ef93e0000").unwrap(), 0x16ef93e0000);
    assert_eq!(parse_timestamp("0X17240810000").unwrap(), 0x17240810000);
    assert_eq!(parse_timestamp("65536").unwrap(), 65536);
    assert_eq!(parse_timestamp("0").unwrap(), 0);
}

#[test]
fn test_parse_timestamp_rejects_garbage() {
    for input in ["", "0x", "0xZZ", "-1", "12ab", "0x1_0000_0000_0000_0000"] {
        assert!(
            matches!(parse_timestamp(input), Err(XdagError::Config(_))),
            "{:?}",
            input
        );
    }
}
