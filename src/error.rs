//! Error types for xdagkv
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using XdagError
pub type Result<T> = std::result::Result<T, XdagError>;

/// Unified error type for xdagkv operations
#[derive(Debug, Error)]
pub enum XdagError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Address Errors
    // -------------------------------------------------------------------------
    #[error("Address string error: {0}")]
    AddressFormat(String),

    // -------------------------------------------------------------------------
    // Block Errors
    // -------------------------------------------------------------------------
    #[error("Block size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("Shard file size error: {} is {len} bytes, not a multiple of the record size", path.display())]
    Corruption { path: PathBuf, len: u64 },

    // -------------------------------------------------------------------------
    // Key-Value Store Errors
    // -------------------------------------------------------------------------
    #[error("Store error: {0}")]
    Store(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
