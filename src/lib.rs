//! # xdagkv
//!
//! Reads XDAG block storage and benchmarks key-value stores with it:
//! - Time-sharded storage walk with exponential skipping over absent shards
//! - Content addressing that ignores each record's transport header
//! - Lossy 32-character address codec for display
//! - Concurrent set/get/delete workloads against pluggable stores
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Workload                              │
//! │              (set / get / mixed / delete)                    │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ blocks                        │ hash -> raw
//! ┌──────────────▼──────────────┐        ┌───────▼──────────────┐
//! │        BlockLoader          │        │       KvStore        │
//! │  (range walk + skipping)    │        │   (memory / log)     │
//! └──────┬───────────────┬──────┘        └──────────────────────┘
//!        │               │
//!        ▼               ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ StoreLocator│  │  RawBlock   │──▶ address codec
//! │ (ts → path) │  │ (hash, ts)  │
//! └─────────────┘  └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod address;
pub mod block;
pub mod storage;
pub mod kv;
pub mod workload;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use address::{decode_address, encode_address};
pub use block::RawBlock;
pub use config::{Config, NetworkMode, StoreKind};
pub use error::{Result, XdagError};
pub use storage::{BlockLoader, StoreLocator};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of xdagkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
