//! Storage Module
//!
//! Read side of the time-sharded block storage.
//!
//! ## Responsibilities
//! - Map timestamps to shard paths
//! - Validate and read shard files
//! - Walk a time range, skipping absent subtrees
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   └── storage-testnet/            (or storage/ on mainnet)
//!       └── 01/                     bits 40..47
//!           └── 6e/                 bits 32..39
//!               └── f9/             bits 24..31
//!                   ├── 3e.dat      bits 16..23, [record 512][record 512]...
//!                   └── 3f.dat
//! ```

mod loader;
mod locator;
mod shard;

pub use loader::{BlockLoader, LoadOutcome, LoadStats};
pub use locator::{shard_components, ShardLevel, StoreLocator, SHARD_FILE_EXT};
