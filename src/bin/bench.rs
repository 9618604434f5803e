//! xdagkv Benchmark Binary
//!
//! Loads blocks from shard storage and replays them against a key-value store.

use std::time::Instant;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use xdagkv::kv;
use xdagkv::workload::Workload;
use xdagkv::config::parse_timestamp;
use xdagkv::{BlockLoader, Config, NetworkMode, StoreKind};

/// xdagkv benchmark
#[derive(Parser, Debug)]
#[command(name = "xdagkv-bench")]
#[command(about = "Replay XDAG blocks against key-value stores")]
#[command(version)]
struct Args {
    /// Directory containing storage/ and storage-testnet/
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// Read mainnet shards instead of testnet
    #[arg(long)]
    mainnet: bool,

    /// First timestamp (hex with 0x prefix, or decimal)
    #[arg(long, default_value = "0x16ef93e0000", value_parser = parse_timestamp)]
    start: u64,

    /// End timestamp, exclusive (hex with 0x prefix, or decimal)
    #[arg(long, default_value = "0x17240810000", value_parser = parse_timestamp)]
    end: u64,

    /// Concurrent worker threads (defaults to available parallelism)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// fsync after every write
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    fsync: bool,

    /// Store type: memory or log
    #[arg(short, long, default_value = "memory")]
    store: StoreKind,

    /// Directory for the store's files
    #[arg(long, default_value = "./xdagkv.db")]
    store_path: String,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,xdagkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("xdagkv bench v{}", xdagkv::VERSION);

    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .network(if args.mainnet {
            NetworkMode::Mainnet
        } else {
            NetworkMode::Testnet
        })
        .store_kind(args.store)
        .store_path(&args.store_path)
        .fsync(args.fsync);
    if let Some(threads) = args.concurrency {
        builder = builder.concurrency(threads);
    }
    let config = builder.build();

    if let Err(e) = run(&config, args.start, args.end) {
        tracing::error!("Benchmark failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config, start: u64, end: u64) -> xdagkv::Result<()> {
    tracing::info!("Storage root: {}", config.storage_root().display());

    let loader = BlockLoader::from_config(config);
    let started = Instant::now();
    let blocks = loader.load_blocks(start, end)?;
    let elapsed = started.elapsed();

    if let Some(first) = blocks.first() {
        tracing::info!(
            "xdag file store single thread load rate: {:.0} op/s, took: {:.3} s, kv total: {}",
            blocks.len() as f64 / elapsed.as_secs_f64().max(f64::MIN_POSITIVE),
            elapsed.as_secs_f64(),
            blocks.len()
        );
        tracing::info!(
            "key length: {}, value length: {}",
            first.hash().len(),
            first.raw_bytes().len()
        );
    }

    tracing::info!("CPU core number = {}", config.concurrency);
    let store = kv::open_from_config(config)?;
    let workload = Workload::new(store.as_ref(), &blocks, config.concurrency)?;
    tracing::info!("total: {}", workload.total_ops());

    let name = store.name();
    let set = workload.run_set()?;
    tracing::info!("{} {}", name, set);

    let get = workload.run_get()?;
    tracing::info!("{} {}", name, get);
    tracing::info!("failed threads: {:?}", get.failed_threads);

    let mixed = workload.run_mixed()?;
    tracing::info!("{} {}", name, mixed.writes);
    tracing::info!("{} {}", name, mixed.reads);
    tracing::info!("failed threads: {:?}", mixed.reads.failed_threads);

    let del = workload.run_delete()?;
    tracing::info!("{} {}", name, del);

    store.flush()?;
    Ok(())
}
