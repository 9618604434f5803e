//! xdagkv CLI
//!
//! Inspection commands for addresses and shard storage.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use xdagkv::address::HASH_LENGTH;
use xdagkv::config::parse_timestamp;
use xdagkv::storage::shard_components;
use xdagkv::{decode_address, encode_address, BlockLoader, NetworkMode, StoreLocator};

/// xdagkv CLI
#[derive(Parser, Debug)]
#[command(name = "xdagkv-cli")]
#[command(about = "Inspect XDAG addresses and block storage")]
struct Args {
    /// Directory containing storage/ and storage-testnet/
    #[arg(short, long, default_value = ".")]
    data_dir: String,

    /// Use mainnet shards instead of testnet
    #[arg(long)]
    mainnet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode a 32-byte hex hash as an address
    Encode {
        /// 64 hex characters
        hash: String,
    },

    /// Decode an address into a hex hash
    Decode {
        /// 32-character address
        address: String,
    },

    /// Print the shard path for a timestamp
    Locate {
        /// Timestamp (hex with 0x prefix, or decimal)
        #[arg(value_parser = parse_timestamp)]
        timestamp: u64,
    },

    /// List blocks stored in a time range
    List {
        /// First timestamp
        #[arg(long, value_parser = parse_timestamp)]
        start: u64,

        /// End timestamp, exclusive
        #[arg(long, value_parser = parse_timestamp)]
        end: u64,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let network = if args.mainnet {
        NetworkMode::Mainnet
    } else {
        NetworkMode::Testnet
    };
    let locator = StoreLocator::new(&args.data_dir, network);

    if let Err(e) = run(args.command, locator) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, locator: StoreLocator) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Encode { hash } => {
            let bytes = hex::decode(hash.trim())?;
            let hash: [u8; HASH_LENGTH] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| format!("hash must be {} bytes, got {}", HASH_LENGTH, bytes.len()))?;
            println!("{}", encode_address(&hash));
        }
        Commands::Decode { address } => {
            let hash = decode_address(&address)?;
            println!("{}", hex::encode(hash));
        }
        Commands::Locate { timestamp } => {
            let [l1, l2, l3, file] = shard_components(timestamp);
            println!("{}", locator.locate(timestamp).display());
            println!("components: {:02x} {:02x} {:02x} {:02x}", l1, l2, l3, file);
        }
        Commands::List { start, end } => {
            let outcome = BlockLoader::new(locator).load(start, end)?;
            for block in &outcome.blocks {
                println!("{:#014x} {}", block.timestamp(), block.address());
            }
            println!(
                "{} blocks, {} shards, {} iterations",
                outcome.stats.blocks_loaded, outcome.stats.shards_read, outcome.stats.iterations
            );
        }
    }
    Ok(())
}
