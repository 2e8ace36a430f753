//! Populate a routing table with random peers, store random content from one
//! of them, then retrieve a sample of it from other random peers.

use std::time::Instant;

use clap::Parser;
use kadstore::{Config, Key, Peer, RoutingTable};
use rand::{seq::SliceRandom, Rng};
use tracing::Level;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of peers in the network
    #[arg(long, default_value_t = 100)]
    peers: usize,
    /// Number of random values to store
    #[arg(long, default_value_t = 200)]
    keys: usize,
    /// Number of stored keys to look up again
    #[arg(long, default_value_t = 100)]
    lookups: usize,
    /// Maximum number of peers per bucket
    #[arg(long, default_value_t = kadstore::DEFAULT_BUCKET_SIZE_K)]
    bucket_size: usize,
    /// Log every hop
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            Level::TRACE
        } else {
            Level::INFO
        })
        .init();

    let table = RoutingTable::with_config(Config {
        bucket_size: cli.bucket_size,
        ..Default::default()
    });

    let peers: Vec<Peer> = (0..cli.peers).map(|_| Peer::random(&table)).collect();
    for peer in &peers {
        table.insert(peer);
    }

    println!(
        "Created {} peers, {} kept in the routing table",
        peers.len(),
        table.size()
    );

    let Some(origin) = peers.choose(&mut rand::thread_rng()) else {
        println!("No peers to store at");
        return;
    };

    let mut rng = rand::thread_rng();
    let values: Vec<[u8; 16]> = (0..cli.keys).map(|_| rng.gen()).collect();

    let start = Instant::now();

    let saved: Vec<Key> = values
        .iter()
        .filter_map(|value| {
            let key = Key::from_value(value);
            origin.store(key.as_bytes(), value).then_some(key)
        })
        .collect();

    println!(
        "Saved {} key-value pairs from {:?} in {:?}",
        saved.len(),
        origin.id(),
        start.elapsed()
    );

    let sample: Vec<&Key> = saved
        .choose_multiple(&mut rng, cli.lookups.min(saved.len()))
        .collect();

    let mut found = 0;
    for key in sample.iter() {
        let Some(peer) = peers.choose(&mut rng) else {
            break;
        };

        match peer.retrieve(key.as_bytes()) {
            Some(value) => {
                found += 1;
                println!("Key {} found at {:?}, value is {:02x?}", key, peer.id(), &value[..]);
            }
            None => println!("Key {} not found from {:?}", key, peer.id()),
        }
    }

    println!("\nFound {}/{} sampled keys", found, sample.len());
}
