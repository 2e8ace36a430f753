//! Micro-benchmarks for RoutingTable operations and lookups: insert,
//! nearest_excluding and store/retrieve at varying population sizes.
//! Reports nanoseconds-per-operation.
//!
//! Run: `cargo bench --bench routing_table`

use kadstore::{Id, Key, Peer, RoutingTable};
use std::time::Instant;

fn main() {
    println!("routing_table\n");

    bench_insert();
    bench_nearest();
    bench_contains();
    bench_store_retrieve();
}

fn populate(table: &RoutingTable, size: usize) -> Vec<Peer> {
    let peers: Vec<Peer> = (0..size).map(|_| Peer::random(table)).collect();
    for peer in &peers {
        table.insert(peer);
    }
    peers
}

fn bench_insert() {
    println!("insert");

    for size in [100, 1000, 10_000] {
        let table = RoutingTable::new();

        // Pre-generate random peers outside the timed section
        let peers: Vec<Peer> = (0..size).map(|_| Peer::random(&table)).collect();

        let start = Instant::now();
        for peer in &peers {
            table.insert(peer);
        }
        let per_op = start.elapsed().as_nanos() / size as u128;
        println!(
            "{size:>6} peers: {per_op}ns/op (final size: {})",
            table.size()
        );
    }

    println!();
}

fn bench_nearest() {
    println!("nearest_excluding");

    let table = RoutingTable::new();
    let _peers = populate(&table, 1000);

    let targets: Vec<Key> = (0..1000_u32)
        .map(|i| Key::from_value(&i.to_be_bytes()))
        .collect();
    let excluded = Id::random();

    let start = Instant::now();
    for target in &targets {
        let bucket = target.to_id().map_or(0, |id| id.bucket_index());
        let _ = table.nearest_excluding(bucket, target, &excluded, 2);
    }
    let per_op = start.elapsed().as_nanos() / targets.len() as u128;
    println!("{per_op}ns/op\n");
}

fn bench_contains() {
    println!("contains");

    let table = RoutingTable::new();
    let peers = populate(&table, 1000);

    let start = Instant::now();
    for peer in &peers {
        let _ = table.contains(&peer.id());
    }
    let per_op = start.elapsed().as_nanos() / peers.len() as u128;
    println!("{per_op}ns/op\n");
}

fn bench_store_retrieve() {
    println!("store / retrieve");

    for size in [10, 100, 1000] {
        let table = RoutingTable::new();
        let peers = populate(&table, size);

        let values: Vec<[u8; 16]> = (0..1000_u128).map(|i| i.to_be_bytes()).collect();

        let start = Instant::now();
        for (i, value) in values.iter().enumerate() {
            let key = Key::from_value(value);
            peers[i % size].store(key.as_bytes(), value);
        }
        let store = start.elapsed().as_nanos() / values.len() as u128;

        let start = Instant::now();
        for (i, value) in values.iter().enumerate() {
            let key = Key::from_value(value);
            let _ = peers[(i + 1) % size].retrieve(key.as_bytes());
        }
        let retrieve = start.elapsed().as_nanos() / values.len() as u128;

        println!("{size:>4} peers: store {store}ns/op, retrieve {retrieve}ns/op");
    }

    println!();
}
