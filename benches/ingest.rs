//! Benchmarks for batch ingestion.
//!
//! Measures decode + per-server speed derivation + wholesale store
//! replacement for a mid-sized fleet.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use std::time::{Duration, Instant};

use vigil::engine::SyncEngine;
use vigil::protocol::Batch;
use vigil::store::FleetStore;

const FLEET_SIZE: usize = 50;

fn fleet_frame(tick: u64) -> String {
    let servers: Vec<serde_json::Value> = (0..FLEET_SIZE)
        .map(|i| {
            serde_json::json!({
                "server_id": format!("srv-{i}"),
                "server_name": format!("Server {i}"),
                "location": "Helsinki",
                "provider": "Hetzner",
                "online": true,
                "metrics": {
                    "hostname": format!("srv-{i}"),
                    "uptime": 86400 + tick,
                    "cpu": {"brand": "AMD EPYC", "cores": 16, "usage": 12.5},
                    "memory": {"total": 64u64 << 30, "used": 16u64 << 30, "usage_percent": 25.0},
                    "network": {
                        "total_rx": tick * 1_000_000 + i as u64,
                        "total_tx": tick * 500_000 + i as u64
                    }
                }
            })
        })
        .collect();
    serde_json::json!({"type": "metrics", "servers": servers}).to_string()
}

fn bench_decode(c: &mut Criterion) {
    let frame = fleet_frame(1);
    c.bench_function("decode_50_server_frame", |b| {
        b.iter(|| Batch::decode(black_box(&frame)).unwrap())
    });
}

fn bench_ingest(c: &mut Criterion) {
    let frame_a = fleet_frame(1);
    let frame_b = fleet_frame(2);

    c.bench_function("ingest_50_server_batch", |b| {
        let engine = SyncEngine::new(Arc::new(FleetStore::new()));
        // Seed previous samples so every iteration takes the derivation path.
        let t0 = Instant::now();
        engine.ingest_at(Batch::decode(&frame_a).unwrap(), t0);

        let batch = Batch::decode(&frame_b).unwrap();
        let t1 = t0 + Duration::from_secs(1);
        b.iter(|| engine.ingest_at(black_box(batch.clone()), t1));
    });
}

criterion_group!(benches, bench_decode, bench_ingest);
criterion_main!(benches);
