//! Event store query benchmarks. Run with: cargo bench --bench store_bench
use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use cephas_core::db::{EventStore, NearPoint, TimeRange};
use cephas_core::validation::validate_for_create;

fn seeded(rt: &tokio::runtime::Runtime, n: usize) -> EventStore {
    let store = EventStore::in_memory();
    rt.block_on(async {
        for i in 0..n {
            let input = json!({ "begin_timestamp": format!("2020-{:02}-{:02}T12:00:00Z", i % 12 + 1, i % 28 + 1), "location": {"type": "Point", "coordinates": [(i % 360) as f64 - 180.0, (i % 180) as f64 - 90.0]}, "description": format!("Event {}", i) });
            if let Some(event) = input.as_object().and_then(|map| validate_for_create(map).ok()) { let _ = store.insert(event).await; }
        }
    });
    store
}

fn bench_queries(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| panic!("runtime: {}", e));
    let mut g = c.benchmark_group("store_queries");
    for &n in &[100usize, 1000, 10000] {
        let store = seeded(&rt, n);
        let range = TimeRange::new(Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap(), Utc.with_ymd_and_hms(2020, 6, 1, 0, 0, 0).unwrap());
        let near = NearPoint::new(0.0, 0.0, 2_000_000.0);
        g.throughput(Throughput::Elements(n as u64));
        g.bench_with_input(BenchmarkId::new("in_time", n), &n, |b, _| b.to_async(&rt).iter(|| async { black_box(store.find_in_time_range(range).await) }));
        g.bench_with_input(BenchmarkId::new("in_space", n), &n, |b, _| b.to_async(&rt).iter(|| async { black_box(store.find_near_point(near).await) }));
        g.bench_with_input(BenchmarkId::new("in_space_time", n), &n, |b, _| b.to_async(&rt).iter(|| async { black_box(store.find_in_time_range_near_point(range, near).await) }));
    }
    g.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
