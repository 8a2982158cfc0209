//! Validation benchmarks. Run with: cargo bench --bench validation_bench
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::{json, Map, Value};
use std::time::Duration;
use cephas_core::validation::{valid_description, valid_point_coords, valid_time, validate_for_create, validate_for_update};

fn object(value: Value) -> Map<String, Value> { value.as_object().cloned().unwrap_or_default() }
fn valid_input() -> Map<String, Value> { object(json!({ "begin_timestamp": "2020-11-10T09:00:00.000Z", "end_timestamp": "2020-11-10T17:30:00Z", "location": {"type": "Point", "coordinates": [-117.923667, 33.809173]}, "description": "Grand opening of the new library, everyone welcome!" })) }
fn invalid_input() -> Map<String, Value> { object(json!({ "begin_timestamp": "tomorrow", "location": {"type": "Polygon", "coordinates": [500, 0]}, "description": "drop table events;" })) }

fn bench_field_rules(c: &mut Criterion) {
    let mut g = c.benchmark_group("validation_field_rules"); g.measurement_time(Duration::from_secs(5));
    g.bench_function("time_rfc3339", |b| b.iter(|| black_box(valid_time(black_box("2020-11-10T09:00:00.000Z")))));
    g.bench_function("time_naive", |b| b.iter(|| black_box(valid_time(black_box("2020-11-10T09:00")))));
    g.bench_function("time_date_only", |b| b.iter(|| black_box(valid_time(black_box("2020-11-10")))));
    g.bench_function("time_invalid", |b| b.iter(|| black_box(valid_time(black_box("not a timestamp")))));
    let coords = json!([-117.923667, 33.809173]);
    g.bench_function("point_valid", |b| b.iter(|| black_box(valid_point_coords(black_box(&coords)))));
    let bad_coords = json!(["x", 33.8]);
    g.bench_function("point_invalid", |b| b.iter(|| black_box(valid_point_coords(black_box(&bad_coords)))));
    let long = "a".repeat(1024);
    g.bench_function("description_short", |b| b.iter(|| black_box(valid_description(black_box("Hello, world.")))));
    g.bench_function("description_max_length", |b| b.iter(|| black_box(valid_description(black_box(&long)))));
    g.finish();
}

fn bench_record_validation(c: &mut Criterion) {
    let mut g = c.benchmark_group("validation_record"); g.measurement_time(Duration::from_secs(5));
    let valid = valid_input(); let invalid = invalid_input();
    g.bench_function("create_valid", |b| b.iter(|| black_box(validate_for_create(black_box(&valid)))));
    g.bench_function("create_invalid", |b| b.iter(|| black_box(validate_for_create(black_box(&invalid)))));
    let patch = object(json!({"description": "Moved indoors"}));
    g.bench_function("update_single_field", |b| b.iter(|| black_box(validate_for_update(black_box(&patch)))));
    let empty = Map::new();
    g.bench_function("update_empty", |b| b.iter(|| black_box(validate_for_update(black_box(&empty)))));
    g.finish();
}

fn bench_batch_validation(c: &mut Criterion) {
    let mut g = c.benchmark_group("validation_batch"); g.measurement_time(Duration::from_secs(8));
    for &bs in &[10usize, 100, 1000] {
        g.throughput(Throughput::Elements(bs as u64));
        g.bench_with_input(BenchmarkId::new("mixed", bs), &bs, |b, &n| {
            let inputs: Vec<Map<String, Value>> = (0..n).map(|i| if i % 3 == 0 { invalid_input() } else { valid_input() }).collect();
            b.iter(|| { let mut r = Vec::with_capacity(n); for input in &inputs { r.push(validate_for_create(input).is_ok()); } black_box(r) });
        });
    }
    g.finish();
}

criterion_group!(benches, bench_field_rules, bench_record_validation, bench_batch_validation);
criterion_main!(benches);
