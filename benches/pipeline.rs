//! Performance benchmarks for trail-enricher
//!
//! Run with: cargo bench --bench pipeline

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use trail_enricher::{
    process_trail, simplify_adaptive, RawPoint, TrailConfig, TrailInput, VariantInput,
    VariantKind, Waypoint,
};

/// A winding mountain track with the given number of points, ~10m apart.
fn generate_track(num_points: usize) -> Vec<RawPoint> {
    (0..num_points)
        .map(|i| {
            let t = i as f64 / num_points as f64;
            let lat = 46.5 + t * 0.5 + (t * 80.0).sin() * 0.002;
            let lon = 7.9 + i as f64 * 0.0001 + (t * 50.0).cos() * 0.002;
            let elevation = 1500.0 + (t * 20.0).sin() * 600.0;
            RawPoint::new(lat, lon, elevation)
        })
        .collect()
}

/// One waypoint every `step` track points, slightly off the line.
fn generate_waypoints(track: &[RawPoint], step: usize) -> Vec<Waypoint> {
    track
        .iter()
        .step_by(step)
        .enumerate()
        .map(|(i, p)| Waypoint::new(&format!("wp{}", i), p.lat + 0.0003, p.lon, "marker"))
        .collect()
}

fn generate_input(num_points: usize) -> TrailInput {
    let points = generate_track(num_points);
    let waypoints = generate_waypoints(&points, 500);
    let quarter = num_points / 4;
    let detour: Vec<RawPoint> = points[quarter..quarter + 200]
        .iter()
        .map(|p| RawPoint::new(p.lat + 0.002, p.lon, p.elevation + 50.0))
        .collect();

    TrailInput {
        id: format!("bench-{}", num_points),
        points,
        waypoints,
        variants: vec![VariantInput::new("High route", VariantKind::Alternate, detour)],
    }
}

// ============================================================================
// Core Benchmarks
// ============================================================================

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");

    for size in [10_000, 50_000, 200_000] {
        let track = generate_track(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &track, |b, track| {
            b.iter(|| simplify_adaptive(track, 3000, 500.0));
        });
    }

    group.finish();
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    group.sample_size(20);
    let config = TrailConfig::default();

    for size in [10_000, 100_000] {
        let input = generate_input(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &input, |b, input| {
            b.iter(|| process_trail(input, &config));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simplify, bench_full_pipeline);
criterion_main!(benches);
