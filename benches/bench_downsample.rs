use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparsecloud::{adaptive_downsample, PointCloud, SamplerParams};

/// Seeded pseudo-LiDAR cloud: points scattered over a 50 m square with
/// gentle height variation, plus labels in 1..=8.
fn random_scene(n: usize) -> (PointCloud, Vec<i32>) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut x = Vec::with_capacity(n);
    let mut y = Vec::with_capacity(n);
    let mut z = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for _ in 0..n {
        x.push(rng.gen_range(-25.0..25.0));
        y.push(rng.gen_range(-25.0..25.0));
        z.push(rng.gen_range(0.0..3.0));
        labels.push(rng.gen_range(1..=8));
    }
    (PointCloud::from_xyz(x, y, z), labels)
}

fn bench_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("adaptive_downsample");
    for size in [10_000, 100_000, 1_000_000] {
        let (cloud, labels) = random_scene(size);
        let params = SamplerParams::new(0.25);
        group.bench_with_input(
            BenchmarkId::new("labeled", size),
            &cloud,
            |b, cloud| {
                b.iter(|| adaptive_downsample(cloud, Some(&labels), &params).unwrap())
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_downsample);
criterion_main!(benches);
