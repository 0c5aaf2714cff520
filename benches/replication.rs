use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use fdrsim::{run_configuration, BaseNoise, Config, Shape};
use std::hint::black_box;

fn bench_replication(c: &mut Criterion) {
    let n_reps = 1_000;

    let mut group = c.benchmark_group("run_configuration");
    for &m in &[4usize, 16, 64] {
        let noise = BaseNoise::generate(m, n_reps, 7).expect("valid shape");
        let cfg = Config::new(m, 0.5, Shape::Equal, 5.0).with_reps(n_reps);
        group.bench_with_input(BenchmarkId::new("m", m), &m, |b, &_m| {
            b.iter(|| black_box(run_configuration(&cfg, &noise, false)));
        });
    }
    group.finish();

    let mut group = c.benchmark_group("base_noise");
    for &m in &[16usize, 64] {
        group.bench_with_input(BenchmarkId::new("generate", m), &m, |b, &m| {
            b.iter(|| black_box(BaseNoise::generate(m, n_reps, 12_345)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_replication);
criterion_main!(benches);
