//! Benchmarks for noise-index interpolation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mcsc_tuning::interp::{find_bracket, Lerp};
use mcsc_tuning::tdnr::{TdnrNiFactors, TdnrTuneset};
use mcsc_tuning::TdnrTuner;

fn tuneset(points: u32) -> TdnrTuneset {
    let ni_dep_factors = (0..points)
        .map(|i| TdnrNiFactors {
            noise_index: (i + 1) * 5,
            temporal_weight_luma_power_base: (i * 16) as i32,
            spatial_power: (i * 8) as i32,
            ..Default::default()
        })
        .collect();
    TdnrTuneset {
        ni_dep_factors,
        ..Default::default()
    }
}

fn bench_bracket(c: &mut Criterion) {
    let mut group = c.benchmark_group("bracket");

    for size in [4usize, 16, 64].iter() {
        let table: Vec<u32> = (0..*size as u32).map(|i| (i + 1) * 5).collect();
        group.bench_with_input(BenchmarkId::new("find", size), size, |b, _| {
            b.iter(|| {
                for ni in (0..700).step_by(13) {
                    black_box(find_bracket(&table, black_box(ni)));
                }
            });
        });
    }

    group.finish();
}

fn bench_lerp(c: &mut Criterion) {
    let lerp = Lerp::new(10, 40, 275);
    c.bench_function("lerp_values", |b| {
        b.iter(|| black_box(lerp.values(black_box(&[1, -2, 3, 4]), black_box(&[40, 30, -20, 10]))));
    });
}

fn bench_tdnr_tune(c: &mut Criterion) {
    let set = tuneset(16);
    c.bench_function("tdnr_tune", |b| {
        let mut tuner = TdnrTuner::new();
        let mut ni = 0u32;
        b.iter(|| {
            ni = (ni + 7) % 790;
            black_box(tuner.tune(Some(&set), ni, false));
        });
    });
}

criterion_group!(benches, bench_bracket, bench_lerp, bench_tdnr_tune);
criterion_main!(benches);
