//! Benchmarks for applying the ADSR tables.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::dsp::{Adsr, EnvelopeTables};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let sr = SAMPLE_RATE as f64;
    let env = EnvelopeTables::compute(Adsr::new(0.1, 0.1, 0.7, 0.3), SAMPLE_RATE).unwrap();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.5f32; size];

        // Inside the attack ramp
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| env.apply_attack_decay(black_box(0.01), sr, black_box(&mut buffer)))
        });

        // Past the AD table, constant sustain
        group.bench_with_input(BenchmarkId::new("sustain", size), &size, |b, _| {
            b.iter(|| env.apply_attack_decay(black_box(1.0), sr, black_box(&mut buffer)))
        });

        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| env.apply_release(black_box(0.05), sr, black_box(&mut buffer)))
        });
    }

    group.finish();
}
