//! Benchmarks for waveform cache reads.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::{dsp::WaveformCache, notes::NoteTable, DEFAULT_GAIN};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    let notes = NoteTable::standard();
    let max_block = *BLOCK_SIZES.iter().max().unwrap();
    let cache = WaveformCache::build(&notes, DEFAULT_GAIN, SAMPLE_RATE, max_block);
    let a4 = notes.by_name("A4").unwrap().id;

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("read", size), &size, |b, &size| {
            b.iter(|| {
                let raw = cache.read(a4, black_box(12.345), size).unwrap();
                buffer.copy_from_slice(raw);
                black_box(&buffer);
            })
        });
    }

    // One-off cost of building every table at startup.
    group.bench_function("build_all", |b| {
        b.iter(|| WaveformCache::build(black_box(&notes), DEFAULT_GAIN, SAMPLE_RATE, 512))
    });

    group.finish();
}
