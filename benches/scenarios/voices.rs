//! Benchmarks for complete engine renders.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use keysynth::{
    dsp::Adsr,
    notes::NoteTable,
    synth::{EngineConfig, SynthEngine},
};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn engine(buffer_len: usize) -> SynthEngine {
    let config = EngineConfig::new()
        .sample_rate(SAMPLE_RATE)
        .buffer_len(buffer_len)
        .channels(2)
        .adsr(Adsr::new(0.05, 0.1, 0.6, 10.0));
    SynthEngine::new(config, &NoteTable::standard()).unwrap()
}

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");

    for &size in BLOCK_SIZES {
        let mut out = vec![0.0f32; size * 2];

        // === SILENCE ===
        // Baseline: snapshot + reap with an empty registry
        let mut idle = engine(size);
        group.bench_with_input(BenchmarkId::new("silence", size), &size, |b, _| {
            b.iter(|| idle.render(black_box(&mut out), black_box(1.0)))
        });

        // === SINGLE NOTE ===
        let mut single = engine(size);
        single.note_on(69, 0.0);
        group.bench_with_input(BenchmarkId::new("single", size), &size, |b, _| {
            b.iter(|| single.render(black_box(&mut out), black_box(1.0)))
        });

        // === TEN-NOTE CHORD ===
        let mut chord = engine(size);
        for note in [48, 52, 55, 60, 64, 67, 72, 76, 79, 84] {
            chord.note_on(note, 0.0);
        }
        group.bench_with_input(BenchmarkId::new("chord_10", size), &size, |b, _| {
            b.iter(|| chord.render(black_box(&mut out), black_box(1.0)))
        });

        // === OVERLAPPING TAILS ===
        // 24 notes released, each re-pressed: 48 voices in the registry
        let mut tails = engine(size);
        for note in 48..72 {
            tails.note_on(note, 0.0);
            tails.note_off(note, 0.5);
            tails.note_on(note, 0.6);
        }
        group.bench_with_input(BenchmarkId::new("tails_48", size), &size, |b, _| {
            b.iter(|| tails.render(black_box(&mut out), black_box(1.0)))
        });
    }

    group.finish();
}
