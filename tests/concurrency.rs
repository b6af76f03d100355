//! Input and render threads hammering one engine at the same time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use keysynth::{
    dsp::Adsr,
    notes::NoteTable,
    synth::{EngineConfig, SynthEngine},
};

#[test]
fn concurrent_input_and_render_stay_consistent() {
    let config = EngineConfig::new()
        .buffer_len(128)
        .adsr(Adsr::new(0.001, 0.001, 0.8, 0.002));
    let mut engine = SynthEngine::new(config, &NoteTable::standard()).unwrap();
    let sr = config.sample_rate as f64;
    let buffer_secs = config.buffer_duration();

    let done = Arc::new(AtomicBool::new(false));
    let input = thread::spawn({
        let handle = engine.handle();
        let done = done.clone();
        move || {
            let mut i = 0u64;
            while !done.load(Ordering::Relaxed) {
                let note = 48 + (i % 24) as u8;
                let t = i as f64 * 32.0 / sr;
                if i % 3 == 0 {
                    handle.note_off(note, t);
                } else {
                    handle.note_on(note, t);
                }
                if i % 50 == 0 {
                    let sustain = 0.5 + 0.5 * ((i / 50) % 2) as f32;
                    handle.set_adsr(Adsr::new(0.001, 0.001, sustain, 0.002)).unwrap();
                }
                i += 1;
                thread::yield_now();
            }
            i
        }
    });

    let mut out = vec![0.0f32; 128 * 2];
    for k in 0..2_000 {
        engine.render(&mut out, k as f64 * buffer_secs);
        assert!(out.iter().all(|s| s.is_finite()));
    }

    done.store(true, Ordering::Relaxed);
    let events = input.join().unwrap();

    // Release everything after the last input event and the last render,
    // then render past the tails: nothing may be left sounding.
    let handle = engine.handle();
    let t_end = (events as f64 * 32.0 / sr).max(2_000.0 * buffer_secs) + 0.01;
    handle.all_notes_off(t_end);
    assert!((0u8..128).all(|note| !handle.is_held(note)));

    let first = (t_end / buffer_secs).ceil() as u64;
    for k in first..first + 4 {
        engine.render(&mut out, k as f64 * buffer_secs);
    }
    assert_eq!(handle.active_voices(), 0);
    assert!(out.iter().all(|&s| s == 0.0));
}
