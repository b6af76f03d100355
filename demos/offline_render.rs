/// Offline render of an arpeggiated chord, no audio device needed.
///
/// Run with: cargo run --example offline_render
use keysynth::{
    dsp::Adsr,
    notes::NoteTable,
    synth::{EngineConfig, SynthEngine},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Offline Render ===\n");

    let notes = NoteTable::standard();
    let config = EngineConfig::new()
        .sample_rate(48_000)
        .buffer_len(256)
        .channels(2)
        .adsr(Adsr::new(0.02, 0.1, 0.6, 0.3));
    let mut engine = SynthEngine::new(config, &notes)?;
    let handle = engine.handle();

    // C major arpeggio, 100ms apart, all released at 0.6s
    let chord = ["C4", "E4", "G4", "C5"];
    for (i, name) in chord.iter().enumerate() {
        let note = notes.by_name(name).ok_or("note missing from table")?;
        println!("  Note On: {} ({}, {:.2} Hz)", note.name, note.id, note.frequency);
        handle.note_on(note.id, i as f64 * 0.1);
    }
    for name in chord {
        if let Some(note) = notes.by_name(name) {
            handle.note_off(note.id, 0.6);
        }
    }

    let buffer_secs = config.buffer_duration();
    let mut buffer = vec![0.0f32; config.buffer_len * config.channels];
    let mut t = 0.0;
    println!();
    while t < 1.0 {
        engine.render(&mut buffer, t);
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let bar = "#".repeat((peak * 60.0) as usize);
        println!("{t:5.3}s  voices {:>2}  {bar}", engine.active_voices());
        // Every 8th buffer only, for a compact printout
        t += buffer_secs * 8.0;
    }

    println!("\nAll tails finished: {}", engine.active_voices() == 0);
    Ok(())
}
