pub mod dsp; // Oscillator tables and envelope generation
pub mod io; // Input collaborators (computer keyboard mapping)
pub mod notes; // Note table: identity, name, frequency
pub mod synth; // Voice registry, engine, render loop

/// Fixed output level of a single voice before enveloping.
pub const DEFAULT_GAIN: f32 = 0.2;
/// Number of addressable note identities (MIDI range 0..=127).
pub const NOTE_SLOTS: usize = 128;
