use crate::notes::NoteTable;
use crate::NOTE_SLOTS;

/*
Triangle Oscillator & Waveform Cache
====================================

Every voice in the engine plays the same waveform: a triangle wave at the
note's frequency. Instead of running an oscillator per voice (and carrying a
phase accumulator between callbacks), each note gets a precomputed table of
raw samples, and voices read from it by absolute time.


The Shape
---------

     +1 ┐    ╱╲          ╱╲
        │   ╱  ╲        ╱  ╲
      0 ┼──╱────╲──────╱────╲────→ t
        │ ╱      ╲    ╱      ╲
     -1 ┘╱        ╲╱╱        ╲
        0   T/4   3T/4   T

  tri(t) = 4f · | ((t - T/4) mod T) - T/2 | - 1        with T = 1/f

Starting at 0 and rising means a voice begins from silence rather than a
jump to full scale.


Phase From Time
---------------

A voice that started at `start_time` has phase

    phase = (now - start_time) mod T

at any absolute time `now`. The renderer computes this fresh for every
buffer, so consecutive buffers line up without storing state and a buffer
can be re-rendered for the same window with identical output.


Table Sizing
------------

For one buffer we read `len <= buffer_len` samples starting at
`floor(phase * sample_rate)`. The start offset is always below one period,
so a table of

    max(2 · period, 2 · buffer_len)  samples

is long enough that a read never needs to wrap around.
*/

/// Triangle wave of the given frequency at time `t` (seconds), in [-1, 1].
#[inline]
pub fn triangle(frequency: f64, t: f64) -> f32 {
    let period = 1.0 / frequency;
    let shifted = (t - 0.25 * period).rem_euclid(period) - 0.5 * period;
    (4.0 * frequency * shifted.abs() - 1.0) as f32
}

/// Precomputed raw samples for one note.
pub struct WaveTable {
    frequency: f64,
    period: f64,
    samples: Vec<f32>,
}

impl WaveTable {
    /// Sample a gain-scaled triangle wave long enough for any phase offset
    /// plus one buffer of `buffer_len` frames.
    pub fn build(frequency: f32, gain: f32, sample_rate: u32, buffer_len: usize) -> Self {
        let frequency = frequency as f64;
        let sr = sample_rate as f64;
        let period = 1.0 / frequency;
        let len = ((2.0 * period * sr).ceil() as usize).max(2 * buffer_len) + 1;

        let samples = (0..len)
            .map(|i| gain * triangle(frequency, i as f64 / sr))
            .collect();

        Self {
            frequency,
            period,
            samples,
        }
    }

    /// Samples for `len` frames starting `elapsed` seconds after note-on.
    ///
    /// `len` must not exceed the buffer length the table was built for.
    pub fn read(&self, elapsed: f64, sample_rate: f64, len: usize) -> &[f32] {
        let phase = elapsed.rem_euclid(self.period);
        // Guard against phase * sr rounding up to a full period.
        let offset = super::sample_offset(phase, sample_rate) % self.period_samples(sample_rate);
        &self.samples[offset..offset + len]
    }

    fn period_samples(&self, sample_rate: f64) -> usize {
        ((self.period * sample_rate).ceil() as usize).max(1)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// One [`WaveTable`] per note identity in the note table.
pub struct WaveformCache {
    sample_rate: f64,
    buffer_len: usize,
    tables: Vec<Option<WaveTable>>,
}

impl WaveformCache {
    pub fn build(notes: &NoteTable, gain: f32, sample_rate: u32, buffer_len: usize) -> Self {
        let mut tables: Vec<Option<WaveTable>> = (0..NOTE_SLOTS).map(|_| None).collect();
        for note in notes.iter() {
            tables[note.id as usize] =
                Some(WaveTable::build(note.frequency, gain, sample_rate, buffer_len));
        }

        Self {
            sample_rate: sample_rate as f64,
            buffer_len,
            tables,
        }
    }

    pub fn get(&self, note: u8) -> Option<&WaveTable> {
        self.tables.get(note as usize).and_then(Option::as_ref)
    }

    pub fn contains(&self, note: u8) -> bool {
        self.get(note).is_some()
    }

    /// Raw samples of `note` for `len` frames, `elapsed` seconds after note-on.
    ///
    /// Returns `None` for identities that are not in the note table.
    pub fn read(&self, note: u8, elapsed: f64, len: usize) -> Option<&[f32]> {
        debug_assert!(len <= self.buffer_len);
        self.get(note)
            .map(|table| table.read(elapsed, self.sample_rate, len))
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }
}
