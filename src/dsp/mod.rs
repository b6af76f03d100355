//! Low-level DSP primitives used by the synth engine.
//!
//! Everything in here is computed once (at construction or on an explicit
//! reconfiguration) and read-only afterwards, so it can be shared across the
//! input and render threads without synchronisation.

/// Attack/decay/sustain/release parameters and precomputed envelope tables.
pub mod envelope;
/// Triangle oscillator and the per-note waveform cache.
pub mod oscillator;

pub use envelope::{Adsr, EnvelopeTables};
pub use oscillator::{WaveTable, WaveformCache};

/// Convert a duration in seconds to a whole sample offset (floor).
///
/// The tiny bias absorbs float error from subtracting two absolute device
/// times, e.g. `(2.5 + 256/sr) - 2.5` landing just below 256 samples.
#[inline]
pub(crate) fn sample_offset(seconds: f64, sample_rate: f64) -> usize {
    let samples = seconds * sample_rate + 1e-6;
    if samples <= 0.0 {
        0
    } else {
        samples.floor() as usize
    }
}

/// Convert a duration in seconds to the nearest sample count.
#[inline]
pub(crate) fn sample_count(seconds: f64, sample_rate: f64) -> usize {
    (seconds * sample_rate).round().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_absorbs_subtraction_error() {
        let sr = 44_100.0;
        let elapsed = (2.5 + 256.0 / sr) - 2.5;
        assert_eq!(sample_offset(elapsed, sr), 256);
    }

    #[test]
    fn negative_offset_clamps_to_zero() {
        assert_eq!(sample_offset(-0.5, 48_000.0), 0);
        assert_eq!(sample_count(-0.5, 48_000.0), 0);
    }
}
