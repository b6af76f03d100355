#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::{sample_count, sample_offset};
use crate::synth::error::EngineError;

/*
Precomputed ADSR Envelope
=========================

A linear ADSR envelope, stored as two lookup tables instead of a per-voice
state machine. Every voice shares the same tables and indexes them by time.

Vocabulary
----------

  level         The envelope's output value (0.0 to 1.0). It multiplies the
                raw waveform sample.

  AD table      Attack ramp (0 → 1) followed by the decay ramp (1 → sustain).
                Indexed by samples since note-on.

  release table Release ramp (sustain → 0). Indexed by samples since
                note-off.


The Shape
---------

  Level
    1.0 ┐     ╱╲
        │    ╱  ╲___________
    S   │   ╱               ╲
        │  ╱                 ╲
    0.0 └─╱───────────────────╲──→ Time
        Attack Decay  Sustain  Release
        └── AD table ─┘        └ release table ┘

Past the end of the AD table the level is the sustain level. Past the end of
the release table it is 0.


Release Starts From Sustain
---------------------------

The release ramp always starts at the sustain level, no matter where the
voice was when the key went up. A note released halfway through its attack
jumps to S and ramps down from there. Tracking the instantaneous level at
note-off would need per-voice envelope state; the tables stay shared and the
render stays a pure function of time.


Zero-Length Stages
------------------

  attack  = 0   no attack ramp; the AD table starts with the decay ramp
                (which starts at 1.0)
  decay   = 0   no decay ramp; attack goes straight to sustain
  both    = 0   empty AD table: the level is S from the first sample
  release = 0   empty release table: silence right at note-off
*/

/// Envelope parameters. Times are in seconds, `sustain` is a level in [0, 1].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adsr {
    pub attack: f32,
    pub decay: f32,
    pub sustain: f32,
    pub release: f32,
}

impl Adsr {
    pub fn new(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }

    /// No shaping at all: full level on note-on, silence on note-off.
    pub fn flat() -> Self {
        Self::new(0.0, 0.0, 1.0, 0.0)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        for (param, value) in [
            ("attack", self.attack),
            ("decay", self.decay),
            ("release", self.release),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EngineError::InvalidAdsr { param, value });
            }
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(EngineError::SustainOutOfRange(self.sustain));
        }
        Ok(())
    }
}

impl Default for Adsr {
    fn default() -> Self {
        Self::flat()
    }
}

/// Longest attack+decay or release table, in samples (a little over 25
/// minutes at 44.1 kHz).
pub const MAX_ENVELOPE_SAMPLES: usize = 1 << 26;

fn segment_len(
    param: &'static str,
    seconds: f32,
    sample_rate: f64,
) -> Result<usize, EngineError> {
    if seconds as f64 * sample_rate > MAX_ENVELOPE_SAMPLES as f64 {
        return Err(EngineError::EnvelopeTooLong {
            param,
            value: seconds,
        });
    }
    Ok(sample_count(seconds as f64, sample_rate))
}

/// The two read-only envelope arrays derived from an [`Adsr`] and a sample rate.
#[derive(Debug, Clone)]
pub struct EnvelopeTables {
    adsr: Adsr,
    attack_decay: Vec<f32>,
    release: Vec<f32>,
}

impl EnvelopeTables {
    pub fn compute(adsr: Adsr, sample_rate: u32) -> Result<Self, EngineError> {
        adsr.validate()?;
        let sr = sample_rate as f64;
        let sustain = adsr.sustain;

        let attack_len = segment_len("attack", adsr.attack, sr)?;
        let decay_len = segment_len("decay", adsr.decay, sr)?;
        let release_len = segment_len("release", adsr.release, sr)?;
        let held_len = attack_len
            .checked_add(decay_len)
            .filter(|&len| len <= MAX_ENVELOPE_SAMPLES)
            .ok_or(EngineError::EnvelopeTooLong {
                param: "attack + decay",
                value: adsr.attack + adsr.decay,
            })?;

        let mut attack_decay = Vec::with_capacity(held_len);
        attack_decay.extend((0..attack_len).map(|i| i as f32 / attack_len as f32));
        attack_decay.extend(
            (0..decay_len).map(|i| 1.0 - (1.0 - sustain) * i as f32 / decay_len as f32),
        );

        let release = (0..release_len)
            .map(|i| sustain * (1.0 - i as f32 / release_len as f32))
            .collect();

        Ok(Self {
            adsr,
            attack_decay,
            release,
        })
    }

    pub fn adsr(&self) -> Adsr {
        self.adsr
    }

    pub fn sustain(&self) -> f32 {
        self.adsr.sustain
    }

    /// Release duration in seconds.
    pub fn release_time(&self) -> f64 {
        self.adsr.release as f64
    }

    pub fn attack_decay(&self) -> &[f32] {
        &self.attack_decay
    }

    pub fn release(&self) -> &[f32] {
        &self.release
    }

    /// Level `index` samples after note-on, ignoring release.
    pub fn held_level(&self, index: usize) -> f32 {
        self.attack_decay
            .get(index)
            .copied()
            .unwrap_or(self.adsr.sustain)
    }

    /// Level `index` samples after note-off.
    pub fn release_level(&self, index: usize) -> f32 {
        self.release.get(index).copied().unwrap_or(0.0)
    }

    /// Multiply `buffer` by the attack/decay/sustain curve, with `buffer[0]`
    /// sitting `elapsed` seconds after note-on.
    pub fn apply_attack_decay(&self, elapsed: f64, sample_rate: f64, buffer: &mut [f32]) {
        let start = sample_offset(elapsed, sample_rate).min(self.attack_decay.len());
        let ramp = &self.attack_decay[start..];
        let split = ramp.len().min(buffer.len());

        let (shaped, sustained) = buffer.split_at_mut(split);
        for (sample, level) in shaped.iter_mut().zip(ramp) {
            *sample *= level;
        }
        let sustain = self.adsr.sustain;
        for sample in sustained.iter_mut() {
            *sample *= sustain;
        }
    }

    /// Multiply `buffer` by the release curve, with `buffer[0]` sitting
    /// `elapsed` seconds after note-off.
    pub fn apply_release(&self, elapsed: f64, sample_rate: f64, buffer: &mut [f32]) {
        let start = sample_offset(elapsed, sample_rate).min(self.release.len());
        let ramp = &self.release[start..];
        let split = ramp.len().min(buffer.len());

        let (shaped, silent) = buffer.split_at_mut(split);
        for (sample, level) in shaped.iter_mut().zip(ramp) {
            *sample *= level;
        }
        silent.fill(0.0);
    }
}
