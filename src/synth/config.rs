#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::envelope::Adsr, synth::error::EngineError, DEFAULT_GAIN};

/// Engine construction parameters.
///
/// ```
/// use keysynth::{dsp::Adsr, synth::EngineConfig};
///
/// let config = EngineConfig::new()
///     .sample_rate(48_000)
///     .buffer_len(512)
///     .adsr(Adsr::new(0.05, 0.1, 0.6, 0.4));
/// assert!(config.validate().is_ok());
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Samples per second (Hz)
    pub sample_rate: u32,
    /// Frames per render chunk; also sizes the waveform tables
    pub buffer_len: usize,
    /// Interleaved output channels; every channel carries the same mix
    pub channels: usize,
    /// Envelope applied to every voice
    pub adsr: Adsr,
    /// Peak level of a single unshaped voice
    pub gain: f32,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_len: 256,
            channels: 2,
            adsr: Adsr::flat(),
            gain: DEFAULT_GAIN,
        }
    }

    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn buffer_len(mut self, buffer_len: usize) -> Self {
        self.buffer_len = buffer_len;
        self
    }

    pub fn channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    pub fn adsr(mut self, adsr: Adsr) -> Self {
        self.adsr = adsr;
        self
    }

    pub fn gain(mut self, gain: f32) -> Self {
        self.gain = gain;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate);
        }
        if self.buffer_len == 0 {
            return Err(EngineError::InvalidBufferLength);
        }
        if self.channels == 0 {
            return Err(EngineError::InvalidChannelCount);
        }
        if !self.gain.is_finite() || self.gain < 0.0 {
            return Err(EngineError::InvalidGain(self.gain));
        }
        self.adsr.validate()
    }

    /// Duration of one render chunk in seconds.
    pub fn buffer_duration(&self) -> f64 {
        self.buffer_len as f64 / self.sample_rate as f64
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
