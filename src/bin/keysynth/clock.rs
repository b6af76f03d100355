//! One seconds axis shared by key events and the audio callback.

use std::time::Instant;

/// Playback drift (seconds) beyond which the timeline re-anchors, e.g.
/// after an underrun.
const RESYNC_THRESHOLD: f64 = 0.05;

/// Monotonic clock; `Copy` so both threads can hold one.
#[derive(Clone, Copy)]
pub struct StreamClock {
    origin: Instant,
}

impl StreamClock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Seconds since the clock started. Key events are stamped with this.
    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }

    /// When the buffer handed to this callback will reach the speaker.
    pub fn playback_time(&self, info: &cpal::OutputCallbackInfo) -> f64 {
        let timestamp = info.timestamp();
        let latency = timestamp
            .playback
            .duration_since(&timestamp.callback)
            .unwrap_or_default();
        self.now() + latency.as_secs_f64()
    }
}

/// Turns jittery per-callback measurements into contiguous buffer windows.
///
/// Buffer `n` starts where buffer `n - 1` ended, counted in frames from the
/// first callback, so held notes stay phase-continuous. A measurement that
/// strays too far from that count re-anchors the timeline.
pub struct Timeline {
    sample_rate: f64,
    anchor: Option<f64>,
    frames: u64,
}

impl Timeline {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate as f64,
            anchor: None,
            frames: 0,
        }
    }

    /// Start time of the next buffer of `frames` frames.
    pub fn next(&mut self, measured: f64, frames: usize) -> f64 {
        let start = match self.anchor {
            Some(anchor) => anchor + self.frames as f64 / self.sample_rate,
            None => measured,
        };

        let start = if self.anchor.is_none() || (measured - start).abs() > RESYNC_THRESHOLD {
            self.anchor = Some(measured);
            self.frames = 0;
            measured
        } else {
            start
        };

        self.frames += frames as u64;
        start
    }
}
