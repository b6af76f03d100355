//! Audio thread → UI statistics
//!
//! Sent over an rtrb ring once per callback; `Copy` and allocation-free.

pub const STATS_RING_LEN: usize = 64;

#[derive(Clone, Copy, Debug, Default)]
pub struct RenderStats {
    /// Held plus releasing voices after the callback
    pub active_voices: usize,
    /// Largest absolute sample in the callback buffer
    pub peak: f32,
}

impl RenderStats {
    pub fn measure(buffer: &[f32], active_voices: usize) -> Self {
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        Self {
            active_voices,
            peak,
        }
    }
}
