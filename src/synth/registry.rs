//! The set of sounding voices, shared by the input and render threads.
//!
//! Every operation takes the lock for a bounded amount of bookkeeping only.
//! The renderer copies the voices out with [`VoiceRegistry::snapshot_into`]
//! and does all per-sample work on that copy with the lock released.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::voice::Voice;
use crate::NOTE_SLOTS;

/// Upper bound on simultaneous voices: one held voice per note slot plus
/// [`MAX_TAILS`] release tails. Snapshot scratch sized to this never grows.
pub const VOICE_CAPACITY: usize = 256;

/// Release tails kept at once. Releasing past this steals the oldest tail.
pub const MAX_TAILS: usize = VOICE_CAPACITY - NOTE_SLOTS;

#[derive(Default)]
struct Voices {
    held: BTreeMap<u8, Voice>,
    released: Vec<Voice>,
}

impl Voices {
    fn push_tail(&mut self, voice: Voice) {
        if self.released.len() >= MAX_TAILS {
            // Steal the tail released earliest.
            let oldest = self
                .released
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.end_time()
                        .partial_cmp(&b.end_time())
                        .unwrap_or(Ordering::Equal)
                })
                .map(|(idx, _)| idx);
            if let Some(idx) = oldest {
                self.released.remove(idx);
            }
        }
        self.released.push(voice);
    }
}

pub struct VoiceRegistry {
    voices: Mutex<Voices>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self {
            voices: Mutex::new(Voices {
                held: BTreeMap::new(),
                released: Vec::with_capacity(MAX_TAILS),
            }),
        }
    }

    /// Start a held voice for `note`. A note that is already held is left
    /// alone. A note whose earlier voice is still in its release tail gets a
    /// fresh voice next to the tailing one.
    pub fn begin(&self, note: u8, start_time: f64) -> bool {
        let mut voices = self.voices.lock();
        if voices.held.contains_key(&note) {
            return false;
        }
        voices.held.insert(note, Voice::new(note, start_time));
        true
    }

    /// Move the held voice for `note` into its release tail.
    pub fn end(&self, note: u8, end_time: f64) -> bool {
        let mut voices = self.voices.lock();
        let Some(mut voice) = voices.held.remove(&note) else {
            return false;
        };
        voice.release(end_time);
        voices.push_tail(voice);
        true
    }

    /// Copy every held and released voice into `out`, replacing its contents.
    pub fn snapshot_into(&self, out: &mut Vec<Voice>) {
        out.clear();
        let voices = self.voices.lock();
        out.extend(voices.held.values().copied());
        out.extend(voices.released.iter().copied());
    }

    pub fn snapshot(&self) -> Vec<Voice> {
        let mut out = Vec::new();
        self.snapshot_into(&mut out);
        out
    }

    /// Drop released voices whose tail ends before the end of the buffer
    /// window `[buffer_start, buffer_start + frames / sample_rate)`.
    ///
    /// Returns how many voices were removed.
    pub fn reap(&self, buffer_start: f64, sample_rate: u32, frames: usize, release: f64) -> usize {
        let buffer_end = buffer_start + frames as f64 / sample_rate as f64;
        let mut voices = self.voices.lock();
        let before = voices.released.len();
        voices
            .released
            .retain(|voice| !voice.expired_before(buffer_end, release));
        before - voices.released.len()
    }

    /// Release every held voice at `end_time`.
    pub fn end_all(&self, end_time: f64) {
        let mut voices = self.voices.lock();
        for (_, mut voice) in std::mem::take(&mut voices.held) {
            voice.release(end_time);
            voices.push_tail(voice);
        }
    }

    pub fn is_held(&self, note: u8) -> bool {
        self.voices.lock().held.contains_key(&note)
    }

    /// Held plus released voices for `note`.
    pub fn count_for(&self, note: u8) -> usize {
        let voices = self.voices.lock();
        usize::from(voices.held.contains_key(&note))
            + voices.released.iter().filter(|v| v.note() == note).count()
    }

    pub fn len(&self) -> usize {
        let voices = self.voices.lock();
        voices.held.len() + voices.released.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for VoiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
