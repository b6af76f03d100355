//! Computer keyboard → note mapping.
//!
//! Two rows of a QWERTY keyboard laid out like a piano: the home row plays
//! the naturals, the row above plays the sharps.
//!
//! ```text
//!    w   e       t   y   u       o   p
//!  a   s   d   f   g   h   j   k   l   ;   '
//!  C3  D3  E3  F3  G3  A3  B3  C4  D4  E4  F4
//! ```
//!
//! `shift_up`/`shift_down` move the whole layout by an octave. This only
//! changes which note a key resolves to next time; voices that are already
//! sounding keep their note.

use crate::notes::NoteTable;
use crate::NOTE_SLOTS;

pub const DEFAULT_LAYOUT: [(char, &str); 18] = [
    ('a', "C3"),
    ('w', "C#3"),
    ('s', "D3"),
    ('e', "D#3"),
    ('d', "E3"),
    ('f', "F3"),
    ('t', "F#3"),
    ('g', "G3"),
    ('y', "G#3"),
    ('h', "A3"),
    ('u', "A#3"),
    ('j', "B3"),
    ('k', "C4"),
    ('o', "C#4"),
    ('l', "D4"),
    ('p', "D#4"),
    (';', "E4"),
    ('\'', "F4"),
];

const SEMITONES_PER_OCTAVE: i32 = 12;

pub struct KeyboardMapping {
    keys: Vec<(char, u8)>,
    available: [bool; NOTE_SLOTS],
    octave: i8,
}

impl KeyboardMapping {
    /// Default two-row layout, resolved against `notes`.
    pub fn new(notes: &NoteTable) -> Self {
        Self::with_layout(&DEFAULT_LAYOUT, notes)
    }

    /// Keys whose note name is not in the table are left unmapped.
    pub fn with_layout(layout: &[(char, &str)], notes: &NoteTable) -> Self {
        let keys = layout
            .iter()
            .filter_map(|&(key, name)| {
                let note = notes.by_name(name);
                if note.is_none() {
                    tracing::debug!(%key, note = name, "layout note not in table, key left unmapped");
                }
                note.map(|n| (key.to_ascii_lowercase(), n.id))
            })
            .collect();

        let mut available = [false; NOTE_SLOTS];
        for note in notes.iter() {
            available[note.id as usize] = true;
        }

        Self {
            keys,
            available,
            octave: 0,
        }
    }

    /// Note identity for `key` under the current octave shift.
    pub fn note_for(&self, key: char) -> Option<u8> {
        let key = key.to_ascii_lowercase();
        self.keys
            .iter()
            .find(|&&(k, _)| k == key)
            .and_then(|&(_, base)| self.shifted(base, self.octave))
    }

    /// Transpose the layout up an octave. Refused (returns `false`) if any
    /// key would leave the note table.
    pub fn shift_up(&mut self) -> bool {
        self.shift_by(1)
    }

    /// Transpose the layout down an octave. Refused (returns `false`) if any
    /// key would leave the note table.
    pub fn shift_down(&mut self) -> bool {
        self.shift_by(-1)
    }

    /// Apply `octaves` single-octave shifts, stopping at the first refusal.
    pub fn shift_octaves(&mut self, octaves: i8) -> bool {
        let step = octaves.signum();
        (0..octaves.unsigned_abs()).all(|_| self.shift_by(step))
    }

    fn shift_by(&mut self, step: i8) -> bool {
        let Some(target) = self.octave.checked_add(step) else {
            return false;
        };
        let fits = self
            .keys
            .iter()
            .all(|&(_, base)| self.shifted(base, target).is_some());
        if fits {
            self.octave = target;
        }
        fits
    }

    fn shifted(&self, base: u8, octave: i8) -> Option<u8> {
        let id = base as i32 + octave as i32 * SEMITONES_PER_OCTAVE;
        u8::try_from(id)
            .ok()
            .filter(|&id| self.available.get(id as usize).copied().unwrap_or(false))
    }

    pub fn octave_offset(&self) -> i8 {
        self.octave
    }

    pub fn keys(&self) -> impl Iterator<Item = char> + '_ {
        self.keys.iter().map(|&(k, _)| k)
    }
}
