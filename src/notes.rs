//! Note table: the fixed mapping between note identity, name and frequency.
//!
//! Identities follow MIDI numbering (C4 = 60, A4 = 69 = 440 Hz). The table is
//! built once at startup, either from the standard twelve-tone layout or
//! parsed from a `name,midi,freq` CSV resource, and never changes afterwards.

use std::collections::HashMap;

use thiserror::Error;

const NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const CSV_HEADER: &str = "name,midi,freq";

/// Convert MIDI note number to frequency in Hz.
/// A4 = 440 Hz = MIDI note 69
#[inline]
pub fn midi_note_to_freq(note: u8) -> f32 {
    440.0 * 2.0_f32.powf((note as f32 - 69.0) / 12.0)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: u8,
    pub name: String,
    pub frequency: f32,
}

#[derive(Debug, Error, PartialEq)]
pub enum NoteTableError {
    #[error("note table is missing the `name,midi,freq` header")]
    MissingHeader,

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("line {line}: frequency must be positive, got {value}")]
    InvalidFrequency { line: usize, value: f32 },
}

#[derive(Debug, Clone, Default)]
pub struct NoteTable {
    notes: Vec<Note>,
    by_id: HashMap<u8, usize>,
    by_name: HashMap<String, usize>,
}

impl NoteTable {
    /// Equal-tempered notes from C-1 (0) up to G9 (127).
    pub fn standard() -> Self {
        let notes = (-1i32..=9)
            .flat_map(|octave| {
                NAMES.iter().enumerate().map(move |(idx, name)| {
                    let id = (octave + 1) * 12 + idx as i32;
                    (format!("{name}{octave}"), id)
                })
            })
            .filter(|&(_, id)| id <= 127)
            .map(|(name, id)| {
                let id = id as u8;
                Note {
                    id,
                    name,
                    frequency: midi_note_to_freq(id),
                }
            })
            .collect();

        Self::from_notes(notes)
    }

    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut table = Self::default();
        for note in notes {
            table.insert(note);
        }
        table
    }

    /// Parse the `name,midi,freq` CSV resource format.
    pub fn parse(text: &str) -> Result<Self, NoteTableError> {
        let mut lines = text.lines().enumerate().filter(|(_, l)| !l.trim().is_empty());

        match lines.next() {
            Some((_, header)) if header.trim() == CSV_HEADER => {}
            _ => return Err(NoteTableError::MissingHeader),
        }

        let mut table = Self::default();
        for (idx, raw) in lines {
            let line = idx + 1;
            let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
            let [name, midi, freq] = fields[..] else {
                return Err(NoteTableError::Malformed {
                    line,
                    reason: format!("expected 3 fields, found {}", fields.len()),
                });
            };

            let id = midi.parse::<u8>().ok().filter(|&id| id <= 127).ok_or_else(|| {
                NoteTableError::Malformed {
                    line,
                    reason: format!("invalid note number `{midi}`"),
                }
            })?;
            let frequency = freq.parse::<f32>().map_err(|_| NoteTableError::Malformed {
                line,
                reason: format!("invalid frequency `{freq}`"),
            })?;
            if !frequency.is_finite() || frequency <= 0.0 {
                return Err(NoteTableError::InvalidFrequency {
                    line,
                    value: frequency,
                });
            }

            table.insert(Note {
                id,
                name: name.to_string(),
                frequency,
            });
        }

        Ok(table)
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::from(CSV_HEADER);
        out.push('\n');
        for note in &self.notes {
            out.push_str(&format!("{},{},{}\n", note.name, note.id, note.frequency));
        }
        out
    }

    // Later entries replace earlier ones with the same id or name.
    fn insert(&mut self, note: Note) {
        if let Some(&idx) = self.by_id.get(&note.id) {
            self.by_name.remove(&self.notes[idx].name);
            self.by_name.insert(note.name.clone(), idx);
            self.notes[idx] = note;
            return;
        }
        let idx = self.notes.len();
        self.by_id.insert(note.id, idx);
        self.by_name.insert(note.name.clone(), idx);
        self.notes.push(note);
    }

    pub fn by_id(&self, id: u8) -> Option<&Note> {
        self.by_id.get(&id).map(|&idx| &self.notes[idx])
    }

    pub fn by_name(&self, name: &str) -> Option<&Note> {
        self.by_name.get(name).map(|&idx| &self.notes[idx])
    }

    pub fn contains(&self, id: u8) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_spans_c_minus_one_to_g9() {
        let table = NoteTable::standard();
        assert_eq!(table.len(), 128);
        assert_eq!(table.by_id(0).unwrap().name, "C-1");
        assert_eq!(table.by_id(127).unwrap().name, "G9");
    }

    #[test]
    fn reference_pitches() {
        let table = NoteTable::standard();
        assert_eq!(table.by_name("C4").unwrap().id, 60);
        assert!((table.by_name("A4").unwrap().frequency - 440.0).abs() < 1e-3);
        assert!((table.by_name("A3").unwrap().frequency - 220.0).abs() < 1e-3);
        assert!((table.by_name("A0").unwrap().frequency - 27.5).abs() < 1e-4);
    }

    #[test]
    fn csv_round_trip_keeps_lookups() {
        let table = NoteTable::standard();
        let csv = table.to_csv();
        assert_eq!(csv.lines().count(), table.len() + 1);
        assert!(csv.contains("\nA4,69,440\n"));

        let parsed = NoteTable::parse(&csv).unwrap();
        assert_eq!(parsed.len(), table.len());
        assert_eq!(parsed.by_name("F#2"), table.by_name("F#2"));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            NoteTable::parse("A4,69,440").unwrap_err(),
            NoteTableError::MissingHeader
        );
        assert!(matches!(
            NoteTable::parse("name,midi,freq\nA4,69\n"),
            Err(NoteTableError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            NoteTable::parse("name,midi,freq\nA4,200,440\n"),
            Err(NoteTableError::Malformed { line: 2, .. })
        ));
        assert!(matches!(
            NoteTable::parse("name,midi,freq\nA4,69,-1\n"),
            Err(NoteTableError::InvalidFrequency { line: 2, .. })
        ));
    }
}
