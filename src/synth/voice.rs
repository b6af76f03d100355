#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Held,     // Key down, envelope in attack/decay/sustain
    Released, // Key up, release tail still sounding
}

/// One sounding instance of a note.
///
/// Times are absolute device-clock seconds. A voice carries no oscillator
/// or envelope state; both are derived from these times at render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voice {
    note: u8,
    start_time: f64,
    end_time: Option<f64>,
}

impl Voice {
    pub fn new(note: u8, start_time: f64) -> Self {
        Self {
            note,
            start_time,
            end_time: None,
        }
    }

    /// Held → Released. A voice that is already released keeps its first
    /// end time.
    pub fn release(&mut self, end_time: f64) {
        if self.end_time.is_none() {
            self.end_time = Some(end_time);
        }
    }

    /// True once the release tail ends strictly before `time`.
    pub fn expired_before(&self, time: f64, release: f64) -> bool {
        self.end_time.is_some_and(|end| end + release < time)
    }

    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> Option<f64> {
        self.end_time
    }

    pub fn state(&self) -> VoiceState {
        match self.end_time {
            None => VoiceState::Held,
            Some(_) => VoiceState::Released,
        }
    }
}
