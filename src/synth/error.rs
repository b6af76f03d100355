use thiserror::Error;

/// Construction and reconfiguration failures.
///
/// Rendering never fails: everything that can go wrong is rejected here,
/// before the audio thread sees it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    #[error("sample rate must be positive")]
    InvalidSampleRate,

    #[error("buffer length must be positive")]
    InvalidBufferLength,

    #[error("channel count must be positive")]
    InvalidChannelCount,

    #[error("{param} must be a non-negative number of seconds, got {value}")]
    InvalidAdsr { param: &'static str, value: f32 },

    #[error("{param} of {value} s is longer than an envelope table can hold")]
    EnvelopeTooLong { param: &'static str, value: f32 },

    #[error("sustain level must be within [0, 1], got {0}")]
    SustainOutOfRange(f32),

    #[error("gain must be a finite, non-negative level, got {0}")]
    InvalidGain(f32),

    #[error("note table is empty")]
    EmptyNoteTable,
}
