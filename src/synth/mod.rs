// Purpose: voice lifecycle, mixing, and the thread-facing engine API
// Sits on top of the read-only DSP tables in `dsp`

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod voice;

pub use config::EngineConfig;
pub use engine::{SynthEngine, SynthHandle};
pub use error::EngineError;
pub use registry::VoiceRegistry;
pub use voice::{Voice, VoiceState};
