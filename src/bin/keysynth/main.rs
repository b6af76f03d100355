//! keysynth - play the triangle synth from the computer keyboard
//!
//! Run with: cargo run --release -- --attack 0.05 --release 1.0

mod app;
mod clock;
mod input;
mod stats;

use std::path::PathBuf;

use app::Keysynth;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Realtime polyphonic keyboard synthesizer
#[derive(Parser, Debug)]
#[command(name = "keysynth", version)]
pub struct Args {
    /// Attack time in seconds
    #[arg(long, default_value_t = 0.7)]
    pub attack: f32,

    /// Decay time in seconds
    #[arg(long, default_value_t = 0.2)]
    pub decay: f32,

    /// Sustain level (0.0 - 1.0)
    #[arg(long, default_value_t = 0.5)]
    pub sustain: f32,

    /// Release time in seconds
    #[arg(long, default_value_t = 4.0)]
    pub release: f32,

    /// Render chunk size in frames
    #[arg(long, default_value_t = 1024)]
    pub buffer: usize,

    /// Peak level of a single voice
    #[arg(long, default_value_t = keysynth::DEFAULT_GAIN)]
    pub gain: f32,

    /// Initial octave shift of the keyboard layout
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub octave: i8,

    /// Seconds before a key auto-releases on terminals that cannot report
    /// key releases
    #[arg(long, default_value_t = 0.6)]
    pub gate: f64,

    /// Note table CSV (`name,midi,freq`); defaults to the built-in table
    #[arg(long)]
    pub notes: Option<PathBuf>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    Keysynth::from_args(&args)?.run()
}
