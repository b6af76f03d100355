//! Keysynth - device setup and the audio callback

use std::time::Duration;

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;

use keysynth::{
    dsp::Adsr,
    io::KeyboardMapping,
    notes::NoteTable,
    synth::{EngineConfig, SynthEngine},
};

use super::clock::{StreamClock, Timeline};
use super::input;
use super::stats::{RenderStats, STATS_RING_LEN};
use super::Args;

pub struct Keysynth {
    config: EngineConfig,
    notes: NoteTable,
    octave: i8,
    gate: Duration,
}

impl Keysynth {
    pub fn from_args(args: &Args) -> EyreResult<Self> {
        let notes = match &args.notes {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .wrap_err_with(|| format!("failed to read note table {}", path.display()))?;
                NoteTable::parse(&text)
                    .wrap_err_with(|| format!("failed to parse note table {}", path.display()))?
            }
            None => NoteTable::standard(),
        };

        if !args.gate.is_finite() || args.gate <= 0.0 {
            return Err(eyre!("--gate must be a positive number of seconds"));
        }

        let config = EngineConfig::new()
            .buffer_len(args.buffer)
            .gain(args.gain)
            .adsr(Adsr::new(args.attack, args.decay, args.sustain, args.release));
        config.validate().wrap_err("invalid synth configuration")?;

        Ok(Self {
            config,
            notes,
            octave: args.octave,
            gate: Duration::from_secs_f64(args.gate),
        })
    }

    /// Open the default output device and play until the user quits.
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let supported = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(eyre!(
                "keysynth requires an f32 output device, found {:?}",
                supported.sample_format()
            ));
        }

        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels() as usize;
        let config = self.config.sample_rate(sample_rate).channels(channels);

        tracing::info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
            "opening output stream"
        );

        let mut engine =
            SynthEngine::new(config, &self.notes).wrap_err("invalid synth configuration")?;
        let handle = engine.handle();
        let clock = StreamClock::start();
        let (stats_tx, stats_rx) = RingBuffer::<RenderStats>::new(STATS_RING_LEN);

        let stream = device
            .build_output_stream(
                &supported.into(),
                {
                    let mut stats_tx = stats_tx;
                    let mut timeline = Timeline::new(sample_rate);
                    move |data: &mut [f32], info: &cpal::OutputCallbackInfo| {
                        let frames = data.len() / channels;
                        let buffer_start = timeline.next(clock.playback_time(info), frames);
                        engine.render(data, buffer_start);

                        // UI is best-effort: drop stats when the ring is full
                        let _ = stats_tx.push(RenderStats::measure(data, engine.active_voices()));
                    }
                },
                |err| tracing::error!(%err, "audio stream error"),
                None,
            )
            .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;

        let mut mapping = KeyboardMapping::new(&self.notes);
        if !mapping.shift_octaves(self.octave) {
            tracing::warn!(
                requested = self.octave,
                applied = mapping.octave_offset(),
                "octave shift clamped to the note table"
            );
        }

        input::run(handle, mapping, clock, stats_rx, self.gate)
    }
}
