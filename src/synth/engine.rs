use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::{
    dsp::{envelope::EnvelopeTables, oscillator::WaveformCache, Adsr},
    notes::NoteTable,
    synth::{
        config::EngineConfig,
        error::EngineError,
        registry::{VoiceRegistry, VOICE_CAPACITY},
        voice::Voice,
    },
};

/*
Render Loop
===========

Two threads touch the engine:

  input thread   note_on / note_off, whenever a key moves
  audio thread   render, once per device callback, under a hard deadline

The only mutable shared state is the voice registry. The audio thread locks
it twice per buffer, briefly each time:

  1. lock → copy voices into a preallocated snapshot → unlock
  2. mix every voice from the snapshot (no lock held)
  3. lock → drop voices whose release tail is over → unlock

so a key press can delay a render by at most one short copy.


Per Voice, Per Buffer
---------------------

Indices are frames inside the current buffer, clamped to [0, frames]:

    begin    max(start, buffer_start)        first audible frame
    release  end_time (or frames if held)    first frame of the release tail
    end      end_time + release_time         first silent frame

      0        begin           release        end        frames
      |  silent  |  raw × AD curve  |  raw × release  | silent |

Both the waveform phase and the AD index are measured from `begin_time -
start_time`; the release index from `buffer_start - end_time`. Everything is
derived from absolute time, so back-to-back buffers join without seams.
*/

struct Shared {
    registry: VoiceRegistry,
    envelope: ArcSwap<EnvelopeTables>,
    waves: WaveformCache,
    sample_rate: u32,
}

/// Cloneable, thread-safe control surface for an engine.
///
/// Give one to the input thread; the engine itself lives on the audio
/// thread.
#[derive(Clone)]
pub struct SynthHandle {
    shared: Arc<Shared>,
}

impl SynthHandle {
    /// Start a voice for `note` at absolute device time `time`.
    ///
    /// Unknown notes and notes that are already held are ignored.
    pub fn note_on(&self, note: u8, time: f64) -> bool {
        if !self.shared.waves.contains(note) {
            tracing::trace!(note, "note-on for unknown note ignored");
            return false;
        }
        self.shared.registry.begin(note, time)
    }

    /// Release the held voice for `note` at absolute device time `time`.
    pub fn note_off(&self, note: u8, time: f64) -> bool {
        self.shared.registry.end(note, time)
    }

    pub fn all_notes_off(&self, time: f64) {
        self.shared.registry.end_all(time);
    }

    /// Replace the envelope. The new tables are built here, on the calling
    /// thread, and swapped in whole; a render already in flight finishes
    /// with the old ones.
    pub fn set_adsr(&self, adsr: Adsr) -> Result<(), EngineError> {
        let tables = EnvelopeTables::compute(adsr, self.shared.sample_rate)?;
        self.shared.envelope.store(Arc::new(tables));
        tracing::debug!(?adsr, "envelope replaced");
        Ok(())
    }

    pub fn adsr(&self) -> Adsr {
        self.shared.envelope.load().adsr()
    }

    /// Held plus releasing voices.
    pub fn active_voices(&self) -> usize {
        self.shared.registry.len()
    }

    pub fn is_held(&self, note: u8) -> bool {
        self.shared.registry.is_held(note)
    }

    /// Voices for `note`, held or still in their release tail.
    pub fn voices_for(&self, note: u8) -> usize {
        self.shared.registry.count_for(note)
    }
}

pub struct SynthEngine {
    config: EngineConfig,
    handle: SynthHandle,
    snapshot: Vec<Voice>,
    voice_buf: Vec<f32>,
    mix_buf: Vec<f32>,
}

impl SynthEngine {
    pub fn new(config: EngineConfig, notes: &NoteTable) -> Result<Self, EngineError> {
        config.validate()?;
        if notes.is_empty() {
            return Err(EngineError::EmptyNoteTable);
        }

        let envelope = EnvelopeTables::compute(config.adsr, config.sample_rate)?;
        let waves = WaveformCache::build(notes, config.gain, config.sample_rate, config.buffer_len);

        tracing::info!(
            sample_rate = config.sample_rate,
            buffer_len = config.buffer_len,
            channels = config.channels,
            notes = notes.len(),
            "synth engine ready"
        );

        let shared = Arc::new(Shared {
            registry: VoiceRegistry::new(),
            envelope: ArcSwap::from_pointee(envelope),
            waves,
            sample_rate: config.sample_rate,
        });

        Ok(Self {
            config,
            handle: SynthHandle { shared },
            snapshot: Vec::with_capacity(VOICE_CAPACITY),
            voice_buf: vec![0.0; config.buffer_len],
            mix_buf: vec![0.0; config.buffer_len],
        })
    }

    pub fn handle(&self) -> SynthHandle {
        self.handle.clone()
    }

    pub fn note_on(&self, note: u8, time: f64) -> bool {
        self.handle.note_on(note, time)
    }

    pub fn note_off(&self, note: u8, time: f64) -> bool {
        self.handle.note_off(note, time)
    }

    pub fn set_adsr(&self, adsr: Adsr) -> Result<(), EngineError> {
        self.handle.set_adsr(adsr)
    }

    pub fn active_voices(&self) -> usize {
        self.handle.active_voices()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fill an interleaved `frames × channels` buffer with the mix for the
    /// window starting at absolute device time `buffer_start`.
    ///
    /// Buffers longer than the configured buffer length are rendered in
    /// consecutive chunks.
    pub fn render(&mut self, out: &mut [f32], buffer_start: f64) {
        out.fill(0.0);

        let channels = self.config.channels;
        debug_assert_eq!(out.len() % channels, 0, "partial frame in output buffer");
        let total_frames = out.len() / channels;
        let sample_rate = self.config.sample_rate as f64;

        // One envelope pair for the whole callback.
        let envelope = self.handle.shared.envelope.load_full();

        let mut frames_written = 0;
        while frames_written < total_frames {
            let frames = (total_frames - frames_written).min(self.config.buffer_len);
            let chunk_start = buffer_start + frames_written as f64 / sample_rate;

            self.mix_chunk(frames, chunk_start, &envelope);

            // Same mono mix on every channel
            let out_off = frames_written * channels;
            let dest = &mut out[out_off..out_off + frames * channels];
            for (frame, &sample) in dest.chunks_exact_mut(channels).zip(&self.mix_buf[..frames]) {
                frame.fill(sample);
            }

            frames_written += frames;
        }
    }

    fn mix_chunk(&mut self, frames: usize, chunk_start: f64, envelope: &EnvelopeTables) {
        let Self {
            config,
            handle,
            snapshot,
            voice_buf,
            mix_buf,
        } = self;
        let shared = &handle.shared;
        let sample_rate = config.sample_rate as f64;
        let release_time = envelope.release_time();

        let mix = &mut mix_buf[..frames];
        mix.fill(0.0);

        shared.registry.snapshot_into(snapshot);

        let frame_at = |time: f64| {
            ((time - chunk_start) * sample_rate)
                .round()
                .clamp(0.0, frames as f64) as usize
        };

        for voice in snapshot.iter() {
            let begin_time = voice.start_time().max(chunk_start);
            let begin = frame_at(begin_time);
            let (release, end) = match voice.end_time() {
                None => (frames, frames),
                Some(end_time) => (frame_at(end_time), frame_at(end_time + release_time)),
            };
            let release = release.max(begin);
            let end = end.max(release);
            if begin == end {
                continue;
            }

            let elapsed = begin_time - voice.start_time();
            let Some(raw) = shared.waves.read(voice.note(), elapsed, end - begin) else {
                continue;
            };
            voice_buf[begin..end].copy_from_slice(raw);

            envelope.apply_attack_decay(elapsed, sample_rate, &mut voice_buf[begin..release]);
            if let Some(end_time) = voice.end_time().filter(|_| release < frames) {
                let since_release = (chunk_start - end_time).max(0.0);
                envelope.apply_release(since_release, sample_rate, &mut voice_buf[release..end]);
            }

            for (m, v) in mix[begin..end].iter_mut().zip(&voice_buf[begin..end]) {
                *m += v;
            }
        }

        shared
            .registry
            .reap(chunk_start, config.sample_rate, frames, release_time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::oscillator::triangle;

    const SR: u32 = 44_100;
    const A3: u8 = 57;

    fn engine(buffer_len: usize, adsr: Adsr) -> SynthEngine {
        let config = EngineConfig::new()
            .sample_rate(SR)
            .buffer_len(buffer_len)
            .channels(2)
            .adsr(adsr);
        SynthEngine::new(config, &NoteTable::standard()).unwrap()
    }

    fn frames(n: usize) -> f64 {
        n as f64 / SR as f64
    }

    fn expected(frequency: f64, t: f64) -> f32 {
        0.2 * triangle(frequency, t)
    }

    #[test]
    fn empty_engine_renders_silence() {
        let mut engine = engine(256, Adsr::flat());
        let mut out = vec![1.0f32; 512];
        engine.render(&mut out, 2.5);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn held_note_starts_mid_buffer() {
        let mut engine = engine(256, Adsr::flat());
        engine.note_on(A3, 2.5 + frames(128));

        let mut out = vec![0.0f32; 512];
        engine.render(&mut out, 2.5);

        for (i, frame) in out.chunks_exact(2).enumerate() {
            let want = if i < 128 {
                0.0
            } else {
                expected(220.0, frames(i - 128))
            };
            assert!((frame[0] - want).abs() < 0.01, "frame {i}: {} vs {want}", frame[0]);
            assert_eq!(frame[0], frame[1]);
        }
    }

    #[test]
    fn note_off_without_release_cuts_immediately() {
        let mut engine = engine(256, Adsr::flat());
        engine.note_on(A3, 2.5 + frames(128));
        engine.note_off(A3, 2.5 + frames(192));

        let mut out = vec![1.0f32; 512];
        engine.render(&mut out, 2.5);

        for (i, frame) in out.chunks_exact(2).enumerate() {
            let want = if (128..192).contains(&i) {
                expected(220.0, frames(i - 128))
            } else {
                0.0
            };
            assert!((frame[0] - want).abs() < 0.01, "frame {i}");
        }
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn oversized_callback_is_chunked() {
        let mut engine = engine(64, Adsr::flat());
        engine.note_on(A3, 1.0);

        // 300 frames at once with a 64-frame chunk size.
        let mut out = vec![0.0f32; 600];
        engine.render(&mut out, 1.0);

        for (i, frame) in out.chunks_exact(2).enumerate() {
            let want = expected(220.0, frames(i));
            assert!((frame[0] - want).abs() < 0.01, "frame {i}");
        }
    }

    #[test]
    fn voices_mix_additively() {
        let mut solo = engine(128, Adsr::flat());
        let mut duo = engine(128, Adsr::flat());
        solo.note_on(A3, 0.0);
        duo.note_on(A3, 0.0);
        duo.note_on(A3 + 12, 0.0);

        let mut a = vec![0.0f32; 256];
        let mut b = vec![0.0f32; 256];
        solo.render(&mut a, 0.0);
        duo.render(&mut b, 0.0);

        for (i, (x, y)) in a.chunks_exact(2).zip(b.chunks_exact(2)).enumerate() {
            let upper = expected(440.0, frames(i));
            assert!((y[0] - (x[0] + upper)).abs() < 0.02, "frame {i}");
        }
    }

    #[test]
    fn unknown_note_is_a_no_op() {
        let notes = NoteTable::parse("name,midi,freq\nA3,57,220.0\n").unwrap();
        let engine = SynthEngine::new(EngineConfig::new(), &notes).unwrap();
        assert!(!engine.note_on(60, 0.0));
        assert!(!engine.note_off(60, 0.1));
        assert_eq!(engine.active_voices(), 0);
    }

    #[test]
    fn construction_rejects_bad_config() {
        let notes = NoteTable::standard();
        assert!(matches!(
            SynthEngine::new(EngineConfig::new().channels(0), &notes),
            Err(EngineError::InvalidChannelCount)
        ));
        assert!(matches!(
            SynthEngine::new(EngineConfig::new(), &NoteTable::default()),
            Err(EngineError::EmptyNoteTable)
        ));
    }

    #[test]
    fn oversized_envelope_is_an_error() {
        let notes = NoteTable::standard();
        let endless = Adsr::new(0.0, 0.0, 1.0, f32::MAX);
        assert!(matches!(
            SynthEngine::new(EngineConfig::new().adsr(endless), &notes),
            Err(EngineError::EnvelopeTooLong { param: "release", .. })
        ));

        let engine = engine(256, Adsr::flat());
        assert!(matches!(
            engine.set_adsr(endless),
            Err(EngineError::EnvelopeTooLong { .. })
        ));
        assert_eq!(engine.handle().adsr(), Adsr::flat());
    }

    #[test]
    fn adsr_swap_applies_to_next_render() {
        let mut engine = engine(256, Adsr::flat());
        engine.note_on(A3, 0.0);
        engine.set_adsr(Adsr::new(0.0, 0.0, 0.5, 0.0)).unwrap();
        assert_eq!(engine.handle().adsr().sustain, 0.5);

        let mut out = vec![0.0f32; 512];
        engine.render(&mut out, 0.0);
        for (i, frame) in out.chunks_exact(2).enumerate() {
            let want = 0.5 * expected(220.0, frames(i));
            assert!((frame[0] - want).abs() < 0.01, "frame {i}");
        }

        assert!(engine.set_adsr(Adsr::new(0.0, 0.0, 2.0, 0.0)).is_err());
        assert_eq!(engine.handle().adsr().sustain, 0.5);
    }
}
