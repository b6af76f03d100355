//! Terminal keyboard input
//!
//! Raw-mode crossterm loop: key presses and releases become note-on /
//! note-off on the engine handle, arrows shift the octave, and the latest
//! render stats are shown on a single status line.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::{
    cursor::MoveToColumn,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
        KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use rtrb::Consumer;

use keysynth::{io::KeyboardMapping, synth::SynthHandle};

use super::clock::StreamClock;
use super::stats::RenderStats;

/// Input poll interval; also bounds auto-release lateness.
const POLL_INTERVAL: Duration = Duration::from_millis(10);
const STATUS_INTERVAL: Duration = Duration::from_millis(50);

/// Restores the terminal even when the loop bails out with an error.
struct RawTerminal {
    enhanced: bool,
}

impl RawTerminal {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let enhanced = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced {
            execute!(
                io::stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }
        Ok(Self { enhanced })
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        if self.enhanced {
            let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = terminal::disable_raw_mode();
        println!();
    }
}

struct InputLoop {
    handle: SynthHandle,
    mapping: KeyboardMapping,
    clock: StreamClock,
    stats_rx: Consumer<RenderStats>,
    stats: RenderStats,
    /// Notes waiting for a synthetic release (terminals without release events)
    pending: Vec<(u8, Instant)>,
    gate: Duration,
    reports_release: bool,
}

pub fn run(
    handle: SynthHandle,
    mapping: KeyboardMapping,
    clock: StreamClock,
    stats_rx: Consumer<RenderStats>,
    gate: Duration,
) -> EyreResult<()> {
    let terminal = RawTerminal::enter()?;
    if !terminal.enhanced {
        tracing::warn!(
            gate = gate.as_secs_f64(),
            "terminal does not report key releases, notes auto-release"
        );
    }

    let mut input = InputLoop {
        handle,
        mapping,
        clock,
        stats_rx,
        stats: RenderStats::default(),
        pending: Vec::new(),
        gate,
        reports_release: terminal.enhanced,
    };
    input.run()
}

impl InputLoop {
    fn run(&mut self) -> EyreResult<()> {
        let mut stdout = io::stdout();
        let mut last_status = Instant::now()
            .checked_sub(STATUS_INTERVAL)
            .unwrap_or_else(Instant::now);

        loop {
            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if self.is_quit(&key) {
                        break;
                    }
                    self.handle_key(key);
                }
            }

            self.release_expired();

            while let Ok(stats) = self.stats_rx.pop() {
                self.stats = stats;
            }
            if last_status.elapsed() >= STATUS_INTERVAL {
                self.draw_status(&mut stdout)?;
                last_status = Instant::now();
            }
        }

        self.handle.all_notes_off(self.clock.now());
        Ok(())
    }

    fn is_quit(&self, key: &KeyEvent) -> bool {
        key.kind == KeyEventKind::Press
            && (key.code == KeyCode::Esc
                || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)))
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match (key.code, key.kind) {
            (KeyCode::Up, KeyEventKind::Press) => {
                if !self.mapping.shift_up() {
                    tracing::debug!("already at the top octave");
                }
            }
            (KeyCode::Down, KeyEventKind::Press) => {
                if !self.mapping.shift_down() {
                    tracing::debug!("already at the bottom octave");
                }
            }
            (KeyCode::Char(c), kind) => {
                let Some(note) = self.mapping.note_for(c) else {
                    return;
                };
                match kind {
                    KeyEventKind::Press | KeyEventKind::Repeat => self.press(note),
                    KeyEventKind::Release => {
                        self.handle.note_off(note, self.clock.now());
                    }
                }
            }
            _ => {}
        }
    }

    fn press(&mut self, note: u8) {
        self.handle.note_on(note, self.clock.now());
        if self.reports_release {
            return;
        }
        // Autorepeat keeps pushing the deadline out while the key is down.
        let deadline = Instant::now() + self.gate;
        match self.pending.iter_mut().find(|(n, _)| *n == note) {
            Some(entry) => entry.1 = deadline,
            None => self.pending.push((note, deadline)),
        }
    }

    fn release_expired(&mut self) {
        let now = Instant::now();
        let handle = &self.handle;
        let clock = self.clock;
        self.pending.retain(|&(note, deadline)| {
            if deadline > now {
                return true;
            }
            handle.note_off(note, clock.now());
            false
        });
    }

    fn draw_status(&self, stdout: &mut io::Stdout) -> io::Result<()> {
        let status = format!(
            "octave {:+}  voices {:>3}  peak {:.2}   [keys a-']  [up/down] octave  [esc] quit",
            self.mapping.octave_offset(),
            self.stats.active_voices,
            self.stats.peak,
        );
        queue!(
            stdout,
            MoveToColumn(0),
            Clear(ClearType::CurrentLine),
            Print(status)
        )?;
        stdout.flush()
    }
}
