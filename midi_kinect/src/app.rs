//! The run loop: input events in, MIDI out.

use std::path::Path;
use std::sync::mpsc::{self, Receiver};

use blob_tracker::{NoteEvent, Session, Slot, Voice};
use grid_scales::pitch_name;
use log::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::output::{clamp_pitch, open_midi_output, MidiOut};
use crate::source::{spawn_input_source, Command, CommandSource, InputEvent, ReplaySource};

/// Lowest velocity put on the wire for a NoteOn.  Control changes still
/// carry the full 0–127 range.
pub const MIN_NOTE_ON_VELOCITY: u8 = 1;

/// Whether the loop should keep going after an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// App
// ════════════════════════════════════════════════════════════════════════════

pub struct App<O: MidiOut> {
    session:    Session,
    out:        O,
    /// Wire channel, 0–15.
    channel:    u8,
    controller: u8,
}

impl<O: MidiOut> App<O> {
    pub fn new(config: &AppConfig, out: O) -> Result<Self, AppError> {
        let session = Session::new(config.session_config()?)?;
        Ok(App {
            session,
            out,
            channel:    config.midi.channel - 1,
            controller: config.midi.controller,
        })
    }

    /// Process one input event.
    pub fn handle(&mut self, event: InputEvent) -> Flow {
        match event {
            InputEvent::Frame(detections) => {
                let events = self.session.process_frame(&detections);
                self.send_all(&events);
                Flow::Continue
            }
            InputEvent::Command(cmd) => {
                if let Err(e) = self.apply(cmd) {
                    warn!("{}", e);
                }
                Flow::Continue
            }
            InputEvent::Quit => {
                self.shutdown();
                Flow::Quit
            }
        }
    }

    /// Apply a runtime command.  Invalid arguments leave the state as it was.
    pub fn apply(&mut self, cmd: Command) -> Result<(), AppError> {
        match cmd {
            Command::Mode(name)   => { self.session.select_mode_by_name(&name)?; }
            Command::Octave(n)    => self.session.transpose_octaves(n),
            Command::Transpose(n) => self.session.adjust_transpose(n),
            Command::Near(mm) => {
                let far = self.session.curve().far_mm();
                self.session.set_distance_bounds(mm, far)?;
            }
            Command::Far(mm) => {
                let near = self.session.curve().near_mm();
                self.session.set_distance_bounds(near, mm)?;
            }
            Command::Channel(ch) => {
                if !(1..=16).contains(&ch) {
                    return Err(AppError::InvalidChannel(ch));
                }
                // notes struck on the old channel must be released there
                self.release_all();
                self.channel = ch - 1;
                info!("MIDI channel → {}", ch);
            }
            Command::Panic  => self.release_all(),
            Command::Status => self.log_status(),
        }
        Ok(())
    }

    /// Release every sounding note.  Call before the output goes away.
    pub fn shutdown(&mut self) {
        info!("shutting down after {} frame(s)", self.session.frames());
        self.release_all();
    }

    /// Drain `rx` until a quit event or until every sender is gone.
    pub fn run(&mut self, rx: Receiver<InputEvent>) {
        for event in rx.iter() {
            if self.handle(event) == Flow::Quit {
                return;
            }
        }
        debug!("all input sources closed");
        self.shutdown();
    }

    fn release_all(&mut self) {
        let events = self.session.release_all();
        self.send_all(&events);
    }

    fn send_all(&mut self, events: &[NoteEvent]) {
        for event in events {
            self.send(event);
        }
    }

    fn send(&mut self, event: &NoteEvent) {
        match *event {
            NoteEvent::NoteOn { pitch, velocity, .. } => {
                // velocity 0 would read as a NoteOff on the wire
                self.out.note_on(self.channel, clamp_pitch(pitch), velocity.max(MIN_NOTE_ON_VELOCITY));
            }
            NoteEvent::NoteOff { pitch, .. } => {
                self.out.note_off(self.channel, clamp_pitch(pitch));
            }
            NoteEvent::ControlChange { value, .. } => {
                self.out.control_change(self.channel, self.controller, value);
            }
        }
    }

    fn log_status(&self) {
        let scale = self.session.scale();
        let curve = self.session.curve();
        info!(
            "mode {} transpose {:+} | velocity {}–{}mm | channel {} cc {} | {} frame(s)",
            scale.name(),
            scale.transpose(),
            curve.near_mm(),
            curve.far_mm(),
            self.channel + 1,
            self.controller,
            self.session.frames(),
        );
        for slot in Slot::ALL {
            if let Voice::Sounding { cell, pitch } = self.session.generator().voice(slot) {
                let vel = self.session.slots().get(slot).velocity;
                info!("  [{}] cell {:<2} {} ({}) vel {}", slot, cell, pitch_name(pitch), pitch, vel);
            }
        }
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session { &self.session }
    pub fn out(&self)     -> &O       { &self.out }
    pub fn out_mut(&mut self) -> &mut O { &mut self.out }
    /// 1-based, as configured.
    pub fn channel(&self) -> u8       { self.channel + 1 }
}

// ════════════════════════════════════════════════════════════════════════════
// run — wire up sources, port, and loop
// ════════════════════════════════════════════════════════════════════════════

/// Run until quit.  With a replay file, frames come from it and stdin only
/// carries commands; without one, stdin carries both and closing it quits.
pub fn run(config: &AppConfig, replay: Option<&Path>) -> Result<(), AppError> {
    // validate before touching any MIDI port
    config.session_config()?;

    let out = open_midi_output(config.midi.port.as_deref(), &config.midi.virtual_port);
    let mut app = App::new(config, out)?;

    let (tx, rx) = mpsc::channel();
    match replay {
        Some(path) => {
            let source = ReplaySource::from_path(path, config.replay.frame_rate, config.replay.repeat)?;
            spawn_input_source(source, tx.clone());
            spawn_input_source(CommandSource::stdin(false), tx);
        }
        None => {
            info!("reading frames and commands from stdin");
            spawn_input_source(CommandSource::stdin(true), tx);
        }
    }

    app.run(rx);
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingOut;
    use blob_tracker::Detection;

    fn app() -> App<RecordingOut> {
        App::new(&AppConfig::default(), RecordingOut::new()).unwrap()
    }

    fn frame_in(app: &App<RecordingOut>, cell: usize, distance_mm: f32) -> InputEvent {
        let (x, y) = app.session().grid().cell_center(cell);
        InputEvent::Frame(vec![Detection::new(x, y, distance_mm)])
    }

    #[test]
    fn frames_become_midi_bytes() {
        let mut app = app();
        let f = frame_in(&app, 7, 500.0);
        assert_eq!(app.handle(f.clone()), Flow::Continue);
        assert_eq!(app.handle(f), Flow::Continue);
        assert_eq!(app.handle(InputEvent::Frame(vec![])), Flow::Continue);
        assert_eq!(
            app.out_mut().take(),
            vec![vec![0x90, 57, 107], vec![0xB0, 74, 107], vec![0x80, 57, 0]]
        );
    }

    #[test]
    fn configured_channel_and_controller() {
        let mut config = AppConfig::default();
        config.midi.channel = 3;
        config.midi.controller = 1;
        let mut app = App::new(&config, RecordingOut::new()).unwrap();
        let f = frame_in(&app, 0, 500.0);
        app.handle(f.clone());
        app.handle(f);
        assert_eq!(app.out().messages, vec![vec![0x92, 64, 107], vec![0xB2, 1, 107]]);
    }

    #[test]
    fn transposed_pitch_is_clamped_on_the_wire() {
        let mut app = app();
        app.apply(Command::Transpose(100)).unwrap();
        let f = frame_in(&app, 0, 500.0);
        app.handle(f);
        assert_eq!(app.out().messages, vec![vec![0x90, 127, 107]]);
    }

    #[test]
    fn far_blob_strikes_audibly_and_streams_zero() {
        let mut app = app();
        let f = frame_in(&app, 0, 700.0);
        app.handle(f.clone());
        app.handle(f);
        assert_eq!(app.out().messages, vec![vec![0x90, 64, 1], vec![0xB0, 74, 0]]);
    }

    #[test]
    fn quit_releases_held_notes() {
        let mut app = app();
        let f = frame_in(&app, 12, 500.0);
        app.handle(f);
        app.out_mut().take();
        assert_eq!(app.handle(InputEvent::Quit), Flow::Quit);
        assert_eq!(app.out().messages, vec![vec![0x80, 52, 0]]);
    }

    #[test]
    fn channel_change_releases_on_the_old_channel() {
        let mut app = app();
        let f = frame_in(&app, 12, 500.0);
        app.handle(f.clone());
        app.out_mut().take();
        app.apply(Command::Channel(2)).unwrap();
        assert_eq!(app.channel(), 2);
        app.handle(f);
        assert_eq!(app.out().messages, vec![vec![0x80, 52, 0], vec![0x91, 52, 107]]);
    }

    #[test]
    fn bad_commands_leave_state_alone() {
        let mut app = app();
        assert!(matches!(app.apply(Command::Channel(0)), Err(AppError::InvalidChannel(0))));
        assert_eq!(app.channel(), 1);
        assert!(app.apply(Command::Mode("bebop".into())).is_err());
        assert_eq!(app.session().scale().name(), "chromatic");
        assert!(app.apply(Command::Near(900.0)).is_err());
        assert_eq!(app.session().curve().near_mm(), 472.0);
        // handle() logs and carries on
        assert_eq!(app.handle(InputEvent::Command(Command::Channel(99))), Flow::Continue);
    }

    #[test]
    fn commands_reach_the_session() {
        let mut app = app();
        app.apply(Command::Mode("major".into())).unwrap();
        app.apply(Command::Octave(-1)).unwrap();
        app.apply(Command::Far(700.0)).unwrap();
        app.apply(Command::Status).unwrap();
        assert_eq!(app.session().scale().name(), "major");
        assert_eq!(app.session().scale().transpose(), -12);
        assert_eq!(app.session().curve().far_mm(), 700.0);
    }

    #[test]
    fn run_drains_until_quit() {
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        tx.send(frame_in(&app, 0, 500.0)).unwrap();
        tx.send(InputEvent::Quit).unwrap();
        tx.send(frame_in(&app, 5, 500.0)).unwrap();
        app.run(rx);
        assert_eq!(app.out().messages, vec![vec![0x90, 64, 107], vec![0x80, 64, 0]]);
    }

    #[test]
    fn run_shuts_down_when_sources_close() {
        let mut app = app();
        let (tx, rx) = mpsc::channel();
        tx.send(frame_in(&app, 0, 500.0)).unwrap();
        drop(tx);
        app.run(rx);
        assert_eq!(app.out().messages.last(), Some(&vec![0x80, 64, 0]));
    }
}
