//! MIDI output — abstraction over midir, a null sink, and a recorder.
//!
//! Channels passed to [`MidiOut`] are wire channels (0–15) and are masked;
//! pitches arrive unclamped from the tracker and go through [`clamp_pitch`]
//! before they reach the port.

use log::{info, warn};

use crate::error::AppError;

const CLIENT_NAME:     &str = "midi_kinect";
const CONNECTION_NAME: &str = "midi_kinect-out";

/// Squeeze a transposed pitch into the 0–127 MIDI range.
///
/// Clamped pitches can collide, so a NoteOff for one may end another
/// slot's note; a warning is logged whenever clamping kicks in.
pub fn clamp_pitch(pitch: i32) -> u8 {
    let clamped = pitch.clamp(0, 127);
    if clamped != pitch {
        warn!("pitch {} outside 0–127, sending {}; reduce the transpose", pitch, clamped);
    }
    clamped as u8
}

// ════════════════════════════════════════════════════════════════════════════
// MidiOut trait
// ════════════════════════════════════════════════════════════════════════════

pub trait MidiOut: Send {
    /// Send one raw message.  Failures are logged, never fatal.
    fn send(&mut self, message: &[u8]);

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        self.send(&[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]);
    }

    fn note_off(&mut self, channel: u8, note: u8) {
        self.send(&[0x80 | (channel & 0x0F), note & 0x7F, 0]);
    }

    fn control_change(&mut self, channel: u8, controller: u8, value: u8) {
        self.send(&[0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]);
    }
}

impl<T: MidiOut + ?Sized> MidiOut for Box<T> {
    fn send(&mut self, message: &[u8]) {
        (**self).send(message)
    }
}

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, message: &[u8]) {
        if let Err(e) = self.conn.send(message) {
            warn!("MIDI send failed: {}", e);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

pub struct NullOut;

impl MidiOut for NullOut {
    fn send(&mut self, _message: &[u8]) {}
}

// ── recorder (tests, dry runs) ────────────────────────────────────────────

/// Keeps every message it is given.
#[derive(Debug, Default)]
pub struct RecordingOut {
    pub messages: Vec<Vec<u8>>,
}

impl RecordingOut {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.messages)
    }
}

impl MidiOut for RecordingOut {
    fn send(&mut self, message: &[u8]) {
        self.messages.push(message.to_vec());
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Pick a port index from `names`.
///
/// A `preferred` substring wins (case-insensitive).  Otherwise a visible
/// softsynth is preferred, then the first port.  `None` if there are no
/// ports or the preferred one is missing.
pub fn choose_port(names: &[String], preferred: Option<&str>) -> Option<usize> {
    if let Some(wanted) = preferred {
        let wanted = wanted.to_lowercase();
        return names.iter().position(|n| n.to_lowercase().contains(&wanted));
    }
    if names.is_empty() {
        return None;
    }
    let synth = names.iter().position(|n| {
        let n = n.to_lowercase();
        n.contains("fluid") || n.contains("timidity") || n.contains("synth")
    });
    Some(synth.unwrap_or(0))
}

/// Names of every visible MIDI output port.
pub fn list_ports() -> Result<Vec<String>, AppError> {
    let midi_out = midir::MidiOutput::new(CLIENT_NAME).map_err(|e| AppError::Midi(e.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

/// Open the best available output.
///
/// With no hardware port a virtual port called `virtual_name` is created
/// where the platform allows it; failing everything, output goes to
/// [`NullOut`] with a warning.
pub fn open_midi_output(preferred: Option<&str>, virtual_name: &str) -> Box<dyn MidiOut> {
    let midi_out = match midir::MidiOutput::new(CLIENT_NAME) {
        Ok(m)  => m,
        Err(e) => {
            warn!("MIDI init error: {} — using null output", e);
            return Box::new(NullOut);
        }
    };

    let ports = midi_out.ports();
    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();

    match choose_port(&names, preferred) {
        Some(idx) => {
            info!("opening MIDI port: {}", names[idx]);
            match midi_out.connect(&ports[idx], CONNECTION_NAME) {
                Ok(conn) => Box::new(MidirOut { conn }),
                Err(e) => {
                    warn!("failed to connect: {} — using null output", e);
                    Box::new(NullOut)
                }
            }
        }
        None => {
            if let Some(wanted) = preferred {
                warn!("no MIDI port matching \"{}\" (have: {:?})", wanted, names);
            }
            open_virtual(midi_out, virtual_name)
        }
    }
}

#[cfg(unix)]
fn open_virtual(midi_out: midir::MidiOutput, name: &str) -> Box<dyn MidiOut> {
    use midir::os::unix::VirtualOutput;

    match midi_out.create_virtual(name) {
        Ok(conn) => {
            info!("opened virtual MIDI port: {}", name);
            Box::new(MidirOut { conn })
        }
        Err(e) => {
            warn!("cannot create virtual port {}: {} — using null output", name, e);
            Box::new(NullOut)
        }
    }
}

#[cfg(not(unix))]
fn open_virtual(_midi_out: midir::MidiOutput, name: &str) -> Box<dyn MidiOut> {
    warn!("no MIDI output ports and virtual port {} unsupported here — using null output", name);
    Box::new(NullOut)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
