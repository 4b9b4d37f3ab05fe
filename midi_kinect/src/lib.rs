//! # midi_kinect
//!
//! Runtime glue around [`blob_tracker`]: feeds it detection frames, applies
//! live commands, and sends the resulting events to a MIDI port.
//!
//! ## Inputs
//!
//! * **Replay file** (`--replay`) — JSON lines, one frame per line, each an
//!   array of `{"x", "y", "distance_mm"}` objects ordered largest blob first.
//!   A blank line is an empty frame.  Frames are paced at the configured
//!   frame rate.
//! * **stdin** — a sensor process can stream frames the same way (lines
//!   starting with `[`); every other line is a command.
//!
//! ## Commands
//!
//! | Command | Action |
//! |---|---|
//! | `mode <name>` | Switch scale preset (`chromatic`, `major`, `pentatonic-minor`, …) |
//! | `up` / `+` | Transpose up an octave |
//! | `down` / `-` | Transpose down an octave |
//! | `transpose <n>` | Transpose by `n` semitones |
//! | `near <mm>` / `far <mm>` | Move the velocity distance bounds |
//! | `channel <1-16>` | Change MIDI channel (held notes are released first) |
//! | `panic` | Release every sounding note |
//! | `status` | Log the current settings |
//! | `quit` | Release everything and exit |
//!
//! ## Output
//!
//! NoteOn / NoteOff on the configured channel, and a control change
//! (controller 74 by default) carrying the velocity while a blob holds
//! still.  With no hardware port available a virtual port named
//! `midiKinectOut` is opened where the platform supports it.

pub mod app;
pub mod config;
pub mod error;
pub mod output;
pub mod source;

pub use app::{App, Flow};
pub use config::AppConfig;
pub use error::AppError;
