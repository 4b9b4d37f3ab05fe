use std::path::PathBuf;

use blob_tracker::ConfigError;
use thiserror::Error;

/// Application-level failures.  Everything here is raised at startup or
/// while parsing input; frame processing itself cannot fail.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot access {path}: {source}")]
    Io {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    ConfigParse {
        path:   PathBuf,
        source: serde_json::Error,
    },

    #[error("bad detection frame on line {line}: {source}")]
    FrameParse {
        line:   usize,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Session(#[from] ConfigError),

    #[error("MIDI channel must be 1–16 (got {0})")]
    InvalidChannel(u8),

    #[error("controller number must be 0–127 (got {0})")]
    InvalidController(u8),

    #[error("frame rate must be at least 1 fps")]
    InvalidFrameRate,

    #[error("unknown command \"{0}\"")]
    UnknownCommand(String),

    #[error("MIDI: {0}")]
    Midi(String),
}
