//! JSON configuration file.
//!
//! Every field has a default matching the reference setup, so a config file
//! only needs the values it changes:
//!
//! ```json
//! { "scale": { "mode": "pentatonic-minor" }, "midi": { "channel": 2 } }
//! ```

use std::fs;
use std::path::Path;

use blob_tracker::{GridSpec, Mode, SessionConfig, VelocityCurve};
use grid_scales::DEFAULT_ROOT;
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub grid:     GridConfig,
    pub scale:    ScaleConfig,
    pub velocity: VelocityConfig,
    pub midi:     MidiConfig,
    pub replay:   ReplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns:      u32,
    pub rows:         u32,
    pub plane_width:  u32,
    pub plane_height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleConfig {
    /// Preset name, see [`Mode::from_name`].
    pub mode:      String,
    /// Pitch of the bottom-right cell.
    pub root:      i32,
    pub transpose: i32,
    /// Explicit per-cell pitches; replaces the preset when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitches:   Option<Vec<i32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VelocityConfig {
    pub near_mm: f32,
    pub far_mm:  f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// 1–16, as printed on hardware.
    pub channel:      u8,
    /// Controller number for the held-note velocity stream.
    pub controller:   u8,
    /// Substring of the output port name to prefer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port:         Option<String>,
    /// Name of the virtual port opened when no hardware port exists.
    pub virtual_port: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    pub frame_rate: u32,
    /// Start over at the end of the replay file instead of quitting.
    pub repeat:     bool,
}

// ── defaults ─────────────────────────────────────────────────────────────────

impl Default for GridConfig {
    fn default() -> Self {
        let g = GridSpec::default();
        GridConfig {
            columns:      g.columns(),
            rows:         g.rows(),
            plane_width:  g.plane_width(),
            plane_height: g.plane_height(),
        }
    }
}

impl Default for ScaleConfig {
    fn default() -> Self {
        ScaleConfig {
            mode:      Mode::Chromatic.name().to_string(),
            root:      DEFAULT_ROOT,
            transpose: 0,
            pitches:   None,
        }
    }
}

impl Default for VelocityConfig {
    fn default() -> Self {
        VelocityConfig {
            near_mm: VelocityCurve::DEFAULT_NEAR_MM,
            far_mm:  VelocityCurve::DEFAULT_FAR_MM,
        }
    }
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig {
            channel:      1,
            controller:   74,
            port:         None,
            virtual_port: "midiKinectOut".to_string(),
        }
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig { frame_rate: 60, repeat: false }
    }
}

// ── load / save / validate ───────────────────────────────────────────────────

impl AppConfig {
    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Read `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, AppError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        fs::write(path, self.to_json()).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn to_json(&self) -> String {
        // plain data with string keys: serialization cannot fail
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Check the application-level fields and build the tracker config.
    pub fn session_config(&self) -> Result<SessionConfig, AppError> {
        self.validate()?;
        let grid = GridSpec::new(
            self.grid.columns,
            self.grid.rows,
            self.grid.plane_width,
            self.grid.plane_height,
        )
        .map_err(blob_tracker::ConfigError::from)?;
        let mode = Mode::from_name(&self.scale.mode).map_err(blob_tracker::ConfigError::from)?;

        Ok(SessionConfig {
            grid,
            mode,
            root:      self.scale.root,
            pitches:   self.scale.pitches.clone(),
            transpose: self.scale.transpose,
            near_mm:   self.velocity.near_mm,
            far_mm:    self.velocity.far_mm,
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=16).contains(&self.midi.channel) {
            return Err(AppError::InvalidChannel(self.midi.channel));
        }
        if self.midi.controller > 127 {
            return Err(AppError::InvalidController(self.midi.controller));
        }
        if self.replay.frame_rate == 0 {
            return Err(AppError::InvalidFrameRate);
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
