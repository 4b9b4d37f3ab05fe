//! One performance: grid, scale, tracker, note state, and the previous frame.

use cell_grid::GridSpec;
use grid_scales::{Mode, ScaleTable, DEFAULT_ROOT};
use log::{debug, info};

use crate::detection::Detection;
use crate::events::{EventGenerator, NoteEvent};
use crate::slot::Snapshot;
use crate::tracker::Tracker;
use crate::velocity::VelocityCurve;
use crate::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// SessionConfig
// ════════════════════════════════════════════════════════════════════════════

/// Everything needed to start a [`Session`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub grid:      GridSpec,
    pub mode:      Mode,
    /// Pitch of the last cell before transposition.
    pub root:      i32,
    /// Hand-written per-cell pitches; overrides `mode` when set.
    pub pitches:   Option<Vec<i32>>,
    pub transpose: i32,
    pub near_mm:   f32,
    pub far_mm:    f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            grid:      GridSpec::default(),
            mode:      Mode::Chromatic,
            root:      DEFAULT_ROOT,
            pitches:   None,
            transpose: 0,
            near_mm:   VelocityCurve::DEFAULT_NEAR_MM,
            far_mm:    VelocityCurve::DEFAULT_FAR_MM,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// Owns all mutable tracking state.  Feed it one frame at a time from a
/// single thread.
#[derive(Clone, Debug)]
pub struct Session {
    tracker:   Tracker,
    scale:     ScaleTable,
    generator: EventGenerator,
    previous:  Snapshot,
    frames:    u64,
}

impl Session {
    /// Validate `config` and start with every slot silent.
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        let cells = config.grid.cell_count();
        let mut scale = match config.pitches {
            Some(pitches) => ScaleTable::custom(pitches, cells)?,
            None          => ScaleTable::from_mode(config.mode, cells, config.root),
        };
        scale.adjust_transpose(config.transpose);
        let curve = VelocityCurve::new(config.near_mm, config.far_mm)?;

        info!(
            "session: {}×{} grid over {}×{}, mode {}, transpose {:+}, velocity {}–{}mm",
            config.grid.columns(),
            config.grid.rows(),
            config.grid.plane_width(),
            config.grid.plane_height(),
            scale.name(),
            scale.transpose(),
            curve.near_mm(),
            curve.far_mm(),
        );

        Ok(Session {
            tracker:   Tracker::new(config.grid, curve),
            scale,
            generator: EventGenerator::new(),
            previous:  Snapshot::default(),
            frames:    0,
        })
    }

    // ── per frame ─────────────────────────────────────────────────────────

    /// Track this frame's detections and return the resulting events.
    ///
    /// `detections` should be ordered largest first; the first two are used.
    pub fn process_frame(&mut self, detections: &[Detection]) -> Vec<NoteEvent> {
        let current = self.tracker.update(detections, &self.previous);
        let events  = self.generator.emit(&current, &self.scale);
        for event in &events {
            debug!("frame {}: {}", self.frames, event);
        }
        self.previous = current;
        self.frames += 1;
        events
    }

    /// NoteOff for everything still sounding, and forget the last frame so
    /// the next one starts from silence.
    pub fn release_all(&mut self) -> Vec<NoteEvent> {
        self.previous = Snapshot::default();
        let events = self.generator.release_all();
        if !events.is_empty() {
            info!("released {} sounding note(s)", events.len());
        }
        events
    }

    // ── runtime controls ──────────────────────────────────────────────────

    /// Switch presets.  Held notes keep their pitch; the next strike uses
    /// the new table.
    pub fn select_mode(&mut self, mode: Mode) {
        self.scale.select_mode(mode);
        info!("mode → {}", mode);
    }

    pub fn select_mode_by_name(&mut self, name: &str) -> Result<Mode, ConfigError> {
        let mode = Mode::from_name(name)?;
        self.select_mode(mode);
        Ok(mode)
    }

    pub fn adjust_transpose(&mut self, delta: i32) {
        self.scale.adjust_transpose(delta);
        info!("transpose → {:+}", self.scale.transpose());
    }

    /// Transpose by whole octaves (±12 semitones per step).
    pub fn transpose_octaves(&mut self, steps: i32) {
        self.adjust_transpose(steps * 12);
    }

    pub fn set_distance_bounds(&mut self, near_mm: f32, far_mm: f32) -> Result<(), ConfigError> {
        self.tracker.set_curve(VelocityCurve::new(near_mm, far_mm)?);
        info!("velocity range → {}–{}mm", near_mm, far_mm);
        Ok(())
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn grid(&self)      -> &GridSpec       { self.tracker.grid() }
    pub fn curve(&self)     -> &VelocityCurve  { self.tracker.curve() }
    pub fn scale(&self)     -> &ScaleTable     { &self.scale }
    pub fn generator(&self) -> &EventGenerator { &self.generator }
    /// State of every slot after the last processed frame.
    pub fn slots(&self)     -> &Snapshot       { &self.previous }
    pub fn frames(&self)    -> u64             { self.frames }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
