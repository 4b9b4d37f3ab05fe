//! # grid_scales
//!
//! Turn grid cells into pitches.
//!
//! A [`ScaleTable`] holds one pitch per grid cell, generated from a named
//! [`Mode`] preset (or supplied verbatim), plus a global transpose offset in
//! semitones.
//!
//! ## Cell layout
//!
//! Cell 0 is the top-left cell of the sensor image and indices run
//! row-major.  Presets put the root on the **last** cell (bottom-right) and
//! climb the scale toward cell 0, so reaching up and left plays higher.
//! With the chromatic preset rooted at [`DEFAULT_ROOT`] on a 5 × 4 grid this
//! gives the classic `pitch = 64 - cell` layout.
//!
//! ```rust
//! use grid_scales::{Mode, ScaleTable, DEFAULT_ROOT};
//!
//! let mut table = ScaleTable::from_mode(Mode::Chromatic, 20, DEFAULT_ROOT);
//! assert_eq!(table.pitch_for(0).unwrap(), 64);
//! assert_eq!(table.pitch_for(19).unwrap(), 45);
//!
//! table.transpose_octaves(1);
//! assert_eq!(table.pitch_for(0).unwrap(), 76);
//!
//! table.select_mode(Mode::PentatonicMajor);
//! assert_eq!(table.pitch_for(19).unwrap(), 57); // root, one octave up
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Root pitch of the default layout: on a 20-cell grid the chromatic preset
/// spans 45 (bottom-right) to 64 (top-left).
pub const DEFAULT_ROOT: i32 = 45;

// ════════════════════════════════════════════════════════════════════════════
// ScaleError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScaleError {
    /// Pitch table length does not match the grid.  Fatal at setup.
    #[error("pitch table has {actual} entries but the grid has {expected} cells")]
    CellCountMismatch { expected: usize, actual: usize },

    /// A cell index outside the grid reached the table.  This is a grid
    /// misconfiguration, never a user input problem.
    #[error("cell {cell} is outside the {cell_count}-cell table")]
    CellOutOfRange { cell: usize, cell_count: usize },

    #[error("unknown mode \"{0}\"")]
    UnknownMode(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Scale — interval sets
// ════════════════════════════════════════════════════════════════════════════

/// A pitch collection defined as semitone offsets from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Scale {
    /// Semitone offsets from root, e.g. `[0,2,4,5,7,9,11]` for major.
    pub intervals: Vec<u8>,
    pub name: &'static str,
}

impl Scale {
    pub fn chromatic() -> Self {
        Scale { intervals: (0..12).collect(), name: "Chromatic" }
    }
    /// Major scale (Ionian): W W H W W W H
    pub fn major() -> Self {
        Scale { intervals: vec![0,2,4,5,7,9,11], name: "Major" }
    }
    /// Natural minor (Aeolian): W H W W H W W
    pub fn minor() -> Self {
        Scale { intervals: vec![0,2,3,5,7,8,10], name: "Minor" }
    }
    pub fn pentatonic_major() -> Self {
        Scale { intervals: vec![0,2,4,7,9], name: "Pentatonic Major" }
    }
    pub fn pentatonic_minor() -> Self {
        Scale { intervals: vec![0,3,5,7,10], name: "Pentatonic Minor" }
    }
    pub fn dorian() -> Self {
        Scale { intervals: vec![0,2,3,5,7,9,10], name: "Dorian" }
    }
    pub fn phrygian() -> Self {
        Scale { intervals: vec![0,1,3,5,7,8,10], name: "Phrygian" }
    }
    pub fn lydian() -> Self {
        Scale { intervals: vec![0,2,4,6,7,9,11], name: "Lydian" }
    }
    pub fn mixolydian() -> Self {
        Scale { intervals: vec![0,2,4,5,7,9,10], name: "Mixolydian" }
    }
    pub fn whole_tone() -> Self {
        Scale { intervals: vec![0,2,4,6,8,10], name: "Whole Tone" }
    }
    /// Minor blues: pentatonic minor plus the flat fifth.
    pub fn blues() -> Self {
        Scale { intervals: vec![0,3,5,6,7,10], name: "Blues" }
    }

    pub fn len(&self) -> usize { self.intervals.len() }
    pub fn is_empty(&self) -> bool { self.intervals.is_empty() }

    /// Pitch of scale degree `degree` above `root`, wrapping into higher
    /// octaves.
    pub fn degree_pitch(&self, root: i32, degree: usize) -> i32 {
        let n = self.len().max(1);
        let octave = (degree / n) as i32;
        let step   = self.intervals.get(degree % n).copied().unwrap_or(0) as i32;
        root + octave * 12 + step
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Mode — named presets
// ════════════════════════════════════════════════════════════════════════════

/// Named scale presets selectable at runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    Chromatic,
    Major,
    Minor,
    PentatonicMajor,
    PentatonicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    WholeTone,
    Blues,
}

impl Mode {
    pub const ALL: [Mode; 11] = [
        Mode::Chromatic,
        Mode::Major,
        Mode::Minor,
        Mode::PentatonicMajor,
        Mode::PentatonicMinor,
        Mode::Dorian,
        Mode::Phrygian,
        Mode::Lydian,
        Mode::Mixolydian,
        Mode::WholeTone,
        Mode::Blues,
    ];

    pub fn scale(self) -> Scale {
        match self {
            Mode::Chromatic       => Scale::chromatic(),
            Mode::Major           => Scale::major(),
            Mode::Minor           => Scale::minor(),
            Mode::PentatonicMajor => Scale::pentatonic_major(),
            Mode::PentatonicMinor => Scale::pentatonic_minor(),
            Mode::Dorian          => Scale::dorian(),
            Mode::Phrygian        => Scale::phrygian(),
            Mode::Lydian          => Scale::lydian(),
            Mode::Mixolydian      => Scale::mixolydian(),
            Mode::WholeTone       => Scale::whole_tone(),
            Mode::Blues           => Scale::blues(),
        }
    }

    /// Canonical kebab-case name, as accepted by [`Mode::from_name`].
    pub fn name(self) -> &'static str {
        match self {
            Mode::Chromatic       => "chromatic",
            Mode::Major           => "major",
            Mode::Minor           => "minor",
            Mode::PentatonicMajor => "pentatonic-major",
            Mode::PentatonicMinor => "pentatonic-minor",
            Mode::Dorian          => "dorian",
            Mode::Phrygian        => "phrygian",
            Mode::Lydian          => "lydian",
            Mode::Mixolydian      => "mixolydian",
            Mode::WholeTone       => "whole-tone",
            Mode::Blues           => "blues",
        }
    }

    /// Look a preset up by name.  Case, spaces, `-` and `_` are ignored, and
    /// the church-mode aliases `ionian`/`aeolian` are accepted.
    pub fn from_name(name: &str) -> Result<Mode, ScaleError> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        let mode = match key.as_str() {
            "chromatic"                  => Mode::Chromatic,
            "major" | "ionian"           => Mode::Major,
            "minor" | "aeolian"          => Mode::Minor,
            "pentatonicmajor" | "pentatonic" => Mode::PentatonicMajor,
            "pentatonicminor"            => Mode::PentatonicMinor,
            "dorian"                     => Mode::Dorian,
            "phrygian"                   => Mode::Phrygian,
            "lydian"                     => Mode::Lydian,
            "mixolydian"                 => Mode::Mixolydian,
            "wholetone"                  => Mode::WholeTone,
            "blues"                      => Mode::Blues,
            _ => return Err(ScaleError::UnknownMode(name.to_string())),
        };
        Ok(mode)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::from_name(s)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScaleTable — one pitch per cell
// ════════════════════════════════════════════════════════════════════════════

/// The active cell → pitch mapping.
///
/// The table length is fixed to the grid's cell count at construction and
/// never changes afterwards; mode switches rebuild the table at the same
/// length.
#[derive(Clone, Debug)]
pub struct ScaleTable {
    /// `None` for a custom table.
    mode:      Option<Mode>,
    root:      i32,
    pitches:   Vec<i32>,
    transpose: i32,
}

impl ScaleTable {
    /// Lay `mode` out over `cell_count` cells, with `root` on the last cell.
    pub fn from_mode(mode: Mode, cell_count: usize, root: i32) -> Self {
        ScaleTable {
            mode: Some(mode),
            root,
            pitches: layout(&mode.scale(), cell_count, root),
            transpose: 0,
        }
    }

    /// Use a hand-written table.  `pitches[i]` is the pitch of cell `i`.
    pub fn custom(pitches: Vec<i32>, cell_count: usize) -> Result<Self, ScaleError> {
        if pitches.len() != cell_count {
            return Err(ScaleError::CellCountMismatch {
                expected: cell_count,
                actual:   pitches.len(),
            });
        }
        let root = pitches.last().copied().unwrap_or(DEFAULT_ROOT);
        Ok(ScaleTable { mode: None, root, pitches, transpose: 0 })
    }

    /// Active preset, or `None` for a custom table.
    pub fn mode(&self) -> Option<Mode> { self.mode }

    /// Display name of the active table.
    pub fn name(&self) -> &'static str {
        self.mode.map(Mode::name).unwrap_or("custom")
    }

    pub fn root(&self)       -> i32    { self.root }
    pub fn transpose(&self)  -> i32    { self.transpose }
    pub fn cell_count(&self) -> usize  { self.pitches.len() }

    /// Untransposed table entries.
    pub fn pitches(&self) -> &[i32] { &self.pitches }

    /// Transposed pitch of `cell`.
    pub fn pitch_for(&self, cell: usize) -> Result<i32, ScaleError> {
        self.pitches
            .get(cell)
            .map(|p| p + self.transpose)
            .ok_or(ScaleError::CellOutOfRange { cell, cell_count: self.pitches.len() })
    }

    /// Transposed pitch of `cell` for callers that already hold a cell index
    /// produced by the matching grid.
    ///
    /// # Panics
    /// If `cell >= cell_count()`, which means the grid and the table were
    /// built for different cell counts.
    pub fn pitch(&self, cell: usize) -> i32 {
        self.pitches[cell] + self.transpose
    }

    /// Swap in another preset.  Root and transpose are kept.
    pub fn select_mode(&mut self, mode: Mode) {
        self.pitches = layout(&mode.scale(), self.pitches.len(), self.root);
        self.mode = Some(mode);
    }

    /// Shift every pitch by `delta` semitones.  Unclamped: keeping notes in
    /// the 0–127 range is the output port's business.
    pub fn adjust_transpose(&mut self, delta: i32) {
        self.transpose += delta;
    }

    /// Shift by whole octaves.
    pub fn transpose_octaves(&mut self, steps: i32) {
        self.adjust_transpose(steps * 12);
    }
}

/// Degree 0 on the last cell, climbing toward cell 0.
fn layout(scale: &Scale, cell_count: usize, root: i32) -> Vec<i32> {
    (0..cell_count)
        .map(|cell| scale.degree_pitch(root, cell_count - 1 - cell))
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Pitch names
// ════════════════════════════════════════════════════════════════════════════

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Scientific pitch name with middle C = `C4` (MIDI 60).
pub fn pitch_name(pitch: i32) -> String {
    let name   = NOTE_NAMES[pitch.rem_euclid(12) as usize];
    let octave = pitch.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
