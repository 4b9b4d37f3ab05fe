//! # blob_tracker
//!
//! Frame-by-frame conversion of depth blobs into note events.
//!
//! Each frame the sensor side hands over up to two [`Detection`]s, largest
//! first.  The first feeds slot **A**, the second slot **B**; anything
//! beyond that is ignored.
//!
//! ```text
//!   detections ──► Tracker ──► Snapshot ──► EventGenerator ──► NoteEvents
//!                    ▲            │               ▲
//!                    └── previous ┘               └── ScaleTable (pitch)
//! ```
//!
//! * [`tracker`] assigns each slot a grid cell with a quarter-cell
//!   hysteresis band and derives velocity from distance.
//! * [`events`] compares each slot's sounding voice with its current state:
//!
//! | voice | current | same cell | emitted |
//! |---|---|---|---|
//! | silent | inactive | — | nothing |
//! | silent | active | — | NoteOn |
//! | sounding | active | yes | ControlChange (velocity) |
//! | sounding | active | no | NoteOff(held), NoteOn(new) |
//! | sounding | inactive | — | NoteOff(held) |
//!
//! * [`session`] owns all of the above for one performance.
//!
//! ```rust
//! use blob_tracker::{Detection, NoteEvent, Session, SessionConfig, Slot};
//!
//! let mut session = Session::new(SessionConfig::default()).unwrap();
//! let events = session.process_frame(&[Detection::new(300.0, 250.0, 500.0)]);
//! assert_eq!(
//!     events,
//!     vec![NoteEvent::NoteOn { slot: Slot::A, cell: 12, pitch: 52, velocity: 107 }]
//! );
//! assert_eq!(session.process_frame(&[]).len(), 1); // NoteOff
//! ```

use thiserror::Error;

pub mod detection;
pub mod events;
pub mod session;
pub mod slot;
pub mod tracker;
pub mod velocity;

pub use cell_grid::{GridError, GridSpec};
pub use grid_scales::{Mode, ScaleError, ScaleTable};

pub use detection::Detection;
pub use events::{EventGenerator, NoteEvent, Voice};
pub use session::{Session, SessionConfig};
pub use slot::{Slot, Snapshot, TrackedSlot, SLOT_COUNT};
pub use tracker::Tracker;
pub use velocity::VelocityCurve;

/// Setup-time configuration errors.  None of these can occur once a
/// [`Session`] exists.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Scale(#[from] ScaleError),

    #[error("near distance {near_mm}mm must be finite and closer than far distance {far_mm}mm")]
    InvalidDistanceRange { near_mm: f32, far_mm: f32 },
}
