//! Detection → slot assignment with cell hysteresis.
//!
//! Raw centroids jitter by a few pixels from frame to frame.  Near a cell
//! boundary that is enough to flip the cell index back and forth and
//! retrigger notes, so once a slot is active its coordinates are pulled a
//! quarter cell toward the cell it already occupies before the final lookup.
//! The centroid has to cross a boundary by more than a quarter cell to move,
//! and has to come back by more than a quarter cell to return.

use std::cmp::Ordering;

use cell_grid::GridSpec;
use log::trace;

use crate::detection::Detection;
use crate::slot::{Slot, Snapshot, TrackedSlot, SLOT_COUNT};
use crate::velocity::VelocityCurve;

/// Assigns detections to slots, frame by frame.
#[derive(Clone, Debug)]
pub struct Tracker {
    grid:  GridSpec,
    curve: VelocityCurve,
}

impl Tracker {
    pub fn new(grid: GridSpec, curve: VelocityCurve) -> Self {
        Tracker { grid, curve }
    }

    pub fn grid(&self)  -> &GridSpec      { &self.grid }
    pub fn curve(&self) -> &VelocityCurve { &self.curve }

    pub fn set_curve(&mut self, curve: VelocityCurve) {
        self.curve = curve;
    }

    /// Build this frame's snapshot.
    ///
    /// `detections[i]` feeds slot `i`; detections past [`SLOT_COUNT`] are
    /// dropped.
    pub fn update(&self, detections: &[Detection], previous: &Snapshot) -> Snapshot {
        if detections.len() > SLOT_COUNT {
            trace!(
                "ignoring {} detection(s) beyond the {} tracked slots",
                detections.len() - SLOT_COUNT,
                SLOT_COUNT
            );
        }
        Snapshot::new(Slot::ALL.map(|slot| {
            self.track(detections.get(slot.index()), previous.get(slot))
        }))
    }

    /// One slot's state for this frame.
    pub fn track(&self, detection: Option<&Detection>, previous: &TrackedSlot) -> TrackedSlot {
        let Some(d) = detection else {
            return TrackedSlot::INACTIVE;
        };
        TrackedSlot {
            active:      true,
            cell:        self.assign_cell(d.x, d.y, previous),
            velocity:    self.curve.velocity_for(d.distance_mm),
            distance_mm: d.distance_mm,
            x:           d.x,
            y:           d.y,
        }
    }

    /// Cell for `(x, y)`, biased toward `previous.cell` when `previous` is
    /// active.
    pub fn assign_cell(&self, x: f32, y: f32, previous: &TrackedSlot) -> usize {
        let Some(prev_cell) = previous.occupied_cell() else {
            return self.grid.cell_index_of(x, y);
        };

        let quarter_w = self.grid.cell_width() as f32 / 4.0;
        let quarter_h = self.grid.cell_height() as f32 / 4.0;

        let bx = bias_toward(
            x,
            self.grid.column_of(x),
            self.grid.column_of_cell(prev_cell),
            quarter_w,
        );
        let by = bias_toward(
            y,
            self.grid.row_of(y),
            self.grid.row_of_cell(prev_cell),
            quarter_h,
        );
        self.grid.cell_index_of(bx, by)
    }
}

/// Pull `v` back by `amount` when its raw step moved away from `previous`.
fn bias_toward(v: f32, raw: u32, previous: u32, amount: f32) -> f32 {
    match raw.cmp(&previous) {
        Ordering::Greater => v - amount,
        Ordering::Less    => v + amount,
        Ordering::Equal   => v,
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
