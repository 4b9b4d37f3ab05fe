//! Tracking slots and per-frame snapshots.

use std::fmt;

/// Number of independently tracked objects.
pub const SLOT_COUNT: usize = 2;

// ════════════════════════════════════════════════════════════════════════════
// Slot
// ════════════════════════════════════════════════════════════════════════════

/// Identifies one tracking slot.  Slot A follows the first (largest)
/// detection of each frame, slot B the second.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    /// All slots in priority order.
    pub const ALL: [Slot; SLOT_COUNT] = [Slot::A, Slot::B];

    pub fn index(self) -> usize {
        match self {
            Slot::A => 0,
            Slot::B => 1,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::A => f.write_str("A"),
            Slot::B => f.write_str("B"),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrackedSlot
// ════════════════════════════════════════════════════════════════════════════

/// What one slot saw in one frame.
///
/// `cell`, `velocity`, `distance_mm` and the position are only meaningful
/// while `active`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct TrackedSlot {
    pub active:      bool,
    pub cell:        usize,
    pub velocity:    u8,
    pub distance_mm: f32,
    pub x:           f32,
    pub y:           f32,
}

impl TrackedSlot {
    /// A slot with nothing assigned to it.
    pub const INACTIVE: TrackedSlot = TrackedSlot {
        active:      false,
        cell:        0,
        velocity:    0,
        distance_mm: 0.0,
        x:           0.0,
        y:           0.0,
    };

    /// The occupied cell, if active.
    pub fn occupied_cell(&self) -> Option<usize> {
        self.active.then_some(self.cell)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Snapshot
// ════════════════════════════════════════════════════════════════════════════

/// The state of every slot at the end of one frame.
///
/// A snapshot is an owned value: the tracker produces a fresh one per frame
/// and the session keeps the last one as "previous" for edge detection.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Snapshot {
    slots: [TrackedSlot; SLOT_COUNT],
}

impl Snapshot {
    pub fn new(slots: [TrackedSlot; SLOT_COUNT]) -> Self {
        Snapshot { slots }
    }

    pub fn get(&self, slot: Slot) -> &TrackedSlot {
        &self.slots[slot.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, &TrackedSlot)> {
        Slot::ALL.into_iter().zip(self.slots.iter())
    }

    /// Number of active slots.
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// True when `slot` is active and a higher-priority slot is active in the
    /// same cell this frame.  Such a slot's transition is not evaluated.
    pub fn is_shadowed(&self, slot: Slot) -> bool {
        let me = self.get(slot);
        me.active
            && self.slots[..slot.index()]
                .iter()
                .any(|other| other.active && other.cell == me.cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(cell: usize) -> TrackedSlot {
        TrackedSlot { active: true, cell, ..TrackedSlot::INACTIVE }
    }

    #[test]
    fn default_snapshot_is_all_inactive() {
        let s = Snapshot::default();
        assert_eq!(s.active_count(), 0);
        for (_, slot) in s.iter() {
            assert_eq!(*slot, TrackedSlot::INACTIVE);
            assert_eq!(slot.occupied_cell(), None);
        }
    }

    #[test]
    fn slot_order_and_labels() {
        assert_eq!(Slot::ALL.map(Slot::index), [0, 1]);
        assert_eq!(Slot::B.to_string(), "B");
    }

    #[test]
    fn only_the_lower_priority_slot_is_shadowed() {
        let s = Snapshot::new([at(7), at(7)]);
        assert!(!s.is_shadowed(Slot::A));
        assert!(s.is_shadowed(Slot::B));
    }

    #[test]
    fn different_cells_are_not_shadowed() {
        let s = Snapshot::new([at(7), at(8)]);
        assert!(!s.is_shadowed(Slot::B));
    }

    #[test]
    fn inactive_slots_never_shadow() {
        // A inactive but left over cell 7 from an old frame
        let s = Snapshot::new([TrackedSlot { cell: 7, ..TrackedSlot::INACTIVE }, at(7)]);
        assert!(!s.is_shadowed(Slot::B));
        let s = Snapshot::new([at(7), TrackedSlot { cell: 7, ..TrackedSlot::INACTIVE }]);
        assert!(!s.is_shadowed(Slot::B));
    }
}
