//! Slot transitions → note events.

use std::fmt;

use grid_scales::ScaleTable;

use crate::slot::{Slot, Snapshot, TrackedSlot, SLOT_COUNT};

// ════════════════════════════════════════════════════════════════════════════
// NoteEvent
// ════════════════════════════════════════════════════════════════════════════

/// Output of one frame, in emission order.
///
/// Pitches are transposed but unclamped; squeezing them into 0–127 is the
/// output port's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoteEvent {
    NoteOn {
        slot:     Slot,
        cell:     usize,
        pitch:    i32,
        velocity: u8,
    },
    /// `pitch` is the pitch that was struck, even if the scale changed
    /// while the note was held.
    NoteOff {
        slot:  Slot,
        cell:  usize,
        pitch: i32,
    },
    /// Continuous velocity update while a slot holds still.
    ControlChange {
        slot:  Slot,
        value: u8,
    },
}

impl NoteEvent {
    pub fn slot(&self) -> Slot {
        match *self {
            NoteEvent::NoteOn { slot, .. }
            | NoteEvent::NoteOff { slot, .. }
            | NoteEvent::ControlChange { slot, .. } => slot,
        }
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteEvent::NoteOn { slot, cell, pitch, velocity } => {
                write!(f, "[{}] note on  cell={:<2} pitch={} vel={}", slot, cell, pitch, velocity)
            }
            NoteEvent::NoteOff { slot, cell, pitch } => {
                write!(f, "[{}] note off cell={:<2} pitch={}", slot, cell, pitch)
            }
            NoteEvent::ControlChange { slot, value } => {
                write!(f, "[{}] cc value={}", slot, value)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Voice — per-slot sounding state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Voice {
    #[default]
    Silent,
    Sounding { cell: usize, pitch: i32 },
}

// ════════════════════════════════════════════════════════════════════════════
// EventGenerator
// ════════════════════════════════════════════════════════════════════════════

/// Per-slot note state machine.
///
/// Each slot's [`Voice`] is its state: `Silent`, or `Sounding` with the cell
/// and pitch it struck.  Every frame the voice is compared with the slot's
/// current [`TrackedSlot`], so a release always names the note the slot
/// actually holds, even across mode switches, transposition, or frames in
/// which the slot was shadowed.
#[derive(Clone, Debug, Default)]
pub struct EventGenerator {
    voices: [Voice; SLOT_COUNT],
}

impl EventGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice(&self, slot: Slot) -> Voice {
        self.voices[slot.index()]
    }

    /// Events for one frame, slot A first.
    ///
    /// A slot that shares its cell with a higher-priority active slot is
    /// skipped entirely this frame: no events, voice untouched.  A slot that
    /// was sounding elsewhere and jumps onto an occupied cell keeps its old
    /// note until it is evaluated again, i.e. until it moves off the shared
    /// cell, disappears, or everything is released.
    pub fn emit(&mut self, current: &Snapshot, scale: &ScaleTable) -> Vec<NoteEvent> {
        let mut out = Vec::new();
        for slot in Slot::ALL {
            if current.is_shadowed(slot) {
                continue;
            }
            self.transition(slot, current.get(slot), scale, &mut out);
        }
        out
    }

    fn transition(
        &mut self,
        slot:    Slot,
        current: &TrackedSlot,
        scale:   &ScaleTable,
        out:     &mut Vec<NoteEvent>,
    ) {
        match (self.voices[slot.index()], current.occupied_cell()) {
            (Voice::Silent, None) => {}
            (Voice::Silent, Some(cell)) => {
                out.push(self.strike(slot, cell, current.velocity, scale));
            }
            (Voice::Sounding { cell: held, .. }, Some(cell)) if held == cell => {
                out.push(NoteEvent::ControlChange { slot, value: current.velocity });
            }
            (Voice::Sounding { cell: held, pitch }, Some(cell)) => {
                out.push(self.release(slot, held, pitch));
                out.push(self.strike(slot, cell, current.velocity, scale));
            }
            (Voice::Sounding { cell: held, pitch }, None) => {
                out.push(self.release(slot, held, pitch));
            }
        }
    }

    fn strike(&mut self, slot: Slot, cell: usize, velocity: u8, scale: &ScaleTable) -> NoteEvent {
        let pitch = scale.pitch(cell);
        self.voices[slot.index()] = Voice::Sounding { cell, pitch };
        NoteEvent::NoteOn { slot, cell, pitch, velocity }
    }

    fn release(&mut self, slot: Slot, cell: usize, pitch: i32) -> NoteEvent {
        self.voices[slot.index()] = Voice::Silent;
        NoteEvent::NoteOff { slot, cell, pitch }
    }

    /// NoteOff for every sounding voice.  Call before shutting down.
    pub fn release_all(&mut self) -> Vec<NoteEvent> {
        let mut out = Vec::new();
        for slot in Slot::ALL {
            if let Voice::Sounding { cell, pitch } = self.voices[slot.index()] {
                out.push(self.release(slot, cell, pitch));
            }
        }
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
