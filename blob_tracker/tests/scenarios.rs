//! End-to-end frame sequences through a default session
//! (5 × 4 grid over 640 × 480, chromatic from 64 down, 472–648mm).

use blob_tracker::velocity::map_clamped;
use blob_tracker::{Detection, Mode, NoteEvent, Session, SessionConfig, Slot};

fn session() -> Session {
    Session::new(SessionConfig::default()).unwrap()
}

/// A detection centred in `cell`.
fn in_cell(session: &Session, cell: usize, distance_mm: f32) -> Detection {
    let (x, y) = session.grid().cell_center(cell);
    Detection::new(x, y, distance_mm)
}

fn expected_velocity(distance_mm: f32) -> u8 {
    127 - map_clamped(distance_mm, 472.0, 648.0, 0.0, 127.0) as u8
}

#[test]
fn onset_in_cell_seven() {
    let mut s = session();
    let d = in_cell(&s, 7, 500.0);
    let events = s.process_frame(&[d]);
    assert_eq!(
        events,
        vec![NoteEvent::NoteOn {
            slot:     Slot::A,
            cell:     7,
            pitch:    57,
            velocity: expected_velocity(500.0),
        }]
    );
}

#[test]
fn staying_in_cell_sends_one_control_change() {
    let mut s = session();
    let d = in_cell(&s, 7, 500.0);
    s.process_frame(&[d]);
    let nudged = Detection::new(d.x + 10.0, d.y - 5.0, 560.0);
    let events = s.process_frame(&[nudged]);
    assert_eq!(
        events,
        vec![NoteEvent::ControlChange { slot: Slot::A, value: expected_velocity(560.0) }]
    );
}

#[test]
fn moving_to_cell_twelve_releases_first() {
    let mut s = session();
    let start = in_cell(&s, 7, 500.0);
    let end   = in_cell(&s, 12, 520.0);
    s.process_frame(&[start]);
    let events = s.process_frame(&[end]);
    assert_eq!(
        events,
        vec![
            NoteEvent::NoteOff { slot: Slot::A, cell: 7, pitch: 57 },
            NoteEvent::NoteOn {
                slot:     Slot::A,
                cell:     12,
                pitch:    52,
                velocity: expected_velocity(520.0),
            },
        ]
    );
}

#[test]
fn disappearing_releases_once() {
    let mut s = session();
    let d = in_cell(&s, 7, 500.0);
    s.process_frame(&[d]);
    assert_eq!(
        s.process_frame(&[]),
        vec![NoteEvent::NoteOff { slot: Slot::A, cell: 7, pitch: 57 }]
    );
    assert!(s.process_frame(&[]).is_empty());
}

#[test]
fn boundary_jitter_holds_the_note() {
    let mut s = session();
    // column 1/2 boundary of row 1 is x = 256
    let eighth = s.grid().cell_width() as f32 / 8.0;
    s.process_frame(&[Detection::new(250.0, 180.0, 500.0)]);
    for i in 0..60 {
        let x = if i % 2 == 0 { 256.0 + eighth } else { 256.0 - eighth };
        let events = s.process_frame(&[Detection::new(x, 180.0, 500.0)]);
        assert_eq!(events, vec![NoteEvent::ControlChange { slot: Slot::A, value: 107 }]);
    }
    // a decisive move does switch
    let events = s.process_frame(&[Detection::new(300.0, 180.0, 500.0)]);
    assert!(matches!(
        events.as_slice(),
        [NoteEvent::NoteOff { cell: 6, .. }, NoteEvent::NoteOn { cell: 7, .. }]
    ));
}

#[test]
fn coincident_slots_only_report_a() {
    let mut s = session();
    // B alone in cell 9
    let b_home = in_cell(&s, 9, 600.0);
    let shared = in_cell(&s, 3, 500.0);
    let a_home = in_cell(&s, 0, 500.0);
    s.process_frame(&[a_home, b_home]);

    // both land in cell 3: only A's transition, B emits nothing at all
    let events = s.process_frame(&[shared, shared]);
    assert!(events.iter().all(|e| e.slot() == Slot::A), "{events:?}");
    assert_eq!(
        events,
        vec![
            NoteEvent::NoteOff { slot: Slot::A, cell: 0, pitch: 64 },
            NoteEvent::NoteOn { slot: Slot::A, cell: 3, pitch: 61, velocity: 107 },
        ]
    );
}

/// A in cell 3, B sounding in cell 9, then B lands on A's cell.
fn b_shadowed_by_a() -> Session {
    let mut s = session();
    let shared = in_cell(&s, 3, 500.0);
    let b_home = in_cell(&s, 9, 500.0);
    s.process_frame(&[shared, b_home]);
    assert_eq!(
        s.process_frame(&[shared, shared]),
        vec![NoteEvent::ControlChange { slot: Slot::A, value: 107 }]
    );
    s
}

fn b_never_touches_a(events: &[NoteEvent]) {
    assert!(
        !events.iter().any(|e| matches!(e, NoteEvent::NoteOff { slot: Slot::B, pitch: 61, .. })),
        "{events:?}"
    );
}

#[test]
fn shadowed_b_leaving_releases_its_own_note() {
    let mut s = b_shadowed_by_a();
    let shared = in_cell(&s, 3, 500.0);
    let events = s.process_frame(&[shared]);
    b_never_touches_a(&events);
    assert_eq!(
        events,
        vec![
            NoteEvent::ControlChange { slot: Slot::A, value: 107 },
            NoteEvent::NoteOff { slot: Slot::B, cell: 9, pitch: 55 },
        ]
    );
    // A is still held and releases normally
    assert_eq!(
        s.process_frame(&[]),
        vec![NoteEvent::NoteOff { slot: Slot::A, cell: 3, pitch: 61 }]
    );
}

#[test]
fn shadowed_b_moving_on_releases_its_own_note() {
    let mut s = b_shadowed_by_a();
    let shared = in_cell(&s, 3, 500.0);
    let next   = in_cell(&s, 14, 500.0);
    let events = s.process_frame(&[shared, next]);
    b_never_touches_a(&events);
    assert_eq!(
        events,
        vec![
            NoteEvent::ControlChange { slot: Slot::A, value: 107 },
            NoteEvent::NoteOff { slot: Slot::B, cell: 9, pitch: 55 },
            NoteEvent::NoteOn { slot: Slot::B, cell: 14, pitch: 50, velocity: 107 },
        ]
    );
}

#[test]
fn shutdown_after_shadowing_releases_both_struck_notes() {
    let mut s = b_shadowed_by_a();
    let events = s.release_all();
    b_never_touches_a(&events);
    assert_eq!(
        events,
        vec![
            NoteEvent::NoteOff { slot: Slot::A, cell: 3, pitch: 61 },
            NoteEvent::NoteOff { slot: Slot::B, cell: 9, pitch: 55 },
        ]
    );
}

#[test]
fn shadowed_onset_strikes_fresh_when_b_moves_away() {
    let mut s = session();
    let shared = in_cell(&s, 3, 500.0);
    s.process_frame(&[shared, shared]);
    let next = in_cell(&s, 4, 500.0);
    let events = s.process_frame(&[shared, next]);
    assert_eq!(
        events,
        vec![
            NoteEvent::ControlChange { slot: Slot::A, value: 107 },
            NoteEvent::NoteOn { slot: Slot::B, cell: 4, pitch: 60, velocity: 107 },
        ]
    );
}

#[test]
fn mode_switch_does_not_touch_held_note() {
    let mut s = session();
    let d = in_cell(&s, 7, 500.0);
    s.process_frame(&[d]);

    s.select_mode(Mode::Major);
    s.transpose_octaves(1);

    // still held: just a control change, no re-strike
    assert_eq!(
        s.process_frame(&[d]),
        vec![NoteEvent::ControlChange { slot: Slot::A, value: 107 }]
    );

    // moving releases the old pitch and strikes from the new table
    let next = in_cell(&s, 8, 500.0);
    let new_pitch = s.scale().pitch_for(8).unwrap();
    assert_eq!(
        s.process_frame(&[next]),
        vec![
            NoteEvent::NoteOff { slot: Slot::A, cell: 7, pitch: 57 },
            NoteEvent::NoteOn { slot: Slot::A, cell: 8, pitch: new_pitch, velocity: 107 },
        ]
    );
    assert_eq!(new_pitch, 45 + 12 + 12 + 7); // degree 11 of major = octave + fifth
}

#[test]
fn two_hands_play_two_notes() {
    let mut s = session();
    let a = in_cell(&s, 0, 400.0);
    let b = in_cell(&s, 19, 700.0);
    let events = s.process_frame(&[a, b]);
    assert_eq!(
        events,
        vec![
            NoteEvent::NoteOn { slot: Slot::A, cell: 0, pitch: 64, velocity: 127 },
            NoteEvent::NoteOn { slot: Slot::B, cell: 19, pitch: 45, velocity: 0 },
        ]
    );
    // B leaves, A stays
    let events = s.process_frame(&[a]);
    assert_eq!(
        events,
        vec![
            NoteEvent::ControlChange { slot: Slot::A, value: 127 },
            NoteEvent::NoteOff { slot: Slot::B, cell: 19, pitch: 45 },
        ]
    );
}

#[test]
fn shutdown_releases_everything() {
    let mut s = session();
    let a = in_cell(&s, 5, 500.0);
    let b = in_cell(&s, 14, 500.0);
    s.process_frame(&[a, b]);
    let events = s.release_all();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| matches!(e, NoteEvent::NoteOff { .. })));
}
