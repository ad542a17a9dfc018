//! End-to-end lifecycle scenarios: a `Manager` driving the scriptable
//! virtual backend through connect, input, fault, and disconnect cycles.

#![cfg(feature = "virtual")]

use std::cell::RefCell;
use std::rc::Rc;

use padbank::backends::virtual_input::{VirtualHub, VirtualPad};
use padbank::provider::{AxisKind, FieldId, InputRecord, RawState, ReadError};
use padbank::{Axis, DiagnosticSink, Manager, PadCaps};

/// Sink the test keeps a handle on after the manager takes ownership.
#[derive(Clone, Default)]
struct SharedSink(Rc<RefCell<Vec<String>>>);

impl SharedSink {
    fn lines(&self) -> Vec<String> {
        self.0.borrow().clone()
    }
}

impl DiagnosticSink for SharedSink {
    fn write(&mut self, message: &str) {
        self.0.borrow_mut().push(message.to_string());
    }
}

fn manager_over(hub: &VirtualHub) -> Manager {
    Manager::new(Box::new(hub.provider()))
}

fn gamepad(guid: u128) -> VirtualPad {
    VirtualPad::new(guid, "Test Pad")
        .with_ids(0x1234, 0xabcd)
        .with_axes(&[AxisKind::X, AxisKind::Y, AxisKind::Slider])
        .with_buttons(6)
        .with_povs(1)
}

#[test]
fn connect_populates_slot_zero() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);
    bank.update();

    assert!(bank.is_connected(0));
    assert_eq!(bank.button_count(0), 6);
    assert_eq!(bank.pov_count(0), 1);
    assert!(bank.has_axis(0, Axis::X));
    assert!(bank.has_axis(0, Axis::Y));
    assert!(bank.has_axis(0, Axis::S0));
    assert!(!bank.has_axis(0, Axis::Rz));
    assert!(!bank.has_axis(0, Axis::S1));

    let identity = bank.identity(0);
    assert_eq!(identity.name, "Test Pad");
    assert_eq!(identity.vendor_id, 0x1234);
    assert_eq!(identity.product_id, 0xabcd);
}

#[test]
fn buffered_records_update_incrementally() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);

    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Axis(Axis::X),
            data: 32767,
        },
    );
    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Button(2),
            data: 1,
        },
    );
    bank.update();

    assert_eq!(bank.axis_position(0, Axis::X), 100.0);
    assert!(bank.is_button_pressed(0, 2));

    // A later cycle that only touches the button leaves the axis alone.
    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Button(2),
            data: 0,
        },
    );
    bank.update();

    assert_eq!(bank.axis_position(0, Axis::X), 100.0);
    assert!(!bank.is_button_pressed(0, 2));
}

#[test]
fn buffered_pov_sentinel_reads_centered() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);

    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Pov(0),
            data: 270,
        },
    );
    bank.update();
    assert_eq!(bank.pov_position(0, 0), 270);

    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Pov(0),
            data: 0xFFFF,
        },
    );
    bank.update();
    assert_eq!(bank.pov_position(0, 0), -1);
}

#[test]
fn records_for_unresolved_fields_are_ignored() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);

    // The pad has no Rz axis and only six buttons.
    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Axis(Axis::Rz),
            data: 32767,
        },
    );
    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Button(100),
            data: 1,
        },
    );
    bank.update();

    assert!(bank.is_connected(0));
    assert_eq!(bank.axis_position(0, Axis::Rz), 0.0);
    assert!(!bank.is_button_pressed(0, 100));
}

#[test]
fn polled_device_maps_every_field_independently() {
    let hub = VirtualHub::new();
    hub.attach(
        VirtualPad::new(1, "Old Stick")
            .with_ids(0x044f, 0xb108)
            .with_axes(&[AxisKind::X, AxisKind::Y])
            .with_buttons(4)
            .with_povs(1)
            .polled_only(),
    );

    let mut raw = RawState::default();
    raw.axes[Axis::X.index()] = 32767;
    raw.axes[Axis::Y.index()] = -32768;
    raw.axes[Axis::Z.index()] = 32767; // unresolved, must stay 0.0
    raw.buttons[0] = 0x80;
    raw.buttons[1] = 0x01; // low bits only: not pressed
    raw.povs[0] = 90;
    hub.set_polled_state(1, raw);

    let mut bank = manager_over(&hub);
    bank.update();

    assert!(bank.is_connected(0));
    assert_eq!(bank.axis_position(0, Axis::X), 100.0);
    assert_eq!(bank.axis_position(0, Axis::Y), -100.0);
    assert_eq!(bank.axis_position(0, Axis::Z), 0.0);
    assert!(bank.is_button_pressed(0, 0));
    assert!(!bank.is_button_pressed(0, 1));
    assert_eq!(bank.pov_position(0, 0), 90);
    // Unresolved POV stays centered.
    assert_eq!(bank.pov_position(0, 1), -1);
}

#[test]
fn single_transient_fault_heals_via_reacquire() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);
    bank.update();
    assert!(bank.is_connected(0));

    hub.inject_read_fault(1, ReadError::NotAcquired);
    bank.update();

    assert!(bank.is_connected(0), "one fault must heal via re-acquire");
}

#[test]
fn repeated_input_lost_disconnects_and_resets_caches() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);
    bank.update();
    assert!(bank.is_connected(0));

    hub.push_record(
        1,
        InputRecord {
            field: FieldId::Button(0),
            data: 1,
        },
    );
    bank.update();
    assert!(bank.is_button_pressed(0, 0));

    // Both the read and the post-acquire retry fail.
    hub.inject_read_fault(1, ReadError::InputLost);
    hub.inject_read_fault(1, ReadError::InputLost);
    bank.update();

    assert!(!bank.is_connected(0));
    assert_eq!(*bank.capabilities(0), PadCaps::default());
    assert!(!bank.is_button_pressed(0, 0));
    assert_eq!(bank.axis_position(0, Axis::X), 0.0);
    assert_eq!(bank.pov_position(0, 0), -1);
    assert_eq!(bank.identity(0).name, "No Joystick");
    assert_eq!(hub.release_count(1), 1);

    // The hardware is still attached, so the next cycle reopens it.
    bank.update();
    assert!(bank.is_connected(0));
}

#[test]
fn unplug_disconnects_and_frees_the_slot_for_a_newcomer() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut bank = manager_over(&hub);
    bank.update();
    assert!(bank.is_connected(0));

    hub.detach(1);
    bank.update();
    assert!(!bank.is_connected(0));

    hub.attach(gamepad(2).with_ids(0x054c, 0x09cc));
    bank.update();

    assert!(bank.is_connected(0));
    assert_eq!(bank.identity(0).vendor_id, 0x054c);
}

#[test]
fn blacklisted_device_is_rejected_without_renegotiation() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1).refusing_absolute());

    let mut bank = manager_over(&hub);
    bank.update();

    assert!(!bank.is_connected(0));
    assert_eq!(bank.blacklist_len(), 1);
    assert_eq!(hub.bind_count(1), 1);
    let negotiated = hub.negotiation_count(1);

    // Every later cycle retries the open, but the blacklist short-circuits
    // it before any negotiation call.
    bank.update();
    bank.update();

    assert!(!bank.is_connected(0));
    assert_eq!(bank.blacklist_len(), 1);
    assert_eq!(hub.bind_count(1), 1);
    assert_eq!(hub.negotiation_count(1), negotiated);
}

#[test]
fn refuser_without_ids_is_not_blacklisted() {
    let hub = VirtualHub::new();
    hub.attach(
        VirtualPad::new(1, "Anonymous Stick")
            .with_axes(&[AxisKind::X])
            .refusing_absolute(),
    );

    let mut bank = manager_over(&hub);
    bank.update();
    bank.update();

    assert!(!bank.is_connected(0));
    assert_eq!(bank.blacklist_len(), 0);
    // Without a blacklist entry the full negotiation is retried every cycle.
    assert_eq!(hub.bind_count(1), 2);
}

#[test]
fn failed_open_is_retried_every_cycle() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1).failing_bind());

    let mut bank = manager_over(&hub);
    bank.update();
    bank.update();
    bank.update();

    assert!(!bank.is_connected(0));
    // One session was created and released per attempt.
    assert_eq!(hub.release_count(1), 3);
}

#[test]
fn enumeration_failure_keeps_the_connected_set() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let sink = SharedSink::default();
    let mut bank = Manager::with_sink(Box::new(hub.provider()), Box::new(sink.clone()));
    bank.update();
    assert!(bank.is_connected(0));

    hub.fail_next_enumeration();
    bank.update();

    assert!(bank.is_connected(0), "tracked set must survive a failed scan");
    assert!(sink
        .lines()
        .iter()
        .any(|l| l.contains("failed to enumerate")));
}

#[test]
fn capability_liar_is_flagged_but_still_opens() {
    let hub = VirtualHub::new();
    hub.attach(gamepad(1).claiming_caps(8, 128, 4));

    let sink = SharedSink::default();
    let mut bank = Manager::with_sink(Box::new(hub.provider()), Box::new(sink.clone()));
    bank.update();

    assert!(bank.is_connected(0));
    assert_eq!(bank.button_count(0), 6, "resolved counts win over claims");
    assert!(sink.lines().iter().any(|l| l.contains("claims")));
}

#[test]
fn eight_pads_fill_all_slots_bijectively() {
    let hub = VirtualHub::new();
    for n in 0..10u128 {
        hub.attach(gamepad(n + 1).with_ids(0x1000 + n as u16, 0x2000));
    }

    let mut bank = manager_over(&hub);
    bank.update();

    let mut vendors = std::collections::HashSet::new();
    for slot in 0..padbank::MAX_SLOTS {
        assert!(bank.is_connected(slot));
        assert!(vendors.insert(bank.identity(slot).vendor_id));
    }
    assert_eq!(vendors.len(), padbank::MAX_SLOTS);
}

#[test]
fn session_close_is_idempotent() {
    use padbank::{Blacklist, BufferSink, DeviceSession};

    let hub = VirtualHub::new();
    hub.attach(gamepad(1));

    let mut provider = hub.provider();
    let mut blacklist = Blacklist::new();
    let mut sink = BufferSink::new();

    let mut session = DeviceSession::open(
        &mut provider,
        padbank::provider::DeviceGuid(1),
        &mut blacklist,
        &mut sink,
    )
    .expect("open should succeed");

    assert!(session.is_buffered());

    session.close();
    session.close();
    assert_eq!(hub.release_count(1), 1);
}
