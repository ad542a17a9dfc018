use padbank::backends::virtual_input::{VirtualHub, VirtualPad};
use padbank::provider::{AxisKind, FieldId, InputRecord};
use padbank::{Axis, Manager};

const PAD_GUID: u128 = 0xD0_0D;

fn main() {
    // Script a small session against the virtual backend: one gamepad that
    // wiggles its stick and taps a button over a handful of frames.
    let hub = VirtualHub::new();
    hub.attach(
        VirtualPad::new(PAD_GUID, "Demo Pad")
            .with_ids(0x045e, 0x028e)
            .with_axes(&[AxisKind::X, AxisKind::Y])
            .with_buttons(10)
            .with_povs(1),
    );

    let mut bank = Manager::new(Box::new(hub.provider()));

    let frames: &[&[InputRecord]] = &[
        &[InputRecord {
            field: FieldId::Axis(Axis::X),
            data: 16384,
        }],
        &[
            InputRecord {
                field: FieldId::Axis(Axis::X),
                data: 32767,
            },
            InputRecord {
                field: FieldId::Button(0),
                data: 1,
            },
        ],
        &[InputRecord {
            field: FieldId::Button(0),
            data: 0,
        }],
        &[InputRecord {
            field: FieldId::Pov(0),
            data: 90,
        }],
        &[InputRecord {
            field: FieldId::Pov(0),
            data: 0xFFFF,
        }],
    ];

    for (frame, records) in frames.iter().enumerate() {
        for record in records.iter() {
            hub.push_record(PAD_GUID, *record);
        }
        bank.update();

        if !bank.is_connected(0) {
            println!("frame {frame}: slot 0 disconnected");
            continue;
        }
        println!(
            "frame {frame}: x={:+7.2} y={:+7.2} btn0={} pov={}",
            bank.axis_position(0, Axis::X),
            bank.axis_position(0, Axis::Y),
            bank.is_button_pressed(0, 0),
            bank.pov_position(0, 0),
        );
    }

    // Yank the cable and show the slot falling back to defaults.
    hub.detach(PAD_GUID);
    bank.update();
    println!(
        "after unplug: connected={} x={:+7.2} pov={}",
        bank.is_connected(0),
        bank.axis_position(0, Axis::X),
        bank.pov_position(0, 0),
    );
}
