use padbank::backends::virtual_input::{VirtualHub, VirtualPad};
use padbank::provider::AxisKind;
use padbank::{Manager, MAX_SLOTS};

fn main() {
    let hub = VirtualHub::new();
    hub.attach(
        VirtualPad::new(1, "Demo Gamepad")
            .with_ids(0x045e, 0x028e)
            .with_axes(&[AxisKind::X, AxisKind::Y, AxisKind::Rx, AxisKind::Ry])
            .with_buttons(12)
            .with_povs(1),
    );
    hub.attach(
        VirtualPad::new(2, "Demo Flight Stick")
            .with_ids(0x044f, 0xb108)
            .with_axes(&[AxisKind::X, AxisKind::Y, AxisKind::Rz, AxisKind::Slider])
            .with_buttons(6)
            .with_povs(1)
            .polled_only(),
    );

    let mut bank = Manager::new(Box::new(hub.provider()));
    bank.update();

    for slot in 0..MAX_SLOTS {
        if !bank.is_connected(slot) {
            continue;
        }
        let identity = serde_json::to_string(bank.identity(slot)).expect("serialize identity");
        let caps = serde_json::to_string(bank.capabilities(slot)).expect("serialize caps");
        println!("slot {slot}: {identity}");
        println!("        {caps}");
    }
    println!("blacklisted pairs: {}", bank.blacklist_len());
}
