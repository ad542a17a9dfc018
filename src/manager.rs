//! The slot bank manager.
//!
//! [`Manager`] is the caller-owned context that ties everything together: it
//! owns the provider, the slot registry, the blacklist, the diagnostic sink,
//! and one cache (session + state + caps + identity) per slot. Construct as
//! many managers as you like; there is no process-global state.
//!
//! # Driving it
//! Call [`Manager::update`] once per frame (or on a timer). All device I/O
//! happens inside that call; every query below it is a pure read of the cached
//! snapshot and never blocks.
//!
//! # Threading
//! Single-threaded by design. Nothing here spawns threads or registers
//! callbacks; if you need access from multiple threads, serialize externally.
//!
//! # Examples
//! ```no_run
//! use padbank::{backends::virtual_input::VirtualHub, Manager};
//!
//! let hub = VirtualHub::new();
//! let mut bank = Manager::new(Box::new(hub.provider()));
//! loop {
//!     bank.update();
//!     if bank.is_connected(0) {
//!         println!("slot 0: x = {}", bank.axis_position(0, padbank::Axis::X));
//!     }
//! #   break;
//! }
//! ```

use crate::blacklist::Blacklist;
use crate::diag::{DiagnosticSink, StderrSink};
use crate::metadata::Identity;
use crate::provider::Provider;
use crate::registry::SlotRegistry;
use crate::session::DeviceSession;
use crate::state::{Axis, PadCaps, PadState, MAX_BUTTONS, MAX_POVS, MAX_SLOTS};

/// Per-slot cache: the open session plus the snapshots the query API reads.
#[derive(Default)]
struct Slot {
    session: Option<DeviceSession>,
    state: PadState,
    caps: PadCaps,
    identity: Identity,
}

/// Caller-owned bank of up to [`MAX_SLOTS`] controller slots.
///
/// Dropping the manager synchronously releases every open session.
pub struct Manager {
    provider: Option<Box<dyn Provider>>,
    registry: SlotRegistry,
    blacklist: Blacklist,
    sink: Box<dyn DiagnosticSink>,
    slots: [Slot; MAX_SLOTS],
}

impl Manager {
    /// Create a manager over the given provider, reporting diagnostics to
    /// standard error.
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self::with_sink(provider, Box::new(StderrSink))
    }

    /// Create a manager with a caller-supplied diagnostic sink.
    ///
    /// Performs the initial device scan so connection queries are meaningful
    /// after the first [`Manager::update`].
    pub fn with_sink(provider: Box<dyn Provider>, sink: Box<dyn DiagnosticSink>) -> Self {
        let mut manager = Self {
            provider: Some(provider),
            registry: SlotRegistry::new(),
            blacklist: Blacklist::new(),
            sink,
            slots: Default::default(),
        };
        if let Some(provider) = manager.provider.as_mut() {
            manager
                .registry
                .rescan(provider.as_mut(), manager.sink.as_mut());
        }
        manager
    }

    /// Create a manager for the case where the platform input subsystem is
    /// unavailable (e.g. its library failed to load).
    ///
    /// Logs one line at construction; afterwards [`Manager::update`] is a
    /// no-op and every slot reports disconnected forever. This keeps the
    /// embedding application alive instead of crashing it.
    pub fn disabled() -> Self {
        Self::disabled_with_sink(Box::new(StderrSink))
    }

    /// [`Manager::disabled`] with a caller-supplied sink.
    pub fn disabled_with_sink(mut sink: Box<dyn DiagnosticSink>) -> Self {
        sink.write("input provider unavailable; all slots will report disconnected");
        Self {
            provider: None,
            registry: SlotRegistry::new(),
            blacklist: Blacklist::new(),
            sink,
            slots: Default::default(),
        }
    }

    /// Run one update cycle: rescan connections, refresh every connected
    /// slot, open sessions for newly connected devices.
    ///
    /// Open failures leave the slot unconnected and are retried on every
    /// subsequent call; transient failures (momentarily busy devices) heal
    /// without caller involvement.
    pub fn update(&mut self) {
        let Some(provider) = self.provider.as_mut() else {
            return;
        };

        self.registry.rescan(provider.as_mut(), self.sink.as_mut());

        for index in 0..MAX_SLOTS {
            let slot = &mut self.slots[index];

            if slot.state.connected {
                if let Some(session) = slot.session.as_mut() {
                    slot.state = session.update(self.sink.as_mut());
                }

                if !slot.state.connected {
                    // Device gone: drop the session and reset the caches so
                    // queries read defaults, not stale data.
                    if let Some(mut session) = slot.session.take() {
                        session.close();
                    }
                    slot.state = PadState::default();
                    slot.caps = PadCaps::default();
                    slot.identity = Identity::default();
                }
            } else if self.registry.is_connected(index) {
                if let Some(guid) = self.registry.guid_at(index) {
                    if let Some(mut session) = DeviceSession::open(
                        provider.as_mut(),
                        guid,
                        &mut self.blacklist,
                        self.sink.as_mut(),
                    ) {
                        slot.caps = session.capabilities();
                        slot.identity = session.identity().clone();
                        slot.state = session.update(self.sink.as_mut());
                        slot.session = Some(session);
                    }
                }
            }
        }
    }

    /// Whether a live device currently backs this slot.
    pub fn is_connected(&self, slot: usize) -> bool {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        self.slots[slot].state.connected
    }

    /// Number of buttons on the device at this slot (`0` when disconnected).
    pub fn button_count(&self, slot: usize) -> u32 {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        self.slots[slot].caps.button_count
    }

    /// Number of POV hats on the device at this slot (`0` when disconnected).
    pub fn pov_count(&self, slot: usize) -> u32 {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        self.slots[slot].caps.pov_count
    }

    /// Whether the device at this slot exposes the given logical axis.
    pub fn has_axis(&self, slot: usize, axis: Axis) -> bool {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        self.slots[slot].caps.has_axis(axis)
    }

    /// Whether a button is currently pressed (`false` when disconnected).
    pub fn is_button_pressed(&self, slot: usize, button: usize) -> bool {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        debug_assert!(button < MAX_BUTTONS, "button {button} out of range");
        self.slots[slot].state.buttons[button]
    }

    /// POV hat position: `-1` centered, else degrees (`-1` when disconnected).
    pub fn pov_position(&self, slot: usize, pov: usize) -> i32 {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        debug_assert!(pov < MAX_POVS, "pov {pov} out of range");
        self.slots[slot].state.povs[pov]
    }

    /// Axis position in `[-100.0, 100.0]` (`0.0` when disconnected).
    pub fn axis_position(&self, slot: usize, axis: Axis) -> f32 {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        self.slots[slot].state.axes[axis.index()]
    }

    /// Identity of the device at this slot (placeholder when disconnected).
    pub fn identity(&self, slot: usize) -> &Identity {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        &self.slots[slot].identity
    }

    /// Full capability snapshot for this slot.
    pub fn capabilities(&self, slot: usize) -> &PadCaps {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        &self.slots[slot].caps
    }

    /// Full state snapshot for this slot.
    pub fn state(&self, slot: usize) -> &PadState {
        debug_assert!(slot < MAX_SLOTS, "slot {slot} out of range");
        &self.slots[slot].state
    }

    /// Number of vendor/product pairs blacklisted so far.
    pub fn blacklist_len(&self) -> usize {
        self.blacklist.len()
    }
}
