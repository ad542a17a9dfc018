//! Device sessions.
//!
//! A [`DeviceSession`] owns exactly one open provider session bound to one
//! physical device. Opening performs the whole capability negotiation in one
//! pass: identity properties, blacklist check, uniform format binding, object
//! resolution, absolute-axis enforcement, and the buffering handshake. After a
//! successful open the session is driven purely through [`DeviceSession::update`].
//!
//! This module does **not**:
//! - decide *which* device a slot maps to (that is the registry's job)
//! - cache results for the query API (that is the manager's job)
//!
//! ## Buffered vs polled
//! Devices that grant an event buffer are updated incrementally: each drained
//! record touches exactly one field and untouched fields keep their previous
//! value. Polled devices produce a fresh full snapshot every update, with
//! unresolved fields at their defaults.

use crate::blacklist::Blacklist;
use crate::diag::DiagnosticSink;
use crate::format::uniform_format;
use crate::metadata::Identity;
use crate::provider::{
    AxisKind, AxisMode, BufferGrant, DeviceGuid, FieldId, ObjectKind, Provider, ProviderSession,
    POV_CENTERED,
};
use crate::state::{Axis, PadCaps, PadState, MAX_AXES, MAX_BUTTONS, MAX_POVS};

/// Size of the event buffer requested from every device, and the maximum
/// number of records drained per update. Keeps one chatty device from
/// starving the rest of the frame.
const EVENT_BUFFER_SIZE: usize = 32;

/// Rescale a raw signed 16-bit axis value to `[-100.0, 100.0]`.
///
/// The `+ 0.5` bias centers the integer lattice so both endpoints map exactly
/// to +/-100; raw `0` maps slightly above zero as a consequence.
#[inline]
pub(crate) fn normalize_axis(raw: i32) -> f32 {
    (raw as f32 + 0.5) * 100.0 / 32767.5
}

/// Decode a raw POV word: [`POV_CENTERED`] means centered (`-1`), anything
/// else is an angle in degrees, passed through unchanged.
#[inline]
pub(crate) fn decode_pov(word: u32) -> i32 {
    let value = (word & 0xFFFF) as u16;
    if value == POV_CENTERED {
        -1
    } else {
        i32::from(value)
    }
}

/// One open session bound to one physical device.
///
/// Owned by exactly one manager slot. Destroyed on disconnect detection and
/// re-created fresh on the next successful open; no state survives a reopen.
pub struct DeviceSession {
    handle: Option<Box<dyn ProviderSession>>,
    identity: Identity,
    /// Resolved field per logical axis, `None` when the device lacks it.
    axes: [Option<FieldId>; MAX_AXES],
    povs: [Option<FieldId>; MAX_POVS],
    buttons: [Option<FieldId>; MAX_BUTTONS],
    /// Accumulated state; only meaningful in buffered mode.
    state: PadState,
    /// Whether the device granted an event buffer at open time.
    buffered: bool,
}

impl DeviceSession {
    /// Open a session for an attached device and negotiate its capabilities.
    ///
    /// Returns `None` on any unrecoverable failure; one line per failure goes
    /// to the sink. Blacklisted devices fail before any negotiation call. A
    /// device that cannot be forced into absolute axis mode is added to the
    /// blacklist and will never open again for the lifetime of the owning
    /// manager.
    pub fn open(
        provider: &mut dyn Provider,
        guid: DeviceGuid,
        blacklist: &mut Blacklist,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<DeviceSession> {
        let mut handle = match provider.create_session(guid) {
            Ok(handle) => handle,
            Err(e) => {
                sink.write(&format!("failed to create input session for {guid}: {e}"));
                return None;
            }
        };

        // Vendor/product lookup is best-effort; the blacklist only applies
        // when both ids are known.
        let mut identity = Identity::default();
        if let Ok((vendor_id, product_id)) = handle.vendor_product() {
            identity.vendor_id = vendor_id;
            identity.product_id = product_id;

            if vendor_id != 0 && product_id != 0 && blacklist.contains(vendor_id, product_id) {
                return None;
            }
        }

        if let Ok(name) = handle.product_name() {
            identity.name = name;
        }

        if let Err(e) = handle.bind_format(uniform_format()) {
            sink.write(&format!(
                "failed to bind data format for '{}': {e}",
                identity.name
            ));
            return None;
        }

        let claimed = match handle.device_caps() {
            Ok(caps) => caps,
            Err(e) => {
                sink.write(&format!(
                    "failed to get device capabilities for '{}': {e}",
                    identity.name
                ));
                return None;
            }
        };

        let objects = match handle.enumerate_objects() {
            Ok(objects) => objects,
            Err(e) => {
                sink.write(&format!(
                    "failed to enumerate device objects for '{}': {e}",
                    identity.name
                ));
                return None;
            }
        };

        let mut session = DeviceSession {
            handle: None,
            identity,
            axes: [None; MAX_AXES],
            povs: [None; MAX_POVS],
            buttons: [None; MAX_BUTTONS],
            state: PadState::default(),
            buffered: false,
        };

        for desc in &objects {
            match desc.kind {
                ObjectKind::Axis(kind) => {
                    let axis = match kind {
                        AxisKind::X => Some(Axis::X),
                        AxisKind::Y => Some(Axis::Y),
                        AxisKind::Z => Some(Axis::Z),
                        AxisKind::Rx => Some(Axis::Rx),
                        AxisKind::Ry => Some(Axis::Ry),
                        AxisKind::Rz => Some(Axis::Rz),
                        // Exactly two sliders, first-come, first-assigned.
                        AxisKind::Slider => {
                            if session.axes[Axis::S0.index()].is_none() {
                                Some(Axis::S0)
                            } else if session.axes[Axis::S1.index()].is_none() {
                                Some(Axis::S1)
                            } else {
                                None
                            }
                        }
                    };

                    if let Some(axis) = axis {
                        session.axes[axis.index()] = Some(FieldId::Axis(axis));

                        // Clamp the reported range to signed 16-bit so the
                        // normalization formula holds. Failure is non-fatal.
                        if let Err(e) = handle.set_axis_range(
                            desc.object,
                            i32::from(i16::MIN),
                            i32::from(i16::MAX),
                        ) {
                            sink.write(&format!(
                                "failed to set axis range on '{}': {e}",
                                session.identity.name
                            ));
                        }
                    }
                }
                ObjectKind::Pov => {
                    if let Some(idx) = session.povs.iter().position(Option::is_none) {
                        session.povs[idx] = Some(FieldId::Pov(idx as u8));
                    }
                }
                ObjectKind::Button => {
                    if let Some(idx) = session.buttons.iter().position(Option::is_none) {
                        session.buttons[idx] = Some(FieldId::Button(idx as u16));
                    }
                }
            }
        }

        // The descriptor is advisory; flag devices whose claims disagree with
        // what object enumeration actually produced.
        let caps = session.derive_caps();
        let resolved_axes = caps.axes.iter().filter(|&&a| a).count() as u32;
        if claimed.axes != resolved_axes
            || claimed.buttons != caps.button_count
            || claimed.povs != caps.pov_count
        {
            sink.write(&format!(
                "device '{}' claims {}/{}/{} axes/buttons/povs, resolved {}/{}/{}",
                session.identity.name,
                claimed.axes,
                claimed.buttons,
                claimed.povs,
                resolved_axes,
                caps.button_count,
                caps.pov_count,
            ));
        }

        // Force absolute reporting if the device has any axis at all. Devices
        // that ignore the write get blacklisted so we never retry them.
        if session.axes.iter().any(Option::is_some) {
            let mode = match handle.axis_mode() {
                Ok(mode) => mode,
                Err(e) => {
                    sink.write(&format!(
                        "failed to get axis mode for '{}': {e}",
                        session.identity.name
                    ));
                    return None;
                }
            };

            if mode != AxisMode::Absolute {
                let _ = handle.set_axis_mode(AxisMode::Absolute);

                match handle.axis_mode() {
                    Ok(AxisMode::Absolute) => {}
                    Ok(_) => {
                        if session.identity.vendor_id != 0 && session.identity.product_id != 0 {
                            blacklist
                                .insert(session.identity.vendor_id, session.identity.product_id);
                        }
                        return None;
                    }
                    Err(e) => {
                        sink.write(&format!(
                            "failed to verify axis mode for '{}': {e}",
                            session.identity.name
                        ));
                        return None;
                    }
                }
            }
        }

        match handle.request_buffering(EVENT_BUFFER_SIZE as u32) {
            Ok(BufferGrant::Buffered) => session.buffered = true,
            Ok(BufferGrant::PolledOnly) => session.buffered = false,
            Err(e) => {
                sink.write(&format!(
                    "failed to set event buffer size for '{}': {e}",
                    session.identity.name
                ));
                return None;
            }
        }

        #[cfg(all(feature = "debug-log", debug_assertions))]
        eprintln!(
            "[SESSION/OPEN] guid={guid} vid=0x{vid:04x} pid=0x{pid:04x} product={product:?} buffered={buffered}",
            vid = session.identity.vendor_id,
            pid = session.identity.product_id,
            product = session.identity.name,
            buffered = session.buffered,
        );

        session.handle = Some(handle);
        Some(session)
    }

    /// Produce the current state snapshot for this device.
    ///
    /// A returned `connected == false` means the device is gone and the
    /// caller should close the session and reset its caches.
    pub fn update(&mut self, sink: &mut dyn DiagnosticSink) -> PadState {
        if self.buffered {
            self.update_buffered(sink)
        } else {
            self.update_polled(sink)
        }
    }

    fn update_buffered(&mut self, sink: &mut dyn DiagnosticSink) -> PadState {
        // Pessimistically disconnected until the read succeeds.
        self.state.connected = false;

        let Some(handle) = self.handle.as_mut() else {
            return self.state;
        };

        let mut result = handle.read_buffered(EVENT_BUFFER_SIZE);

        if matches!(&result, Err(e) if e.is_transient()) {
            handle.acquire();
            result = handle.read_buffered(EVENT_BUFFER_SIZE);
        }

        let records = match result {
            Ok(records) => records,
            Err(e) if e.is_transient() => {
                // Re-acquire did not help; the hardware is gone.
                self.handle = None;
                return self.state;
            }
            Err(e) => {
                sink.write(&format!("failed to read buffered input records: {e}"));
                return self.state;
            }
        };

        for record in records {
            match record.field {
                FieldId::Axis(axis) => {
                    if self.axes[axis.index()] == Some(record.field) {
                        // Low 16 bits carry the signed axis value.
                        self.state.axes[axis.index()] =
                            normalize_axis(i32::from(record.data as i16));
                    }
                }
                FieldId::Button(idx) => {
                    let idx = usize::from(idx);
                    if idx < MAX_BUTTONS && self.buttons[idx] == Some(record.field) {
                        self.state.buttons[idx] = record.data != 0;
                    }
                }
                FieldId::Pov(idx) => {
                    let idx = usize::from(idx);
                    if idx < MAX_POVS && self.povs[idx] == Some(record.field) {
                        self.state.povs[idx] = decode_pov(record.data);
                    }
                }
            }
        }

        self.state.connected = true;
        self.state
    }

    fn update_polled(&mut self, sink: &mut dyn DiagnosticSink) -> PadState {
        let mut state = PadState::default();

        let Some(handle) = self.handle.as_mut() else {
            return state;
        };

        handle.poll();
        let mut result = handle.read_state();

        if matches!(&result, Err(e) if e.is_transient()) {
            handle.acquire();
            handle.poll();
            result = handle.read_state();
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) if e.is_transient() => {
                self.handle = None;
                return state;
            }
            Err(e) => {
                sink.write(&format!("failed to read input state: {e}"));
                return state;
            }
        };

        // Every field is mapped independently; unresolved fields keep their
        // defaults rather than values from a previous read.
        for axis in Axis::ALL {
            if self.axes[axis.index()].is_some() {
                state.axes[axis.index()] = normalize_axis(raw.axes[axis.index()]);
            }
        }

        for (idx, resolved) in self.buttons.iter().enumerate() {
            state.buttons[idx] = resolved.is_some() && (raw.buttons[idx] & 0x80) != 0;
        }

        for (idx, resolved) in self.povs.iter().enumerate() {
            if resolved.is_some() {
                state.povs[idx] = decode_pov(raw.povs[idx]);
            }
        }

        state.connected = true;
        state
    }

    /// Release the bound provider session. Idempotent.
    pub fn close(&mut self) {
        self.handle = None;
    }

    /// Capabilities derived from the resolved field tables.
    pub fn capabilities(&self) -> PadCaps {
        self.derive_caps()
    }

    /// Identity read during open.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Whether the device granted buffered reads.
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    fn derive_caps(&self) -> PadCaps {
        let mut caps = PadCaps {
            button_count: self.buttons.iter().filter(|b| b.is_some()).count() as u32,
            pov_count: self.povs.iter().filter(|p| p.is_some()).count() as u32,
            ..PadCaps::default()
        };
        for axis in Axis::ALL {
            caps.axes[axis.index()] = self.axes[axis.index()].is_some();
        }
        caps
    }
}
