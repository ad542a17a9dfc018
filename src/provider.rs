//! Capability-provider contract.
//!
//! The platform input subsystem is consumed, not implemented, by this crate:
//! everything the core needs from it is expressed as the two object-safe
//! traits below. A backend implements [`Provider`] (device enumeration and
//! session creation) and [`ProviderSession`] (one bound device: property
//! negotiation plus buffered/polled reads); the core never touches the
//! platform API directly.
//!
//! ## Field identifiers instead of byte offsets
//! Raw platform layouts dispatch fields by byte offset into an opaque blob.
//! Here every field of the uniform layout carries an enumerated [`FieldId`]
//! instead: buffered records are tagged with the field they touch, and the
//! polled [`RawState`] is indexed by field. Sessions resolve a
//! `logical slot -> FieldId` table once at open time and dispatch through it.
//!
//! ## Raw value conventions (pre-normalization)
//! - Axis data is signed 16-bit after the session forces the range to
//!   `[-32768, 32767]` at open time.
//! - Button bytes use the high bit for "pressed" in polled reads; buffered
//!   records use any nonzero data word.
//! - POV words report hundredth-free degrees with [`POV_CENTERED`] (`0xFFFF`)
//!   as the centered sentinel.

use thiserror::Error;

use crate::format::DataFormat;
use crate::state::{Axis, MAX_AXES, MAX_BUTTONS, MAX_POVS};

/// Raw POV word meaning "centered" (maps to logical `-1`).
pub const POV_CENTERED: u16 = 0xFFFF;

/// Opaque hardware instance identifier, globally unique per attached device.
///
/// Identity is per *attachment*: replugging a device may yield a new GUID.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceGuid(pub u128);

impl std::fmt::Display for DeviceGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Identifies one field of the uniform data layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    /// One of the eight logical axes.
    Axis(Axis),
    /// Button index in `0..MAX_BUTTONS`.
    Button(u16),
    /// POV hat index in `0..MAX_POVS`.
    Pov(u8),
}

/// Kind of a physical axis object as reported by the device descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisKind {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    /// Sliders are unnumbered at the descriptor level; the session assigns
    /// them to `S0`/`S1` in discovery order.
    Slider,
}

/// Kind of a device object yielded by [`ProviderSession::enumerate_objects`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Axis(AxisKind),
    Button,
    Pov,
}

/// Opaque per-session object handle, used to address a single object in
/// property calls such as [`ProviderSession::set_axis_range`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectRef(pub u32);

/// One entry from the device object enumeration.
#[derive(Clone, Copy, Debug)]
pub struct ObjectDesc {
    pub object: ObjectRef,
    pub kind: ObjectKind,
}

/// Raw capability descriptor counts, as claimed by the device.
///
/// Treated as advisory only: the session trusts its own object enumeration
/// and merely logs a diagnostic when these disagree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceCaps {
    pub axes: u32,
    pub buttons: u32,
    pub povs: u32,
}

/// Axis reporting mode. Sessions require [`AxisMode::Absolute`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisMode {
    Absolute,
    Relative,
}

/// Outcome of requesting an event buffer from the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferGrant {
    /// Buffered reads are available; drain change records per update.
    Buffered,
    /// The device only supports full-snapshot polling.
    PolledOnly,
}

/// One buffered change record.
#[derive(Clone, Copy, Debug)]
pub struct InputRecord {
    /// Which field of the uniform layout changed.
    pub field: FieldId,
    /// Raw data word. Interpretation depends on the field kind; see the
    /// module docs.
    pub data: u32,
}

/// Full raw state snapshot for polled reads, indexed by field.
#[derive(Clone, Copy, Debug)]
pub struct RawState {
    /// Raw axis values, indexed by [`Axis::index`].
    pub axes: [i32; MAX_AXES],
    /// Raw button bytes; high bit set = pressed.
    pub buttons: [u8; MAX_BUTTONS],
    /// Raw POV words; [`POV_CENTERED`] = centered.
    pub povs: [u32; MAX_POVS],
}

impl Default for RawState {
    fn default() -> Self {
        Self {
            axes: [0; MAX_AXES],
            buttons: [0; MAX_BUTTONS],
            povs: [POV_CENTERED as u32; MAX_POVS],
        }
    }
}

/// Error from enumeration or property negotiation calls.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("enumeration failed: {0}")]
    Enumeration(String),
    #[error("session creation failed: {0}")]
    Create(String),
    #[error("property access failed: {0}")]
    Property(String),
    #[error("data format rejected: {0}")]
    Format(String),
}

/// Error from a buffered or polled read.
///
/// `NotAcquired` and `InputLost` are transient: the session retries once
/// after re-acquiring, then treats the device as disconnected.
#[derive(Debug, Clone, Error)]
pub enum ReadError {
    #[error("device not acquired")]
    NotAcquired,
    #[error("input lost")]
    InputLost,
    #[error("read failed: {0}")]
    Other(String),
}

impl ReadError {
    /// True for errors worth a single re-acquire attempt.
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, ReadError::NotAcquired | ReadError::InputLost)
    }
}

/// Platform input subsystem: enumerates attached devices and opens sessions.
pub trait Provider {
    /// List GUIDs of all currently attached game controllers.
    fn enumerate(&mut self) -> Result<Vec<DeviceGuid>, ProviderError>;

    /// Open a session bound to one attached device.
    fn create_session(
        &mut self,
        guid: DeviceGuid,
    ) -> Result<Box<dyn ProviderSession>, ProviderError>;
}

/// One open platform session bound to one physical device.
///
/// Dropping the session releases the underlying platform handle; there is no
/// separate release call.
pub trait ProviderSession {
    /// Vendor/product ids of the device.
    fn vendor_product(&mut self) -> Result<(u16, u16), ProviderError>;

    /// Friendly product name. Callers treat failure as non-fatal.
    fn product_name(&mut self) -> Result<String, ProviderError>;

    /// Bind the uniform data layout to the session. After a successful bind,
    /// reads report fields using the format's [`FieldId`]s.
    fn bind_format(&mut self, format: &DataFormat) -> Result<(), ProviderError>;

    /// Raw capability descriptor counts claimed by the device.
    fn device_caps(&mut self) -> Result<DeviceCaps, ProviderError>;

    /// Enumerate the axis/button/POV objects the device actually exposes.
    fn enumerate_objects(&mut self) -> Result<Vec<ObjectDesc>, ProviderError>;

    /// Clamp one axis object's reported range.
    fn set_axis_range(
        &mut self,
        object: ObjectRef,
        min: i32,
        max: i32,
    ) -> Result<(), ProviderError>;

    /// Current axis reporting mode.
    fn axis_mode(&mut self) -> Result<AxisMode, ProviderError>;

    /// Request an axis reporting mode. Devices may silently ignore this;
    /// callers must re-read [`ProviderSession::axis_mode`] to verify.
    fn set_axis_mode(&mut self, mode: AxisMode) -> Result<(), ProviderError>;

    /// Ask the device for an event buffer of `events` entries.
    fn request_buffering(&mut self, events: u32) -> Result<BufferGrant, ProviderError>;

    /// Nudge the device to refresh its state (no-op on event-driven devices).
    fn poll(&mut self);

    /// (Re-)acquire the device after a transient read error. Best-effort.
    fn acquire(&mut self);

    /// Drain up to `max_records` buffered change records.
    fn read_buffered(&mut self, max_records: usize) -> Result<Vec<InputRecord>, ReadError>;

    /// Read one full raw state snapshot.
    fn read_state(&mut self) -> Result<RawState, ReadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_the_two_acquire_cases() {
        assert!(ReadError::NotAcquired.is_transient());
        assert!(ReadError::InputLost.is_transient());
        assert!(!ReadError::Other("io".into()).is_transient());
    }

    #[test]
    fn default_raw_state_has_centered_povs() {
        let raw = RawState::default();
        assert!(raw.povs.iter().all(|&p| p == POV_CENTERED as u32));
    }
}
