//! Scriptable in-process backend.
//!
//! [`VirtualHub`] plays the role of the platform input subsystem: tests and
//! demos attach declarative [`VirtualPad`]s, script their behavior (queued
//! records, polled state, read faults, negotiation quirks), and keep the hub
//! handle around to drive the scenario while a [`Manager`](crate::Manager)
//! owns the provider end.
//!
//! The hub is a shared handle (`Rc<RefCell<...>>` internally): cloning it is
//! cheap and every clone sees the same attached devices. Like the rest of the
//! crate this backend is single-threaded by design.
//!
//! # Example
//! ```
//! use padbank::backends::virtual_input::{VirtualHub, VirtualPad};
//! use padbank::provider::AxisKind;
//!
//! let hub = VirtualHub::new();
//! hub.attach(
//!     VirtualPad::new(0xA11CE, "Test Stick")
//!         .with_ids(0x1234, 0x5678)
//!         .with_axes(&[AxisKind::X, AxisKind::Y])
//!         .with_buttons(4),
//! );
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::format::DataFormat;
use crate::provider::{
    AxisKind, AxisMode, BufferGrant, DeviceCaps, DeviceGuid, InputRecord, ObjectDesc, ObjectKind,
    ObjectRef, Provider, ProviderError, ProviderSession, RawState, ReadError,
};

/// One scriptable device attached to a [`VirtualHub`].
///
/// Builder-style configuration; everything defaults to a well-behaved
/// buffered gamepad with no objects.
pub struct VirtualPad {
    guid: DeviceGuid,
    name: String,
    vendor_id: u16,
    product_id: u16,
    axes: Vec<AxisKind>,
    buttons: u32,
    povs: u32,
    /// Capability counts the device *claims*, when different from reality.
    claimed_caps: Option<DeviceCaps>,
    /// Current axis reporting mode. Real devices commonly start relative.
    mode: AxisMode,
    /// Device ignores absolute-mode writes (the blacklisting case).
    refuses_absolute: bool,
    /// Grant only full-snapshot polling instead of an event buffer.
    polled_only: bool,
    fail_create: bool,
    fail_bind: bool,
    queued: VecDeque<InputRecord>,
    polled_state: RawState,
    /// Scripted read faults, consumed one per read attempt.
    read_faults: VecDeque<ReadError>,
    // Interaction counters for assertions.
    bind_calls: u32,
    negotiation_calls: u32,
    releases: u32,
}

impl VirtualPad {
    pub fn new(guid: u128, name: &str) -> Self {
        Self {
            guid: DeviceGuid(guid),
            name: name.to_string(),
            vendor_id: 0,
            product_id: 0,
            axes: Vec::new(),
            buttons: 0,
            povs: 0,
            claimed_caps: None,
            mode: AxisMode::Relative,
            refuses_absolute: false,
            polled_only: false,
            fail_create: false,
            fail_bind: false,
            queued: VecDeque::new(),
            polled_state: RawState::default(),
            read_faults: VecDeque::new(),
            bind_calls: 0,
            negotiation_calls: 0,
            releases: 0,
        }
    }

    pub fn with_ids(mut self, vendor_id: u16, product_id: u16) -> Self {
        self.vendor_id = vendor_id;
        self.product_id = product_id;
        self
    }

    pub fn with_axes(mut self, axes: &[AxisKind]) -> Self {
        self.axes = axes.to_vec();
        self
    }

    pub fn with_buttons(mut self, buttons: u32) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_povs(mut self, povs: u32) -> Self {
        self.povs = povs;
        self
    }

    /// Claim different capability counts than the device actually has.
    pub fn claiming_caps(mut self, axes: u32, buttons: u32, povs: u32) -> Self {
        self.claimed_caps = Some(DeviceCaps {
            axes,
            buttons,
            povs,
        });
        self
    }

    /// Only grant full-snapshot polling.
    pub fn polled_only(mut self) -> Self {
        self.polled_only = true;
        self
    }

    /// Ignore absolute-mode writes, triggering the blacklist path.
    pub fn refusing_absolute(mut self) -> Self {
        self.refuses_absolute = true;
        self
    }

    /// Fail session creation outright.
    pub fn failing_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    /// Reject the data-format bind.
    pub fn failing_bind(mut self) -> Self {
        self.fail_bind = true;
        self
    }

    fn object_descs(&self) -> Vec<ObjectDesc> {
        let mut descs = Vec::new();
        let mut next = 0u32;
        let mut push = |descs: &mut Vec<ObjectDesc>, kind: ObjectKind| {
            descs.push(ObjectDesc {
                object: ObjectRef(next),
                kind,
            });
            next += 1;
        };
        for &axis in &self.axes {
            push(&mut descs, ObjectKind::Axis(axis));
        }
        for _ in 0..self.povs {
            push(&mut descs, ObjectKind::Pov);
        }
        for _ in 0..self.buttons {
            push(&mut descs, ObjectKind::Button);
        }
        descs
    }

    fn actual_caps(&self) -> DeviceCaps {
        DeviceCaps {
            axes: self.axes.len() as u32,
            buttons: self.buttons,
            povs: self.povs,
        }
    }
}

#[derive(Default)]
struct HubInner {
    attached: Vec<VirtualPad>,
    /// Fail the next `enumerate` call, once.
    fail_next_enumeration: bool,
}

impl HubInner {
    fn pad(&mut self, guid: DeviceGuid) -> Option<&mut VirtualPad> {
        self.attached.iter_mut().find(|p| p.guid == guid)
    }
}

/// Shared control handle over the virtual input subsystem.
#[derive(Clone, Default)]
pub struct VirtualHub {
    inner: Rc<RefCell<HubInner>>,
}

impl VirtualHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// The provider end, to be boxed into a [`Manager`](crate::Manager).
    pub fn provider(&self) -> VirtualProvider {
        VirtualProvider {
            inner: Rc::clone(&self.inner),
        }
    }

    /// Attach a device; it shows up on the next enumeration.
    pub fn attach(&self, pad: VirtualPad) {
        self.inner.borrow_mut().attached.push(pad);
    }

    /// Detach a device. Open sessions against it start failing with
    /// [`ReadError::InputLost`].
    pub fn detach(&self, guid: u128) {
        self.inner
            .borrow_mut()
            .attached
            .retain(|p| p.guid != DeviceGuid(guid));
    }

    /// Make the next enumeration fail, once.
    pub fn fail_next_enumeration(&self) {
        self.inner.borrow_mut().fail_next_enumeration = true;
    }

    /// Queue a buffered change record on a device.
    pub fn push_record(&self, guid: u128, record: InputRecord) {
        if let Some(pad) = self.inner.borrow_mut().pad(DeviceGuid(guid)) {
            pad.queued.push_back(record);
        }
    }

    /// Replace a device's polled raw state.
    pub fn set_polled_state(&self, guid: u128, raw: RawState) {
        if let Some(pad) = self.inner.borrow_mut().pad(DeviceGuid(guid)) {
            pad.polled_state = raw;
        }
    }

    /// Script a read fault; each read attempt consumes one.
    pub fn inject_read_fault(&self, guid: u128, fault: ReadError) {
        if let Some(pad) = self.inner.borrow_mut().pad(DeviceGuid(guid)) {
            pad.read_faults.push_back(fault);
        }
    }

    /// How many sessions against this device have been released so far.
    pub fn release_count(&self, guid: u128) -> u32 {
        self.inner
            .borrow_mut()
            .pad(DeviceGuid(guid))
            .map_or(0, |p| p.releases)
    }

    /// How many times the device's format bind was invoked.
    pub fn bind_count(&self, guid: u128) -> u32 {
        self.inner
            .borrow_mut()
            .pad(DeviceGuid(guid))
            .map_or(0, |p| p.bind_calls)
    }

    /// How many property-negotiation calls the device has seen.
    pub fn negotiation_count(&self, guid: u128) -> u32 {
        self.inner
            .borrow_mut()
            .pad(DeviceGuid(guid))
            .map_or(0, |p| p.negotiation_calls)
    }
}

/// [`Provider`] implementation backed by a [`VirtualHub`].
pub struct VirtualProvider {
    inner: Rc<RefCell<HubInner>>,
}

impl Provider for VirtualProvider {
    fn enumerate(&mut self) -> Result<Vec<DeviceGuid>, ProviderError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next_enumeration {
            inner.fail_next_enumeration = false;
            return Err(ProviderError::Enumeration("scripted failure".into()));
        }
        Ok(inner.attached.iter().map(|p| p.guid).collect())
    }

    fn create_session(
        &mut self,
        guid: DeviceGuid,
    ) -> Result<Box<dyn ProviderSession>, ProviderError> {
        let mut inner = self.inner.borrow_mut();
        let pad = inner
            .pad(guid)
            .ok_or_else(|| ProviderError::Create(format!("{guid} is not attached")))?;
        if pad.fail_create {
            return Err(ProviderError::Create("scripted failure".into()));
        }
        Ok(Box::new(VirtualSession {
            inner: Rc::clone(&self.inner),
            guid,
        }))
    }
}

/// One session bound to a [`VirtualPad`]. All calls look the device up by
/// GUID, so detaching it mid-session behaves like a yanked cable.
struct VirtualSession {
    inner: Rc<RefCell<HubInner>>,
    guid: DeviceGuid,
}

impl VirtualSession {
    fn with_pad<T>(
        &mut self,
        f: impl FnOnce(&mut VirtualPad) -> T,
    ) -> Result<T, ProviderError> {
        let mut inner = self.inner.borrow_mut();
        match inner.pad(self.guid) {
            Some(pad) => Ok(f(pad)),
            None => Err(ProviderError::Property(format!(
                "{} is not attached",
                self.guid
            ))),
        }
    }

    fn read_fault(&mut self) -> Option<ReadError> {
        let mut inner = self.inner.borrow_mut();
        match inner.pad(self.guid) {
            Some(pad) => pad.read_faults.pop_front(),
            // Detached mid-session: every read fails like a pulled plug.
            None => Some(ReadError::InputLost),
        }
    }
}

impl ProviderSession for VirtualSession {
    fn vendor_product(&mut self) -> Result<(u16, u16), ProviderError> {
        self.with_pad(|pad| (pad.vendor_id, pad.product_id))
    }

    fn product_name(&mut self) -> Result<String, ProviderError> {
        self.with_pad(|pad| pad.name.clone())
    }

    fn bind_format(&mut self, _format: &DataFormat) -> Result<(), ProviderError> {
        let fail = self.with_pad(|pad| {
            pad.bind_calls += 1;
            pad.negotiation_calls += 1;
            pad.fail_bind
        })?;
        if fail {
            return Err(ProviderError::Format("scripted rejection".into()));
        }
        Ok(())
    }

    fn device_caps(&mut self) -> Result<DeviceCaps, ProviderError> {
        self.with_pad(|pad| {
            pad.negotiation_calls += 1;
            pad.claimed_caps.unwrap_or_else(|| pad.actual_caps())
        })
    }

    fn enumerate_objects(&mut self) -> Result<Vec<ObjectDesc>, ProviderError> {
        self.with_pad(|pad| {
            pad.negotiation_calls += 1;
            pad.object_descs()
        })
    }

    fn set_axis_range(
        &mut self,
        _object: ObjectRef,
        _min: i32,
        _max: i32,
    ) -> Result<(), ProviderError> {
        self.with_pad(|pad| pad.negotiation_calls += 1)
    }

    fn axis_mode(&mut self) -> Result<AxisMode, ProviderError> {
        self.with_pad(|pad| {
            pad.negotiation_calls += 1;
            pad.mode
        })
    }

    fn set_axis_mode(&mut self, mode: AxisMode) -> Result<(), ProviderError> {
        self.with_pad(|pad| {
            pad.negotiation_calls += 1;
            if !pad.refuses_absolute {
                pad.mode = mode;
            }
        })
    }

    fn request_buffering(&mut self, _events: u32) -> Result<BufferGrant, ProviderError> {
        self.with_pad(|pad| {
            pad.negotiation_calls += 1;
            if pad.polled_only {
                BufferGrant::PolledOnly
            } else {
                BufferGrant::Buffered
            }
        })
    }

    fn poll(&mut self) {}

    fn acquire(&mut self) {}

    fn read_buffered(&mut self, max_records: usize) -> Result<Vec<InputRecord>, ReadError> {
        if let Some(fault) = self.read_fault() {
            return Err(fault);
        }
        let mut inner = self.inner.borrow_mut();
        let pad = match inner.pad(self.guid) {
            Some(pad) => pad,
            None => return Err(ReadError::InputLost),
        };
        let take = pad.queued.len().min(max_records);
        Ok(pad.queued.drain(..take).collect())
    }

    fn read_state(&mut self) -> Result<RawState, ReadError> {
        if let Some(fault) = self.read_fault() {
            return Err(fault);
        }
        let mut inner = self.inner.borrow_mut();
        match inner.pad(self.guid) {
            Some(pad) => Ok(pad.polled_state),
            None => Err(ReadError::InputLost),
        }
    }
}

impl Drop for VirtualSession {
    fn drop(&mut self) {
        if let Some(pad) = self.inner.borrow_mut().pad(self.guid) {
            pad.releases += 1;
        }
    }
}
