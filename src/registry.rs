//! Slot registry and connection tracking.
//!
//! Hardware identities are ephemeral (a GUID per attachment); the query API
//! works in stable slot indices `0..MAX_SLOTS`. This module owns the mapping
//! between the two. Each [`SlotRegistry::rescan`] re-enumerates attached
//! devices, drops records for devices that vanished, and hands the lowest free
//! slots to newly discovered devices in discovery order.
//!
//! Slot assignment is a bijection at any instant, but it is *not* stable
//! across a full disconnect/reconnect cycle: a replugged device may land in a
//! different slot.

use crate::diag::DiagnosticSink;
use crate::provider::{DeviceGuid, Provider};
use crate::state::MAX_SLOTS;

/// One tracked hardware identity.
#[derive(Clone, Copy, Debug)]
struct TrackedDevice {
    guid: DeviceGuid,
    /// Assigned slot, or `None` while waiting for a free index.
    slot: Option<usize>,
    /// Seen during the current enumeration pass. Reset every rescan.
    plugged: bool,
}

/// Maps hardware GUIDs to stable slot indices across rescans.
#[derive(Debug, Default)]
pub struct SlotRegistry {
    tracked: Vec<TrackedDevice>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-enumerate attached devices and refresh the GUID/slot mapping.
    ///
    /// If enumeration itself fails, the tracked set is left untouched (no
    /// partial removal) and one line goes to the sink.
    pub fn rescan(&mut self, provider: &mut dyn Provider, sink: &mut dyn DiagnosticSink) {
        let guids = match provider.enumerate() {
            Ok(guids) => guids,
            Err(e) => {
                sink.write(&format!("failed to enumerate input devices: {e}"));
                return;
            }
        };

        for record in &mut self.tracked {
            record.plugged = false;
        }

        for guid in guids {
            match self.tracked.iter_mut().find(|r| r.guid == guid) {
                Some(record) => record.plugged = true,
                None => self.tracked.push(TrackedDevice {
                    guid,
                    slot: None,
                    plugged: true,
                }),
            }
        }

        // Devices absent from this pass were physically removed.
        self.tracked.retain(|record| record.plugged);

        // Hand free slots to unassigned records, lowest index first,
        // discovery order second. Records beyond MAX_SLOTS stay unassigned
        // until a slot frees up.
        for slot in 0..MAX_SLOTS {
            if self.tracked.iter().any(|r| r.slot == Some(slot)) {
                continue;
            }
            match self.tracked.iter_mut().find(|r| r.slot.is_none()) {
                Some(record) => record.slot = Some(slot),
                None => break,
            }
        }
    }

    /// Whether a tracked device currently holds this slot.
    pub fn is_connected(&self, slot: usize) -> bool {
        self.tracked.iter().any(|r| r.slot == Some(slot))
    }

    /// GUID of the device holding this slot, if any.
    pub fn guid_at(&self, slot: usize) -> Option<DeviceGuid> {
        self.tracked
            .iter()
            .find(|r| r.slot == Some(slot))
            .map(|r| r.guid)
    }

    /// Number of tracked identities (assigned or not).
    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::BufferSink;
    use crate::provider::{DeviceGuid, ProviderError, ProviderSession};

    /// Minimal provider: a scripted enumeration result per rescan.
    struct ScriptedProvider {
        passes: Vec<Result<Vec<DeviceGuid>, ProviderError>>,
    }

    impl ScriptedProvider {
        fn new(passes: Vec<Result<Vec<DeviceGuid>, ProviderError>>) -> Self {
            Self { passes }
        }
    }

    impl Provider for ScriptedProvider {
        fn enumerate(&mut self) -> Result<Vec<DeviceGuid>, ProviderError> {
            self.passes.remove(0)
        }

        fn create_session(
            &mut self,
            guid: DeviceGuid,
        ) -> Result<Box<dyn ProviderSession>, ProviderError> {
            Err(ProviderError::Create(format!("no session for {guid}")))
        }
    }

    fn g(n: u128) -> DeviceGuid {
        DeviceGuid(n)
    }

    #[test]
    fn same_device_keeps_its_slot_across_rescans() {
        let mut provider = ScriptedProvider::new(vec![Ok(vec![g(1)]), Ok(vec![g(1)])]);
        let mut sink = BufferSink::new();
        let mut registry = SlotRegistry::new();

        registry.rescan(&mut provider, &mut sink);
        assert!(registry.is_connected(0));
        assert_eq!(registry.guid_at(0), Some(g(1)));

        registry.rescan(&mut provider, &mut sink);
        assert_eq!(registry.guid_at(0), Some(g(1)));
        assert_eq!(registry.tracked_count(), 1);
    }

    #[test]
    fn freed_slot_is_reassigned_to_a_new_device() {
        let mut provider =
            ScriptedProvider::new(vec![Ok(vec![g(1)]), Ok(vec![]), Ok(vec![g(2)])]);
        let mut sink = BufferSink::new();
        let mut registry = SlotRegistry::new();

        registry.rescan(&mut provider, &mut sink);
        assert_eq!(registry.guid_at(0), Some(g(1)));

        registry.rescan(&mut provider, &mut sink);
        assert!(!registry.is_connected(0));
        assert_eq!(registry.tracked_count(), 0);

        registry.rescan(&mut provider, &mut sink);
        assert_eq!(registry.guid_at(0), Some(g(2)));
    }

    #[test]
    fn assignment_is_a_bijection() {
        let mut provider = ScriptedProvider::new(vec![Ok((0u128..12).map(g).collect())]);
        let mut sink = BufferSink::new();
        let mut registry = SlotRegistry::new();

        registry.rescan(&mut provider, &mut sink);

        let mut seen = std::collections::HashSet::new();
        for slot in 0..MAX_SLOTS {
            let guid = registry.guid_at(slot).expect("slot should be filled");
            assert!(seen.insert(guid), "guid {guid} holds two slots");
        }
        // Four devices are left waiting for a free slot.
        assert_eq!(registry.tracked_count(), 12);
    }

    #[test]
    fn surviving_device_shifts_are_not_invented() {
        // Device 2 keeps slot 1 when device 1 disappears; the newcomer gets
        // the freed slot 0.
        let mut provider = ScriptedProvider::new(vec![
            Ok(vec![g(1), g(2)]),
            Ok(vec![g(2), g(3)]),
        ]);
        let mut sink = BufferSink::new();
        let mut registry = SlotRegistry::new();

        registry.rescan(&mut provider, &mut sink);
        assert_eq!(registry.guid_at(0), Some(g(1)));
        assert_eq!(registry.guid_at(1), Some(g(2)));

        registry.rescan(&mut provider, &mut sink);
        assert_eq!(registry.guid_at(0), Some(g(3)));
        assert_eq!(registry.guid_at(1), Some(g(2)));
    }

    #[test]
    fn enumeration_failure_leaves_tracked_set_unchanged() {
        let mut provider = ScriptedProvider::new(vec![
            Ok(vec![g(1)]),
            Err(ProviderError::Enumeration("bus reset".into())),
        ]);
        let mut sink = BufferSink::new();
        let mut registry = SlotRegistry::new();

        registry.rescan(&mut provider, &mut sink);
        registry.rescan(&mut provider, &mut sink);

        assert_eq!(registry.guid_at(0), Some(g(1)));
        assert_eq!(sink.lines().len(), 1);
        assert!(sink.lines()[0].contains("failed to enumerate"));
    }
}
