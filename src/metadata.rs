//! Device identity metadata.
//!
//! [`Identity`] is a lightweight, cloneable description of the device behind a
//! slot, suitable for UI display, logging, and persistence.
//!
//! ## Persistence notes
//! - `vendor_id`/`product_id` are stable and useful for re-identification
//!   (they are also the blacklist key).
//! - `name` is the driver/firmware product string and is best-effort: when the
//!   platform cannot supply one, the default `"No Joystick"` stays in place.

use serde::{Deserialize, Serialize};

/// Identity of the device occupying a slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Human-readable product name reported by the driver/firmware.
    pub name: String,
    /// USB Vendor ID (VID); `0` when unknown.
    pub vendor_id: u16,
    /// USB Product ID (PID); `0` when unknown.
    pub product_id: u16,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "No Joystick".to_string(),
            vendor_id: 0,
            product_id: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identity_is_the_placeholder() {
        let id = Identity::default();
        assert_eq!(id.name, "No Joystick");
        assert_eq!((id.vendor_id, id.product_id), (0, 0));
    }
}
