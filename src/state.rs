//! Normalized per-slot state and capability snapshots.
//!
//! Every device, whatever its wire format, is projected onto the same
//! fixed-size model: eight axes, four POV hats, 128 buttons.
//!
//! ## Value conventions
//! - **Axes:** `f32` in `[-100.0, 100.0]` (percent of full scale per direction).
//!   Raw device values are treated as signed 16-bit and rescaled with
//!   `(raw + 0.5) * 100.0 / 32767.5`, so raw `0` lands slightly above zero.
//! - **Buttons:** plain `bool`.
//! - **POV hats:** `-1` = centered, otherwise an angle in degrees clockwise
//!   from top, `[0, 360)`.
//!
//! ### Validity gate
//! `connected` is the *only* validity signal. When a slot reports
//! `connected == false` every other field holds its documented default
//! (`0.0` / `false` / `-1`), never stale data from a previous session.

use serde::{Deserialize, Serialize};

/// Maximum number of controller slots tracked by a [`Manager`](crate::Manager).
pub const MAX_SLOTS: usize = 8;

/// Maximum number of buttons per device.
pub const MAX_BUTTONS: usize = 128;

/// Maximum number of POV hats per device.
pub const MAX_POVS: usize = 4;

/// Maximum number of axes per device.
pub const MAX_AXES: usize = 8;

/// Logical axis identifiers of the uniform layout.
///
/// `S0`/`S1` are the two slider axes. Devices exposing more than two sliders
/// have the extras ignored; sliders are assigned first-come, first-assigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    S0,
    S1,
}

impl Axis {
    /// All axes in table order.
    pub const ALL: [Axis; MAX_AXES] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::Rx,
        Axis::Ry,
        Axis::Rz,
        Axis::S0,
        Axis::S1,
    ];

    /// Position of this axis in the fixed state tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Snapshot of one slot's input state.
///
/// Cheap to copy; the manager hands out references to its cached copy and
/// never mutates it outside [`Manager::update`](crate::Manager::update).
#[derive(Clone, Copy, Debug)]
pub struct PadState {
    /// Whether a live device currently backs this state.
    pub connected: bool,
    /// Axis positions, indexed by [`Axis::index`]. `[-100.0, 100.0]`.
    pub axes: [f32; MAX_AXES],
    /// POV hat positions: `-1` centered, else degrees `[0, 360)`.
    pub povs: [i32; MAX_POVS],
    /// Button states.
    pub buttons: [bool; MAX_BUTTONS],
}

impl Default for PadState {
    fn default() -> Self {
        Self {
            connected: false,
            axes: [0.0; MAX_AXES],
            povs: [-1; MAX_POVS],
            buttons: [false; MAX_BUTTONS],
        }
    }
}

/// Capabilities of a device, derived once when its session opens.
///
/// Counts reflect the channels the session actually resolved, not what the
/// device descriptor claims (some devices lie; see the session's open path).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PadCaps {
    /// Number of resolved buttons.
    pub button_count: u32,
    /// Number of resolved POV hats.
    pub pov_count: u32,
    /// Which logical axes are present, indexed by [`Axis::index`].
    pub axes: [bool; MAX_AXES],
}

impl PadCaps {
    /// True if the device exposes the given logical axis.
    #[inline]
    pub fn has_axis(&self, axis: Axis) -> bool {
        self.axes[axis.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_reads_documented_defaults() {
        let state = PadState::default();
        assert!(!state.connected);
        assert!(state.axes.iter().all(|&a| a == 0.0));
        assert!(state.povs.iter().all(|&p| p == -1));
        assert!(state.buttons.iter().all(|&b| !b));
    }

    #[test]
    fn axis_table_order_matches_indices() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
    }
}
