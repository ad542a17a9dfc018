//! The uniform data-format descriptor.
//!
//! Every session binds the same fixed layout: eight axes, four POV hats and
//! 128 buttons, all marked optional so a device binds whichever subset it
//! physically has. The descriptor is a plain value, computed once and cached
//! behind [`uniform_format`]; sessions share the same `&'static` instance.

use std::sync::OnceLock;

use crate::provider::{AxisMode, FieldId};
use crate::state::{Axis, MAX_BUTTONS, MAX_POVS};

/// Data layout requested from every session at open time.
#[derive(Clone, Debug)]
pub struct DataFormat {
    /// Reporting mode the layout assumes for axis fields.
    pub axis_mode: AxisMode,
    /// Every field of the layout, in table order. All fields are optional:
    /// binding succeeds even when the device exposes only a subset.
    pub fields: Vec<FieldId>,
}

/// The shared uniform format (axes, then POVs, then buttons).
pub fn uniform_format() -> &'static DataFormat {
    static FORMAT: OnceLock<DataFormat> = OnceLock::new();
    FORMAT.get_or_init(|| {
        let mut fields = Vec::with_capacity(Axis::ALL.len() + MAX_POVS + MAX_BUTTONS);
        fields.extend(Axis::ALL.iter().map(|&axis| FieldId::Axis(axis)));
        fields.extend((0..MAX_POVS as u8).map(FieldId::Pov));
        fields.extend((0..MAX_BUTTONS as u16).map(FieldId::Button));
        DataFormat {
            axis_mode: AxisMode::Absolute,
            fields,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MAX_AXES;

    #[test]
    fn format_covers_every_field_once() {
        let format = uniform_format();
        assert_eq!(format.axis_mode, AxisMode::Absolute);
        assert_eq!(format.fields.len(), MAX_AXES + MAX_POVS + MAX_BUTTONS);

        let mut seen = std::collections::HashSet::new();
        for field in &format.fields {
            assert!(seen.insert(*field), "duplicate field {field:?}");
        }
    }

    #[test]
    fn accessor_returns_the_same_instance() {
        assert!(std::ptr::eq(uniform_format(), uniform_format()));
    }
}
