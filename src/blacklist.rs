//! Vendor/product blacklist.
//!
//! Some devices accept the absolute-axis property write and then keep
//! reporting relative values anyway. Once a device fails absolute-mode
//! verification its `(vendor_id, product_id)` pair lands here, and every
//! later open attempt for that pair is rejected before any negotiation.
//!
//! The list is append-only and lives exactly as long as the owning
//! [`Manager`](crate::Manager); there is no removal.

/// Append-only set of `(vendor_id, product_id)` pairs excluded from opens.
#[derive(Debug, Default)]
pub struct Blacklist {
    entries: Vec<(u16, u16)>,
}

impl Blacklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pair is blacklisted.
    pub fn contains(&self, vendor_id: u16, product_id: u16) -> bool {
        self.entries
            .iter()
            .any(|&(v, p)| v == vendor_id && p == product_id)
    }

    /// Add a pair. Duplicates are ignored.
    pub fn insert(&mut self, vendor_id: u16, product_id: u16) {
        if !self.contains(vendor_id, product_id) {
            self.entries.push((vendor_id, product_id));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
