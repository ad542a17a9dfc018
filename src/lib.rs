//! padbank — a fixed bank of eight game-controller slots, polled on demand.
//!
//! The crate does one job: keep a stable, always-answerable view of up to
//! eight controllers. A [`Manager`] owns the platform access (through the
//! [`provider`] traits), re-scans connections every [`Manager::update`],
//! opens and closes device sessions as hardware comes and goes, and caches a
//! normalized snapshot per slot. Queries never block, never error, and never
//! return stale data: `connected == false` is the single validity gate.
//!
//! No global state — construct a [`Manager`], feed it a backend, call
//! `update()` once per frame, read the accessors.

pub mod backends;
pub mod blacklist;
pub mod diag;
pub mod format;
pub mod manager;
pub mod metadata;
pub mod provider;
pub mod registry;
pub mod session;
pub mod state;

pub use blacklist::Blacklist;
pub use diag::{BufferSink, DiagnosticSink, StderrSink};
pub use manager::Manager;
pub use metadata::Identity;
pub use registry::SlotRegistry;
pub use session::DeviceSession;
pub use state::{Axis, PadCaps, PadState, MAX_AXES, MAX_BUTTONS, MAX_POVS, MAX_SLOTS};
