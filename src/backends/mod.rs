//! Input backends for `padbank`.
//!
//! A backend is anything implementing [`Provider`](crate::provider::Provider)
//! and handing out [`ProviderSession`](crate::provider::ProviderSession)s.
//! Platform backends (DirectInput, evdev, ...) live outside this crate and
//! plug in through those traits.
//!
//! # Feature flags
//! - **`virtual`** — an in-process, fully scriptable backend. It powers the
//!   test suite and the demo programs, and is handy for replaying recorded
//!   input in applications.

#[cfg(feature = "virtual")]
#[cfg_attr(docsrs, doc(cfg(feature = "virtual")))]
pub mod virtual_input;
