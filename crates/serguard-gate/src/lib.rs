//! serguard gate library entry.
//!
//! Wraps the core object reader with a denylist check at every type
//! resolution point, plus the strict config used by the `serguard-inspect`
//! binary and by hosts that want the same knobs.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod policy;
pub mod stream;

pub use policy::{Denylist, GateResolver, DEFAULT_DENYLIST};
pub use stream::{GateOptions, SafeObjectReader};
