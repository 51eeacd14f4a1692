//! Policy layer (denylist + gating resolver).
//!
//! The denylist is compiled once into an immutable, `Arc`-shared value; the
//! gating resolver decorates whatever resolver the underlying reader uses and
//! consults the denylist before delegating.

pub mod denylist;
pub mod gate;

pub use denylist::{Denylist, DEFAULT_DENYLIST};
pub use gate::GateResolver;
