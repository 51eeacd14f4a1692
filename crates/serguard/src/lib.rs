//! Top-level facade crate for serguard.
//!
//! Re-exports the core reader and the gate so users can depend on a single crate.

pub mod core {
    pub use serguard_core::*;
}

pub mod gate {
    pub use serguard_gate::*;
}

pub use serguard_core::protocol::{ObjectInput, Value};
pub use serguard_core::{GuardError, Result};
pub use serguard_gate::SafeObjectReader;
