//! serguard core: the object-graph stream reader, its resolution seam, and
//! the error surface shared by the gate and tooling.
//!
//! The reader decodes the Java Object Serialization Stream Protocol from any
//! `std::io::Read`. Every class descriptor it meets is handed to a
//! [`ClassResolver`](protocol::ClassResolver) before any value of that class is
//! read, which is where the gate in `serguard-gate` plugs in.
//!
//! # Panic-free parsing
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Hostile bytes surface as `GuardError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ErrorCode, GuardError, Result};
