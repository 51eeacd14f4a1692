//! Object-graph stream protocol.
//!
//! - `grammar`: tag bytes, descriptor flags and the wire handle base.
//! - `utf`: modified UTF-8 as used by every string on the wire.
//! - `desc`: class descriptors before and after resolution.
//! - `value`: the reconstructed graph.
//! - `resolve`: the type-resolution seam (`ClassResolver`) and stock resolvers.
//! - `reader`: `ObjectReader`, the decoder that drives all of the above.
//!
//! All parsing is panic-free: malformed or truncated input is reported as
//! `GuardError`, and declared lengths never drive up-front allocation.

pub mod desc;
pub mod grammar;
pub mod reader;
pub mod resolve;
pub mod utf;
pub mod value;

pub use desc::{ClassDesc, DescKind, FieldDesc, FieldType, ResolvedClass, StreamClass};
pub use reader::{ObjectInput, ObjectReader, ReaderOptions, DEFAULT_MAX_DEPTH};
pub use resolve::{AnyClass, ClassRegistry, ClassResolver};
pub use value::{Array, ClassData, EnumConstant, Object, Value};
