//! Gatekeeping deserializer.
//!
//! `SafeObjectReader` is an `ObjectReader` whose resolver is wrapped in a
//! [`GateResolver`]. Every class descriptor in the graph, at any depth, is
//! checked against the denylist before the reader touches the data that
//! follows it. A rejection fails the whole `read_object` call and poisons the
//! reader: later reads fail the same way without consuming input.

use std::io::Read;
use std::sync::Arc;

use serguard_core::error::{GuardError, Result};
use serguard_core::protocol::{
    AnyClass, ClassResolver, ObjectInput, ObjectReader, ReaderOptions, Value,
};

use crate::policy::{Denylist, GateResolver};

#[derive(Debug, Clone, Copy, Default)]
pub struct GateOptions {
    pub reader: ReaderOptions,
    pub log_blocked_names: bool,
}

pub struct SafeObjectReader<R, C = AnyClass> {
    inner: ObjectReader<R, GateResolver<C>>,
    rejected: bool,
}

impl<R: Read> SafeObjectReader<R, AnyClass> {
    /// Gate over a reader that treats every permitted type as loadable.
    pub fn new(input: R) -> Result<Self> {
        Self::with_resolver(input, AnyClass)
    }
}

impl<R: Read, C: ClassResolver> SafeObjectReader<R, C> {
    pub fn with_resolver(input: R, resolver: C) -> Result<Self> {
        Self::with_options(input, resolver, GateOptions::default())
    }

    pub fn with_options(input: R, resolver: C, options: GateOptions) -> Result<Self> {
        Self::with_denylist(input, resolver, Denylist::standard(), options)
    }

    /// Reads the stream header; fails exactly as the plain reader would.
    pub fn with_denylist(
        input: R,
        resolver: C,
        denylist: Arc<Denylist>,
        options: GateOptions,
    ) -> Result<Self> {
        let gate = GateResolver::new(resolver, denylist).log_blocked_names(options.log_blocked_names);
        let inner = ObjectReader::with_options(input, gate, options.reader)?;
        Ok(Self {
            inner,
            rejected: false,
        })
    }

    /// The wrapped resolver.
    pub fn resolver(&self) -> &C {
        self.inner.resolver().inner()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    pub fn get_ref(&self) -> Option<&R> {
        self.inner.get_ref()
    }

    /// Whether a denylisted type has been seen on this stream.
    pub fn is_rejected(&self) -> bool {
        self.rejected
    }
}

impl<R: Read, C: ClassResolver> ObjectInput for SafeObjectReader<R, C> {
    fn read_object(&mut self) -> Result<Value> {
        if self.inner.is_closed() {
            return Err(GuardError::Closed);
        }
        if self.rejected {
            return Err(GuardError::SecurityViolation);
        }

        let res = self.inner.read_object();
        if matches!(&res, Err(e) if e.is_security_violation()) {
            self.rejected = true;
        }
        res
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}
