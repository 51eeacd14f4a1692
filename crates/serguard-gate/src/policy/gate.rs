//! Denylist check at the type-resolution point.

use std::sync::Arc;

use serguard_core::error::{GuardError, Result};
use serguard_core::protocol::{ClassResolver, ResolvedClass, StreamClass};

use super::denylist::Denylist;

/// Resolver decorator: rejects denylisted names, delegates everything else
/// to `inner` untouched.
#[derive(Debug, Clone)]
pub struct GateResolver<C> {
    inner: C,
    denylist: Arc<Denylist>,
    log_blocked_names: bool,
}

impl<C: ClassResolver> GateResolver<C> {
    pub fn new(inner: C, denylist: Arc<Denylist>) -> Self {
        Self {
            inner,
            denylist,
            log_blocked_names: false,
        }
    }

    /// Include the rejected type name in the `warn!` event.
    pub fn log_blocked_names(mut self, enabled: bool) -> Self {
        self.log_blocked_names = enabled;
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    fn check(&self, name: &str) -> Result<()> {
        if let Some(entry) = self.denylist.matching(name) {
            if self.log_blocked_names {
                tracing::warn!(type_name = %name, entry = %entry, "rejected denylisted type");
            } else {
                tracing::warn!("rejected denylisted type");
            }
            return Err(GuardError::SecurityViolation);
        }
        Ok(())
    }
}

impl<C: ClassResolver> ClassResolver for GateResolver<C> {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass> {
        self.check(&desc.name)?;
        self.inner.resolve_class(desc)
    }

    fn resolve_proxy_class(&self, interfaces: &[Arc<str>]) -> Result<ResolvedClass> {
        for name in interfaces {
            self.check(name)?;
        }
        self.inner.resolve_proxy_class(interfaces)
    }
}
