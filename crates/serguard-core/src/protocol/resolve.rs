//! Type resolution seam.
//!
//! The reader calls a [`ClassResolver`] once for every class descriptor the
//! stream defines, after the descriptor's field layout is known and before its
//! annotation, superclass, or any instance data is read. Decorating a resolver
//! is how a caller intercepts the graph at the moment of type resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{GuardError, Result};

use super::desc::{ResolvedClass, StreamClass};

/// Maps stream descriptors to runtime types.
pub trait ClassResolver {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass>;

    /// Dynamic proxy implementing `interfaces`.
    fn resolve_proxy_class(&self, interfaces: &[Arc<str>]) -> Result<ResolvedClass> {
        Ok(ResolvedClass::proxy(interfaces))
    }
}

impl<T: ClassResolver + ?Sized> ClassResolver for &T {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass> {
        (**self).resolve_class(desc)
    }
    fn resolve_proxy_class(&self, interfaces: &[Arc<str>]) -> Result<ResolvedClass> {
        (**self).resolve_proxy_class(interfaces)
    }
}

impl<T: ClassResolver + ?Sized> ClassResolver for Arc<T> {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass> {
        (**self).resolve_class(desc)
    }
    fn resolve_proxy_class(&self, interfaces: &[Arc<str>]) -> Result<ResolvedClass> {
        (**self).resolve_proxy_class(interfaces)
    }
}

/// Resolves every descriptor to itself, as if every type were loadable.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnyClass;

impl ClassResolver for AnyClass {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass> {
        Ok(ResolvedClass::from_stream(desc))
    }
}

/// Closed set of loadable types, optionally pinned to a serialVersionUID.
///
/// Primitive arrays always resolve; object arrays resolve when their element
/// type does.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<String, Option<i64>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, accepting any serialVersionUID.
    pub fn register(mut self, name: impl Into<String>) -> Self {
        self.classes.insert(name.into(), None);
        self
    }

    /// Register `name`, rejecting descriptors whose UID differs.
    pub fn register_with_uid(mut self, name: impl Into<String>, uid: i64) -> Self {
        self.classes.insert(name.into(), Some(uid));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    fn knows_array(&self, name: &str) -> bool {
        let component = name.trim_start_matches('[');
        match component.len() {
            1 => component.bytes().all(|c| b"BCDFIJSZ".contains(&c)),
            _ => component
                .strip_prefix('L')
                .and_then(|c| c.strip_suffix(';'))
                .is_some_and(|c| self.contains(c)),
        }
    }
}

impl ClassResolver for ClassRegistry {
    fn resolve_class(&self, desc: &StreamClass) -> Result<ResolvedClass> {
        if desc.is_array() {
            if self.knows_array(&desc.name) {
                return Ok(ResolvedClass::from_stream(desc));
            }
            return Err(GuardError::ClassNotFound(desc.name.to_string()));
        }

        match self.classes.get(&*desc.name) {
            None => Err(GuardError::ClassNotFound(desc.name.to_string())),
            Some(Some(uid)) if *uid != desc.serial_version_uid => Err(GuardError::InvalidClass {
                name: desc.name.to_string(),
                reason: format!(
                    "local class incompatible: stream classdesc serialVersionUID = {}, local class serialVersionUID = {}",
                    desc.serial_version_uid, uid
                ),
            }),
            Some(_) => Ok(ResolvedClass::from_stream(desc)),
        }
    }

    fn resolve_proxy_class(&self, interfaces: &[Arc<str>]) -> Result<ResolvedClass> {
        if let Some(missing) = interfaces.iter().find(|i| !self.contains(i)) {
            return Err(GuardError::ClassNotFound(missing.to_string()));
        }
        Ok(ResolvedClass::proxy(interfaces))
    }
}
