//! Denylist compilation and matching.
//!
//! Matching is a case-sensitive suffix test against the complete type name,
//! so a listed type is also caught behind any extra package prefix.

use std::sync::{Arc, OnceLock};

use serguard_core::error::{GuardError, Result};

/// Known deserialization gadget types.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "org.apache.commons.collections.functors.InvokerTransformer",
    "org.apache.commons.collections.functors.InstantiateTransformer",
    "org.apache.commons.collections4.functors.InvokerTransformer",
    "org.apache.commons.collections4.functors.InstantiateTransformer",
    "org.codehaus.groovy.runtime.ConvertedClosure",
    "org.codehaus.groovy.runtime.MethodClosure",
    "org.springframework.beans.factory.ObjectFactory",
    "com.sun.org.apache.xalan.internal.xsltc.trax.TemplatesImpl",
    "org.apache.xalan.xsltc.trax.TemplatesImpl",
];

/// Immutable set of denied type names.
#[derive(Debug)]
pub struct Denylist {
    entries: Vec<String>,
}

impl Denylist {
    /// Compile a denylist. Entries must be non-empty and free of whitespace.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for e in entries {
            let e = e.into();
            if e.is_empty() || e.chars().any(char::is_whitespace) {
                return Err(GuardError::Config(format!("invalid denylist entry: {e:?}")));
            }
            if !out.contains(&e) {
                out.push(e);
            }
        }
        Ok(Self { entries: out })
    }

    /// Process-wide list built from [`DEFAULT_DENYLIST`].
    pub fn standard() -> Arc<Denylist> {
        static STANDARD: OnceLock<Arc<Denylist>> = OnceLock::new();
        STANDARD
            .get_or_init(|| {
                Arc::new(Denylist {
                    entries: DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
                })
            })
            .clone()
    }

    /// First entry `name` ends with, if any.
    pub fn matching(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| name.ends_with(e.as_str()))
            .map(String::as_str)
    }

    pub fn is_blocked(&self, name: &str) -> bool {
        self.matching(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn every_entry_blocks_itself() {
        let list = Denylist::standard();
        assert_eq!(list.len(), 9);
        for name in DEFAULT_DENYLIST {
            assert!(list.is_blocked(name), "{name}");
        }
    }

    #[test]
    fn prefixed_names_are_blocked() {
        let list = Denylist::standard();
        for name in DEFAULT_DENYLIST {
            let prefixed = format!("some.prefix.{name}");
            assert_eq!(list.matching(&prefixed), Some(*name));
        }
    }

    #[test]
    fn trailing_characters_are_not_blocked() {
        let list = Denylist::standard();
        assert!(!list.is_blocked("org.apache.commons.collections.functors.InvokerTransformerExtra"));
        assert!(!list.is_blocked("[Lorg.apache.commons.collections.functors.InvokerTransformer;"));
        for name in DEFAULT_DENYLIST {
            assert!(!list.is_blocked(&format!("{name}$1")), "{name}");
        }
    }

    #[test]
    fn matching_is_case_sensitive() {
        let list = Denylist::standard();
        assert!(!list.is_blocked("org.codehaus.groovy.runtime.methodclosure"));
        assert!(!list.is_blocked("ORG.APACHE.XALAN.XSLTC.TRAX.TEMPLATESIMPL"));
    }

    #[test]
    fn unrelated_names_pass() {
        let list = Denylist::standard();
        for name in ["java.lang.String", "java.util.HashMap", "com.example.Point", "TemplatesImpl"] {
            assert!(!list.is_blocked(name), "{name}");
        }
    }

    #[test]
    fn standard_is_shared() {
        assert!(Arc::ptr_eq(&Denylist::standard(), &Denylist::standard()));
    }

    #[test]
    fn compile_rejects_blank_entries() {
        assert!(Denylist::new(["com.example.Evil", " "]).is_err());
        assert!(Denylist::new([""]).is_err());
        let list = Denylist::new(["a.B", "a.B"]).unwrap();
        assert_eq!(list.len(), 1);
    }
}
