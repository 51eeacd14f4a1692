//! Class descriptors.
//!
//! A [`StreamClass`] is what the stream says about a type (name, UID, flags,
//! field layout). It is handed to the resolver, which answers with a
//! [`ResolvedClass`]. The reader then finishes the [`ClassDesc`] with its
//! annotation and superclass chain.

use std::sync::Arc;

use super::grammar::{
    SC_BLOCK_DATA, SC_ENUM, SC_EXTERNALIZABLE, SC_SERIALIZABLE, SC_WRITE_METHOD,
};
use super::value::Value;

/// Field (and array element) type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
    Object,
    Array,
}

impl FieldType {
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'B' => FieldType::Byte,
            b'C' => FieldType::Char,
            b'D' => FieldType::Double,
            b'F' => FieldType::Float,
            b'I' => FieldType::Int,
            b'J' => FieldType::Long,
            b'S' => FieldType::Short,
            b'Z' => FieldType::Boolean,
            b'L' => FieldType::Object,
            b'[' => FieldType::Array,
            _ => return None,
        })
    }

    pub fn is_primitive(self) -> bool {
        !matches!(self, FieldType::Object | FieldType::Array)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    pub name: Arc<str>,
    pub ty: FieldType,
    /// JVM signature for object and array fields (`Ljava/lang/String;`).
    pub type_name: Option<Arc<str>>,
}

/// Pending type descriptor: the stream's view of a class, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamClass {
    /// Complete dotted name exactly as written (`[Lcom.example.Foo;` for arrays).
    pub name: Arc<str>,
    pub serial_version_uid: i64,
    pub flags: u8,
    pub fields: Vec<FieldDesc>,
}

impl StreamClass {
    pub fn is_serializable(&self) -> bool {
        self.flags & SC_SERIALIZABLE != 0
    }
    pub fn is_externalizable(&self) -> bool {
        self.flags & SC_EXTERNALIZABLE != 0
    }
    pub fn is_enum(&self) -> bool {
        self.flags & SC_ENUM != 0
    }
    pub fn is_array(&self) -> bool {
        self.name.starts_with('[')
    }
}

/// Runtime type a resolver maps a descriptor to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClass {
    pub name: Arc<str>,
    pub serial_version_uid: i64,
    /// Non-empty only for dynamic proxies.
    pub interfaces: Vec<Arc<str>>,
}

impl ResolvedClass {
    pub const PROXY_NAME: &'static str = "$Proxy";

    /// Resolve a descriptor to itself.
    pub fn from_stream(desc: &StreamClass) -> Self {
        Self {
            name: desc.name.clone(),
            serial_version_uid: desc.serial_version_uid,
            interfaces: Vec::new(),
        }
    }

    pub fn proxy(interfaces: &[Arc<str>]) -> Self {
        Self {
            name: Arc::from(Self::PROXY_NAME),
            serial_version_uid: 0,
            interfaces: interfaces.to_vec(),
        }
    }

    pub fn is_proxy(&self) -> bool {
        !self.interfaces.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DescKind {
    Class(StreamClass),
    Proxy { interfaces: Vec<Arc<str>> },
}

/// Fully read class descriptor, shared by handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDesc {
    pub kind: DescKind,
    pub resolved: ResolvedClass,
    /// Class annotation (objects and block data up to `TC_ENDBLOCKDATA`).
    pub annotation: Vec<Value>,
    pub super_desc: Option<Arc<ClassDesc>>,
}

impl ClassDesc {
    /// Stream name for ordinary classes, resolved name for proxies.
    pub fn name(&self) -> &str {
        match &self.kind {
            DescKind::Class(c) => &c.name,
            DescKind::Proxy { .. } => &self.resolved.name,
        }
    }

    pub fn flags(&self) -> u8 {
        match &self.kind {
            DescKind::Class(c) => c.flags,
            DescKind::Proxy { .. } => SC_SERIALIZABLE,
        }
    }

    pub fn fields(&self) -> &[FieldDesc] {
        match &self.kind {
            DescKind::Class(c) => &c.fields,
            DescKind::Proxy { .. } => &[],
        }
    }

    pub fn is_enum(&self) -> bool {
        self.flags() & SC_ENUM != 0
    }

    pub fn is_externalizable(&self) -> bool {
        self.flags() & SC_EXTERNALIZABLE != 0
    }

    pub fn has_write_method(&self) -> bool {
        self.flags() & SC_WRITE_METHOD != 0
    }

    pub fn has_block_data(&self) -> bool {
        self.flags() & SC_BLOCK_DATA != 0
    }

    /// Element type of an array class (`[I` -> `Int`, `[[I` -> `Array`).
    pub fn component_type(&self) -> Option<FieldType> {
        self.name()
            .strip_prefix('[')
            .and_then(|rest| rest.bytes().next())
            .and_then(FieldType::from_code)
    }

    /// Descriptor chain from the topmost superclass down to `self`.
    pub fn hierarchy(&self) -> Vec<&ClassDesc> {
        let mut chain = Vec::new();
        let mut cur = Some(self);
        while let Some(d) = cur {
            chain.push(d);
            cur = d.super_desc.as_deref();
        }
        chain.reverse();
        chain
    }
}
