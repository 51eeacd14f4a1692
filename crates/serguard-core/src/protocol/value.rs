//! Reconstructed object graph.

use std::sync::Arc;

use bytes::Bytes;

use super::desc::ClassDesc;

/// One decoded content element.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(i8),
    Char(u16),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Arc<str>),
    Object(Arc<Object>),
    Array(Arc<Array>),
    Enum(Arc<EnumConstant>),
    /// Class literal (`TC_CLASS`).
    Class(Arc<ClassDesc>),
    /// Descriptor written as a value in its own right.
    ClassDesc(Arc<ClassDesc>),
    /// Raw primitive data; appears only inside annotations.
    BlockData(Bytes),
    /// Wire handle of an enclosing object or array that was still being read
    /// (the graph has a cycle through it).
    BackReference(u32),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Byte(_) => "byte",
            Value::Char(_) => "char",
            Value::Short(_) => "short",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Enum(_) => "enum",
            Value::Class(_) => "class",
            Value::ClassDesc(_) => "class_desc",
            Value::BlockData(_) => "block_data",
            Value::BackReference(_) => "back_reference",
        }
    }

    /// Type name for values that carry a descriptor.
    pub fn class_name(&self) -> Option<&str> {
        match self {
            Value::Object(o) => Some(o.class.name()),
            Value::Array(a) => Some(a.class.name()),
            Value::Enum(e) => Some(e.class.name()),
            Value::Class(d) | Value::ClassDesc(d) => Some(d.name()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub class: Arc<ClassDesc>,
    /// One entry per class in the hierarchy, topmost superclass first.
    pub class_data: Vec<ClassData>,
}

impl Object {
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// Field by name, searching from the most derived class up.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.class_data
            .iter()
            .rev()
            .flat_map(|d| d.fields.iter())
            .find(|(n, _)| &**n == name)
            .map(|(_, v)| v)
    }

    /// Custom data written by the given class's `writeObject`/`writeExternal`.
    pub fn annotation(&self, class_name: &str) -> Option<&[Value]> {
        self.class_data
            .iter()
            .find(|d| &*d.class_name == class_name)
            .map(|d| d.annotation.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassData {
    pub class_name: Arc<str>,
    pub fields: Vec<(Arc<str>, Value)>,
    pub annotation: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    pub class: Arc<ClassDesc>,
    pub elements: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumConstant {
    pub class: Arc<ClassDesc>,
    pub constant: Arc<str>,
}
