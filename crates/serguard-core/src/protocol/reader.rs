//! Object-graph stream reader.
//!
//! Reading rules:
//! - Never index the handle table; always `get`/`get_mut`.
//! - Never trust a declared length for allocation; grow as bytes arrive.
//! - Every class descriptor goes through the resolver before anything that
//!   depends on it (annotation, superclass, instance data) is read.

use std::io::{self, Read};
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;

use crate::error::{GuardError, Result};

use super::desc::{ClassDesc, DescKind, FieldDesc, FieldType, StreamClass};
use super::grammar::*;
use super::resolve::{AnyClass, ClassResolver};
use super::utf::decode_modified_utf8;
use super::value::{Array, ClassData, EnumConstant, Object, Value};

pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Upper bound on capacity reserved from a declared count.
const PREALLOC_LIMIT: usize = 1024;

/// The read contract shared by the plain reader and the gate.
pub trait ObjectInput {
    /// Read the next top-level object, with everything it references.
    fn read_object(&mut self) -> Result<Value>;

    /// Release the underlying input. Idempotent.
    fn close(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Maximum nesting of objects, arrays and descriptors.
    pub max_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug)]
enum Handle {
    /// Assigned, still being read.
    Pending,
    Value(Value),
    Desc(Arc<ClassDesc>),
}

/// Decoder over any byte input, resolving types through `C`.
pub struct ObjectReader<R, C = AnyClass> {
    input: Option<R>,
    resolver: C,
    options: ReaderOptions,
    handles: Vec<Handle>,
    depth: usize,
}

impl<R: Read> ObjectReader<R, AnyClass> {
    /// Reader that treats every type as loadable.
    pub fn open(input: R) -> Result<Self> {
        Self::new(input, AnyClass)
    }
}

impl<R: Read, C: ClassResolver> ObjectReader<R, C> {
    pub fn new(input: R, resolver: C) -> Result<Self> {
        Self::with_options(input, resolver, ReaderOptions::default())
    }

    /// Read and check the stream header.
    pub fn with_options(mut input: R, resolver: C, options: ReaderOptions) -> Result<Self> {
        let magic = input.read_u16::<BigEndian>()?;
        let version = input.read_u16::<BigEndian>()?;
        if magic != STREAM_MAGIC || version != STREAM_VERSION {
            return Err(GuardError::corrupted(format!(
                "invalid stream header: {magic:04X}{version:04X}"
            )));
        }

        Ok(Self {
            input: Some(input),
            resolver,
            options,
            handles: Vec::new(),
            depth: 0,
        })
    }

    pub fn resolver(&self) -> &C {
        &self.resolver
    }

    pub fn is_closed(&self) -> bool {
        self.input.is_none()
    }

    /// The underlying input, until closed.
    pub fn get_ref(&self) -> Option<&R> {
        self.input.as_ref()
    }

    // ---- primitives -------------------------------------------------------

    fn input(&mut self) -> Result<&mut R> {
        self.input.as_mut().ok_or(GuardError::Closed)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.input()?.read_u8()?)
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(self.input()?.read_u16::<BigEndian>()?)
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(self.input()?.read_i32::<BigEndian>()?)
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(self.input()?.read_i64::<BigEndian>()?)
    }

    fn bytes(&mut self, len: usize) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let got = self.input()?.by_ref().take(len as u64).read_to_end(&mut buf)?;
        if got < len {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(Bytes::from(buf))
    }

    fn utf(&mut self) -> Result<Arc<str>> {
        let len = usize::from(self.u16()?);
        self.utf_body(len)
    }

    fn long_utf(&mut self) -> Result<Arc<str>> {
        let len = self.i64()?;
        let len = usize::try_from(len)
            .map_err(|_| GuardError::corrupted(format!("invalid long string length: {len}")))?;
        self.utf_body(len)
    }

    fn utf_body(&mut self, len: usize) -> Result<Arc<str>> {
        let raw = self.bytes(len)?;
        Ok(Arc::from(decode_modified_utf8(&raw)?))
    }

    fn block_len(&mut self, tc: u8) -> Result<usize> {
        if tc == TC_BLOCKDATA {
            return Ok(usize::from(self.u8()?));
        }
        let len = self.i32()?;
        usize::try_from(len)
            .map_err(|_| GuardError::corrupted(format!("illegal block data header length: {len}")))
    }

    // ---- bookkeeping ------------------------------------------------------

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(GuardError::DepthExceeded(self.options.max_depth));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn assign(&mut self, handle: Handle) -> usize {
        self.handles.push(handle);
        self.handles.len() - 1
    }

    fn fill(&mut self, idx: usize, handle: Handle) {
        if let Some(slot) = self.handles.get_mut(idx) {
            *slot = handle;
        }
    }

    fn reset(&mut self) {
        tracing::debug!(handles = self.handles.len(), "stream reset");
        self.handles.clear();
    }

    fn read_handle(&mut self) -> Result<(u32, &Handle)> {
        let wire = self.i32()? as u32;
        let handle = wire
            .checked_sub(BASE_WIRE_HANDLE)
            .and_then(|idx| self.handles.get(idx as usize))
            .ok_or_else(|| GuardError::corrupted(format!("invalid handle value: {wire:08X}")))?;
        Ok((wire, handle))
    }

    // ---- content ----------------------------------------------------------

    fn read_content(&mut self) -> Result<Value> {
        let tc = self.u8()?;
        self.read_content_tag(tc)
    }

    fn read_content_tag(&mut self, tc: u8) -> Result<Value> {
        match tc {
            TC_NULL => Ok(Value::Null),
            TC_REFERENCE => self.read_reference(),
            TC_OBJECT => self.read_new_object(),
            TC_STRING => {
                let s = self.utf()?;
                Ok(self.new_string(s))
            }
            TC_LONGSTRING => {
                let s = self.long_utf()?;
                Ok(self.new_string(s))
            }
            TC_ARRAY => self.read_array(),
            TC_ENUM => self.read_enum(),
            TC_CLASS => self.read_class(),
            TC_CLASSDESC | TC_PROXYCLASSDESC => match self.read_desc_tag(tc)? {
                Some(desc) => Ok(Value::ClassDesc(desc)),
                None => Ok(Value::Null),
            },
            TC_EXCEPTION => self.read_exception(),
            TC_RESET => Err(GuardError::corrupted("unexpected reset")),
            TC_BLOCKDATA | TC_BLOCKDATALONG => Err(GuardError::corrupted("unexpected block data")),
            TC_ENDBLOCKDATA => Err(GuardError::corrupted("unexpected end of block data")),
            other => Err(GuardError::corrupted(format!("invalid type code: {other:02X}"))),
        }
    }

    fn new_string(&mut self, s: Arc<str>) -> Value {
        let value = Value::String(s);
        self.assign(Handle::Value(value.clone()));
        value
    }

    fn read_reference(&mut self) -> Result<Value> {
        let (wire, handle) = self.read_handle()?;
        Ok(match handle {
            Handle::Value(v) => v.clone(),
            Handle::Desc(d) => Value::ClassDesc(d.clone()),
            Handle::Pending => Value::BackReference(wire),
        })
    }

    /// Contents up to `TC_ENDBLOCKDATA`.
    fn read_annotation(&mut self) -> Result<Vec<Value>> {
        let mut out = Vec::new();
        loop {
            let tc = self.u8()?;
            match tc {
                TC_ENDBLOCKDATA => return Ok(out),
                TC_BLOCKDATA | TC_BLOCKDATALONG => {
                    let len = self.block_len(tc)?;
                    out.push(Value::BlockData(self.bytes(len)?));
                }
                _ => out.push(self.read_content_tag(tc)?),
            }
        }
    }

    /// Thrown while writing: the producer reset the stream, wrote the
    /// exception, and reset again.
    fn read_exception(&mut self) -> Result<Value> {
        self.enter()?;
        self.reset();
        let thrown = self.read_content()?;
        self.reset();
        self.leave();
        let name = thrown.class_name().unwrap_or("<unknown>").to_string();
        Err(GuardError::WriteAborted(name))
    }

    // ---- descriptors ------------------------------------------------------

    fn read_class_desc(&mut self) -> Result<Option<Arc<ClassDesc>>> {
        let tc = self.u8()?;
        self.read_desc_tag(tc)
    }

    fn require_class_desc(&mut self) -> Result<Arc<ClassDesc>> {
        self.read_class_desc()?
            .ok_or_else(|| GuardError::corrupted("missing class descriptor"))
    }

    fn read_desc_tag(&mut self, tc: u8) -> Result<Option<Arc<ClassDesc>>> {
        match tc {
            TC_NULL => Ok(None),
            TC_REFERENCE => match self.read_handle()? {
                (_, Handle::Desc(d)) => Ok(Some(d.clone())),
                (wire, _) => Err(GuardError::corrupted(format!(
                    "handle {wire:08X} is not a class descriptor"
                ))),
            },
            TC_CLASSDESC => self.read_plain_desc().map(Some),
            TC_PROXYCLASSDESC => self.read_proxy_desc().map(Some),
            other => Err(GuardError::corrupted(format!(
                "invalid class descriptor type code: {other:02X}"
            ))),
        }
    }

    fn read_plain_desc(&mut self) -> Result<Arc<ClassDesc>> {
        self.enter()?;
        let name = self.utf()?;
        let serial_version_uid = self.i64()?;
        let handle = self.assign(Handle::Pending);
        let flags = self.u8()?;

        let count = self.u16()? as i16;
        if count < 0 {
            return Err(GuardError::InvalidClass {
                name: name.to_string(),
                reason: format!("illegal field count: {count}"),
            });
        }
        let mut fields = Vec::with_capacity((count as usize).min(PREALLOC_LIMIT));
        for _ in 0..count {
            fields.push(self.read_field_desc(&name)?);
        }

        let stream = StreamClass {
            name,
            serial_version_uid,
            flags,
            fields,
        };
        check_flags(&stream)?;

        tracing::trace!(class = %stream.name, "resolving class");
        let resolved = self.resolver.resolve_class(&stream)?;

        let annotation = self.read_annotation()?;
        let super_desc = self.read_class_desc()?;

        let desc = Arc::new(ClassDesc {
            kind: DescKind::Class(stream),
            resolved,
            annotation,
            super_desc,
        });
        self.fill(handle, Handle::Desc(desc.clone()));
        self.leave();
        Ok(desc)
    }

    fn read_field_desc(&mut self, class: &str) -> Result<FieldDesc> {
        let code = self.u8()?;
        let name = self.utf()?;
        let ty = FieldType::from_code(code).ok_or_else(|| GuardError::InvalidClass {
            name: class.to_string(),
            reason: format!("invalid typecode for field {name}: {code:02X}"),
        })?;
        let type_name = if ty.is_primitive() {
            None
        } else {
            Some(self.read_type_string()?)
        };
        Ok(FieldDesc {
            name,
            ty,
            type_name,
        })
    }

    fn read_type_string(&mut self) -> Result<Arc<str>> {
        let tc = self.u8()?;
        match tc {
            TC_STRING | TC_LONGSTRING | TC_REFERENCE => match self.read_content_tag(tc)? {
                Value::String(s) => Ok(s),
                other => Err(GuardError::corrupted(format!(
                    "field type signature is a {}, not a string",
                    other.kind()
                ))),
            },
            other => Err(GuardError::corrupted(format!(
                "invalid field type signature code: {other:02X}"
            ))),
        }
    }

    fn read_proxy_desc(&mut self) -> Result<Arc<ClassDesc>> {
        self.enter()?;
        let handle = self.assign(Handle::Pending);

        let count = self.i32()?;
        if !(0..=MAX_PROXY_INTERFACES).contains(&count) {
            return Err(GuardError::corrupted(format!(
                "invalid proxy interface count: {count}"
            )));
        }
        let mut interfaces = Vec::with_capacity((count as usize).min(PREALLOC_LIMIT));
        for _ in 0..count {
            interfaces.push(self.utf()?);
        }

        tracing::trace!(interfaces = interfaces.len(), "resolving proxy class");
        let resolved = self.resolver.resolve_proxy_class(&interfaces)?;

        let annotation = self.read_annotation()?;
        let super_desc = self.read_class_desc()?;

        let desc = Arc::new(ClassDesc {
            kind: DescKind::Proxy { interfaces },
            resolved,
            annotation,
            super_desc,
        });
        self.fill(handle, Handle::Desc(desc.clone()));
        self.leave();
        Ok(desc)
    }

    // ---- instances --------------------------------------------------------

    fn read_new_object(&mut self) -> Result<Value> {
        self.enter()?;
        let class = self.require_class_desc()?;
        if class.is_enum() {
            return Err(GuardError::InvalidClass {
                name: class.name().to_string(),
                reason: "enum type written as an ordinary object".into(),
            });
        }
        let handle = self.assign(Handle::Pending);

        let class_data = if class.is_externalizable() {
            vec![self.read_external_data(&class)?]
        } else {
            let mut out = Vec::new();
            for desc in class.hierarchy() {
                out.push(self.read_serial_data(desc)?);
            }
            out
        };

        let value = Value::Object(Arc::new(Object { class, class_data }));
        self.fill(handle, Handle::Value(value.clone()));
        self.leave();
        Ok(value)
    }

    fn read_serial_data(&mut self, desc: &ClassDesc) -> Result<ClassData> {
        let mut fields = Vec::with_capacity(desc.fields().len());
        for field in desc.fields() {
            let value = self.read_typed(field.ty)?;
            fields.push((field.name.clone(), value));
        }
        let annotation = if desc.has_write_method() {
            self.read_annotation()?
        } else {
            Vec::new()
        };
        Ok(ClassData {
            class_name: Arc::from(desc.name()),
            fields,
            annotation,
        })
    }

    fn read_external_data(&mut self, desc: &ClassDesc) -> Result<ClassData> {
        if !desc.has_block_data() {
            return Err(GuardError::corrupted(format!(
                "externalizable data for {} was not written in block data mode",
                desc.name()
            )));
        }
        Ok(ClassData {
            class_name: Arc::from(desc.name()),
            fields: Vec::new(),
            annotation: self.read_annotation()?,
        })
    }

    fn read_typed(&mut self, ty: FieldType) -> Result<Value> {
        if !ty.is_primitive() {
            return self.read_content();
        }
        let input = self.input()?;
        Ok(match ty {
            FieldType::Byte => Value::Byte(input.read_i8()?),
            FieldType::Char => Value::Char(input.read_u16::<BigEndian>()?),
            FieldType::Double => Value::Double(input.read_f64::<BigEndian>()?),
            FieldType::Float => Value::Float(input.read_f32::<BigEndian>()?),
            FieldType::Int => Value::Int(input.read_i32::<BigEndian>()?),
            FieldType::Long => Value::Long(input.read_i64::<BigEndian>()?),
            FieldType::Short => Value::Short(input.read_i16::<BigEndian>()?),
            FieldType::Boolean => Value::Boolean(input.read_u8()? != 0),
            FieldType::Object | FieldType::Array => {
                return Err(GuardError::corrupted("object field read as primitive"))
            }
        })
    }

    fn read_array(&mut self) -> Result<Value> {
        self.enter()?;
        let class = self.require_class_desc()?;
        let ty = class.component_type().ok_or_else(|| {
            GuardError::corrupted(format!("array of non-array class {}", class.name()))
        })?;
        let handle = self.assign(Handle::Pending);

        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| GuardError::corrupted(format!("negative array size: {len}")))?;
        let mut elements = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            elements.push(self.read_typed(ty)?);
        }

        let value = Value::Array(Arc::new(Array { class, elements }));
        self.fill(handle, Handle::Value(value.clone()));
        self.leave();
        Ok(value)
    }

    fn read_enum(&mut self) -> Result<Value> {
        self.enter()?;
        let class = self.require_class_desc()?;
        if !class.is_enum() {
            return Err(GuardError::InvalidClass {
                name: class.name().to_string(),
                reason: "non-enum class".into(),
            });
        }
        let handle = self.assign(Handle::Pending);

        let constant = match self.read_content()? {
            Value::String(s) => s,
            other => {
                return Err(GuardError::corrupted(format!(
                    "enum constant name is a {}, not a string",
                    other.kind()
                )))
            }
        };

        let value = Value::Enum(Arc::new(EnumConstant { class, constant }));
        self.fill(handle, Handle::Value(value.clone()));
        self.leave();
        Ok(value)
    }

    fn read_class(&mut self) -> Result<Value> {
        let class = self.require_class_desc()?;
        let value = Value::Class(class);
        self.assign(Handle::Value(value.clone()));
        Ok(value)
    }
}

fn check_flags(desc: &StreamClass) -> Result<()> {
    let invalid = |reason: &str| GuardError::InvalidClass {
        name: desc.name.to_string(),
        reason: reason.to_string(),
    };
    if desc.is_serializable() && desc.is_externalizable() {
        return Err(invalid("serializable and externalizable flags conflict"));
    }
    if desc.is_enum() && desc.serial_version_uid != 0 {
        return Err(invalid("enum descriptor has non-zero serialVersionUID"));
    }
    if desc.is_enum() && !desc.fields.is_empty() {
        return Err(invalid("enum descriptor has non-zero field count"));
    }
    Ok(())
}

impl<R: Read, C: ClassResolver> ObjectInput for ObjectReader<R, C> {
    fn read_object(&mut self) -> Result<Value> {
        self.depth = 0;
        loop {
            let tc = self.u8()?;
            match tc {
                TC_RESET => self.reset(),
                TC_BLOCKDATA | TC_BLOCKDATALONG => {
                    // Skip it so the next read starts at a tag again.
                    let len = self.block_len(tc)?;
                    self.bytes(len)?;
                    return Err(GuardError::OptionalData(len));
                }
                _ => return self.read_content_tag(tc),
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.input.take().is_some() {
            tracing::debug!("stream closed");
        }
        self.handles.clear();
        Ok(())
    }
}
