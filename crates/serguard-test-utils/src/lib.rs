//! Test helpers for serguard crates.
//!
//! [`StreamBuilder`] emits object-stream bytes tag by tag and tracks handle
//! numbering, so tests can build graphs the JDK vectors do not cover
//! (hostile lengths, odd nesting, handcrafted descriptors).

pub const BASE_WIRE_HANDLE: u32 = 0x7E_0000;

pub const TC_NULL: u8 = 0x70;
pub const TC_REFERENCE: u8 = 0x71;
pub const TC_CLASSDESC: u8 = 0x72;
pub const TC_OBJECT: u8 = 0x73;
pub const TC_STRING: u8 = 0x74;
pub const TC_ARRAY: u8 = 0x75;
pub const TC_BLOCKDATA: u8 = 0x77;
pub const TC_ENDBLOCKDATA: u8 = 0x78;
pub const TC_RESET: u8 = 0x79;
pub const TC_EXCEPTION: u8 = 0x7B;
pub const TC_PROXYCLASSDESC: u8 = 0x7D;

pub const SC_WRITE_METHOD: u8 = 0x01;
pub const SC_SERIALIZABLE: u8 = 0x02;
pub const SC_EXTERNALIZABLE: u8 = 0x04;
pub const SC_BLOCK_DATA: u8 = 0x08;

/// Field layout entry for [`StreamBuilder::class_desc`].
#[derive(Debug, Clone, Copy)]
pub enum Field<'a> {
    Int(&'a str),
    Long(&'a str),
    Boolean(&'a str),
    /// Object field with its JVM signature (`Ljava/lang/Object;`).
    Object(&'a str, &'a str),
}

#[derive(Debug, Default)]
pub struct StreamBuilder {
    buf: Vec<u8>,
    next_handle: u32,
}

impl StreamBuilder {
    /// Builder with the stream header already written.
    pub fn new() -> Self {
        let mut b = Self::headerless();
        b.u16(0xACED).u16(0x0005);
        b
    }

    pub fn headerless() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn int(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn long(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn utf(&mut self, s: &str) -> &mut Self {
        self.u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
        self
    }

    /// Reserve the next wire handle, as the reader will.
    pub fn handle(&mut self) -> u32 {
        let h = BASE_WIRE_HANDLE + self.next_handle;
        self.next_handle += 1;
        h
    }

    pub fn null(&mut self) -> &mut Self {
        self.u8(TC_NULL)
    }

    pub fn reference(&mut self, handle: u32) -> &mut Self {
        self.u8(TC_REFERENCE).int(handle as i32)
    }

    pub fn end_block(&mut self) -> &mut Self {
        self.u8(TC_ENDBLOCKDATA)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.next_handle = 0;
        self.u8(TC_RESET)
    }

    pub fn block_data(&mut self, data: &[u8]) -> &mut Self {
        self.u8(TC_BLOCKDATA).u8(data.len() as u8);
        self.buf.extend_from_slice(data);
        self
    }

    /// `TC_STRING`; returns its handle.
    pub fn string(&mut self, s: &str) -> u32 {
        self.u8(TC_STRING).utf(s);
        self.handle()
    }

    /// `TC_CLASSDESC` with an empty class annotation. The superclass
    /// descriptor (or `null()`) must be written next. Returns the descriptor
    /// handle.
    pub fn class_desc(&mut self, name: &str, uid: i64, flags: u8, fields: &[Field<'_>]) -> u32 {
        self.u8(TC_CLASSDESC).utf(name).long(uid);
        let handle = self.handle();
        self.u8(flags).u16(fields.len() as u16);
        for field in fields {
            match *field {
                Field::Int(n) => {
                    self.u8(b'I').utf(n);
                }
                Field::Long(n) => {
                    self.u8(b'J').utf(n);
                }
                Field::Boolean(n) => {
                    self.u8(b'Z').utf(n);
                }
                Field::Object(n, sig) => {
                    self.u8(b'L').utf(n);
                    self.string(sig);
                }
            }
        }
        self.end_block();
        handle
    }

    /// `TC_PROXYCLASSDESC` with an empty annotation; the superclass
    /// descriptor must be written next. Returns the descriptor handle.
    pub fn proxy_desc(&mut self, interfaces: &[&str]) -> u32 {
        self.u8(TC_PROXYCLASSDESC);
        let handle = self.handle();
        self.int(interfaces.len() as i32);
        for i in interfaces {
            self.utf(i);
        }
        self.end_block();
        handle
    }

    /// `TC_OBJECT` of a serializable class with no superclass. Field values
    /// must be written next, in field order. Returns the object handle.
    pub fn object(&mut self, name: &str, fields: &[Field<'_>]) -> u32 {
        self.u8(TC_OBJECT);
        self.class_desc(name, 1, SC_SERIALIZABLE, fields);
        self.null();
        self.handle()
    }

    /// `TC_OBJECT` whose descriptor was already written. Returns the object handle.
    pub fn object_of(&mut self, desc_handle: u32) -> u32 {
        self.u8(TC_OBJECT).reference(desc_handle);
        self.handle()
    }

    /// `TC_ARRAY` of `Object[]` with the given length; elements follow.
    /// Returns the array handle.
    pub fn object_array(&mut self, len: i32) -> u32 {
        self.u8(TC_ARRAY);
        self.class_desc("[Ljava.lang.Object;", 1, SC_SERIALIZABLE, &[]);
        self.null();
        let handle = self.handle();
        self.int(len);
        handle
    }

    /// A serializable `name` holding a single object field `value`, nested
    /// `depth` times around whatever the closure writes.
    pub fn nested(&mut self, name: &str, depth: usize, inner: impl FnOnce(&mut Self)) -> &mut Self {
        if depth == 0 {
            inner(self);
            return self;
        }
        self.object(name, &[Field::Object("value", "Ljava/lang/Object;")]);
        self.nested(name, depth - 1, inner)
    }
}
