//! Decoding of streams produced by a JDK `ObjectOutputStream`.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Cursor;
use std::sync::Arc;

use serguard_core::protocol::{ObjectInput, ObjectReader, Value};
use serguard_core::Result;

use vector_loader::load;

fn read_first(name: &str) -> Result<Value> {
    let raw = load(name).stream.decode();
    let mut reader = ObjectReader::open(Cursor::new(raw))?;
    reader.read_object()
}

#[test]
fn stream_vectors() {
    let files = [
        "string_hello",
        "string_hello_base64",
        "point",
        "null",
        "int_array",
        "enum_color",
        "class_literal",
        "array_list",
        "cycle",
        "shared_ref",
        "top_level_int",
        "two_objects_reset",
        "bad_magic",
        "truncated_header",
        "truncated_object",
        "unknown_tag",
        "dangling_reference",
    ];

    for f in files {
        let v = load(f);
        let res = read_first(f);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.code().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let value = res.unwrap_or_else(|e| panic!("vector={}: {e}", v.description));
        let ex = v.expect.expect("missing expect block");

        assert_eq!(value.kind(), ex["kind"].as_str().unwrap(), "vector={}", v.description);
        if let Some(class) = ex.get("class") {
            assert_eq!(value.class_name(), class.as_str(), "vector={}", v.description);
        }
        if let Some(len) = ex.get("len") {
            let arr = value.as_array().expect("array");
            assert_eq!(arr.elements.len() as u64, len.as_u64().unwrap(), "vector={}", v.description);
        }
        if let Some(expected) = ex.get("value").and_then(|s| s.as_str()) {
            let got = match &value {
                Value::String(s) => s.to_string(),
                Value::Enum(e) => e.constant.to_string(),
                other => panic!("vector={}: no scalar in {}", v.description, other.kind()),
            };
            assert_eq!(got, expected, "vector={}", v.description);
        }
    }
}

#[test]
fn point_fields_decode() {
    let value = read_first("point").unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.field("x").and_then(Value::as_int), Some(3));
    assert_eq!(obj.field("y").and_then(Value::as_int), Some(4));
    assert_eq!(obj.field("label").and_then(Value::as_str), Some("origin"));
    assert_eq!(obj.class.resolved.serial_version_uid, 42);
    assert_eq!(obj.class.fields()[2].type_name.as_deref(), Some("Ljava/lang/String;"));
}

#[test]
fn int_array_elements() {
    let value = read_first("int_array").unwrap();
    let ints: Vec<i32> = value
        .as_array()
        .unwrap()
        .elements
        .iter()
        .filter_map(Value::as_int)
        .collect();
    assert_eq!(ints, vec![1, 2, 3]);
}

#[test]
fn enum_superclass_chain() {
    let value = read_first("enum_color").unwrap();
    let Value::Enum(e) = value else { panic!("expected enum") };
    let names: Vec<&str> = e.class.hierarchy().iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["java.lang.Enum", "com.example.Color"]);
}

#[test]
fn array_list_keeps_write_object_annotation() {
    let value = read_first("array_list").unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.field("size").and_then(Value::as_int), Some(2));

    let ann = obj.annotation("java.util.ArrayList").unwrap();
    assert_eq!(ann.len(), 3);
    assert!(matches!(&ann[0], Value::BlockData(b) if b.to_vec() == vec![0, 0, 0, 2]));
    assert_eq!(ann[1].as_str(), Some("a"));

    // java.lang.Integer extends java.lang.Number
    let boxed = ann[2].as_object().unwrap();
    assert_eq!(boxed.class_name(), "java.lang.Integer");
    assert_eq!(boxed.field("value").and_then(Value::as_int), Some(1));
    assert_eq!(boxed.class_data.len(), 2);
    assert_eq!(&*boxed.class_data[0].class_name, "java.lang.Number");
}

#[test]
fn self_reference_becomes_back_reference() {
    let value = read_first("cycle").unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.field("name").and_then(Value::as_str), Some("loop"));
    // descriptor 0, two signature strings, then the object itself
    assert_eq!(obj.field("next"), Some(&Value::BackReference(0x7E_0003)));
}

#[test]
fn shared_reference_is_shared() {
    let value = read_first("shared_ref").unwrap();
    let arr = value.as_array().unwrap();
    match (&arr.elements[0], &arr.elements[1]) {
        (Value::Object(a), Value::Object(b)) => assert!(Arc::ptr_eq(a, b)),
        other => panic!("unexpected elements: {other:?}"),
    }
}

#[test]
fn reset_between_objects() {
    let raw = load("two_objects_reset").stream.decode();
    let mut reader = ObjectReader::open(Cursor::new(raw)).unwrap();
    assert_eq!(reader.read_object().unwrap().as_str(), Some("first"));
    assert_eq!(reader.read_object().unwrap().as_str(), Some("second"));
    let end = reader.read_object().unwrap_err();
    assert_eq!(end.code().as_str(), "IO");
}

#[test]
fn bad_header_fails_at_open() {
    let raw = load("bad_magic").stream.decode();
    let err = ObjectReader::open(Cursor::new(raw)).err().expect("must fail");
    assert_eq!(err.to_string(), "stream corrupted: invalid stream header: CAFE0005");
}
