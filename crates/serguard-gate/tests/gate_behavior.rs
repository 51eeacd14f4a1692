//! Gate behavior on handcrafted streams.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serguard_core::protocol::{ClassRegistry, ObjectInput, ObjectReader, ReaderOptions};
use serguard_gate::{Denylist, GateOptions, SafeObjectReader, DEFAULT_DENYLIST};
use serguard_test_utils::*;

const GADGET: &str = "org.apache.commons.collections.functors.InvokerTransformer";

/// Input that counts how many times it is dropped.
struct Tracked {
    inner: Cursor<Vec<u8>>,
    drops: Arc<AtomicUsize>,
}

impl Read for Tracked {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.drops.fetch_add(1, Ordering::SeqCst);
    }
}

fn tracked(bytes: Vec<u8>) -> (Tracked, Arc<AtomicUsize>) {
    let drops = Arc::new(AtomicUsize::new(0));
    let input = Tracked {
        inner: Cursor::new(bytes),
        drops: drops.clone(),
    };
    (input, drops)
}

fn single(name: &str) -> Vec<u8> {
    let mut b = StreamBuilder::new();
    b.object(name, &[]);
    b.into_bytes()
}

fn gate(bytes: Vec<u8>) -> SafeObjectReader<Cursor<Vec<u8>>> {
    SafeObjectReader::new(Cursor::new(bytes)).unwrap()
}

#[test]
fn every_entry_is_blocked_exactly_and_prefixed() {
    for name in DEFAULT_DENYLIST {
        let err = gate(single(name)).read_object().unwrap_err();
        assert!(err.is_security_violation(), "{name}");

        let prefixed = format!("some.prefix.{name}");
        let err = gate(single(&prefixed)).read_object().unwrap_err();
        assert!(err.is_security_violation(), "{prefixed}");
    }
}

#[test]
fn non_suffix_substring_is_not_blocked() {
    let name = format!("{GADGET}Extra");
    let value = gate(single(&name)).read_object().unwrap();
    assert_eq!(value.class_name(), Some(name.as_str()));
}

#[test]
fn violation_mid_graph_returns_nothing_and_poisons() {
    let mut b = StreamBuilder::new();
    b.object(
        "com.example.Pair",
        &[
            Field::Int("id"),
            Field::Object("left", "Ljava/lang/Object;"),
            Field::Object("right", "Ljava/lang/Object;"),
        ],
    );
    b.int(7);
    b.string("left side");
    b.object(GADGET, &[]);
    b.reset();
    b.string("trailing");

    let mut reader = gate(b.into_bytes());
    let err = reader.read_object().unwrap_err();
    assert!(err.is_security_violation());
    assert!(reader.is_rejected());

    // the well-formed string after the reset is never handed out
    let again = reader.read_object().unwrap_err();
    assert!(again.is_security_violation());
}

#[test]
fn gadget_in_proxy_interfaces() {
    let mut b = StreamBuilder::new();
    b.u8(TC_OBJECT);
    b.proxy_desc(&["java.lang.Runnable", "org.springframework.beans.factory.ObjectFactory"]);
    b.class_desc("java.lang.reflect.Proxy", 1, SC_SERIALIZABLE, &[]);
    b.null();

    let err = gate(b.into_bytes()).read_object().unwrap_err();
    assert!(err.is_security_violation());
}

#[test]
fn safe_proxy_passes() {
    let mut b = StreamBuilder::new();
    b.u8(TC_OBJECT);
    b.proxy_desc(&["java.lang.Runnable"]);
    b.class_desc("java.lang.reflect.Proxy", 1, SC_SERIALIZABLE, &[]);
    b.null();
    b.handle();

    let value = gate(b.into_bytes()).read_object().unwrap();
    let obj = value.as_object().unwrap();
    assert!(obj.class.resolved.is_proxy());
    assert_eq!(&*obj.class.resolved.interfaces[0], "java.lang.Runnable");
}

#[test]
fn gadget_in_write_object_annotation() {
    let mut b = StreamBuilder::new();
    b.u8(TC_OBJECT);
    b.class_desc("com.example.Custom", 1, SC_SERIALIZABLE | SC_WRITE_METHOD, &[]);
    b.null();
    b.handle();
    b.block_data(&[0, 1]);
    b.object(GADGET, &[]);
    b.end_block();

    let err = gate(b.into_bytes()).read_object().unwrap_err();
    assert!(err.is_security_violation());
}

#[test]
fn gadget_as_serialized_exception() {
    let mut b = StreamBuilder::new();
    b.u8(TC_EXCEPTION);
    b.object(GADGET, &[]);

    let mut plain = ObjectReader::open(Cursor::new(b.into_bytes())).unwrap();
    assert_eq!(plain.read_object().unwrap_err().code().as_str(), "WRITE_ABORTED");

    let mut b = StreamBuilder::new();
    b.u8(TC_EXCEPTION);
    b.object(GADGET, &[]);
    let err = gate(b.into_bytes()).read_object().unwrap_err();
    assert!(err.is_security_violation());
}

#[test]
fn exception_chain_is_depth_limited_not_a_crash() {
    let mut raw = vec![0xAC, 0xED, 0x00, 0x05];
    raw.extend(std::iter::repeat(TC_EXCEPTION).take(2_000_000));
    let mut reader = gate(raw);
    let err = reader.read_object().unwrap_err();
    assert_eq!(err.code().as_str(), "DEPTH_EXCEEDED");
    assert!(!reader.is_rejected());
}

#[test]
fn underlying_errors_pass_through_unchanged() {
    // unknown type
    let registry = ClassRegistry::new();
    let mut reader =
        SafeObjectReader::with_resolver(Cursor::new(single("com.example.Missing")), registry).unwrap();
    let err = reader.read_object().unwrap_err();
    assert_eq!(err.to_string(), "class not found: com.example.Missing");
    assert!(!reader.is_rejected());

    // truncated input
    let mut bytes = single("com.example.Point");
    bytes.truncate(bytes.len() - 3);
    let err = gate(bytes).read_object().unwrap_err();
    assert_eq!(err.code().as_str(), "IO");

    // malformed tag
    let mut b = StreamBuilder::new();
    b.u8(0x01);
    let err = gate(b.into_bytes()).read_object().unwrap_err();
    assert_eq!(err.to_string(), "stream corrupted: invalid type code: 01");
}

#[test]
fn construction_fails_like_the_plain_reader() {
    let err = SafeObjectReader::new(Cursor::new(vec![0xAC])).err().unwrap();
    assert_eq!(err.code().as_str(), "IO");

    let err = SafeObjectReader::new(Cursor::new(vec![0xAC, 0xED, 0x00, 0x04])).err().unwrap();
    assert_eq!(err.code().as_str(), "STREAM_CORRUPTED");
}

#[test]
fn construction_reads_only_the_header() {
    let mut b = StreamBuilder::new();
    b.string("payload");
    let reader = gate(b.into_bytes());
    assert_eq!(reader.get_ref().unwrap().position(), 4);
}

#[test]
fn close_after_violation_releases_once() {
    let (input, drops) = tracked(single(GADGET));
    let mut reader = SafeObjectReader::new(input).unwrap();

    assert!(reader.read_object().unwrap_err().is_security_violation());
    assert_eq!(drops.load(Ordering::SeqCst), 0);

    reader.close().unwrap();
    assert_eq!(drops.load(Ordering::SeqCst), 1);
    reader.close().unwrap();
    drop(reader);
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn dropping_without_close_releases_once() {
    let (input, drops) = tracked(single(GADGET));
    {
        let mut reader = SafeObjectReader::new(input).unwrap();
        let _ = reader.read_object();
    }
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn failed_construction_releases_input() {
    let (input, drops) = tracked(vec![0xCA, 0xFE, 0x00, 0x05]);
    assert!(SafeObjectReader::new(input).is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 1);
}

#[test]
fn read_after_close_is_closed_not_rejected() {
    let mut reader = gate(single(GADGET));
    let _ = reader.read_object();
    reader.close().unwrap();
    assert_eq!(reader.read_object().unwrap_err().code().as_str(), "CLOSED");
}

#[test]
fn custom_denylist_and_depth_options() {
    let list = Arc::new(Denylist::new(["com.example.Forbidden"]).unwrap());
    let opts = GateOptions {
        reader: ReaderOptions { max_depth: 4 },
        log_blocked_names: true,
    };

    let mut reader = SafeObjectReader::with_denylist(
        Cursor::new(single("x.com.example.Forbidden")),
        serguard_core::protocol::AnyClass,
        list.clone(),
        opts,
    )
    .unwrap();
    assert!(reader.read_object().unwrap_err().is_security_violation());

    let mut b = StreamBuilder::new();
    b.nested("com.example.Box", 6, |b| {
        b.null();
    });
    let mut reader = SafeObjectReader::with_denylist(
        Cursor::new(b.into_bytes()),
        serguard_core::protocol::AnyClass,
        list,
        opts,
    )
    .unwrap();
    assert_eq!(reader.read_object().unwrap_err().code().as_str(), "DEPTH_EXCEEDED");
    assert!(!reader.is_rejected());
}
