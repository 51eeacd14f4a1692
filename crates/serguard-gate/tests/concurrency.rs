//! Independent gates on independent streams, run in parallel.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Cursor;
use std::sync::{Arc, Barrier};
use std::thread;

use serguard_core::protocol::{ObjectInput, Value};
use serguard_core::Result;
use serguard_gate::SafeObjectReader;
use serguard_test_utils::{Field, StreamBuilder};

const GADGET: &str = "org.codehaus.groovy.runtime.ConvertedClosure";

fn three_deep(leaf: &str) -> Vec<u8> {
    let mut b = StreamBuilder::new();
    b.nested("com.example.Container", 3, |b| {
        b.object(leaf, &[Field::Int("n")]);
        b.int(1);
    });
    b.into_bytes()
}

fn run(bytes: Vec<u8>, barrier: Arc<Barrier>, rounds: usize) -> Vec<Result<Value>> {
    let mut out = Vec::with_capacity(rounds);
    for _ in 0..rounds {
        barrier.wait();
        let mut reader = SafeObjectReader::new(Cursor::new(bytes.clone())).unwrap();
        out.push(reader.read_object());
        reader.close().unwrap();
    }
    out
}

#[test]
fn safe_and_unsafe_streams_do_not_interfere() {
    const ROUNDS: usize = 50;
    let barrier = Arc::new(Barrier::new(2));

    let safe = {
        let barrier = barrier.clone();
        let bytes = three_deep("com.example.Leaf");
        thread::spawn(move || run(bytes, barrier, ROUNDS))
    };
    let unsafe_ = {
        let barrier = barrier.clone();
        let bytes = three_deep(GADGET);
        thread::spawn(move || run(bytes, barrier, ROUNDS))
    };

    for res in safe.join().unwrap() {
        let value = res.unwrap();
        let mut cur = value;
        for _ in 0..3 {
            cur = cur.as_object().unwrap().field("value").cloned().unwrap();
        }
        assert_eq!(cur.class_name(), Some("com.example.Leaf"));
    }
    for res in unsafe_.join().unwrap() {
        assert!(res.unwrap_err().is_security_violation());
    }
}

#[test]
fn many_gates_share_the_standard_denylist() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let leaf = if i % 2 == 0 { "com.example.Leaf" } else { GADGET };
                let mut reader = SafeObjectReader::new(Cursor::new(three_deep(leaf))).unwrap();
                (i, reader.read_object().is_ok())
            })
        })
        .collect();

    for h in handles {
        let (i, ok) = h.join().unwrap();
        assert_eq!(ok, i % 2 == 0, "thread {i}");
    }
}
