//! Modified UTF-8.
//!
//! Differs from UTF-8 in two ways: NUL is written as `0xC0 0x80`, and
//! supplementary characters are written as two 3-byte surrogates. Decoding
//! goes through UTF-16 units; unpaired surrogates become U+FFFD.

use crate::error::{GuardError, Result};

pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    if bytes.iter().all(|b| (0x01..0x80).contains(b)) {
        return String::from_utf8(bytes.to_vec())
            .map_err(|e| GuardError::corrupted(format!("malformed string: {e}")));
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut it = bytes.iter().copied();
    while let Some(a) = it.next() {
        let unit = match a >> 4 {
            0x0..=0x7 => u16::from(a),
            0xC | 0xD => {
                let b = continuation(it.next())?;
                (u16::from(a & 0x1F) << 6) | b
            }
            0xE => {
                let b = continuation(it.next())?;
                let c = continuation(it.next())?;
                (u16::from(a & 0x0F) << 12) | (b << 6) | c
            }
            _ => return Err(malformed()),
        };
        units.push(unit);
    }
    Ok(String::from_utf16_lossy(&units))
}

fn continuation(byte: Option<u8>) -> Result<u16> {
    match byte {
        Some(b) if b & 0xC0 == 0x80 => Ok(u16::from(b & 0x3F)),
        _ => Err(malformed()),
    }
}

fn malformed() -> GuardError {
    GuardError::corrupted("malformed modified utf-8")
}
