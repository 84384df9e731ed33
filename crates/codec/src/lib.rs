//! # Codec - dotted-quad line encoding
//!
//! Turns one input line into a fixed-width, sortable [`Key`].
//!
//! A key is the big-endian packing of the four octets:
//!
//! ```text
//! key = octet0 << 24 | octet1 << 16 | octet2 << 8 | octet3
//! ```
//!
//! so unsigned integer order on keys is the same as numeric order on the
//! addresses (`2.0.0.0` sorts after `1.255.255.255`).
//!
//! ## Structural window
//!
//! One trailing `\r` is removed first, so CRLF and LF files encode alike.
//! The remaining line is only considered when its length lies in
//! `MIN_LINE_LEN..=MAX_LINE_LEN`; everything outside the window is rejected
//! before any parsing happens.
//!
//! ## Policies
//!
//! | Policy       | Behaviour on `999.1.1.1`, `1.a.1.1`, `1..11.1`           |
//! |--------------|-----------------------------------------------------------|
//! | `Permissive` | encodes; each octet is an 8-bit wrapping accumulator     |
//! | `Strict`     | rejects; exactly four 1-3 digit octets, each `<= 255`     |
//!
//! `Permissive` is the default and matches the historical behaviour of the
//! counter: garbage in encodes to a garbage-but-deterministic key.
//!
//! ## Example
//!
//! ```rust
//! use codec::{decode, encode, ParsePolicy};
//!
//! let key = encode(b"10.0.0.1", ParsePolicy::Strict).unwrap();
//! assert_eq!(key, 0x0A00_0001);
//! assert_eq!(decode(key).to_string(), "10.0.0.1");
//! assert!(encode(b"1.1.1", ParsePolicy::Permissive).is_none());
//! ```

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Fixed-width sortable encoding of one address.
pub type Key = u32;

/// Size of one encoded key on disk.
pub const KEY_BYTES: usize = std::mem::size_of::<Key>();

/// Shortest accepted line: `"0.0.0.0"`.
pub const MIN_LINE_LEN: usize = 7;

/// Longest accepted line, not counting a trailing `\r`. One byte longer than
/// `"255.255.255.255"`.
pub const MAX_LINE_LEN: usize = 16;

/// How strictly a structurally plausible line is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParsePolicy {
    /// Only the length window is enforced. Digits accumulate into 8-bit
    /// octets with wrapping arithmetic and any non-separator byte is treated
    /// as a digit. Lines with more than three separators are rejected.
    #[default]
    Permissive,
    /// Exactly four dot-separated octets of 1-3 ASCII digits, each `<= 255`.
    Strict,
}

impl fmt::Display for ParsePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsePolicy::Permissive => f.write_str("permissive"),
            ParsePolicy::Strict => f.write_str("strict"),
        }
    }
}

impl FromStr for ParsePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "permissive" => Ok(ParsePolicy::Permissive),
            "strict" => Ok(ParsePolicy::Strict),
            other => Err(format!("unknown parse policy: {}", other)),
        }
    }
}

/// Encodes one line (without its `\n`) into a [`Key`].
///
/// Returns `None` when the line falls outside the structural window or the
/// policy rejects it. Rejection is not an error: the caller simply skips the
/// line.
#[inline]
pub fn encode(line: &[u8], policy: ParsePolicy) -> Option<Key> {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.len() < MIN_LINE_LEN || line.len() > MAX_LINE_LEN {
        return None;
    }
    let octets = match policy {
        ParsePolicy::Permissive => parse_permissive(line)?,
        ParsePolicy::Strict => parse_strict(line)?,
    };
    Some(Key::from_be_bytes(octets))
}

/// Formats a key back into its address form.
#[must_use]
pub fn decode(key: Key) -> Ipv4Addr {
    Ipv4Addr::from(key)
}

fn parse_permissive(line: &[u8]) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut idx = 0usize;
    for &b in line {
        if b == b'.' {
            idx += 1;
            // no slot for a fifth octet
            if idx > 3 {
                return None;
            }
        } else {
            octets[idx] = octets[idx].wrapping_mul(10).wrapping_add(b.wrapping_sub(b'0'));
        }
    }
    Some(octets)
}

fn parse_strict(line: &[u8]) -> Option<[u8; 4]> {
    let mut octets = [0u8; 4];
    let mut parts = line.split(|&b| b == b'.');
    for slot in octets.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 {
            return None;
        }
        let mut value: u16 = 0;
        for &b in part {
            if !b.is_ascii_digit() {
                return None;
            }
            value = value * 10 + u16::from(b - b'0');
        }
        *slot = u8::try_from(value).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(octets)
}
