//! In-memory packet views and the on-disk frame layout.
//!
//! ## NBS packet frame
//!
//! Packets are laid out back to back in the main file with no outer
//! framing, each one starting with the three-byte radiation symbol:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0x00    3     marker: 0xE2 0x98 0xA2 ("☢")
//! 0x03    4     length (u32 LE) = 16 + payload_len
//! 0x07    8     timestamp (u64 LE, microseconds)
//! 0x0F    8     type hash (u64 LE)
//! 0x17    N     payload
//! ```
//!
//! The header `length` counts everything after itself (timestamp + hash +
//! payload); the sidecar index instead records the size of the whole frame
//! from the marker onward. The frame timestamp is in microseconds; every
//! other timestamp in the system is in nanoseconds.

use crate::key::TypeSubtype;

/// The three-byte marker beginning every packet frame (UTF-8 "☢").
pub const RADIATION_SYMBOL: [u8; 3] = [0xE2, 0x98, 0xA2];

/// Bytes in a packet frame before the payload: marker, length, timestamp
/// and type hash.
pub const HEADER_LEN: usize = 3 + 4 + 8 + 8;

/// Bytes the frame's `length` field counts beyond the payload: the
/// timestamp and hash that sit between it and the payload.
pub const LENGTH_FIELD_OVERHEAD: u32 = 8 + 8;

/// A decoded packet.
///
/// The payload borrows the decoder's memory map, so packets are views, not
/// copies; they cannot outlive the decoder they came from. A `None` payload
/// marks an *empty packet*: the positional placeholder a point query emits
/// for a stream with no record at or before the queried timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Packet<'a> {
    /// Timestamp in nanoseconds.
    pub timestamp: u64,
    /// XXH64 hash of the message type.
    pub hash: u64,
    /// Stream subtype, `0` when unused.
    pub subtype: u32,
    /// Payload bytes within the mapped file, or `None` for empty packets.
    pub payload: Option<&'a [u8]>,
}

impl<'a> Packet<'a> {
    /// Creates a packet over a payload slice.
    pub fn new(timestamp: u64, hash: u64, subtype: u32, payload: &'a [u8]) -> Self {
        Self {
            timestamp,
            hash,
            subtype,
            payload: Some(payload),
        }
    }

    /// Creates the empty packet for `key` at the queried timestamp.
    pub fn empty(timestamp: u64, key: TypeSubtype) -> Self {
        Self {
            timestamp,
            hash: key.hash,
            subtype: key.subtype,
            payload: None,
        }
    }

    /// The stream key this packet belongs to.
    pub fn key(&self) -> TypeSubtype {
        TypeSubtype::new(self.hash, self.subtype)
    }

    /// Payload length in bytes; `0` for empty packets.
    pub fn len(&self) -> usize {
        self.payload.map_or(0, <[u8]>::len)
    }

    /// True when this is an empty packet or the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
