//! The fixed 32-byte sidecar index record.
//!
//! ## Record layout
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0x00    8     type hash (u64 LE)
//! 0x08    4     subtype (u32 LE)
//! 0x0C    8     timestamp (u64 LE, nanoseconds)
//! 0x14    8     offset of the frame marker in the main file (u64 LE)
//! 0x1C    4     length of the whole frame, header included (u32 LE)
//! ```
//!
//! There is no padding anywhere; field order and the 32-byte total are
//! load-bearing for file compatibility and asserted at compile time.

use crate::key::TypeSubtype;
use crate::packet;

/// Serialized size of an index record in bytes.
pub const INDEX_ITEM_LEN: usize = 32;

// Field sizes must add up to the record size exactly.
const _: () = assert!(INDEX_ITEM_LEN == 8 + 4 + 8 + 8 + 4);

/// One sidecar index record describing a packet frame in the main file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexItem {
    /// XXH64 hash of the message type.
    pub hash: u64,
    /// Stream subtype, `0` when unused.
    pub subtype: u32,
    /// Packet timestamp in nanoseconds.
    pub timestamp: u64,
    /// Byte offset of the frame's radiation symbol in the main file.
    pub offset: u64,
    /// Total frame length in bytes, including the 23-byte header.
    pub length: u32,
}

impl IndexItem {
    /// The stream key this record belongs to.
    pub fn key(&self) -> TypeSubtype {
        TypeSubtype::new(self.hash, self.subtype)
    }

    /// Payload length of the referenced frame, in bytes.
    ///
    /// Callers must have validated `length >= HEADER_LEN` beforehand; the
    /// decoder does so when opening the files.
    pub fn payload_len(&self) -> u32 {
        self.length - packet::HEADER_LEN as u32
    }

    /// Serializes the record in on-disk byte order.
    pub fn to_bytes(&self) -> [u8; INDEX_ITEM_LEN] {
        let mut buf = [0u8; INDEX_ITEM_LEN];
        buf[0..8].copy_from_slice(&self.hash.to_le_bytes());
        buf[8..12].copy_from_slice(&self.subtype.to_le_bytes());
        buf[12..20].copy_from_slice(&self.timestamp.to_le_bytes());
        buf[20..28].copy_from_slice(&self.offset.to_le_bytes());
        buf[28..32].copy_from_slice(&self.length.to_le_bytes());
        buf
    }

    /// Deserializes a record from on-disk byte order.
    ///
    /// Short reads are handled by the loader, which treats them as end of
    /// stream; this function only ever sees complete records.
    pub fn from_bytes(buf: &[u8; INDEX_ITEM_LEN]) -> Self {
        Self {
            hash: u64::from_le_bytes(buf[0..8].try_into().unwrap()),
            subtype: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            timestamp: u64::from_le_bytes(buf[12..20].try_into().unwrap()),
            offset: u64::from_le_bytes(buf[20..28].try_into().unwrap()),
            length: u32::from_le_bytes(buf[28..32].try_into().unwrap()),
        }
    }
}

/// An index record tagged with the file it came from.
///
/// When several NBS files are opened together, `fileno` is the position of
/// the owning file in the list passed at open time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexItemFile {
    /// The index record.
    pub item: IndexItem,
    /// Position of the owning file in the opened path list.
    pub fileno: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_bytes() {
        let item = IndexItem {
            hash: 0x1122_3344_5566_7788,
            subtype: 0xAABB_CCDD,
            timestamp: 0x0102_0304_0506_0708,
            offset: 0x1020_3040_5060_7080,
            length: 0xDEAD_BEEF,
        };

        let expected: [u8; INDEX_ITEM_LEN] = [
            0x88, 0x77, 0x66, 0x55, 0x44, 0x33, 0x22, 0x11, // hash
            0xDD, 0xCC, 0xBB, 0xAA, // subtype
            0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01, // timestamp
            0x80, 0x70, 0x60, 0x50, 0x40, 0x30, 0x20, 0x10, // offset
            0xEF, 0xBE, 0xAD, 0xDE, // length
        ];

        assert_eq!(item.to_bytes(), expected);
        assert_eq!(IndexItem::from_bytes(&expected), item);
    }

    #[test]
    fn test_payload_len_excludes_header() {
        let item = IndexItem {
            hash: 0,
            subtype: 0,
            timestamp: 0,
            offset: 0,
            length: 23 + 4,
        };
        assert_eq!(item.payload_len(), 4);
    }
}
