//! The `(type, subtype)` composite key identifying a message stream.

use crate::hash;

/// Identifies one message stream: a type hash plus a numeric subtype.
///
/// The subtype distinguishes multiple instances of one message type (for
/// example per-camera ids); messages without one use subtype `0`. Keys
/// order by `hash` first, then `subtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeSubtype {
    /// XXH64 hash of the type name.
    pub hash: u64,
    /// Subtype id, `0` when unused.
    pub subtype: u32,
}

impl TypeSubtype {
    /// Creates a key from a pre-computed type hash.
    pub fn new(hash: u64, subtype: u32) -> Self {
        Self { hash, subtype }
    }

    /// Creates a key by hashing a type name.
    pub fn of(name: &str, subtype: u32) -> Self {
        Self {
            hash: hash::from_name(name),
            subtype,
        }
    }
}
