//! Type-name hashing.
//!
//! NBS identifies message types by the 64-bit XXH64 hash of their fully
//! qualified name (e.g. `message.Ping`), computed with a fixed seed shared
//! by every writer and reader of the format. Callers may also supply a
//! pre-computed hash as 8 raw little-endian bytes; both forms compare equal
//! iff their `u64` values are equal.

use crate::error::{NbsError, Result};
use xxhash_rust::xxh64::xxh64;

/// Seed for XXH64 type-name hashing. Compatibility constant; never change.
pub const HASH_SEED: u64 = 0x4e55_436c;

/// Hashes a type name with XXH64 using the NBS seed.
pub fn from_name(name: &str) -> u64 {
    xxh64(name.as_bytes(), HASH_SEED)
}

/// Interprets a raw buffer as a pre-computed type hash.
///
/// # Errors
///
/// Returns `NbsError::InvalidHashBytes` unless `bytes` is exactly 8 bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<u64> {
    let raw: [u8; 8] = bytes.try_into().map_err(|_| NbsError::InvalidHashBytes)?;
    Ok(u64::from_le_bytes(raw))
}

/// Converts a type hash to its 8-byte little-endian form.
pub fn to_bytes(hash: u64) -> [u8; 8] {
    hash.to_le_bytes()
}
