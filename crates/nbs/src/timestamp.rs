//! Timestamp normalization.
//!
//! The engine speaks nanoseconds everywhere: sidecar records store a `u64`
//! nanosecond count, and every query API takes and returns nanoseconds.
//! External callers, however, hand timestamps over in one of three shapes:
//! a signed 64-bit nanosecond count, an unsigned 64-bit nanosecond count,
//! or a split `{seconds, nanos}` pair. [`TimestampValue`] models those
//! shapes and [`to_nanos`] collapses them.
//!
//! The one place the engine does not use nanoseconds is the main-file
//! packet header, which stores **microseconds**; that conversion lives in
//! the encoder, not here.

use crate::error::{NbsError, Result};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A nanosecond timestamp split into whole seconds and a sub-second rest.
///
/// This is the shape timestamps take on the way back out to callers;
/// `nanos` is always in `[0, 10^9)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp {
    /// Whole seconds since the (unspecified) epoch.
    pub seconds: u64,
    /// Nanoseconds past `seconds`, in `[0, 10^9)`.
    pub nanos: u32,
}

impl Timestamp {
    /// Creates a timestamp from seconds and a sub-second nanosecond rest.
    pub fn new(seconds: u64, nanos: u32) -> Self {
        Self { seconds, nanos }
    }

    /// Splits a nanosecond count into `{seconds, nanos}` form.
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            seconds: nanos / NANOS_PER_SEC,
            nanos: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    /// Recombines into a single nanosecond count.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::InvalidTimestamp` if `seconds * 10^9 + nanos`
    /// overflows `u64`.
    pub fn as_nanos(&self) -> Result<u64> {
        self.seconds
            .checked_mul(NANOS_PER_SEC)
            .and_then(|ns| ns.checked_add(u64::from(self.nanos)))
            .ok_or(NbsError::InvalidTimestamp)
    }
}

/// An externally supplied timestamp in one of the three accepted shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampValue {
    /// A signed nanosecond count.
    Signed(i64),
    /// An unsigned nanosecond count.
    Unsigned(u64),
    /// A split `{seconds, nanos}` pair.
    Parts(Timestamp),
}

impl From<i64> for TimestampValue {
    fn from(nanos: i64) -> Self {
        Self::Signed(nanos)
    }
}

impl From<u64> for TimestampValue {
    fn from(nanos: u64) -> Self {
        Self::Unsigned(nanos)
    }
}

impl From<Timestamp> for TimestampValue {
    fn from(parts: Timestamp) -> Self {
        Self::Parts(parts)
    }
}

/// Normalizes any accepted timestamp shape to nanoseconds.
///
/// # Errors
///
/// Returns `NbsError::InvalidTimestamp` for negative signed counts and for
/// `{seconds, nanos}` pairs that overflow the nanosecond range.
pub fn to_nanos(value: impl Into<TimestampValue>) -> Result<u64> {
    match value.into() {
        TimestampValue::Signed(ns) => {
            u64::try_from(ns).map_err(|_| NbsError::InvalidTimestamp)
        }
        TimestampValue::Unsigned(ns) => Ok(ns),
        TimestampValue::Parts(parts) => parts.as_nanos(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_recombine() {
        let ts = Timestamp::from_nanos(1_500_000_000);
        assert_eq!(ts, Timestamp::new(1, 500_000_000));
        assert_eq!(ts.as_nanos().unwrap(), 1_500_000_000);
    }

    #[test]
    fn test_roundtrip_below_i64_max() {
        for ns in [0u64, 1, 999_999_999, NANOS_PER_SEC, u64::MAX / 2, (1 << 63) - 1] {
            assert_eq!(Timestamp::from_nanos(ns).as_nanos().unwrap(), ns);
        }
    }

    #[test]
    fn test_accepts_all_three_shapes() {
        let expected = 1_000_000_000_000u64;
        assert_eq!(to_nanos(1_000_000_000_000i64).unwrap(), expected);
        assert_eq!(to_nanos(1_000_000_000_000u64).unwrap(), expected);
        assert_eq!(to_nanos(Timestamp::new(1000, 0)).unwrap(), expected);
    }

    #[test]
    fn test_negative_signed_rejected() {
        assert!(matches!(to_nanos(-1i64), Err(NbsError::InvalidTimestamp)));
    }

    #[test]
    fn test_overflowing_parts_rejected() {
        let parts = Timestamp::new(u64::MAX, 999_999_999);
        assert!(matches!(parts.as_nanos(), Err(NbsError::InvalidTimestamp)));
    }
}
