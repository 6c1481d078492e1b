//! Multi-stream time-cursor stepping.
//!
//! Each requested stream gets a cursor seeked to the last record at or
//! before the starting timestamp; a cursor on a stream that begins after
//! the starting point sits *before* its first record and clamps to it for
//! reporting. Stepping forward repeatedly advances the cursor whose next
//! record is earliest, so the group replays records in global timestamp
//! order; stepping backward retreats the cursor whose previous record is
//! latest. After the requested number of jumps the group's position is the
//! latest cursor position (forward) or the earliest (backward).
//!
//! The forward/backward asymmetry around stream edges is deliberate:
//! forward stepping keeps going until every stream is parked on its last
//! record, while backward stepping stops as soon as any cursor reaches its
//! first record. Both directions are exercised against the scenarios the
//! file format tooling established; deviations there are bugs.

use crate::index::IndexItemFile;

/// A cursor over one stream's records.
struct Cursor<'a> {
    stream: &'a [IndexItemFile],
    /// Current record, or `None` when positioned before the first record
    /// (the starting timestamp precedes the whole stream).
    pos: Option<usize>,
}

impl<'a> Cursor<'a> {
    /// Seeks to the last record with `timestamp <= t`. Streams are
    /// non-empty by construction.
    fn seek(stream: &'a [IndexItemFile], t: u64) -> Self {
        let upper = stream.partition_point(|f| f.item.timestamp <= t);
        Self {
            stream,
            pos: upper.checked_sub(1),
        }
    }

    fn ts(&self, i: usize) -> u64 {
        self.stream[i].item.timestamp
    }

    /// The reported position: the current record's timestamp, clamped to
    /// the first record when the cursor sits before the stream.
    fn report(&self) -> u64 {
        self.ts(self.pos.unwrap_or(0))
    }

    /// True once the cursor has an actual current record.
    fn has_current(&self) -> bool {
        self.pos.is_some()
    }

    /// Timestamp of the record one jump forward, if any.
    fn next_ts(&self) -> Option<u64> {
        let next = match self.pos {
            Some(i) => i + 1,
            None => 0,
        };
        (next < self.stream.len()).then(|| self.ts(next))
    }

    /// Timestamp of the record one jump backward, if any.
    fn prev_ts(&self) -> Option<u64> {
        match self.pos {
            Some(i) if i > 0 => Some(self.ts(i - 1)),
            _ => None,
        }
    }

    fn advance(&mut self) {
        self.pos = Some(self.pos.map_or(0, |i| i + 1));
    }

    fn retreat(&mut self) {
        if let Some(i) = self.pos {
            self.pos = i.checked_sub(1);
        }
    }

    /// True when a backward jump is impossible: the cursor is on (or
    /// before) its first record.
    fn at_begin(&self) -> bool {
        matches!(self.pos, None | Some(0))
    }
}

/// The group position after stepping forward: the latest consumed record
/// across the cursors, falling back to the earliest first record when no
/// cursor has consumed anything yet.
fn report_forward(cursors: &[Cursor<'_>]) -> u64 {
    cursors
        .iter()
        .filter(|c| c.has_current())
        .map(Cursor::report)
        .max()
        .unwrap_or_else(|| {
            cursors
                .iter()
                .map(Cursor::report)
                .min()
                .expect("streams are non-empty")
        })
}

/// The group position after stepping backward: the earliest cursor
/// position, clamped cursors reporting their first record.
fn report_backward(cursors: &[Cursor<'_>]) -> u64 {
    cursors
        .iter()
        .map(Cursor::report)
        .min()
        .expect("streams are non-empty")
}

/// Steps the group of `streams` a total of `|steps|` jumps away from `t`
/// and returns the resulting group timestamp. Streams must be non-empty
/// slices sorted by timestamp; the caller guarantees both.
pub(super) fn next_timestamp(streams: &[&[IndexItemFile]], t: u64, steps: i64) -> u64 {
    let mut cursors: Vec<Cursor<'_>> = streams.iter().map(|s| Cursor::seek(s, t)).collect();
    let target = steps.unsigned_abs();

    if steps >= 0 {
        let mut jumps = 0u64;
        while jumps < target {
            // Jump the cursor with the earliest next record.
            let earliest = cursors
                .iter_mut()
                .filter_map(|c| c.next_ts().map(|ts| (ts, c)))
                .min_by_key(|&(ts, _)| ts);

            match earliest {
                Some((_, cursor)) => {
                    cursor.advance();
                    jumps += 1;
                }
                // Every stream is parked on its last record.
                None => break,
            }
        }
        report_forward(&cursors)
    } else {
        let mut jumps = 0u64;
        while jumps < target {
            // A cursor at its first record pins the group.
            if cursors.iter().any(Cursor::at_begin) {
                break;
            }

            // Jump the cursor with the latest previous record.
            let latest = cursors
                .iter_mut()
                .filter_map(|c| c.prev_ts().map(|ts| (ts, c)))
                .max_by_key(|&(ts, _)| ts);

            match latest {
                Some((_, cursor)) => {
                    cursor.retreat();
                    jumps += 1;
                }
                None => break,
            }
        }
        report_backward(&cursors)
    }
}
