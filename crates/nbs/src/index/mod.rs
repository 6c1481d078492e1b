//! The merged, queryable index over one or more NBS files.
//!
//! Every NBS file carries a `<path>.idx` sidecar: a gzip-compressed stream
//! of fixed 32-byte records, one per packet in the main file. [`Index`]
//! loads the sidecars of all opened files, tags each record with the file
//! it came from, sorts the merged set by `(hash, subtype, timestamp)` and
//! groups it into per-key subranges. All queries are binary searches or
//! walks over those subranges; the vector is never touched again after
//! construction.

mod item;
mod step;

pub use item::{IndexItem, IndexItemFile, INDEX_ITEM_LEN};

use crate::error::{NbsError, Result};
use crate::key::TypeSubtype;
use flate2::bufread::GzDecoder;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::ops::Range;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Gzip stream magic bytes, used to auto-detect compressed sidecars.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A timestamp-sorted view of every index record in a set of NBS files,
/// grouped into per-key streams.
#[derive(Debug, Default)]
pub struct Index {
    /// All records, sorted by `(hash, subtype, timestamp)`.
    items: Vec<IndexItemFile>,
    /// Half-open `[begin, end)` subranges of `items` per stream key.
    /// Subranges are never empty.
    by_key: BTreeMap<TypeSubtype, (usize, usize)>,
}

/// Returns the sidecar path for an NBS file: the full file name with
/// `.idx` appended (`a.nbs` → `a.nbs.idx`).
pub fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".idx");
    PathBuf::from(os)
}

/// Opens a sidecar for reading, decompressing when the gzip magic is
/// present and passing plain streams through untouched.
fn open_sidecar(path: &Path) -> Result<Box<dyn Read>> {
    let mut reader = BufReader::new(File::open(path)?);
    let head = reader.fill_buf()?;
    if head.starts_with(&GZIP_MAGIC) {
        Ok(Box::new(GzDecoder::new(reader)))
    } else {
        Ok(Box::new(reader))
    }
}

impl Index {
    /// Loads and merges the sidecar indexes of the given NBS files.
    ///
    /// Records are tagged with their file's position in `paths`. A sidecar
    /// truncated mid-record (by a crashed writer) loads its complete
    /// prefix; the partial tail is dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::EmptyPaths` for an empty path list and
    /// `NbsError::MissingSidecar` when any `<path>.idx` does not exist.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Err(NbsError::EmptyPaths);
        }

        let mut items = Vec::new();
        let mut by_key = BTreeMap::new();

        for (fileno, path) in paths.iter().enumerate() {
            let path = path.as_ref();
            let idx_path = sidecar_path(path);

            if !idx_path.exists() {
                return Err(NbsError::MissingSidecar(path.display().to_string()));
            }

            let mut reader = open_sidecar(&idx_path)?;
            let mut buf = [0u8; INDEX_ITEM_LEN];
            let mut records = 0usize;

            loop {
                match read_record(&mut reader, &mut buf) {
                    RecordRead::Complete => {
                        let item = IndexItem::from_bytes(&buf);
                        by_key.entry(item.key()).or_insert((0, 0));
                        items.push(IndexItemFile {
                            item,
                            fileno: fileno as u32,
                        });
                        records += 1;
                    }
                    RecordRead::Eof => break,
                    RecordRead::Truncated => {
                        warn!(
                            path = %idx_path.display(),
                            records,
                            "sidecar ends mid-record; loaded the complete prefix"
                        );
                        break;
                    }
                }
            }

            debug!(path = %path.display(), records, "loaded nbs sidecar");
        }

        Ok(Self::from_parts(items, by_key))
    }

    /// Sorts the merged records and computes every key's subrange.
    fn from_parts(
        mut items: Vec<IndexItemFile>,
        mut by_key: BTreeMap<TypeSubtype, (usize, usize)>,
    ) -> Self {
        items.sort_unstable_by_key(|f| (f.item.hash, f.item.subtype, f.item.timestamp));

        // Equal range over the (hash, subtype) prefix of the sort key.
        for (key, range) in by_key.iter_mut() {
            let begin = items.partition_point(|f| f.item.key() < *key);
            let end = items.partition_point(|f| f.item.key() <= *key);
            *range = (begin, end);
        }

        Self { items, by_key }
    }

    /// Builds an index directly from records, for tests.
    #[cfg(test)]
    pub(crate) fn from_items(items: Vec<IndexItemFile>) -> Self {
        let by_key = items
            .iter()
            .map(|f| (f.item.key(), (0, 0)))
            .collect::<BTreeMap<_, _>>();
        Self::from_parts(items, by_key)
    }

    /// All records, in `(hash, subtype, timestamp)` order.
    pub fn items(&self) -> &[IndexItemFile] {
        &self.items
    }

    /// Number of records in the index.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when no records were loaded.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every stream key present, in ascending `(hash, subtype)` order.
    pub fn types(&self) -> Vec<TypeSubtype> {
        self.by_key.keys().copied().collect()
    }

    /// The subrange of `items` holding `key`'s stream, when present.
    pub fn range_for(&self, key: &TypeSubtype) -> Option<Range<usize>> {
        self.by_key.get(key).map(|&(begin, end)| begin..end)
    }

    /// The records of `key`'s stream, oldest first; empty when absent.
    pub fn stream(&self, key: &TypeSubtype) -> &[IndexItemFile] {
        match self.by_key.get(key) {
            Some(&(begin, end)) => &self.items[begin..end],
            None => &[],
        }
    }

    /// Subranges for each requested key that exists, in the order given.
    /// Unknown keys are silently dropped.
    pub fn ranges_for(&self, keys: &[TypeSubtype]) -> Vec<Range<usize>> {
        keys.iter().filter_map(|k| self.range_for(k)).collect()
    }

    /// First and last timestamps across every stream.
    ///
    /// Returns `(u64::MAX, 0)` when the index holds no records; that
    /// inverted pair is the documented "no data" convention.
    pub fn timestamp_range(&self) -> (u64, u64) {
        let mut range = (u64::MAX, 0);

        for &(begin, end) in self.by_key.values() {
            let first = self.items[begin].item.timestamp;
            let last = self.items[end - 1].item.timestamp;
            range.0 = range.0.min(first);
            range.1 = range.1.max(last);
        }

        range
    }

    /// First and last timestamps of one stream; `(0, 0)` when absent.
    pub fn timestamp_range_for(&self, key: &TypeSubtype) -> (u64, u64) {
        match self.by_key.get(key) {
            Some(&(begin, end)) => (
                self.items[begin].item.timestamp,
                self.items[end - 1].item.timestamp,
            ),
            None => (0, 0),
        }
    }

    /// Steps a group of stream cursors `steps` jumps away from `timestamp`
    /// and reports the group's new position.
    ///
    /// Forward steps replay records across the requested streams in global
    /// timestamp order; backward steps do the reverse, stopping as soon as
    /// any cursor reaches its stream's first record. The result is the
    /// latest cursor position for forward steps and the earliest for
    /// backward ones; `steps == 0` reports without moving.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::NoMatchingTypes` when none of `keys` exist in
    /// the index, and `NbsError::EmptyStreams` when every matched stream
    /// has no records.
    pub fn next_timestamp(
        &self,
        timestamp: u64,
        keys: &[TypeSubtype],
        steps: i64,
    ) -> Result<u64> {
        let ranges = self.ranges_for(keys);
        if ranges.is_empty() {
            return Err(NbsError::NoMatchingTypes);
        }

        let streams: Vec<&[IndexItemFile]> = ranges
            .into_iter()
            .filter(|r| !r.is_empty())
            .map(|r| &self.items[r])
            .collect();
        if streams.is_empty() {
            return Err(NbsError::EmptyStreams);
        }

        Ok(step::next_timestamp(&streams, timestamp, steps))
    }
}

/// Outcome of one fixed-size record read from a sidecar stream.
enum RecordRead {
    /// A full record was read.
    Complete,
    /// The stream ended cleanly on a record boundary.
    Eof,
    /// The stream ended inside a record, or failed; the partial bytes are
    /// dropped, matching the tolerant loader behavior.
    Truncated,
}

/// Reads exactly one record, distinguishing a clean end of stream from a
/// truncated tail. Read and decompression failures end the stream the
/// same way truncation does.
fn read_record(reader: &mut dyn Read, buf: &mut [u8; INDEX_ITEM_LEN]) -> RecordRead {
    let mut filled = 0usize;

    while filled < INDEX_ITEM_LEN {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return RecordRead::Eof,
            Ok(0) => return RecordRead::Truncated,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => return RecordRead::Truncated,
        }
    }

    RecordRead::Complete
}
