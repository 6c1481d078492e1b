//! Random-access decoder over a set of NBS files.
//!
//! [`Decoder`] loads the merged sidecar [`Index`] and memory-maps every
//! main file once; queries then binary-search the index and hand out
//! [`Packet`] views directly into the mappings. Nothing is copied on the
//! read path, and nothing is mutated after open, so a decoder can serve
//! any number of interleaved queries.

use crate::error::{NbsError, Result};
use crate::index::{Index, IndexItemFile};
use crate::key::TypeSubtype;
use crate::packet::{self, Packet};
use crate::timestamp::{self, TimestampValue};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// A read-only mapping of one NBS file. Zero-length files cannot be
/// mapped, so they are held as an empty view instead.
#[derive(Debug)]
enum FileMap {
    Mapped(Mmap),
    Empty,
}

impl FileMap {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Ok(Self::Empty);
        }
        // Safety: the mapping is read-only and the engine never writes to
        // files it has opened for decoding.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self::Mapped(map))
    }

    fn bytes(&self) -> &[u8] {
        match self {
            Self::Mapped(map) => map,
            Self::Empty => &[],
        }
    }
}

/// The per-key timestamp listing returned by [`Decoder::indices`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeIndex {
    /// The stream key.
    pub type_subtype: TypeSubtype,
    /// Every record timestamp of the stream, oldest first.
    pub timestamps: Vec<u64>,
}

/// Reads packets from one or more NBS files opened together.
#[derive(Debug)]
pub struct Decoder {
    index: Index,
    maps: Vec<FileMap>,
}

impl Decoder {
    /// Opens a set of NBS files: loads and merges their sidecar indexes
    /// and memory-maps each main file.
    ///
    /// Every index record is validated against its file's mapping so that
    /// the read path can slice without bounds checks.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::EmptyPaths` for an empty list,
    /// `NbsError::MissingSidecar` when a `<path>.idx` is absent, and
    /// `NbsError::CorruptSidecar` when a record points outside its file.
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let index = Index::load(paths)?;

        let mut maps = Vec::with_capacity(paths.len());
        for path in paths {
            maps.push(FileMap::open(path.as_ref())?);
        }

        for record in index.items() {
            let item = &record.item;
            let file_len = maps[record.fileno as usize].bytes().len() as u64;
            let end = item.offset.checked_add(u64::from(item.length));
            let in_bounds = end.is_some_and(|end| end <= file_len);

            if item.length < packet::HEADER_LEN as u32 || !in_bounds {
                let path = paths[record.fileno as usize].as_ref();
                return Err(NbsError::CorruptSidecar(path.display().to_string()));
            }
        }

        debug!(
            files = maps.len(),
            records = index.len(),
            types = index.types().len(),
            "opened nbs decoder"
        );

        Ok(Self { index, maps })
    }

    /// The merged index over every opened file.
    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Every `(type, subtype)` present, in ascending key order.
    pub fn available_types(&self) -> Vec<TypeSubtype> {
        self.index.types()
    }

    /// First and last timestamps across every stream, or `(u64::MAX, 0)`
    /// when the files hold no packets.
    pub fn timestamp_range(&self) -> (u64, u64) {
        self.index.timestamp_range()
    }

    /// First and last timestamps of one stream; `(0, 0)` when absent.
    pub fn timestamp_range_for(&self, key: &TypeSubtype) -> (u64, u64) {
        self.index.timestamp_range_for(key)
    }

    /// The most-recent packet per requested stream at or before the given
    /// timestamp.
    ///
    /// Returns one packet per requested stream that exists in the index,
    /// in the order the streams were requested (index order when `types`
    /// is `None`). Streams with no record at or before the timestamp get
    /// an [empty packet](Packet::empty) so callers can align responses
    /// positionally; misses are not errors.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::InvalidTimestamp` for unrepresentable timestamp
    /// arguments.
    pub fn get_packets<T>(&self, ts: T, types: Option<&[TypeSubtype]>) -> Result<Vec<Packet<'_>>>
    where
        T: Into<TimestampValue>,
    {
        let ts = timestamp::to_nanos(ts)?;
        let keys = self.resolve_types(types);

        let mut packets = Vec::new();
        for range in self.index.ranges_for(&keys) {
            let stream = &self.index.items()[range];
            let upper = stream.partition_point(|f| f.item.timestamp <= ts);

            match upper.checked_sub(1) {
                Some(i) => packets.push(self.read(&stream[i])),
                None => packets.push(Packet::empty(ts, stream[0].item.key())),
            }
        }

        Ok(packets)
    }

    /// Every packet of the requested streams, stream by stream in request
    /// order, oldest first within each stream.
    pub fn get_all_packets(&self, types: Option<&[TypeSubtype]>) -> Vec<Packet<'_>> {
        let keys = self.resolve_types(types);

        self.index
            .ranges_for(&keys)
            .into_iter()
            .flat_map(|range| self.index.items()[range].iter())
            .map(|record| self.read(record))
            .collect()
    }

    /// The `i`-th packet of `key`'s stream in timestamp order.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::NotFound` when the stream is absent or `i` is
    /// past its end.
    pub fn get_packet_by_index(&self, i: usize, key: &TypeSubtype) -> Result<Packet<'_>> {
        let stream = self.index.stream(key);
        let record = stream.get(i).ok_or(NbsError::NotFound)?;
        Ok(self.read(record))
    }

    /// Steps the requested streams' shared time cursor `steps` jumps away
    /// from the given timestamp; see [`Index::next_timestamp`].
    ///
    /// # Errors
    ///
    /// Returns `NbsError::InvalidTimestamp` for unrepresentable timestamp
    /// arguments, plus the index stepping errors.
    pub fn next_timestamp<T>(
        &self,
        ts: T,
        types: Option<&[TypeSubtype]>,
        steps: i64,
    ) -> Result<u64>
    where
        T: Into<TimestampValue>,
    {
        let ts = timestamp::to_nanos(ts)?;
        let keys = self.resolve_types(types);
        self.index.next_timestamp(ts, &keys, steps)
    }

    /// Per-stream timestamp listings, in key order.
    pub fn indices(&self) -> Vec<TypeIndex> {
        self.available_types()
            .into_iter()
            .map(|key| TypeIndex {
                type_subtype: key,
                timestamps: self
                    .index
                    .stream(&key)
                    .iter()
                    .map(|f| f.item.timestamp)
                    .collect(),
            })
            .collect()
    }

    /// Closes the decoder, unmapping every file.
    ///
    /// Consuming the decoder ends the lifetime of every packet borrowed
    /// from it, so no payload slice can outlive the mappings.
    pub fn close(self) {
        drop(self);
    }

    /// An omitted type filter means every available type.
    fn resolve_types(&self, types: Option<&[TypeSubtype]>) -> Vec<TypeSubtype> {
        match types {
            Some(keys) => keys.to_vec(),
            None => self.available_types(),
        }
    }

    /// Produces the zero-copy packet view for an index record. Offsets
    /// were bounds-checked at open time.
    fn read(&self, record: &IndexItemFile) -> Packet<'_> {
        let item = &record.item;
        let data = self.maps[record.fileno as usize].bytes();

        let start = item.offset as usize + packet::HEADER_LEN;
        let payload = &data[start..start + item.payload_len() as usize];

        Packet::new(item.timestamp, item.hash, item.subtype, payload)
    }
}
