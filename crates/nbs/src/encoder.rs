//! Append-only writer for NBS files.
//!
//! [`Encoder`] maintains two output streams: the main `<path>` file, which
//! receives framed packets, and the `<path>.idx` sidecar, which receives a
//! gzip-compressed 32-byte index record per packet. The running byte
//! offset of the main file is tracked so each index record can point at
//! the frame it describes.
//!
//! Timestamps are the one asymmetry of the format: the frame header is
//! written in microseconds (truncating division by 1000) while the sidecar
//! record keeps the exact nanosecond count.

use crate::error::{NbsError, Result};
use crate::index::IndexItem;
use crate::packet::{self, Packet, RADIATION_SYMBOL};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// Writes packets to an NBS file and records to its sidecar index.
pub struct Encoder {
    output: Option<BufWriter<File>>,
    index: Option<GzEncoder<BufWriter<File>>>,
    bytes_written: u64,
}

impl Encoder {
    /// Creates `<path>` and `<path>.idx`, truncating existing files.
    ///
    /// # Errors
    ///
    /// Returns an error when either file cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let output = BufWriter::new(File::create(path)?);
        let index = GzEncoder::new(
            BufWriter::new(File::create(crate::index::sidecar_path(path))?),
            Compression::default(),
        );

        debug!(path = %path.display(), "created nbs encoder");

        Ok(Self {
            output: Some(output),
            index: Some(index),
            bytes_written: 0,
        })
    }

    /// Appends a packet to the main file and its record to the sidecar.
    ///
    /// `emit_timestamp` overrides the packet's own timestamp in both the
    /// frame header and the index record; both values are nanoseconds. A
    /// packet without a payload is written as a zero-length frame.
    ///
    /// Returns the total bytes written to the main file after this append.
    ///
    /// # Errors
    ///
    /// Returns `NbsError::InvalidPacket` when the payload cannot be
    /// described by the frame's length field, and I/O errors from either
    /// stream. On error `bytes_written` keeps the last successful total.
    pub fn write(&mut self, packet: &Packet<'_>, emit_timestamp: Option<u64>) -> Result<u64> {
        let (output, index) = match (self.output.as_mut(), self.index.as_mut()) {
            (Some(output), Some(index)) => (output, index),
            _ => {
                return Err(NbsError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotConnected,
                    "encoder is closed",
                )))
            }
        };

        // The whole frame, header included, must be describable in u32.
        let payload = packet.payload.unwrap_or(&[]);
        let payload_len = u32::try_from(payload.len())
            .ok()
            .filter(|len| len.checked_add(packet::HEADER_LEN as u32).is_some())
            .ok_or(NbsError::InvalidPacket)?;

        let timestamp_ns = emit_timestamp.unwrap_or(packet.timestamp);
        let timestamp_us = timestamp_ns / 1000;

        // Frame header: marker, length, microsecond timestamp, type hash.
        let mut header = [0u8; packet::HEADER_LEN];
        header[0..3].copy_from_slice(&RADIATION_SYMBOL);
        header[3..7].copy_from_slice(&(packet::LENGTH_FIELD_OVERHEAD + payload_len).to_le_bytes());
        header[7..15].copy_from_slice(&timestamp_us.to_le_bytes());
        header[15..23].copy_from_slice(&packet.hash.to_le_bytes());

        output.write_all(&header)?;
        output.write_all(payload)?;

        let frame_len = packet::HEADER_LEN as u32 + payload_len;
        let record = IndexItem {
            hash: packet.hash,
            subtype: packet.subtype,
            timestamp: timestamp_ns,
            offset: self.bytes_written,
            length: frame_len,
        };
        index.write_all(&record.to_bytes())?;

        self.bytes_written += u64::from(frame_len);
        Ok(self.bytes_written)
    }

    /// Total bytes appended to the main file so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// True while the output streams are open.
    pub fn is_open(&self) -> bool {
        self.output.is_some()
    }

    /// Flushes and closes both streams, finishing the sidecar's gzip
    /// trailer. Calling close on a closed encoder is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error when flushing either stream fails.
    pub fn close(&mut self) -> Result<()> {
        if let Some(index) = self.index.take() {
            index.finish()?.flush()?;
        }
        if let Some(mut output) = self.output.take() {
            output.flush()?;
        }
        Ok(())
    }
}
