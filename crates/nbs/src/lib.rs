//! NBS - append-only timestamped message container format.
//!
//! An NBS file is a sequence of framed binary messages, each tagged with a
//! 64-bit type hash and a timestamp, paired with a gzip-compressed sidecar
//! index (`<path>.idx`) of fixed 32-byte records. This crate provides the
//! random-access read and append-only write engine for the format.
//!
//! # Components
//!
//! - [`Decoder`]: opens a set of NBS files, merges their sidecar indexes
//!   and serves zero-copy point, scan and stepping queries over
//!   memory-mapped packets
//! - [`Encoder`]: appends packets to an NBS file while maintaining its
//!   sidecar index
//! - [`Index`]: the merged `(type, subtype, timestamp)`-sorted record
//!   index behind the decoder
//!
//! # Example
//!
//! ```rust,ignore
//! use nbs::{Decoder, Encoder, Packet, TypeSubtype};
//!
//! // Write a packet
//! let mut encoder = Encoder::create("log.nbs")?;
//! let packet = Packet::new(1_500_000_000, nbs::hash::from_name("message.Ping"), 0, b"ping");
//! encoder.write(&packet, None)?;
//! encoder.close()?;
//!
//! // Read it back
//! let decoder = Decoder::open(&["log.nbs"])?;
//! let key = TypeSubtype::of("message.Ping", 0);
//! let packets = decoder.get_packets(1_500_000_000u64, Some(&[key]))?;
//! assert_eq!(packets[0].payload, Some(&b"ping"[..]));
//! ```
//!
//! Payload bytes are opaque to the engine; interpreting them is the
//! caller's business. Timestamps are nanoseconds everywhere except inside
//! the on-disk frame header, which stores microseconds.

#![deny(missing_docs)]

pub mod error;
pub mod hash;
pub mod timestamp;

mod decoder;
mod encoder;
mod index;
mod key;
mod packet;

pub use decoder::{Decoder, TypeIndex};
pub use encoder::Encoder;
pub use error::{NbsError, Result};
pub use index::{Index, IndexItem, IndexItemFile, INDEX_ITEM_LEN};
pub use key::TypeSubtype;
pub use packet::{Packet, HEADER_LEN, RADIATION_SYMBOL};
pub use timestamp::{Timestamp, TimestampValue};
