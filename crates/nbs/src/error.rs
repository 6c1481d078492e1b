//! Error and Result types for NBS operations.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for NBS operations.
pub type Result<T> = std::result::Result<T, NbsError>;

/// The error type for NBS operations.
///
/// The first three kinds are argument-marshalling failures raised by host
/// binding layers; they live here so bindings and core share one error
/// surface.
#[derive(Debug, Error)]
pub enum NbsError {
    /// No `paths` argument was supplied to the decoder.
    #[error("missing argument `paths`: provide a list of nbs file paths")]
    MissingPaths,

    /// The list of NBS file paths was empty.
    #[error("invalid argument `paths`: expected non-empty list")]
    EmptyPaths,

    /// An entry in the `paths` list was not a valid path.
    #[error("invalid item in `paths` list: expected string")]
    InvalidPathItem,

    /// An NBS file has no `.idx` sidecar next to it.
    #[error("nbs index not found for file: {0}")]
    MissingSidecar(String),

    /// A sidecar record points outside its file, or is otherwise unusable.
    #[error("corrupt nbs index for file: {0}")]
    CorruptSidecar(String),

    /// A raw type hash buffer was not exactly 8 bytes.
    #[error("invalid hash bytes: expected exactly 8 bytes")]
    InvalidHashBytes,

    /// A timestamp value was negative or overflowed the nanosecond range.
    #[error("invalid timestamp: expected a non-negative nanosecond count")]
    InvalidTimestamp,

    /// A `(type, subtype)` argument could not be interpreted.
    #[error("invalid type subtype: expected a type hash and a numeric subtype")]
    InvalidTypeSubtype,

    /// A packet could not be written in the on-disk frame format.
    #[error("invalid packet: payload does not fit the frame format")]
    InvalidPacket,

    /// None of the requested types exist in the index.
    #[error("no matching types in index")]
    NoMatchingTypes,

    /// Every stream matched by a query was empty.
    #[error("all matching streams are empty")]
    EmptyStreams,

    /// A packet index was outside the valid range for its stream.
    #[error("packet not found")]
    NotFound,

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
