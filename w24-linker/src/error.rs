//! Linker error types

use std::path::PathBuf;
use thiserror::Error;
use w24_spec::SpecError;

/// Errors raised while reading a memory configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid memory config line {line}: {text}")]
    InvalidLine { line: usize, text: String },

    #[error("Invalid number `{text}` at line {line}")]
    InvalidNumber { line: usize, text: String },

    #[error("Segment {segment} defined more than once")]
    DuplicateSegment { segment: String },

    #[error("Segment {segment} (start {start:#08X}, size {size:#X}) exceeds the address space")]
    SegmentOutOfRange { segment: String, start: u64, size: u64 },

    #[error("Segment {segment} overlaps segment {other}")]
    SegmentOverlap { segment: String, other: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Memory config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Segment '{segment}' used by {object} is not defined in memory config")]
    UnknownSegment { segment: String, object: String },

    #[error("Segment '{segment}' in {object} holds {length} words, capacity is {capacity}")]
    SegmentOverflow {
        segment: String,
        object: String,
        length: usize,
        capacity: u32,
    },

    #[error("Segment '{segment}' in {object} ends at {end:#X}, beyond the address space")]
    AddressOutOfBounds {
        segment: String,
        object: String,
        end: u64,
    },

    #[error("Segment '{segment}' is filled by both {first} and {second}")]
    SegmentCollision {
        segment: String,
        first: String,
        second: String,
    },

    #[error("Undefined symbol: {symbol} (referenced by {object})")]
    UndefinedSymbol { symbol: String, object: String },

    #[error("Symbol {symbol} (referenced by {object}) resolves to {address:#X}, beyond the address space")]
    AddressOutOfRange {
        symbol: String,
        object: String,
        address: u64,
    },

    #[error("Ambiguous symbol: {symbol} (defined by {})", .definitions.join(", "))]
    AmbiguousSymbol {
        symbol: String,
        definitions: Vec<String>,
    },

    #[error("Import {file} of {importer} not found")]
    MissingImport { file: String, importer: String },

    #[error("Object file not found: {}", .0.display())]
    ObjectNotFound(PathBuf),

    #[error("Invalid object: {0}")]
    InvalidObject(#[from] SpecError),
}

pub type Result<T> = std::result::Result<T, LinkError>;
