//! Error handling for XMF container parsing.

use thiserror::Error;

use crate::node::ReferenceType;

/// Convenient result alias for XMF parsing.
pub type Result<T> = std::result::Result<T, XmfError>;

/// Errors that may occur while parsing an XMF container.
///
/// Every variant is fatal for the parse that produced it. Benign anomalies
/// (unknown metadata fields, unrecognized resource formats, internationalized
/// metadata) are logged instead and never surface here.
#[derive(Debug, Error)]
pub enum XmfError {
    /// File does not start with the `XMF_` signature.
    #[error("XMF file must start with XMF_ header, found {found:?}")]
    InvalidHeader {
        /// The four bytes found where the signature was expected.
        found: [u8; 4],
    },
    /// Buffer ended in the middle of a field.
    #[error("unexpected end of input at offset 0x{offset:x}: needed {needed} bytes, {available} available")]
    TruncatedInput {
        /// Offset where the read started.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of bytes left in the buffer.
        available: usize,
    },
    /// Variable-length quantity overflowed 32 bits.
    #[error("malformed variable-length quantity at offset 0x{offset:x}")]
    MalformedVlq {
        /// Offset of the first byte of the quantity.
        offset: usize,
    },
    /// Node structure is inconsistent with its own length fields.
    #[error("malformed node at offset 0x{offset:x}: {msg}")]
    MalformedNode {
        /// Offset of the node (or child record) start.
        offset: usize,
        /// Human-readable explanation.
        msg: String,
    },
    /// Reference type is known but cannot be resolved by this parser.
    #[error("unsupported reference type {reference:?} at offset 0x{offset:x}")]
    UnsupportedReferenceType {
        /// Offset of the reference type field.
        offset: usize,
        /// The recognized reference type.
        reference: ReferenceType,
    },
    /// Reference type id is outside the known enumeration.
    #[error("unknown reference type {id} at offset 0x{offset:x}")]
    UnknownReferenceType {
        /// Offset of the reference type field.
        offset: usize,
        /// Raw reference type id.
        id: u32,
    },
    /// Unpacker kind whose byte layout cannot be decoded.
    #[error("unsupported unpacker id {id} at offset 0x{offset:x}")]
    UnsupportedUnpacker {
        /// Offset of the unpacker entry.
        offset: usize,
        /// Raw unpacker id.
        id: u32,
    },
    /// Packed node content failed to inflate.
    #[error("failed to unpack node content at offset 0x{offset:x}: {source}")]
    Decompression {
        /// Offset of the packed content.
        offset: usize,
        /// Underlying decompressor failure.
        #[source]
        source: DecompressError,
    },
    /// Folder nesting exceeded the configured limit.
    #[error("node nesting depth {depth} exceeds limit {limit}")]
    NestingTooDeep {
        /// Depth that was reached.
        depth: usize,
        /// Configured maximum.
        limit: usize,
    },
    /// The tree contains no MIDI sequence resource.
    #[error("no MIDI data in the XMF file")]
    NoPlayableResource,
    /// IO error while reading a container from disk.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a [`Decompressor`](crate::compression::Decompressor).
#[derive(Debug, Error)]
pub enum DecompressError {
    /// The packed stream is not valid for the algorithm.
    #[error("corrupt stream: {0}")]
    Corrupt(#[from] std::io::Error),
    /// Output grew past the allowed size.
    #[error("decompressed data exceeded maximum size of {limit} bytes")]
    TooLarge {
        /// Maximum allowed output size.
        limit: usize,
    },
    /// Packed content too short to hold its fixed header.
    #[error("packed content is {len} bytes, shorter than its 2-byte header")]
    MissingHeader {
        /// Length of the packed content.
        len: usize,
    },
}

impl XmfError {
    /// Byte offset associated with this error, if any.
    pub fn offset(&self) -> Option<usize> {
        match self {
            Self::TruncatedInput { offset, .. }
            | Self::MalformedVlq { offset }
            | Self::MalformedNode { offset, .. }
            | Self::UnsupportedReferenceType { offset, .. }
            | Self::UnknownReferenceType { offset, .. }
            | Self::UnsupportedUnpacker { offset, .. }
            | Self::Decompression { offset, .. } => Some(*offset),
            Self::InvalidHeader { .. } => Some(0),
            Self::NestingTooDeep { .. } | Self::NoPlayableResource | Self::Io(_) => None,
        }
    }
}
