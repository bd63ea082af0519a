//! Decompression of packed node content.
//!
//! Packed nodes store a zlib stream. The node parser strips the 2-byte zlib
//! header and hands the remaining raw DEFLATE data to a [`Decompressor`] along
//! with the decoded size from the node's first unpacker entry.
//!
//! Output is bounded so a corrupt or hostile size field cannot turn one node
//! into an unbounded allocation.

use std::io::Read;

use flate2::read::DeflateDecoder;
use log::warn;

use crate::config::DEFAULT_MAX_DECODED_SIZE;
use crate::error::DecompressError;

/// Inflates packed node content.
pub trait Decompressor {
    /// Unpack `packed` (header already stripped), expecting `decoded_size` bytes.
    fn decompress(&self, packed: &[u8], decoded_size: usize) -> Result<Vec<u8>, DecompressError>;
}

/// Raw DEFLATE decompressor backed by `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct DeflateDecompressor {
    max_size: usize,
}

impl DeflateDecompressor {
    /// Create a decompressor that refuses to produce more than `max_size` bytes.
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Maximum number of bytes a single call may produce.
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for DeflateDecompressor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DECODED_SIZE)
    }
}

impl Decompressor for DeflateDecompressor {
    fn decompress(&self, packed: &[u8], decoded_size: usize) -> Result<Vec<u8>, DecompressError> {
        let mut out = Vec::with_capacity(decoded_size.min(self.max_size));

        // Read one byte past the limit to tell "exactly at limit" from "over it"
        let limit = self.max_size as u64 + 1;
        DeflateDecoder::new(packed).take(limit).read_to_end(&mut out)?;

        if out.len() > self.max_size {
            return Err(DecompressError::TooLarge {
                limit: self.max_size,
            });
        }
        if out.len() != decoded_size {
            warn!(
                "Unpacked {} bytes, unpacker table declared {}",
                out.len(),
                decoded_size
            );
        }
        Ok(out)
    }
}

/// Check whether two bytes form a valid zlib stream header.
pub fn is_zlib_header(header: &[u8]) -> bool {
    match header {
        [cmf, flg, ..] => {
            cmf & 0x0F == 8 && ((u16::from(*cmf) << 8) | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}
