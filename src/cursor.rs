//! Byte buffer with a read position.
//!
//! Every decoder in this crate borrows a [`Cursor`] mutably and advances it.
//! Sub-cursors cover disjoint ranges of the parent buffer so sibling nodes
//! never share position state.

use crate::error::{Result, XmfError};

/// Read position over a borrowed byte buffer.
///
/// `origin` is the absolute offset of `data[0]` inside the buffer the parse
/// started from; it only feeds error reporting.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    origin: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_origin(data, 0)
    }

    /// Create a cursor whose offsets are reported relative to `origin`.
    pub fn with_origin(data: &'a [u8], origin: usize) -> Self {
        Self {
            data,
            pos: 0,
            origin,
        }
    }

    /// Current position relative to the start of this cursor.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Current position as an absolute offset (for diagnostics).
    pub fn offset(&self) -> usize {
        self.origin + self.pos
    }

    /// Absolute offset of an arbitrary position inside this cursor.
    pub fn offset_of(&self, pos: usize) -> usize {
        self.origin + pos
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left between the position and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True once every byte has been consumed.
    pub fn at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The unread part of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Look at the next byte without consuming it.
    pub fn peek_u8(&self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.data[self.pos])
    }

    /// Consume one byte.
    pub fn read_u8(&mut self) -> Result<u8> {
        let byte = self.peek_u8()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Consume a big-endian 32-bit integer.
    pub fn read_u32_be(&mut self) -> Result<u32> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consume exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        self.ensure(len)?;
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Consume a fixed-size array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Advance past `len` bytes.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.pos += len;
        Ok(())
    }

    /// Move to an absolute position inside this cursor (end inclusive).
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(XmfError::TruncatedInput {
                offset: self.offset_of(pos),
                needed: pos - self.data.len(),
                available: 0,
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Split off the next `len` bytes as an independent cursor and advance
    /// past them.
    pub fn sub_cursor(&mut self, len: usize) -> Result<Cursor<'a>> {
        let origin = self.offset();
        let bytes = self.read_bytes(len)?;
        Ok(Cursor::with_origin(bytes, origin))
    }

    /// Independent cursor over `start..end` without moving this cursor.
    pub fn range(&self, start: usize, end: usize) -> Result<Cursor<'a>> {
        if start > end || end > self.data.len() {
            return Err(XmfError::TruncatedInput {
                offset: self.offset_of(start),
                needed: end.saturating_sub(start),
                available: self.data.len().saturating_sub(start),
            });
        }
        Ok(Cursor::with_origin(
            &self.data[start..end],
            self.offset_of(start),
        ))
    }

    fn ensure(&self, len: usize) -> Result<()> {
        if len > self.remaining() {
            return Err(XmfError::TruncatedInput {
                offset: self.offset(),
                needed: len,
                available: self.remaining(),
            });
        }
        Ok(())
    }
}
