//! Variable-length quantities.
//!
//! Big-endian groups of 7 bits; the high bit of each byte marks that another
//! group follows. Values are capped at 32 bits.

use crate::cursor::Cursor;
use crate::error::{Result, XmfError};

/// Decode one quantity, advancing the cursor past it.
pub fn read_vlq(cursor: &mut Cursor<'_>) -> Result<u32> {
    let start = cursor.offset();
    let mut value: u32 = 0;
    loop {
        let byte = cursor.read_u8()?;
        if value > (u32::MAX >> 7) {
            return Err(XmfError::MalformedVlq { offset: start });
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

/// Decode a quantity used as a byte count or offset.
pub fn read_vlq_usize(cursor: &mut Cursor<'_>) -> Result<usize> {
    read_vlq(cursor).map(|v| v as usize)
}

/// Encode `value` in the container's VLQ form.
pub fn encode_vlq(value: u32) -> Vec<u8> {
    let mut groups = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest > 0 {
        groups.push(((rest & 0x7F) as u8) | 0x80);
        rest >>= 7;
    }
    groups.reverse();
    groups
}
