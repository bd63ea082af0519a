//! Unpacker table decoding.
//!
//! A non-empty unpacker table marks the node content as packed. Each entry
//! names the algorithm and ends with the decoded size of the content.

use log::debug;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::{Result, XmfError};
use crate::vlq::{read_vlq, read_vlq_usize};

/// Unpacker kind ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
enum UnpackerId {
    None = 0,
    MmaUnpacker = 1,
    Registered = 2,
    NonRegistered = 3,
}

/// Algorithm description of one unpacker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnpackerKind {
    /// Standard unpacker, selected by id.
    Standard {
        /// Standard unpacker id.
        standard_id: u32,
    },
    /// Manufacturer-specific unpacker.
    Vendor {
        /// One- or three-byte MMA manufacturer id.
        manufacturer_id: u32,
        /// Manufacturer-internal unpacker id.
        manufacturer_internal_id: u32,
    },
}

/// One entry of a node's unpacker table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UnpackerDescriptor {
    /// Algorithm of this entry.
    pub kind: UnpackerKind,
    /// Size of the content after unpacking.
    pub decoded_size: usize,
}

/// Decode an unpacker table of exactly `length` bytes.
///
/// Returns an empty table when `length` is zero (content stored as-is).
pub fn decode_unpackers(cursor: &mut Cursor<'_>, length: usize) -> Result<Vec<UnpackerDescriptor>> {
    let mut table = cursor.sub_cursor(length)?;
    let mut unpackers = Vec::new();

    while !table.at_end() {
        let entry_offset = table.offset();
        let id = read_vlq(&mut table)?;
        let kind = match UnpackerId::from_u32(id) {
            Some(UnpackerId::None) => UnpackerKind::Standard {
                standard_id: read_vlq(&mut table)?,
            },
            Some(UnpackerId::MmaUnpacker) => {
                let manufacturer_id = read_manufacturer_id(&mut table)?;
                UnpackerKind::Vendor {
                    manufacturer_id,
                    manufacturer_internal_id: read_vlq(&mut table)?,
                }
            }
            Some(UnpackerId::Registered | UnpackerId::NonRegistered) | None => {
                return Err(XmfError::UnsupportedUnpacker {
                    offset: entry_offset,
                    id,
                });
            }
        };
        let decoded_size = read_vlq_usize(&mut table)?;
        debug!("Unpacker {kind:?}, decoded size {decoded_size}");
        unpackers.push(UnpackerDescriptor { kind, decoded_size });
    }

    Ok(unpackers)
}

/// MMA manufacturer ids use either one byte, or a zero byte followed by two more.
fn read_manufacturer_id(table: &mut Cursor<'_>) -> Result<u32> {
    let first = table.read_u8()?;
    if first != 0 {
        return Ok(u32::from(first));
    }
    let [hi, lo] = table.read_array::<2>()?;
    Ok((u32::from(hi) << 8) | u32::from(lo))
}
