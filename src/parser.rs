//! XMF container parser.
//!
//! File layout:
//!
//! ```text
//! "XMF_"                 signature
//! "1.00" | "2.00"        version
//! [u32 BE, u32 BE]       file type id and revision (2.00 only)
//! fileLength VLQ
//! metadataTableLength VLQ, file-level metadata table (skipped)
//! treeStart VLQ          absolute offset of the root node
//! ```

use log::{debug, info, warn};

use crate::collector::collect;
use crate::compression::{Decompressor, DeflateDecompressor};
use crate::config::ParserConfig;
use crate::cursor::Cursor;
use crate::error::{Result, XmfError};
use crate::format::{ContainerHeader, FileTypeId, XmfFile, XmfSong};
use crate::node::parse_node;
use crate::vlq::{read_vlq, read_vlq_usize};

/// Signature at the start of every XMF file.
pub const XMF_SIGNATURE: &[u8; 4] = b"XMF_";

const VERSION_1: &str = "1.00";
const VERSION_2: &str = "2.00";

/// Quick signature check without parsing.
pub fn is_xmf_data(data: &[u8]) -> bool {
    data.starts_with(XMF_SIGNATURE)
}

/// Parse the container and return its playable resources.
pub fn parse_container(data: &[u8]) -> Result<XmfSong> {
    parse_container_with(data, &ParserConfig::default())
}

/// [`parse_container`] with explicit configuration.
pub fn parse_container_with(data: &[u8], config: &ParserConfig) -> Result<XmfSong> {
    let decompressor = DeflateDecompressor::new(config.max_decoded_size);
    parse_container_with_decompressor(data, config, &decompressor)
}

/// [`parse_container`] with explicit configuration and decompressor.
pub fn parse_container_with_decompressor(
    data: &[u8],
    config: &ParserConfig,
    decompressor: &dyn Decompressor,
) -> Result<XmfSong> {
    let file = ContainerParser {
        data,
        config,
        decompressor,
    }
    .parse()?;
    collect(&file, config)
}

/// Parse the container into its full node tree.
pub fn load_xmf(data: &[u8]) -> Result<XmfFile> {
    let config = ParserConfig::default();
    let decompressor = DeflateDecompressor::new(config.max_decoded_size);
    load_xmf_with(data, &config, &decompressor)
}

/// [`load_xmf`] with explicit configuration and decompressor.
pub fn load_xmf_with(
    data: &[u8],
    config: &ParserConfig,
    decompressor: &dyn Decompressor,
) -> Result<XmfFile> {
    ContainerParser {
        data,
        config,
        decompressor,
    }
    .parse()
}

/// Read the file-level header, leaving the cursor after the root offset field.
///
/// The file-level metadata table is skipped, not decoded.
pub fn read_header(cursor: &mut Cursor<'_>) -> Result<ContainerHeader> {
    let signature = cursor.read_array::<4>()?;
    if &signature != XMF_SIGNATURE {
        return Err(XmfError::InvalidHeader { found: signature });
    }

    let version: String = cursor.read_bytes(4)?.iter().map(|&b| char::from(b)).collect();
    info!("XMF version: {version}");

    let file_type = if version == VERSION_2 {
        let id = cursor.read_u32_be()?;
        let revision = cursor.read_u32_be()?;
        info!("File Type ID: {id}, File Type Revision ID: {revision}");
        Some(FileTypeId { id, revision })
    } else {
        if version != VERSION_1 {
            warn!("Unrecognized XMF version {version:?}, parsing as {VERSION_1}");
        }
        None
    };

    let file_length = read_vlq(cursor)?;
    let metadata_table_length = read_vlq_usize(cursor)?;
    cursor.skip(metadata_table_length)?;
    let root_offset = read_vlq_usize(cursor)?;
    debug!(
        "File length {file_length}, metadata table {metadata_table_length} bytes, root node @{root_offset}"
    );

    Ok(ContainerHeader {
        version,
        file_type,
        file_length,
        metadata_table_length,
        root_offset,
    })
}

struct ContainerParser<'a> {
    data: &'a [u8],
    config: &'a ParserConfig,
    decompressor: &'a dyn Decompressor,
}

impl ContainerParser<'_> {
    fn parse(&self) -> Result<XmfFile> {
        let mut cursor = Cursor::new(self.data);
        let header = read_header(&mut cursor)?;
        cursor.seek(header.root_offset)?;
        let root = parse_node(&mut cursor, self.config, self.decompressor)?;
        Ok(XmfFile { header, root })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vlq::encode_vlq;

    fn header_bytes(version: &[u8; 4], table: &[u8], root_offset: u32) -> Vec<u8> {
        let mut data = b"XMF_".to_vec();
        data.extend_from_slice(version);
        if version == b"2.00" {
            data.extend_from_slice(&2u32.to_be_bytes());
            data.extend_from_slice(&1u32.to_be_bytes());
        }
        data.extend(encode_vlq(0));
        data.extend(encode_vlq(table.len() as u32));
        data.extend_from_slice(table);
        data.extend(encode_vlq(root_offset));
        data
    }

    #[test]
    fn test_bad_signature_reads_only_four_bytes() {
        let data = b"RIFF1.00\x00\x00\x00";
        let mut cursor = Cursor::new(data);
        let err = read_header(&mut cursor).unwrap_err();
        assert!(matches!(err, XmfError::InvalidHeader { found } if &found == b"RIFF"));
        assert_eq!(cursor.position(), 4);
        assert!(!is_xmf_data(data));
    }

    #[test]
    fn test_version_1_header() {
        let data = header_bytes(b"1.00", &[0xAB; 3], 42);
        let mut cursor = Cursor::new(&data);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.version, "1.00");
        assert_eq!(header.file_type, None);
        assert_eq!(header.metadata_table_length, 3);
        assert_eq!(header.root_offset, 42);
        assert!(cursor.at_end());
    }

    #[test]
    fn test_version_2_header_reads_file_type() {
        let v1 = header_bytes(b"1.00", &[], 0);
        let v2 = header_bytes(b"2.00", &[], 0);
        assert_eq!(v2.len(), v1.len() + 8);

        let mut cursor = Cursor::new(&v2);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.file_type, Some(FileTypeId { id: 2, revision: 1 }));
        assert_eq!(cursor.position(), v2.len());
    }

    #[test]
    fn test_other_versions_read_no_extra_fields() {
        let data = header_bytes(b"1.01", &[], 7);
        let mut cursor = Cursor::new(&data);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.version, "1.01");
        assert_eq!(header.root_offset, 7);
        assert!(cursor.at_end());
    }

    #[test]
    fn test_root_offset_past_end() {
        let data = header_bytes(b"1.00", &[], 200);
        assert!(matches!(load_xmf(&data), Err(XmfError::TruncatedInput { .. })));
    }
}
