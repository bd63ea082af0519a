//! Node metadata decoding.
//!
//! A metadata block is a sequence of entries. Each entry starts with either a
//! standard field specifier (a `0x00` byte followed by a VLQ field id) or an
//! inline vendor key (a VLQ length followed by that many Latin-1 bytes),
//! followed by a version count and the field contents.

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, info};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Serialize;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::vlq::{read_vlq, read_vlq_usize};

/// Format type ids below this value carry text; the rest carry binary data.
const FIRST_BINARY_FORMAT_ID: u32 = 4;

/// Standard metadata field ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromPrimitive, Serialize)]
pub enum FieldSpecifier {
    /// XMF file type.
    FileType = 0,
    /// Node name.
    NodeName = 1,
    /// Node id number.
    NodeIdNumber = 2,
    /// Resource format (binary: format type id, resource format id).
    ResourceFormat = 3,
    /// Filename on disk.
    FilenameOnDisk = 4,
    /// Filename extension on disk.
    FilenameExtensionOnDisk = 5,
    /// Classic Mac OS file type and creator.
    MacOsFileTypeAndCreator = 6,
    /// MIME type.
    MimeType = 7,
    /// Title.
    Title = 8,
    /// Copyright notice.
    CopyrightNotice = 9,
    /// Comment.
    Comment = 10,
    /// Name of the file node holding the SMF to start when the file loads.
    Autostart = 11,
    /// Resources to preload.
    Preload = 12,
    /// Content description (RP-42a).
    ContentDescription = 13,
    /// ID3 metadata (RP-47).
    Id3Metadata = 14,
}

impl FieldSpecifier {
    /// Look up a field id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::from_u32(id)
    }

    /// Key under which the field is stored in a [`Metadata`] map.
    pub fn key(self) -> &'static str {
        match self {
            Self::FileType => "file_type",
            Self::NodeName => "node_name",
            Self::NodeIdNumber => "node_id_number",
            Self::ResourceFormat => "resource_format",
            Self::FilenameOnDisk => "filename_on_disk",
            Self::FilenameExtensionOnDisk => "filename_extension_on_disk",
            Self::MacOsFileTypeAndCreator => "mac_os_file_type_and_creator",
            Self::MimeType => "mime_type",
            Self::Title => "title",
            Self::CopyrightNotice => "copyright_notice",
            Self::Comment => "comment",
            Self::Autostart => "autostart",
            Self::Preload => "preload",
            Self::ContentDescription => "content_description",
            Self::Id3Metadata => "id3_metadata",
        }
    }
}

/// Key of a metadata entry as it appeared in the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataKey {
    /// Standard field.
    Field(FieldSpecifier),
    /// Standard-form field id outside the known enumeration.
    Unknown(u32),
    /// Vendor-defined inline string key.
    Custom(String),
}

impl MetadataKey {
    /// Map key for this entry.
    pub fn name(&self) -> String {
        match self {
            Self::Field(field) => field.key().to_string(),
            Self::Unknown(id) => format!("unknown_{id}"),
            Self::Custom(name) => name.clone(),
        }
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Decoded metadata value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    /// Text content (format type id below 4).
    Text(String),
    /// Opaque binary content, stored verbatim.
    Bytes(Vec<u8>),
}

impl MetadataValue {
    /// Text content, if this value is textual.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Bytes(_) => None,
        }
    }

    /// Binary content, if this value is binary.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(_) => None,
            Self::Bytes(bytes) => Some(bytes),
        }
    }
}

/// Metadata of one node. Later entries with the same key replace earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: BTreeMap<String, MetadataValue>,
}

impl Metadata {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.get(key)
    }

    /// Value of a standard field.
    pub fn field(&self, field: FieldSpecifier) -> Option<&MetadataValue> {
        self.get(field.key())
    }

    /// Text stored under `key`; `None` for missing or binary values.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetadataValue::as_text)
    }

    /// Bytes stored under `key`; `None` for missing or textual values.
    pub fn bytes(&self, key: &str) -> Option<&[u8]> {
        self.get(key).and_then(MetadataValue::as_bytes)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no entries were decoded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetadataValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: &MetadataKey, value: MetadataValue) -> Option<MetadataValue> {
        self.entries.insert(key.name(), value)
    }
}

/// Decode a metadata block of exactly `length` bytes.
pub fn decode_metadata(cursor: &mut Cursor<'_>, length: usize) -> Result<Metadata> {
    let mut block = cursor.sub_cursor(length)?;
    let mut metadata = Metadata::new();

    while !block.at_end() {
        let key = read_key(&mut block)?;
        let version_count = read_vlq(&mut block)?;

        if version_count != 0 {
            let skip = read_vlq_usize(&mut block)?;
            info!("International content for {key}: {version_count} versions, skipping {skip} bytes");
            block.skip(skip)?;
            continue;
        }

        let data_length = read_vlq_usize(&mut block)?;
        let mut contents = block.sub_cursor(data_length)?;
        let value = if contents.at_end() {
            MetadataValue::Text(String::new())
        } else {
            let format_id = read_vlq(&mut contents)?;
            if format_id < FIRST_BINARY_FORMAT_ID {
                MetadataValue::Text(latin1(contents.rest()))
            } else {
                MetadataValue::Bytes(contents.rest().to_vec())
            }
        };

        if metadata.insert(&key, value).is_some() {
            debug!("Duplicate metadata key {key}, keeping the later value");
        }
    }

    Ok(metadata)
}

fn read_key(block: &mut Cursor<'_>) -> Result<MetadataKey> {
    if block.peek_u8()? == 0 {
        block.read_u8()?;
        let id = read_vlq(block)?;
        return Ok(match FieldSpecifier::from_id(id) {
            Some(field) => MetadataKey::Field(field),
            None => {
                info!("Unknown field specifier: {id}");
                MetadataKey::Unknown(id)
            }
        });
    }

    let len = read_vlq_usize(block)?;
    Ok(MetadataKey::Custom(latin1(block.read_bytes(len)?)))
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XmfError;
    use crate::vlq::encode_vlq;

    fn standard_entry(field: u32, versions: u32, format_id: u32, payload: &[u8]) -> Vec<u8> {
        let mut entry = vec![0x00];
        entry.extend(encode_vlq(field));
        entry.extend(encode_vlq(versions));
        let mut contents = encode_vlq(format_id);
        contents.extend_from_slice(payload);
        entry.extend(encode_vlq(contents.len() as u32));
        entry.extend(contents);
        entry
    }

    fn decode_all(block: &[u8]) -> Result<Metadata> {
        let mut cursor = Cursor::new(block);
        let metadata = decode_metadata(&mut cursor, block.len())?;
        assert!(cursor.at_end());
        Ok(metadata)
    }

    #[test]
    fn test_standard_title() {
        let block = standard_entry(8, 0, 0, b"Test Song");
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.text("title"), Some("Test Song"));
        assert_eq!(
            metadata.field(FieldSpecifier::Title),
            Some(&MetadataValue::Text("Test Song".into()))
        );
    }

    #[test]
    fn test_internationalized_entry_is_skipped() {
        // version count 1: a single length-prefixed block follows
        let mut block = vec![0x00];
        block.extend(encode_vlq(8));
        block.extend(encode_vlq(1));
        block.extend(encode_vlq(4));
        block.extend_from_slice(b"\x00abc");
        block.extend(standard_entry(10, 0, 0, b"after"));

        let metadata = decode_all(&block).unwrap();
        assert!(metadata.get("title").is_none());
        assert_eq!(metadata.text("comment"), Some("after"));
    }

    #[test]
    fn test_unknown_field_id_gets_synthetic_key() {
        let mut block = standard_entry(99, 0, 0, b"vendor");
        block.extend(standard_entry(9, 0, 0, b"(c) 2004"));
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.text("unknown_99"), Some("vendor"));
        assert_eq!(metadata.text("copyright_notice"), Some("(c) 2004"));
    }

    #[test]
    fn test_custom_string_key() {
        let mut block = encode_vlq(6);
        block.extend_from_slice(b"vendor");
        block.extend(encode_vlq(0));
        block.extend(encode_vlq(3));
        block.extend_from_slice(b"\x01hi");
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.text("vendor"), Some("hi"));
    }

    #[test]
    fn test_binary_format_is_stored_verbatim() {
        let block = standard_entry(3, 0, 4, &[0x00, 0x01]);
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.bytes("resource_format"), Some(&[0x00, 0x01][..]));
        assert_eq!(metadata.text("resource_format"), None);
    }

    #[test]
    fn test_latin1_text() {
        let block = standard_entry(8, 0, 0, &[b'C', 0xE9]);
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.text("title"), Some("Cé"));
    }

    #[test]
    fn test_duplicate_key_last_write_wins() {
        let mut block = standard_entry(8, 0, 0, b"first");
        block.extend(standard_entry(8, 0, 0, b"second"));
        let metadata = decode_all(&block).unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata.text("title"), Some("second"));
    }

    #[test]
    fn test_iter_is_in_key_order() {
        let mut block = standard_entry(9, 0, 0, b"(c)");
        block.extend(standard_entry(3, 0, 4, &[0x00, 0x05]));
        block.extend(standard_entry(1, 0, 0, b"root"));
        let metadata = decode_all(&block).unwrap();
        let keys: Vec<&str> = metadata.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["copyright_notice", "node_name", "resource_format"]);
        let (_, format) = metadata.iter().nth(2).unwrap();
        assert_eq!(format.as_bytes(), Some(&[0x00, 0x05][..]));
    }

    #[test]
    fn test_consumes_exactly_length() {
        let mut data = standard_entry(1, 0, 0, b"node");
        let len = data.len();
        data.extend_from_slice(&[0xEE, 0xEE]);
        let mut cursor = Cursor::new(&data);
        let metadata = decode_metadata(&mut cursor, len).unwrap();
        assert_eq!(metadata.text("node_name"), Some("node"));
        assert_eq!(cursor.position(), len);
    }

    #[test]
    fn test_entry_overrunning_block_is_truncated() {
        let mut block = standard_entry(8, 0, 0, b"Test Song");
        block.truncate(block.len() - 2);
        assert!(matches!(
            decode_all(&block),
            Err(XmfError::TruncatedInput { .. })
        ));
    }
}
