//! Recursive node decoding.
//!
//! A node is laid out as:
//!
//! ```text
//! totalLength  VLQ
//! itemCount    VLQ   (0: file node, otherwise folder node)
//! headerLength VLQ   (measured from the node start)
//!   metadataLength VLQ, metadata block
//!   unpackersLength VLQ, unpacker table
//!   (reserved bytes up to headerLength)
//! referenceType VLQ
//! content      (up to totalLength)
//! ```
//!
//! Folder content is a run of child nodes, each beginning with its own
//! `totalLength`.

use log::{debug, info, warn};
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use serde::Serialize;

use crate::compression::{is_zlib_header, Decompressor};
use crate::config::ParserConfig;
use crate::cursor::Cursor;
use crate::error::{DecompressError, Result, XmfError};
use crate::metadata::{decode_metadata, FieldSpecifier, Metadata};
use crate::unpacker::{decode_unpackers, UnpackerDescriptor, UnpackerKind};
use crate::vlq::{read_vlq, read_vlq_usize};

/// Length of the zlib header in front of packed content.
const PACKED_HEADER_LEN: usize = 2;

/// Resource format type id for MMA standard formats.
const FORMAT_TYPE_STANDARD: u8 = 0;

/// Where a node's content lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive, Serialize)]
pub enum ReferenceType {
    /// Content follows the header inside the node.
    InlineResource = 1,
    /// Content lives elsewhere in the same file.
    InFileResource = 2,
    /// Node is a reference to another node of the same file.
    InFileNode = 3,
    /// Content lives in an external file.
    ExternalFile = 4,
    /// Node is a reference into an external XMF file.
    ExternalXmf = 5,
    /// Node is a reference by XMF file URI and node id.
    XmfFileUriAndNodeId = 6,
}

/// Classification of a node's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ResourceKind {
    /// Standard MIDI File, type 0.
    StandardMidiFile,
    /// Standard MIDI File, type 1.
    StandardMidiFileType1,
    /// DLS level 1 bank.
    Dls1,
    /// DLS level 2 bank.
    Dls2,
    /// DLS level 2.2 bank.
    Dls22,
    /// Mobile DLS bank.
    MobileDls,
    /// File node whose format is missing or unrecognized.
    Unknown,
    /// File node with a non-standard format type; holds the raw format bytes.
    NonStandard(Vec<u8>),
    /// Folder node.
    Folder,
}

impl ResourceKind {
    fn from_format_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::StandardMidiFile),
            1 => Some(Self::StandardMidiFileType1),
            2 => Some(Self::Dls1),
            3 => Some(Self::Dls2),
            4 => Some(Self::Dls22),
            5 => Some(Self::MobileDls),
            _ => None,
        }
    }

    /// Classify a file node from its `resource_format` metadata bytes.
    ///
    /// Byte 0 is the format type id, byte 1 the resource format id.
    pub fn classify(resource_format: Option<&[u8]>) -> Self {
        let Some(format) = resource_format else {
            warn!("No resource format for this file node");
            return Self::Unknown;
        };
        match format {
            // A non-standard type keeps its raw bytes even when the id byte
            // matches a standard format id.
            [format_type, ..] if *format_type != FORMAT_TYPE_STANDARD => {
                info!("Non-standard format type: {format:?}");
                Self::NonStandard(format.to_vec())
            }
            [_, id, ..] => Self::from_format_id(*id).unwrap_or_else(|| {
                info!("Unrecognized resource format: {id}");
                Self::Unknown
            }),
            _ => {
                info!("Incomplete resource format: {format:?}");
                Self::Unknown
            }
        }
    }

    /// Guess the kind of a resource from its leading bytes.
    pub fn sniff(content: &[u8]) -> Self {
        match content {
            [b'M', b'T', b'h', b'd', _, _, _, _, 0, 1, ..] => Self::StandardMidiFileType1,
            [b'M', b'T', b'h', b'd', ..] => Self::StandardMidiFile,
            [b'R', b'I', b'F', b'F', _, _, _, _, b'D', b'L', b'S', b' ', ..] => Self::Dls1,
            _ => Self::Unknown,
        }
    }

    /// True for the MIDI sequence kinds.
    pub fn is_sequence(&self) -> bool {
        matches!(self, Self::StandardMidiFile | Self::StandardMidiFileType1)
    }

    /// True for the DLS bank kinds.
    pub fn is_instrument_bank(&self) -> bool {
        matches!(self, Self::Dls1 | Self::Dls2 | Self::Dls22 | Self::MobileDls)
    }
}

/// One decoded node of the container tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Offset of the node start (relative to the buffer the node was read from).
    pub offset: usize,
    /// Length of the whole node, header and content included.
    pub total_length: usize,
    /// Declared number of children (0 for file nodes).
    pub item_count: usize,
    /// Length of the header, measured from the node start.
    pub header_length: usize,
    /// Decoded node metadata.
    pub metadata: Metadata,
    /// Unpacker table; non-empty iff the content was stored packed.
    pub unpackers: Vec<UnpackerDescriptor>,
    /// How the content is referenced.
    pub reference_type: ReferenceType,
    /// Node payload, unpacked if it was stored packed.
    pub content: Vec<u8>,
    /// Content classification.
    pub resource_kind: ResourceKind,
    /// Child nodes in stream order (folder nodes only).
    pub children: Vec<Node>,
}

impl Node {
    /// True for file (leaf) nodes.
    pub fn is_file(&self) -> bool {
        self.item_count == 0
    }

    /// True if the content was stored packed.
    pub fn is_packed(&self) -> bool {
        !self.unpackers.is_empty()
    }

    /// Node name, if the node carries a textual one.
    pub fn name(&self) -> Option<&str> {
        self.metadata.text(FieldSpecifier::NodeName.key())
    }

    /// Depth-first pre-order iterator over this node and its descendants.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }
}

/// Iterator returned by [`Node::walk`].
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Walk<'a> {
    /// Next node together with its depth below the walk's starting node.
    pub fn next_with_depth(&mut self) -> Option<(usize, &'a Node)> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        self.next_with_depth().map(|(_, node)| node)
    }
}

/// Decode one node (and its subtree) starting at the cursor position.
///
/// On success the cursor sits exactly at the end of the node.
pub fn parse_node(
    cursor: &mut Cursor<'_>,
    config: &ParserConfig,
    decompressor: &dyn Decompressor,
) -> Result<Node> {
    NodeParser {
        config,
        decompressor,
    }
    .parse(cursor, 0)
}

/// `start + length`, or `MalformedNode` if the sum does not fit in `usize`.
fn end_of(start: usize, length: usize, offset: usize) -> Result<usize> {
    start.checked_add(length).ok_or_else(|| XmfError::MalformedNode {
        offset,
        msg: format!("length {length} overflows the address space"),
    })
}

struct NodeParser<'a> {
    config: &'a ParserConfig,
    decompressor: &'a dyn Decompressor,
}

impl NodeParser<'_> {
    fn parse(&self, cursor: &mut Cursor<'_>, depth: usize) -> Result<Node> {
        let node_start = cursor.position();
        let offset = cursor.offset();

        let total_length = read_vlq_usize(cursor)?;
        let item_count = read_vlq_usize(cursor)?;
        let header_length = read_vlq_usize(cursor)?;

        let already_read = cursor.position() - node_start;
        if header_length < already_read {
            return Err(XmfError::MalformedNode {
                offset,
                msg: format!("header length {header_length} shorter than its own length fields"),
            });
        }
        if total_length < header_length {
            return Err(XmfError::MalformedNode {
                offset,
                msg: format!("node length {total_length} shorter than header length {header_length}"),
            });
        }

        let mut header = cursor.sub_cursor(header_length - already_read)?;
        let metadata_length = read_vlq_usize(&mut header)?;
        let metadata = decode_metadata(&mut header, metadata_length)?;
        let unpackers_length = read_vlq_usize(&mut header)?;
        let unpackers = decode_unpackers(&mut header, unpackers_length)?;

        // Trailing reserved header bytes are skipped regardless of what the
        // header cursor consumed
        cursor.seek(end_of(node_start, header_length, offset)?)?;

        let reference_offset = cursor.offset();
        let reference_id = read_vlq(cursor)?;
        let reference_type = match ReferenceType::from_u32(reference_id) {
            Some(ReferenceType::InlineResource) => ReferenceType::InlineResource,
            Some(reference) => {
                return Err(XmfError::UnsupportedReferenceType {
                    offset: reference_offset,
                    reference,
                });
            }
            None => {
                return Err(XmfError::UnknownReferenceType {
                    offset: reference_offset,
                    id: reference_id,
                });
            }
        };

        let node_end = end_of(node_start, total_length, offset)?;
        if cursor.position() > node_end {
            return Err(XmfError::MalformedNode {
                offset,
                msg: format!("reference type runs past node end at {node_end}"),
            });
        }
        let content_offset = cursor.offset();
        let raw = cursor.read_bytes(node_end - cursor.position())?;

        debug!(
            "Node at 0x{offset:x}: length {total_length}, items {item_count}, header {header_length}, content {} bytes{}",
            raw.len(),
            if unpackers.is_empty() { "" } else { " (packed)" }
        );

        let (content, content_origin) = match unpackers.first() {
            Some(unpacker) => (self.unpack(raw, unpacker, content_offset)?, 0),
            None => (raw.to_vec(), content_offset),
        };

        let (resource_kind, children) = if item_count == 0 {
            let kind = ResourceKind::classify(metadata.bytes(FieldSpecifier::ResourceFormat.key()));
            (kind, Vec::new())
        } else {
            let children = self.parse_children(&content, content_origin, depth + 1)?;
            if children.len() != item_count {
                debug!(
                    "Folder at 0x{offset:x} declares {item_count} items, found {}",
                    children.len()
                );
            }
            (ResourceKind::Folder, children)
        };

        Ok(Node {
            offset,
            total_length,
            item_count,
            header_length,
            metadata,
            unpackers,
            reference_type,
            content,
            resource_kind,
            children,
        })
    }

    fn unpack(&self, raw: &[u8], unpacker: &UnpackerDescriptor, offset: usize) -> Result<Vec<u8>> {
        if raw.len() < PACKED_HEADER_LEN {
            return Err(XmfError::Decompression {
                offset,
                source: DecompressError::MissingHeader { len: raw.len() },
            });
        }
        if !is_zlib_header(raw) {
            warn!(
                "Packed content at 0x{offset:x} has no zlib header ({:02x} {:02x})",
                raw[0], raw[1]
            );
        }
        if let UnpackerKind::Vendor {
            manufacturer_id, ..
        } = unpacker.kind
        {
            info!("Vendor unpacker 0x{manufacturer_id:x}, inflating as zlib");
        }
        info!(
            "Packed content. Attempting to deflate. Target size: {}",
            unpacker.decoded_size
        );

        self.decompressor
            .decompress(&raw[PACKED_HEADER_LEN..], unpacker.decoded_size)
            .map_err(|source| XmfError::Decompression { offset, source })
    }

    fn parse_children(&self, content: &[u8], origin: usize, depth: usize) -> Result<Vec<Node>> {
        if depth > self.config.max_depth {
            return Err(XmfError::NestingTooDeep {
                depth,
                limit: self.config.max_depth,
            });
        }

        let mut records = Cursor::with_origin(content, origin);
        let mut children = Vec::new();
        while !records.at_end() {
            let record_start = records.position();
            let record_length = read_vlq_usize(&mut records)?;
            if record_length == 0 {
                return Err(XmfError::MalformedNode {
                    offset: records.offset_of(record_start),
                    msg: "zero-length child node".to_string(),
                });
            }
            let record_end = record_start.saturating_add(record_length);
            let mut record = records.range(record_start, record_end)?;
            records.seek(record_end)?;
            children.push(self.parse(&mut record, depth)?);
        }
        Ok(children)
    }
}
