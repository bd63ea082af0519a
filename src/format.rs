//! Data structures describing parsed XMF containers.

use serde::Serialize;

use crate::node::Node;

/// File type identification present in version 2.00 headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileTypeId {
    /// XMF file type id.
    pub id: u32,
    /// XMF file type revision id.
    pub revision: u32,
}

/// File-level header of an XMF container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerHeader {
    /// Version string, e.g. `"1.00"` or `"2.00"`.
    pub version: String,
    /// File type ids (version 2.00 only).
    pub file_type: Option<FileTypeId>,
    /// Declared file length (not checked against the buffer).
    pub file_length: u32,
    /// Length of the skipped file-level metadata table.
    pub metadata_table_length: usize,
    /// Absolute offset of the root node.
    pub root_offset: usize,
}

/// Full node tree of a container.
#[derive(Debug, Clone, PartialEq)]
pub struct XmfFile {
    /// File-level header.
    pub header: ContainerHeader,
    /// Root node of the tree.
    pub root: Node,
}

/// Textual song information gathered from node metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SongInfo {
    /// Song name (from node name or title).
    pub name: Option<String>,
    /// Copyright notice.
    pub copyright: Option<String>,
    /// Comment.
    pub comment: Option<String>,
}

/// Playable resources extracted from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmfSong {
    /// File-level header of the source container.
    pub header: ContainerHeader,
    /// Standard MIDI File image.
    pub sequence: Vec<u8>,
    /// DLS instrument bank image, if the container embeds one.
    pub instrument_bank: Option<Vec<u8>>,
    /// Song information.
    pub info: SongInfo,
}
