//! XMF container parser
//!
//! Reads eXtensible Music Format (XMF) and Mobile XMF containers and extracts
//! the embedded Standard MIDI File, plus the embedded DLS instrument bank when
//! one is present, as raw bytes for a synthesizer to consume.
//!
//! # Features
//! - Header validation for XMF 1.00 and 2.00 files
//! - Recursive decoding of the node tree with per-node metadata
//! - Unpacking of zlib-packed node content
//! - Resource classification (SMF type 0/1, DLS 1/2/2.2, Mobile DLS)
//! - Song name, copyright and comment collection
//!
//! Only inline resources are supported. Nodes that reference content in
//! other files or other parts of the container fail the parse.
//!
//! # Crate feature flags
//! - `cli` (default): the `xmf-extract` command line tool
//!
//! # Quick start
//! ```no_run
//! use xmf_container::parse_container;
//! let data = std::fs::read("song.mxmf").unwrap();
//! let song = parse_container(&data).unwrap();
//! println!("{} bytes of MIDI", song.sequence.len());
//! if let Some(bank) = &song.instrument_bank {
//!     println!("{} bytes of DLS", bank.len());
//! }
//! ```
//!
//! ## Inspecting the node tree
//! ```no_run
//! use xmf_container::load_xmf;
//! let data = std::fs::read("song.xmf").unwrap();
//! let file = load_xmf(&data).unwrap();
//! for node in file.root.walk() {
//!     println!("{:?} {:?}", node.name(), node.resource_kind);
//! }
//! ```

#![warn(missing_docs)]

pub mod collector;
pub mod compression;
pub mod config;
pub mod cursor;
pub mod error;
pub mod format;
pub mod loader;
pub mod metadata;
pub mod node;
pub mod parser;
pub mod unpacker;
pub mod vlq;

pub use crate::collector::collect;
pub use crate::compression::{Decompressor, DeflateDecompressor};
pub use crate::config::ParserConfig;
pub use crate::cursor::Cursor;
pub use crate::error::{DecompressError, Result, XmfError};
pub use crate::format::{ContainerHeader, FileTypeId, SongInfo, XmfFile, XmfSong};
pub use crate::loader::{load_file, load_file_with};
pub use crate::metadata::{FieldSpecifier, Metadata, MetadataKey, MetadataValue};
pub use crate::node::{Node, ReferenceType, ResourceKind};
pub use crate::parser::{
    is_xmf_data, load_xmf, load_xmf_with, parse_container, parse_container_with,
    parse_container_with_decompressor, XMF_SIGNATURE,
};
pub use crate::unpacker::{UnpackerDescriptor, UnpackerKind};
