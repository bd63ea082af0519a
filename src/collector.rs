//! Resource collection over a parsed node tree.

use std::borrow::Cow;

use log::info;

use crate::config::ParserConfig;
use crate::error::{Result, XmfError};
use crate::format::{SongInfo, XmfFile, XmfSong};
use crate::metadata::FieldSpecifier;
use crate::node::{Node, ResourceKind};

/// Locate the first MIDI sequence and DLS bank in `file` and gather song info.
///
/// Traversal is depth-first in stream order; for every output field the first
/// match wins. Fails with [`XmfError::NoPlayableResource`] when the tree holds
/// no MIDI sequence.
pub fn collect(file: &XmfFile, config: &ParserConfig) -> Result<XmfSong> {
    let mut collector = ResourceCollector::default();
    for node in file.root.walk() {
        collector.visit(node, config);
    }

    let sequence = collector.sequence.ok_or(XmfError::NoPlayableResource)?;
    Ok(XmfSong {
        header: file.header.clone(),
        sequence: sequence.to_vec(),
        instrument_bank: collector.instrument_bank.map(<[u8]>::to_vec),
        info: collector.info,
    })
}

#[derive(Default)]
struct ResourceCollector<'a> {
    sequence: Option<&'a [u8]>,
    instrument_bank: Option<&'a [u8]>,
    info: SongInfo,
}

impl<'a> ResourceCollector<'a> {
    fn visit(&mut self, node: &'a Node, config: &ParserConfig) {
        let metadata = &node.metadata;
        fill(&mut self.info.name, metadata.text(FieldSpecifier::NodeName.key()));
        fill(&mut self.info.name, metadata.text(FieldSpecifier::Title.key()));
        fill(&mut self.info.copyright, metadata.text(FieldSpecifier::CopyrightNotice.key()));
        fill(&mut self.info.comment, metadata.text(FieldSpecifier::Comment.key()));

        if !node.is_file() {
            return;
        }

        let kind = effective_kind(node, config);
        if kind.is_instrument_bank() && self.instrument_bank.is_none() {
            info!("Found embedded DLS ({kind:?}) at 0x{:x}", node.offset);
            self.instrument_bank = Some(&node.content);
        } else if kind.is_sequence() && self.sequence.is_none() {
            info!("Found embedded MIDI ({kind:?}) at 0x{:x}", node.offset);
            self.sequence = Some(&node.content);
        }
    }
}

fn effective_kind<'n>(node: &'n Node, config: &ParserConfig) -> Cow<'n, ResourceKind> {
    let unlabelled = node.metadata.get(FieldSpecifier::ResourceFormat.key()).is_none();
    if config.sniff_unlabelled && unlabelled && node.resource_kind == ResourceKind::Unknown {
        let sniffed = ResourceKind::sniff(&node.content);
        if sniffed != ResourceKind::Unknown {
            info!("Unlabelled file node at 0x{:x} looks like {sniffed:?}", node.offset);
        }
        return Cow::Owned(sniffed);
    }
    Cow::Borrowed(&node.resource_kind)
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    if slot.is_none() {
        *slot = value.map(str::to_string);
    }
}
