//! Fixture builder for XMF containers.

#![allow(dead_code)]

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use xmf_container::vlq::encode_vlq;

pub const INLINE: u32 = 1;
pub const EXTERNAL_FILE: u32 = 4;

pub const SMF_TYPE0: u8 = 0;
pub const SMF_TYPE1: u8 = 1;
pub const DLS1: u8 = 2;
pub const MOBILE_DLS: u8 = 5;

pub const MIDI: &[u8] = b"MThd\x00\x00\x00\x06\x00\x00\x00\x01\x00\x60MTrk\x00\x00\x00\x04\x00\xFF\x2F\x00";
pub const DLS: &[u8] = b"RIFF\x0C\x00\x00\x00DLS colh\x04\x00\x00\x00";

/// One standard metadata entry with text content.
pub fn text_field(field: u32, text: &str) -> Vec<u8> {
    field_entry(field, 0, text.as_bytes())
}

/// One standard metadata entry with binary resource format content.
pub fn resource_format(format_id: u8) -> Vec<u8> {
    field_entry(3, 4, &[0x00, format_id])
}

/// Standard metadata entry: field id, format type id, payload.
pub fn field_entry(field: u32, format_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut entry = vec![0x00];
    entry.extend(encode_vlq(field));
    entry.extend(encode_vlq(0));
    let mut contents = encode_vlq(format_id);
    contents.extend_from_slice(payload);
    entry.extend(encode_vlq(contents.len() as u32));
    entry.extend(contents);
    entry
}

/// Internationalized (multi-version) metadata entry.
pub fn international_field(field: u32, versions: u32, block: &[u8]) -> Vec<u8> {
    let mut entry = vec![0x00];
    entry.extend(encode_vlq(field));
    entry.extend(encode_vlq(versions));
    entry.extend(encode_vlq(block.len() as u32));
    entry.extend_from_slice(block);
    entry
}

/// Builder for a single node.
#[derive(Clone, Default)]
pub struct NodeBuilder {
    item_count: u32,
    metadata: Vec<u8>,
    unpackers: Vec<u8>,
    reserved: Vec<u8>,
    reference: u32,
    content: Vec<u8>,
}

impl NodeBuilder {
    pub fn file(format_id: u8, content: &[u8]) -> Self {
        Self {
            metadata: resource_format(format_id),
            reference: INLINE,
            content: content.to_vec(),
            ..Self::default()
        }
    }

    pub fn unlabelled(content: &[u8]) -> Self {
        Self {
            reference: INLINE,
            content: content.to_vec(),
            ..Self::default()
        }
    }

    pub fn folder(children: &[Vec<u8>]) -> Self {
        Self {
            item_count: children.len() as u32,
            reference: INLINE,
            content: children.concat(),
            ..Self::default()
        }
    }

    pub fn metadata(mut self, entry: Vec<u8>) -> Self {
        self.metadata.extend(entry);
        self
    }

    pub fn reference(mut self, reference: u32) -> Self {
        self.reference = reference;
        self
    }

    pub fn reserved(mut self, bytes: &[u8]) -> Self {
        self.reserved = bytes.to_vec();
        self
    }

    pub fn item_count(mut self, count: u32) -> Self {
        self.item_count = count;
        self
    }

    pub fn raw_unpackers(mut self, table: &[u8]) -> Self {
        self.unpackers = table.to_vec();
        self
    }

    /// zlib-pack the content and declare a standard unpacker for it.
    pub fn packed(mut self) -> Self {
        let decoded_size = self.content.len() as u32;
        self.content = zlib(&self.content);
        let mut table = vec![0x00];
        table.extend(encode_vlq(1));
        table.extend(encode_vlq(decoded_size));
        self.unpackers = table;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut body = encode_vlq(self.metadata.len() as u32);
        body.extend(&self.metadata);
        body.extend(encode_vlq(self.unpackers.len() as u32));
        body.extend(&self.unpackers);
        body.extend(&self.reserved);

        let item = encode_vlq(self.item_count);
        let reference = encode_vlq(self.reference);

        // total and header lengths include their own VLQ sizes
        let (mut total_len, mut header_len) = (1, 1);
        loop {
            let header_length = total_len + item.len() + header_len + body.len();
            let total = header_length + reference.len() + self.content.len();
            let next = (
                encode_vlq(total as u32).len(),
                encode_vlq(header_length as u32).len(),
            );
            if next == (total_len, header_len) {
                let mut out = encode_vlq(total as u32);
                out.extend(&item);
                out.extend(encode_vlq(header_length as u32));
                out.extend(&body);
                out.extend(&reference);
                out.extend(&self.content);
                assert_eq!(out.len(), total);
                return out;
            }
            (total_len, header_len) = next;
        }
    }
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Wrap a root node in an XMF file header.
pub fn container(version: &[u8; 4], root: &[u8]) -> Vec<u8> {
    container_with_table(version, &[], root)
}

pub fn container_with_table(version: &[u8; 4], table: &[u8], root: &[u8]) -> Vec<u8> {
    let mut prefix = b"XMF_".to_vec();
    prefix.extend_from_slice(version);
    if version == b"2.00" {
        prefix.extend_from_slice(&0x0000_0002u32.to_be_bytes());
        prefix.extend_from_slice(&0x0000_0001u32.to_be_bytes());
    }

    // file length and root offset include their own VLQ sizes
    let (mut length_len, mut offset_len) = (1, 1);
    loop {
        let root_offset =
            prefix.len() + length_len + encode_vlq(table.len() as u32).len() + table.len() + offset_len;
        let file_length = encode_vlq((root_offset + root.len()) as u32);
        let encoded_offset = encode_vlq(root_offset as u32);
        if (file_length.len(), encoded_offset.len()) == (length_len, offset_len) {
            let mut out = prefix;
            out.extend(file_length);
            out.extend(encode_vlq(table.len() as u32));
            out.extend_from_slice(table);
            out.extend(encoded_offset);
            out.extend_from_slice(root);
            return out;
        }
        (length_len, offset_len) = (file_length.len(), encoded_offset.len());
    }
}
