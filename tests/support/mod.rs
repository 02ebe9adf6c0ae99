//! Shared fixture builders for the integration specs.
#![allow(dead_code)]

use std::io::{Cursor, Read, Write};

use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::{Compression, Crc};
use stardict::{CompressionOptions, StarDict};

/// An in-memory dictzip container plus the layout facts tests need to poke
/// at specific chunks.
pub struct DzFixture {
    pub bytes: Vec<u8>,
    pub payload_offset: usize,
    pub chunk_lens: Vec<usize>,
}

pub fn build_dictzip(content: &[u8], chunk_len: u16) -> DzFixture {
    build_dictzip_with(content, chunk_len, None, None, false)
}

/// Assemble a dictzip container: gzip header, `RA` chunk table in the extra
/// field, independently deflated chunks, CRC32/ISIZE footer. Optional name,
/// comment, and header-checksum fields exercise the computed payload offset.
pub fn build_dictzip_with(
    content: &[u8],
    chunk_len: u16,
    name: Option<&str>,
    comment: Option<&str>,
    header_crc: bool,
) -> DzFixture {
    let chunks: Vec<Vec<u8>> = content
        .chunks(chunk_len as usize)
        .map(|chunk| {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(chunk).unwrap();
            encoder.finish().unwrap()
        })
        .collect();

    let mut ra = Vec::new();
    ra.extend_from_slice(&1u16.to_le_bytes()); // version
    ra.extend_from_slice(&chunk_len.to_le_bytes());
    ra.extend_from_slice(&(chunks.len() as u16).to_le_bytes());
    for chunk in &chunks {
        ra.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
    }

    let mut extra = Vec::new();
    extra.push(b'R');
    extra.push(b'A');
    extra.extend_from_slice(&(ra.len() as u16).to_le_bytes());
    extra.extend_from_slice(&ra);

    let mut flags = 0x04u8; // FEXTRA
    if name.is_some() {
        flags |= 0x08;
    }
    if comment.is_some() {
        flags |= 0x10;
    }
    if header_crc {
        flags |= 0x02;
    }

    let mut bytes = vec![0x1f, 0x8b, 8, flags, 0, 0, 0, 0, 0, 0xff];
    bytes.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&extra);
    if let Some(name) = name {
        bytes.extend_from_slice(name.as_bytes());
        bytes.push(0);
    }
    if let Some(comment) = comment {
        bytes.extend_from_slice(comment.as_bytes());
        bytes.push(0);
    }
    if header_crc {
        bytes.extend_from_slice(&[0xab, 0xcd]);
    }

    let payload_offset = bytes.len();
    for chunk in &chunks {
        bytes.extend_from_slice(chunk);
    }
    let mut crc = Crc::new();
    crc.update(content);
    bytes.extend_from_slice(&crc.sum().to_le_bytes());
    bytes.extend_from_slice(&(content.len() as u32).to_le_bytes());

    DzFixture {
        bytes,
        payload_offset,
        chunk_lens: chunks.iter().map(|c| c.len()).collect(),
    }
}

/// Whole-file gzip, as used by `.idx.dz` and `.syn.dz` tables.
pub fn gzip_bytes(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Raw `.idx` records with 32-bit offsets.
pub fn idx_bytes(records: &[(&str, u32, u32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (word, offset, size) in records {
        bytes.extend_from_slice(word.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&offset.to_be_bytes());
        bytes.extend_from_slice(&size.to_be_bytes());
    }
    bytes
}

/// Raw `.syn` records.
pub fn syn_bytes(records: &[(&str, u32)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for (word, index) in records {
        bytes.extend_from_slice(word.as_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&index.to_be_bytes());
    }
    bytes
}

pub fn ifo_text(word_count: usize, syn_count: usize, idx_size: usize) -> String {
    let mut text = String::from("StarDict's dict ifo file\nversion=3.0.0\nbookname=Test\n");
    text.push_str(&format!("wordcount={}\n", word_count));
    if syn_count > 0 {
        text.push_str(&format!("synwordcount={}\n", syn_count));
    }
    text.push_str(&format!("idxfilesize={}\n", idx_size));
    text.push_str("sametypesequence=h\n");
    text
}

/// Assemble an open dictionary over plain (uncompressed) in-memory streams.
/// Entry order in `words` becomes file order.
pub fn open_plain(
    words: &[(&str, &str)],
    synonyms: &[(&str, u32)],
) -> StarDict<Cursor<Vec<u8>>> {
    let mut dict = Vec::new();
    let mut idx_records = Vec::new();
    for (word, definition) in words {
        idx_records.push((*word, dict.len() as u32, definition.len() as u32));
        dict.extend_from_slice(definition.as_bytes());
    }
    let idx = idx_bytes(&idx_records);
    let ifo = ifo_text(words.len(), synonyms.len(), idx.len());
    let syn = if synonyms.is_empty() {
        None
    } else {
        Some(Cursor::new(syn_bytes(synonyms)))
    };

    StarDict::from_readers(
        Cursor::new(ifo.into_bytes()),
        Cursor::new(idx),
        syn,
        Cursor::new(dict),
        CompressionOptions {
            idx: false,
            syn: false,
            dict: false,
        },
    )
    .expect("open plain dictionary")
}

/// Extract one member of a zip archive produced by the writer.
pub fn zip_member(archive_bytes: &[u8], name: &str) -> Option<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(archive_bytes.to_vec())).expect("open zip");
    let mut member = match archive.by_name(name) {
        Ok(member) => member,
        Err(_) => return None,
    };
    let mut bytes = Vec::new();
    member.read_to_end(&mut bytes).expect("read zip member");
    Some(bytes)
}
