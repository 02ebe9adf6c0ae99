//! Decoders for the `.idx` headword table and `.syn` synonym table
//!
//! Both tables may be stored whole-file gzip-compressed; that outer layer is
//! removed once, eagerly, into memory. Record order is semantically
//! meaningful (first occurrence wins on lookup) and is preserved.

use std::io::Read;

use byteorder::{BigEndian, ByteOrder};
use flate2::read::GzDecoder;
use log::{info, warn};

use super::error::Result;
use super::models::{IndexEntry, OffsetWidth, SynonymEntry};

/// Read a table into memory, removing whole-file gzip compression when the
/// caller says the table is compressed.
pub fn read_table<R: Read>(source: R, compressed: bool) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    if compressed {
        GzDecoder::new(source).read_to_end(&mut buf)?;
    } else {
        let mut source = source;
        source.read_to_end(&mut buf)?;
    }
    Ok(buf)
}

/// Parse `.idx` records: UTF-8 word, NUL, big-endian data offset (32 or
/// 64-bit per `width`), big-endian 32-bit data size.
///
/// Decodes until `declared_len` bytes are consumed. A damaged tail (missing
/// terminator, or too few bytes left for the fixed-width fields) must not
/// discard an otherwise-valid prefix: parsing stops and returns the records
/// decoded so far. The truncation is logged, never surfaced as an error.
pub fn parse_idx(buf: &[u8], declared_len: usize, width: OffsetWidth) -> Vec<IndexEntry> {
    let limit = declared_len.min(buf.len());
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos < limit {
        let Some(nul) = buf[pos..limit].iter().position(|&b| b == 0) else {
            warn!(
                "idx table ends mid-record at byte {}; keeping {} entries",
                pos,
                entries.len()
            );
            break;
        };
        let word_end = pos + nul;
        let tail = word_end + 1;
        if tail + width.record_tail_len() > limit {
            warn!(
                "idx record at byte {} lacks its fixed-width fields; keeping {} entries",
                pos,
                entries.len()
            );
            break;
        }

        let word = String::from_utf8_lossy(&buf[pos..word_end]).into_owned();
        let (data_offset, size_pos) = match width {
            OffsetWidth::U32 => (BigEndian::read_u32(&buf[tail..]) as u64, tail + 4),
            OffsetWidth::U64 => (BigEndian::read_u64(&buf[tail..]), tail + 8),
        };
        let data_size = BigEndian::read_u32(&buf[size_pos..]);
        entries.push(IndexEntry {
            word,
            data_offset,
            data_size,
        });
        pos = size_pos + 4;
    }

    info!("idx table parsed: {} entries", entries.len());
    entries
}

/// Parse `.syn` records: UTF-8 word, NUL, big-endian 32-bit original-word
/// index. Same truncation policy as [`parse_idx`].
pub fn parse_syn(buf: &[u8]) -> Vec<SynonymEntry> {
    let mut entries = Vec::new();
    let mut pos = 0usize;

    while pos < buf.len() {
        let Some(nul) = buf[pos..].iter().position(|&b| b == 0) else {
            warn!(
                "syn table ends mid-record at byte {}; keeping {} entries",
                pos,
                entries.len()
            );
            break;
        };
        let word_end = pos + nul;
        let tail = word_end + 1;
        if tail + 4 > buf.len() {
            warn!(
                "syn record at byte {} lacks its index field; keeping {} entries",
                pos,
                entries.len()
            );
            break;
        }

        let word = String::from_utf8_lossy(&buf[pos..word_end]).into_owned();
        let original_word_index = BigEndian::read_u32(&buf[tail..]);
        entries.push(SynonymEntry {
            word,
            original_word_index,
        });
        pos = tail + 4;
    }

    info!("syn table parsed: {} entries", entries.len());
    entries
}
