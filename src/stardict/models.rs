//! Data structures representing StarDict format components

use std::collections::BTreeSet;

use serde::Serialize;

use super::error::{Result, StarDictError};

/// One record from the `.idx` headword table.
///
/// Records appear in file order; duplicate words are permitted and preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub word: String,
    /// Byte offset of the definition inside the (decompressed) `.dict` blob.
    pub data_offset: u64,
    /// Byte length of the definition.
    pub data_size: u32,
}

/// One record from the optional `.syn` synonym table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymEntry {
    pub word: String,
    /// Positional reference into the `.idx` record sequence.
    pub original_word_index: u32,
}

/// Width of the data offset field in `.idx` records, selected by the
/// `idxoffsetbits` metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OffsetWidth {
    #[default]
    U32,
    U64,
}

impl OffsetWidth {
    /// Fixed-width byte count following a word's NUL terminator
    /// (offset + 32-bit size).
    pub fn record_tail_len(self) -> usize {
        match self {
            OffsetWidth::U32 => 8,
            OffsetWidth::U64 => 12,
        }
    }

    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            32 => Ok(OffsetWidth::U32),
            64 => Ok(OffsetWidth::U64),
            _ => Err(StarDictError::InvalidFormat(format!(
                "idxoffsetbits must be 32 or 64, got {}",
                bits
            ))),
        }
    }
}

/// Per-table compression flags for the stream constructors.
///
/// The caller's flag is authoritative; table content is never sniffed to
/// guess whether it is compressed.
#[derive(Debug, Clone, Copy)]
pub struct CompressionOptions {
    /// `.idx` table is whole-file gzip-compressed.
    pub idx: bool,
    /// `.syn` table is whole-file gzip-compressed.
    pub syn: bool,
    /// `.dict` blob is a dictzip random-access container.
    pub dict: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            idx: false,
            syn: false,
            dict: true,
        }
    }
}

/// A full dictionary entry as yielded by
/// [`StarDict::all_entries`](super::StarDict::all_entries).
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub word: String,
    pub alternatives: BTreeSet<String>,
    pub definition: String,
}
