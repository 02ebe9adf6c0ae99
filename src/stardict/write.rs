//! StarDict authoring: collation sort, layout assignment, stream emission,
//! and zip packaging
//!
//! The writer re-derives the exact on-disk layout from authored entries as a
//! two-phase pipeline: sort under StarDict collation, then map with a running
//! byte offset into finalized, immutable records. All inputs are in memory;
//! any failure aborts the whole write.

use std::collections::BTreeSet;
use std::io::{Cursor, Seek, SeekFrom, Write};

use byteorder::{BigEndian, WriteBytesExt};
use log::{debug, info};
use zip::write::FileOptions;
use zip::ZipWriter;

use super::collate::stardict_cmp;
use super::error::Result;
use super::ifo::IFO_MAGIC;

/// Number of entries processed between cooperative yields in [`write_async`].
const YIELD_BATCH: usize = 8000;

/// One authored dictionary entry, before layout assignment.
///
/// Headword and definition are whitespace-trimmed on construction;
/// alternatives equal to the headword itself are dropped.
#[derive(Debug, Clone)]
pub struct OutputEntry {
    headword: String,
    definition: String,
    alternatives: BTreeSet<String>,
}

impl OutputEntry {
    pub fn new(headword: &str, definition: &str) -> Self {
        Self {
            headword: headword.trim().to_string(),
            definition: definition.trim().to_string(),
            alternatives: BTreeSet::new(),
        }
    }

    pub fn with_alternatives(
        headword: &str,
        definition: &str,
        alternatives: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut entry = Self::new(headword, definition);
        entry.alternatives = alternatives
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && *a != entry.headword)
            .collect();
        entry
    }

    pub fn headword(&self) -> &str {
        &self.headword
    }

    pub fn definition(&self) -> &str {
        &self.definition
    }

    pub fn alternatives(&self) -> &BTreeSet<String> {
        &self.alternatives
    }
}

/// Naming and metadata for one write.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Base name of the archive members (`<base_name>.idx` and so on).
    pub base_name: String,
    pub title: String,
    pub author: String,
    pub description: String,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            base_name: "Stardict_Dictionary".to_string(),
            title: "Title".to_string(),
            author: "Author".to_string(),
            description: "Desc.".to_string(),
        }
    }
}

/// An entry after the sort and layout passes; immutable from here on.
struct PreparedEntry {
    headword: String,
    definition: Vec<u8>,
    alternatives: BTreeSet<String>,
    index: u32,
    offset: u32,
}

impl PreparedEntry {
    fn definition_size(&self) -> u32 {
        self.definition.len() as u32
    }
}

/// Sort entries by StarDict collation, then assign each a zero-based sequence
/// index and a byte offset equal to the cumulative UTF-8 length of all
/// definitions before it. No padding or alignment.
fn prepare(mut entries: Vec<OutputEntry>) -> Vec<PreparedEntry> {
    entries.sort_by(|a, b| stardict_cmp(&a.headword, &b.headword));

    let mut prepared = Vec::with_capacity(entries.len());
    let mut offset = 0u32;
    for (index, entry) in entries.into_iter().enumerate() {
        let definition = entry.definition.into_bytes();
        let size = definition.len() as u32;
        prepared.push(PreparedEntry {
            headword: entry.headword,
            definition,
            alternatives: entry.alternatives,
            index: index as u32,
            offset,
        });
        offset += size;
    }
    prepared
}

/// Collect every (alternative spelling, owning entry index) pair and sort the
/// collection independently under the same collation rule.
fn collect_synonyms(prepared: &[PreparedEntry]) -> Vec<(String, u32)> {
    let mut synonyms = Vec::new();
    for entry in prepared {
        for alternative in &entry.alternatives {
            synonyms.push((alternative.clone(), entry.index));
        }
    }
    synonyms.sort_by(|a, b| stardict_cmp(&a.0, &b.0));
    synonyms
}

struct Streams {
    ifo: Vec<u8>,
    idx: Vec<u8>,
    dict: Vec<u8>,
    syn: Vec<u8>,
}

fn emit_streams(
    prepared: &[PreparedEntry],
    synonyms: &[(String, u32)],
    options: &WriteOptions,
) -> Result<Streams> {
    let mut idx = Vec::new();
    let mut dict = Vec::new();
    for entry in prepared {
        idx.write_all(entry.headword.as_bytes())?;
        idx.write_u8(0)?;
        idx.write_u32::<BigEndian>(entry.offset)?;
        idx.write_u32::<BigEndian>(entry.definition_size())?;
        dict.write_all(&entry.definition)?;
    }

    let mut syn = Vec::new();
    for (word, index) in synonyms {
        syn.write_all(word.as_bytes())?;
        syn.write_u8(0)?;
        syn.write_u32::<BigEndian>(*index)?;
    }

    let mut ifo = Vec::new();
    writeln!(ifo, "{}", IFO_MAGIC)?;
    writeln!(ifo, "version=3.0.0")?;
    writeln!(ifo, "bookname={}", options.title)?;
    writeln!(ifo, "wordcount={}", prepared.len())?;
    if !synonyms.is_empty() {
        writeln!(ifo, "synwordcount={}", synonyms.len())?;
    }
    writeln!(ifo, "idxfilesize={}", idx.len())?;
    writeln!(ifo, "author={}", options.author)?;
    writeln!(ifo, "description={}", options.description)?;
    writeln!(ifo, "sametypesequence=h")?;

    debug!(
        "streams emitted: idx={} bytes, dict={} bytes, syn={} bytes",
        idx.len(),
        dict.len(),
        syn.len()
    );
    Ok(Streams {
        ifo,
        idx,
        dict,
        syn,
    })
}

/// Write the streams as named zip entries. The `.syn` member is omitted when
/// no synonyms were extracted.
fn package(streams: &Streams, base_name: &str) -> Result<Cursor<Vec<u8>>> {
    let mut archive = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options = FileOptions::default();

    archive.start_file(format!("{}.idx", base_name), file_options)?;
    archive.write_all(&streams.idx)?;
    archive.start_file(format!("{}.dict", base_name), file_options)?;
    archive.write_all(&streams.dict)?;
    if !streams.syn.is_empty() {
        archive.start_file(format!("{}.syn", base_name), file_options)?;
        archive.write_all(&streams.syn)?;
    }
    archive.start_file(format!("{}.ifo", base_name), file_options)?;
    archive.write_all(&streams.ifo)?;

    let mut cursor = archive.finish()?;
    cursor.seek(SeekFrom::Start(0))?;
    Ok(cursor)
}

/// Turn authored entries into the four StarDict streams packaged as one zip
/// archive, returned positioned at its start.
pub fn write(entries: Vec<OutputEntry>, options: &WriteOptions) -> Result<Cursor<Vec<u8>>> {
    info!(
        "writing dictionary {:?}: {} entries",
        options.base_name,
        entries.len()
    );
    let prepared = prepare(entries);
    let synonyms = collect_synonyms(&prepared);
    let streams = emit_streams(&prepared, &synonyms, options)?;
    package(&streams, &options.base_name)
}

/// Identical algorithm to [`write`], yielding cooperatively every 8000
/// entries during layout assignment and synonym extraction so long writes can
/// interleave with other cooperative work. Adds no parallelism and no
/// additional ordering guarantees; output is byte-identical to [`write`].
pub async fn write_async(
    mut entries: Vec<OutputEntry>,
    options: &WriteOptions,
) -> Result<Cursor<Vec<u8>>> {
    info!(
        "writing dictionary {:?} (cooperative): {} entries",
        options.base_name,
        entries.len()
    );
    entries.sort_by(|a, b| stardict_cmp(&a.headword, &b.headword));

    let mut prepared = Vec::with_capacity(entries.len());
    let mut offset = 0u32;
    for (index, entry) in entries.into_iter().enumerate() {
        if index % YIELD_BATCH == 0 {
            tokio::task::yield_now().await;
        }
        let definition = entry.definition.into_bytes();
        let size = definition.len() as u32;
        prepared.push(PreparedEntry {
            headword: entry.headword,
            definition,
            alternatives: entry.alternatives,
            index: index as u32,
            offset,
        });
        offset += size;
    }

    let mut synonyms = Vec::new();
    let mut count = 0usize;
    for entry in &prepared {
        for alternative in &entry.alternatives {
            if count % YIELD_BATCH == 0 {
                tokio::task::yield_now().await;
            }
            synonyms.push((alternative.clone(), entry.index));
            count += 1;
        }
    }
    synonyms.sort_by(|a, b| stardict_cmp(&a.0, &b.0));

    let streams = emit_streams(&prepared, &synonyms, options)?;
    package(&streams, &options.base_name)
}
