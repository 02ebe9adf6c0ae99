//! Core StarDict reader module
//!
//! [`StarDict`] combines the headword index, the optional synonym
//! reverse-index, and an open definition store (dictzip or plain) to answer
//! exact and pattern queries and to iterate the whole dictionary.
//!
//! Definition-fetching operations take `&mut self`: the store holds a single
//! read cursor into its backing byte source, so a handle is not safe for
//! concurrent use without external synchronization.

pub mod collate;
pub mod error;
pub mod index;
pub mod models;
pub mod write;

mod diacritics;
mod dictzip;
mod ifo;
mod json;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use regex::RegexBuilder;

pub use diacritics::remove_diacritics;
pub use dictzip::{ChunkDescriptor, DictZip};
pub use error::{Result, StarDictError};
pub use ifo::{Ifo, IFO_MAGIC};
pub use models::{CompressionOptions, Entry, IndexEntry, OffsetWidth, SynonymEntry};
pub use write::{write, write_async, OutputEntry, WriteOptions};

/// Hard cap on exact-lookup matches over the headword index.
const MAX_EXACT_RESULTS: usize = 10;
/// Hard cap on exact-lookup matches over the synonym table.
const MAX_SYNONYM_RESULTS: usize = 20;
/// Default cap on accepted pattern-lookup matches.
const DEFAULT_MAX_PATTERN_RESULTS: usize = 200;

/// The definition store behind an open dictionary: either a dictzip
/// random-access container or a flat blob addressed directly by byte offset.
#[derive(Debug)]
enum Store<R> {
    DictZip(DictZip<R>),
    Plain(R),
}

/// An open StarDict dictionary.
///
/// The index and synonym tables are loaded once at open time and held
/// read-only. Every definition lookup re-reads (and, for compressed stores,
/// re-decompresses) from the backing source; there is no caching layer.
#[derive(Debug)]
pub struct StarDict<R: Read + Seek> {
    pub metadata: Ifo,
    index: Vec<IndexEntry>,
    synonyms: Vec<SynonymEntry>,
    /// Alternative words grouped by the position of their target index entry.
    synonym_groups: HashMap<u32, BTreeSet<String>>,
    store: Store<R>,
    /// Cap on accepted pattern-lookup matches (default 200).
    pub max_pattern_results: usize,
}

impl StarDict<File> {
    /// Open a dictionary from the path of its `.ifo` file.
    ///
    /// Companion files are resolved from the same base name: `.idx` or
    /// `.idx.dz`, optional `.syn` or `.syn.dz`, and `.dict` or `.dict.dz`
    /// (the `.dz` definition blob is a dictzip container).
    ///
    /// # Errors
    /// `MissingFile` if no idx or dict file exists at the base path;
    /// `InvalidFormat` for a bad `.ifo` magic line or a `.dict.dz` without a
    /// random-access chunk table.
    pub fn open(ifo_path: impl AsRef<Path>) -> Result<Self> {
        let ifo_path = ifo_path.as_ref();
        info!("opening StarDict dictionary: {}", ifo_path.display());

        let metadata = Ifo::from_path(ifo_path)?;
        let base = ifo_path.with_extension("");

        let idx_buf = load_table_file(&base, "idx")?;
        let index = index::parse_idx(
            &idx_buf,
            metadata.idx_file_size as usize,
            metadata.offset_width,
        );

        let synonyms = match load_table_file(&base, "syn") {
            Ok(buf) => index::parse_syn(&buf),
            Err(StarDictError::MissingFile { .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        let dz_path = companion_path(&base, "dict.dz");
        let plain_path = companion_path(&base, "dict");
        let store = if dz_path.exists() {
            Store::DictZip(DictZip::open(File::open(dz_path)?)?)
        } else if plain_path.exists() {
            Store::Plain(File::open(plain_path)?)
        } else {
            return Err(StarDictError::MissingFile {
                extension: "dict",
                base: base.clone(),
            });
        };

        Ok(Self::assemble(metadata, index, synonyms, store))
    }
}

impl<R: Read + Seek> StarDict<R> {
    /// Open a dictionary from in-memory or streamed tables.
    ///
    /// The caller-supplied [`CompressionOptions`] flags are authoritative;
    /// table content is never sniffed to guess whether it is compressed.
    pub fn from_readers<I: Read, X: Read, S: Read>(
        ifo: I,
        idx: X,
        syn: Option<S>,
        dict: R,
        compression: CompressionOptions,
    ) -> Result<Self> {
        let metadata = Ifo::from_reader(ifo)?;

        let idx_buf = index::read_table(idx, compression.idx)?;
        let index = index::parse_idx(
            &idx_buf,
            metadata.idx_file_size as usize,
            metadata.offset_width,
        );

        let synonyms = match syn {
            Some(source) => {
                let buf = index::read_table(source, compression.syn)?;
                index::parse_syn(&buf)
            }
            None => Vec::new(),
        };

        let store = if compression.dict {
            Store::DictZip(DictZip::open(dict)?)
        } else {
            Store::Plain(dict)
        };

        Ok(Self::assemble(metadata, index, synonyms, store))
    }

    fn assemble(
        metadata: Ifo,
        index: Vec<IndexEntry>,
        synonyms: Vec<SynonymEntry>,
        store: Store<R>,
    ) -> Self {
        let mut synonym_groups: HashMap<u32, BTreeSet<String>> = HashMap::new();
        for synonym in &synonyms {
            synonym_groups
                .entry(synonym.original_word_index)
                .or_default()
                .insert(synonym.word.clone());
        }
        info!(
            "dictionary ready: {} index entries, {} synonyms",
            index.len(),
            synonyms.len()
        );
        Self {
            metadata,
            index,
            synonyms,
            synonym_groups,
            store,
            max_pattern_results: DEFAULT_MAX_PATTERN_RESULTS,
        }
    }

    pub fn entry_count(&self) -> usize {
        self.index.len()
    }

    pub fn has_synonyms(&self) -> bool {
        !self.synonyms.is_empty()
    }

    /// Exact lookup honoring the two independent comparison toggles.
    ///
    /// Scans the index in file order, counting matches (and only matches)
    /// toward a hard cap of 10; an analogous scan over the synonym table is
    /// capped at 20, each hit resolved to its target index entry. Returns
    /// deduplicated `(word, definition)` pairs in first-encounter order, each
    /// definition fetched on demand from the store.
    pub fn lookup(
        &mut self,
        word: &str,
        ignore_case: bool,
        ignore_diacritics: bool,
    ) -> Result<Vec<(String, String)>> {
        let target = diacritics::fold_for_match(word, ignore_case, ignore_diacritics);
        let mut positions = Vec::new();

        let mut hits = 0usize;
        for (position, entry) in self.index.iter().enumerate() {
            if hits == MAX_EXACT_RESULTS {
                break;
            }
            if diacritics::fold_for_match(&entry.word, ignore_case, ignore_diacritics) == target {
                positions.push(position);
                hits += 1;
            }
        }

        if !self.synonyms.is_empty() {
            let mut synonym_hits = 0usize;
            for synonym in &self.synonyms {
                if synonym_hits == MAX_SYNONYM_RESULTS {
                    break;
                }
                if diacritics::fold_for_match(&synonym.word, ignore_case, ignore_diacritics)
                    == target
                {
                    positions.push(synonym.original_word_index as usize);
                    synonym_hits += 1;
                }
            }
        }

        debug!("lookup {:?}: {} candidate positions", word, positions.len());
        self.resolve_positions(positions)
    }

    /// Pattern lookup over headwords (optionally diacritic-stripped before
    /// matching) and, when `match_synonyms` is set, over synonym words under
    /// the same remaining cap.
    ///
    /// Accepted matches are capped at [`max_pattern_results`] with
    /// first-encountered-in-file-order semantics. A compile failure is fatal
    /// to this call only. The regex engine guarantees linear-time matching,
    /// so no wall-clock abort is needed against pathological patterns.
    ///
    /// [`max_pattern_results`]: Self::max_pattern_results
    pub fn lookup_pattern(
        &mut self,
        pattern: &str,
        ignore_case: bool,
        ignore_diacritics: bool,
        match_synonyms: bool,
    ) -> Result<Vec<(String, String)>> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()?;

        let mut positions = Vec::new();
        let mut accepted = HashSet::new();

        for (position, entry) in self.index.iter().enumerate() {
            if accepted.len() == self.max_pattern_results {
                break;
            }
            let word = if ignore_diacritics {
                remove_diacritics(&entry.word)
            } else {
                entry.word.clone()
            };
            if regex.is_match(&word) && accepted.insert(position) {
                positions.push(position);
            }
        }

        if match_synonyms && !self.synonyms.is_empty() {
            for synonym in &self.synonyms {
                if accepted.len() == self.max_pattern_results {
                    break;
                }
                let word = if ignore_diacritics {
                    remove_diacritics(&synonym.word)
                } else {
                    synonym.word.clone()
                };
                let position = synonym.original_word_index as usize;
                if regex.is_match(&word) && accepted.insert(position) {
                    positions.push(position);
                }
            }
        }

        debug!(
            "pattern lookup {:?}: {} accepted positions",
            pattern,
            positions.len()
        );
        self.resolve_positions(positions)
    }

    /// Every headword in file order. Lazy and restartable: call again for a
    /// fresh pass.
    pub fn all_words(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.iter().map(|entry| entry.word.as_str())
    }

    /// Alternative spellings of `word`, resolved by exact case-sensitive
    /// positional lookup in the index. Empty if the word is absent or has no
    /// synonyms.
    pub fn synonyms_of(&self, word: &str) -> BTreeSet<String> {
        let Some(position) = self.index.iter().position(|entry| entry.word == word) else {
            return BTreeSet::new();
        };
        self.synonym_groups
            .get(&(position as u32))
            .cloned()
            .unwrap_or_default()
    }

    /// Every `(word, synonym set, definition)` triple in file order, each
    /// definition resolved on demand. The basis for full-dictionary export.
    pub fn all_entries(&mut self) -> Entries<'_, R> {
        Entries {
            dict: self,
            position: 0,
        }
    }

    /// Write the whole dictionary as a pretty-printed JSON array of
    /// `{word, alternatives, definition}` objects.
    pub fn export_json<W: Write>(&mut self, out: W) -> Result<()> {
        json::export(self, out)
    }

    /// Fetch definition bytes from the store and decode them as UTF-8
    /// (lossily, matching how index words decode).
    fn read_definition(&mut self, offset: u64, size: u32) -> Result<String> {
        let bytes = match &mut self.store {
            Store::DictZip(dz) => dz.read_at(offset, size as u64)?,
            Store::Plain(source) => {
                source.seek(SeekFrom::Start(offset))?;
                let mut buf = vec![0u8; size as usize];
                source.read_exact(&mut buf)?;
                buf
            }
        };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Resolve index positions to deduplicated `(word, definition)` pairs,
    /// preserving first-encounter order.
    fn resolve_positions(&mut self, positions: Vec<usize>) -> Result<Vec<(String, String)>> {
        let mut seen_positions = HashSet::new();
        let mut seen_pairs = HashSet::new();
        let mut results = Vec::new();

        for position in positions {
            if !seen_positions.insert(position) {
                continue;
            }
            let Some(entry) = self.index.get(position).cloned() else {
                warn!("synonym points past the index end: {}", position);
                continue;
            };
            let definition = self.read_definition(entry.data_offset, entry.data_size)?;
            if seen_pairs.insert((entry.word.clone(), definition.clone())) {
                results.push((entry.word, definition));
            }
        }
        Ok(results)
    }
}

/// Iterator over full dictionary entries in file order.
pub struct Entries<'a, R: Read + Seek> {
    dict: &'a mut StarDict<R>,
    position: usize,
}

impl<R: Read + Seek> Iterator for Entries<'_, R> {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.dict.index.get(self.position)?.clone();
        let alternatives = self
            .dict
            .synonym_groups
            .get(&(self.position as u32))
            .cloned()
            .unwrap_or_default();
        self.position += 1;

        Some(
            self.dict
                .read_definition(entry.data_offset, entry.data_size)
                .map(|definition| Entry {
                    word: entry.word,
                    alternatives,
                    definition,
                }),
        )
    }
}

/// Build `<base>.<extension>` without touching any existing dots in the base
/// name.
fn companion_path(base: &Path, extension: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

/// Load a table file, preferring the `.dz` (whole-file gzip) variant.
fn load_table_file(base: &Path, extension: &'static str) -> Result<Vec<u8>> {
    let dz_path = companion_path(base, &format!("{}.dz", extension));
    if dz_path.exists() {
        return index::read_table(File::open(dz_path)?, true);
    }
    let plain_path = companion_path(base, extension);
    if plain_path.exists() {
        return index::read_table(File::open(plain_path)?, false);
    }
    Err(StarDictError::MissingFile {
        extension,
        base: base.to_path_buf(),
    })
}
