//! # stardict
//!
//! Read and write support for the StarDict dictionary file family
//! (.ifo/.idx/.dict/.syn), including the dictzip random-access compression
//! layer used by `.dict.dz` files.
//!
//! Single-process and file-backed: no network or multi-process concern.
pub mod stardict;

// Re-export the main types for convenience
pub use stardict::{
    models::{CompressionOptions, Entry, IndexEntry, OffsetWidth, SynonymEntry},
    write, write_async, DictZip, Ifo, OutputEntry, Result, StarDict, StarDictError, WriteOptions,
};
