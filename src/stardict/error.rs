//! Custom error types for the stardict crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum StarDictError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The file is structurally invalid: bad gzip magic, missing random-access
    /// sub-field, wrong `.ifo` magic line, or a malformed numeric field.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// An expected companion file (`.idx`, `.dict`, ...) was not found next to
    /// the `.ifo` file.
    #[error("No .{extension} file found for base path {base}")]
    MissingFile {
        extension: &'static str,
        base: PathBuf,
    },

    /// A search pattern failed to compile. Fatal to that call only; the
    /// dictionary handle remains valid.
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A dictzip chunk failed to decompress, indicating corrupt data. Fatal to
    /// that specific read only; the store remains usable.
    #[error("Decompression failed: {0}")]
    Decompression(String),

    /// A requested byte range extends past the decompressed data covered by
    /// the chunk table.
    #[error("Read out of bounds: requested {offset}+{len}, but only {available} bytes are addressable")]
    ReadOutOfBounds { offset: u64, len: u64, available: u64 },

    /// An error from the zip container used to package writer output.
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// JSON serialization failed during export.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenience `Result` type alias using the crate's `StarDictError` type.
pub type Result<T> = std::result::Result<T, StarDictError>;
