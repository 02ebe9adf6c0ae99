//! JSON export: a thin consumer of the facade's full-dictionary iteration

use std::io::{Read, Seek, Write};

use log::info;
use serde::ser::{SerializeSeq, Serializer};

use super::error::Result;
use super::StarDict;

/// Stream the whole dictionary to `out` as a pretty-printed JSON array of
/// `{word, alternatives, definition}` objects, one entry at a time.
pub fn export<R: Read + Seek, W: Write>(dict: &mut StarDict<R>, out: W) -> Result<()> {
    let mut serializer = serde_json::Serializer::pretty(out);
    let mut seq = (&mut serializer).serialize_seq(None)?;
    let mut count = 0usize;
    for entry in dict.all_entries() {
        seq.serialize_element(&entry?)?;
        count += 1;
    }
    seq.end()?;
    info!("exported {} entries to JSON", count);
    Ok(())
}
