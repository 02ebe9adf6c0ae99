//! `.ifo` metadata parsing (line-oriented `key=value` text)

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use log::debug;

use super::error::{Result, StarDictError};
use super::models::OffsetWidth;

/// Required first line of every `.ifo` file.
pub const IFO_MAGIC: &str = "StarDict's dict ifo file";

/// Parsed `.ifo` metadata.
///
/// Unrecognized keys are ignored. `idxoffsetbits` defaults to 32.
#[derive(Debug, Clone, Default)]
pub struct Ifo {
    pub book_name: Option<String>,
    pub word_count: u64,
    pub syn_word_count: Option<u64>,
    pub idx_file_size: u64,
    pub offset_width: OffsetWidth,
    pub author: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub same_type_sequence: Option<String>,
    pub dict_type: Option<String>,
}

impl Ifo {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }

    /// Parse `.ifo` content from any reader. The first line must equal the
    /// magic string exactly.
    pub fn from_reader(source: impl Read) -> Result<Self> {
        let reader = BufReader::new(source);
        let mut ifo = Ifo::default();
        let mut first = true;

        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if first {
                if line != IFO_MAGIC {
                    return Err(StarDictError::InvalidFormat(format!(
                        "first line of ifo file does not match magic ({:?})",
                        IFO_MAGIC
                    )));
                }
                first = false;
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            match key {
                "bookname" => ifo.book_name = Some(value.to_string()),
                "wordcount" => ifo.word_count = parse_number(key, value)?,
                "synwordcount" => ifo.syn_word_count = Some(parse_number(key, value)?),
                "idxfilesize" => ifo.idx_file_size = parse_number(key, value)?,
                "idxoffsetbits" => {
                    let bits = parse_number(key, value)? as u32;
                    ifo.offset_width = OffsetWidth::from_bits(bits)?;
                }
                "author" => ifo.author = Some(value.to_string()),
                "email" => ifo.email = Some(value.to_string()),
                "website" => ifo.website = Some(value.to_string()),
                "description" => ifo.description = Some(value.to_string()),
                "date" => ifo.date = Some(value.to_string()),
                "sametypesequence" => ifo.same_type_sequence = Some(value.to_string()),
                "dicttype" => ifo.dict_type = Some(value.to_string()),
                other => debug!("ignoring unrecognized ifo key: {}", other),
            }
        }

        if first {
            return Err(StarDictError::InvalidFormat(
                "ifo file is empty".to_string(),
            ));
        }

        debug!(
            "ifo parsed: bookname={:?}, wordcount={}, idxfilesize={}",
            ifo.book_name, ifo.word_count, ifo.idx_file_size
        );
        Ok(ifo)
    }
}

fn parse_number(key: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        StarDictError::InvalidFormat(format!("ifo key {} has non-numeric value {:?}", key, value))
    })
}
