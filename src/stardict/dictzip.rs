//! Random-access dictzip container parsing and chunked byte-range reads
//!
//! A dictzip file is a gzip file whose extra field carries an `RA` sub-field
//! describing a table of independently deflated chunks of fixed decompressed
//! size. Because chunks share no compression state, a byte range can be
//! served by decompressing only the chunks that cover it.

use std::io::{Read, Seek, SeekFrom};

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use log::{debug, trace, warn};

use super::error::{Result, StarDictError};

const GZIP_ID1: u8 = 0x1f;
const GZIP_ID2: u8 = 0x8b;

const FLG_FHCRC: u8 = 0x02;
const FLG_FEXTRA: u8 = 0x04;
const FLG_FNAME: u8 = 0x08;
const FLG_FCOMMENT: u8 = 0x10;

/// Compressed extent of one chunk inside the payload.
#[derive(Debug, Clone, Copy)]
pub struct ChunkDescriptor {
    /// Running-sum offset of the chunk within the compressed payload.
    pub compressed_offset: u64,
    /// Compressed byte length of the chunk.
    pub compressed_len: u16,
}

/// An open dictzip container over a seekable byte source.
///
/// The chunk table is parsed once at open time; each [`read_at`] re-reads and
/// re-decompresses the covering chunks from the source.
///
/// [`read_at`]: DictZip::read_at
#[derive(Debug)]
pub struct DictZip<R> {
    source: R,
    version: u16,
    chunk_len: u16,
    chunks: Vec<ChunkDescriptor>,
    /// Byte offset where compressed payload begins (= total header length).
    /// Computed, never assumed fixed, since optional header fields vary.
    payload_offset: u64,
}

impl<R: Read + Seek> DictZip<R> {
    /// Open a dictzip container and build its chunk table.
    ///
    /// # Errors
    /// Returns `InvalidFormat` if the gzip magic bytes are absent or if no
    /// `RA` sub-field is present in the extra field (an ordinary gzip file is
    /// not a valid random-access source).
    pub fn open(mut source: R) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;

        let mut fixed = [0u8; 10];
        source.read_exact(&mut fixed)?;
        if fixed[0] != GZIP_ID1 || fixed[1] != GZIP_ID2 {
            return Err(StarDictError::InvalidFormat(
                "not a valid gzip header".to_string(),
            ));
        }
        let flags = fixed[3];

        // Optional fields appear in fixed order; each later field's position
        // depends on the earlier ones being present.
        let ra_data = if flags & FLG_FEXTRA != 0 {
            let xlen = source.read_u16::<LittleEndian>()? as usize;
            let mut extra = vec![0u8; xlen];
            source.read_exact(&mut extra)?;
            find_random_access_subfield(&extra)
        } else {
            None
        };

        if flags & FLG_FNAME != 0 {
            skip_zero_terminated(&mut source)?;
        }
        if flags & FLG_FCOMMENT != 0 {
            skip_zero_terminated(&mut source)?;
        }
        if flags & FLG_FHCRC != 0 {
            source.read_u16::<LittleEndian>()?;
        }

        let payload_offset = source.stream_position()?;

        let Some(ra_data) = ra_data else {
            return Err(StarDictError::InvalidFormat(
                "gzip extra field carries no random-access (RA) sub-field".to_string(),
            ));
        };

        let (version, chunk_len, chunks) = parse_chunk_table(&ra_data)?;
        debug!(
            "dictzip opened: version={}, chunk_len={}, chunks={}, payload_offset={}",
            version,
            chunk_len,
            chunks.len(),
            payload_offset
        );

        Ok(Self {
            source,
            version,
            chunk_len,
            chunks,
            payload_offset,
        })
    }

    pub fn version(&self) -> u16 {
        self.version
    }

    /// Fixed decompressed size of every chunk except possibly the last.
    pub fn chunk_len(&self) -> u16 {
        self.chunk_len
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Read `len` decompressed bytes starting at decompressed offset `offset`,
    /// decompressing only the chunks covering the range.
    ///
    /// # Errors
    /// `Decompression` if a covering chunk is corrupt (the store remains
    /// usable for other reads), `ReadOutOfBounds` if the range extends past
    /// the decompressed data the chunk table covers.
    pub fn read_at(&mut self, offset: u64, len: u64) -> Result<Vec<u8>> {
        if len == 0 {
            return Ok(Vec::new());
        }
        if self.chunks.is_empty() {
            return Err(StarDictError::ReadOutOfBounds {
                offset,
                len,
                available: 0,
            });
        }

        let chunk_len = self.chunk_len as u64;
        let last_index = (self.chunks.len() - 1) as u64;
        let first = (offset / chunk_len).min(last_index) as usize;
        let last = ((offset + len) / chunk_len).min(last_index) as usize;
        trace!(
            "read_at(offset={}, len={}): chunks {}..={}",
            offset,
            len,
            first,
            last
        );

        // One contiguous read of the compressed span covering the range.
        let span_start = self.chunks[first].compressed_offset;
        let span_end =
            self.chunks[last].compressed_offset + self.chunks[last].compressed_len as u64;
        let mut compressed = vec![0u8; (span_end - span_start) as usize];
        self.source
            .seek(SeekFrom::Start(self.payload_offset + span_start))?;
        self.source.read_exact(&mut compressed)?;

        // Chunks carry no cross-chunk compression state, so each one
        // decompresses independently.
        let mut decompressed = Vec::with_capacity((last - first + 1) * self.chunk_len as usize);
        let mut cursor = 0usize;
        for (i, chunk) in self.chunks[first..=last].iter().enumerate() {
            let chunk_bytes = &compressed[cursor..cursor + chunk.compressed_len as usize];
            cursor += chunk.compressed_len as usize;
            let mut decoder = DeflateDecoder::new(chunk_bytes);
            if let Err(e) = decoder.read_to_end(&mut decompressed) {
                return Err(StarDictError::Decompression(format!(
                    "chunk {}: {}",
                    first + i,
                    e
                )));
            }
        }

        let skip = (offset - first as u64 * chunk_len) as usize;
        let end = skip + len as usize;
        if end > decompressed.len() {
            return Err(StarDictError::ReadOutOfBounds {
                offset,
                len,
                available: first as u64 * chunk_len + decompressed.len() as u64,
            });
        }
        Ok(decompressed[skip..end].to_vec())
    }
}

/// Scan the extra field's (SI1, SI2, LEN, DATA) sub-field sequence for the
/// registered random-access tag `RA`.
fn find_random_access_subfield(extra: &[u8]) -> Option<Vec<u8>> {
    let mut rest = extra;
    while rest.len() >= 4 {
        let si1 = rest[0];
        let si2 = rest[1];
        let len = u16::from_le_bytes([rest[2], rest[3]]) as usize;
        if 4 + len > rest.len() {
            warn!("truncated gzip extra sub-field; stopping scan");
            break;
        }
        if si1 == b'R' && si2 == b'A' {
            return Some(rest[4..4 + len].to_vec());
        }
        rest = &rest[4 + len..];
    }
    None
}

/// Parse the RA sub-field payload: version, fixed chunk length, chunk count,
/// then a list of compressed chunk lengths. Compressed offsets are derived by
/// running sum. A payload shorter than the declared chunk count implies stops
/// at the available data; a store with fewer usable chunks still serves
/// ranges that stay within them.
fn parse_chunk_table(data: &[u8]) -> Result<(u16, u16, Vec<ChunkDescriptor>)> {
    if data.len() < 6 {
        return Err(StarDictError::InvalidFormat(
            "random-access sub-field too short for its fixed header".to_string(),
        ));
    }
    let version = u16::from_le_bytes([data[0], data[1]]);
    let chunk_len = u16::from_le_bytes([data[2], data[3]]);
    let chunk_count = u16::from_le_bytes([data[4], data[5]]) as usize;
    if chunk_len == 0 {
        return Err(StarDictError::InvalidFormat(
            "random-access sub-field declares a zero chunk length".to_string(),
        ));
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    let mut compressed_offset = 0u64;
    for i in 0..chunk_count {
        let pos = 6 + 2 * i;
        if pos + 2 > data.len() {
            warn!(
                "chunk table truncated: {} chunks declared, {} usable",
                chunk_count,
                chunks.len()
            );
            break;
        }
        let compressed_len = u16::from_le_bytes([data[pos], data[pos + 1]]);
        chunks.push(ChunkDescriptor {
            compressed_offset,
            compressed_len,
        });
        compressed_offset += compressed_len as u64;
    }

    Ok((version, chunk_len, chunks))
}

fn skip_zero_terminated<R: Read>(source: &mut R) -> Result<()> {
    loop {
        if source.read_u8()? == 0 {
            return Ok(());
        }
    }
}
