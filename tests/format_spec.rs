//! Specs for the on-disk codecs: dictzip containers, `.idx`/`.syn` tables,
//! and `.ifo` metadata.

mod support;

use std::io::Cursor;

use stardict::stardict::index::{parse_idx, parse_syn, read_table};
use stardict::stardict::IFO_MAGIC;
use stardict::{DictZip, Ifo, OffsetWidth, StarDictError};

fn sample_content(len: usize) -> Vec<u8> {
    (0..len).map(|i| ((i * 7 + 13) % 251) as u8).collect()
}

#[test]
fn dictzip_serves_arbitrary_ranges() {
    let content = sample_content(150);
    let fixture = support::build_dictzip(&content, 32);
    let mut dz = DictZip::open(Cursor::new(fixture.bytes)).unwrap();

    assert_eq!(dz.version(), 1);
    assert_eq!(dz.chunk_len(), 32);
    assert_eq!(dz.chunk_count(), 5);

    for &offset in &[0usize, 1, 31, 32, 33, 63, 64, 95, 100] {
        for &len in &[1usize, 16, 32, 33, 64, 65] {
            if offset + len > content.len() {
                continue;
            }
            let got = dz.read_at(offset as u64, len as u64).unwrap();
            assert_eq!(got, &content[offset..offset + len], "at {}+{}", offset, len);
        }
    }
}

#[test]
fn dictzip_zero_length_read_is_empty() {
    let fixture = support::build_dictzip(&sample_content(40), 16);
    let mut dz = DictZip::open(Cursor::new(fixture.bytes)).unwrap();
    assert!(dz.read_at(10, 0).unwrap().is_empty());
}

#[test]
fn dictzip_payload_offset_accounts_for_optional_header_fields() {
    let content = sample_content(70);
    let fixture =
        support::build_dictzip_with(&content, 16, Some("words.dict"), Some("a comment"), true);
    let mut dz = DictZip::open(Cursor::new(fixture.bytes)).unwrap();
    assert_eq!(dz.read_at(0, content.len() as u64).unwrap(), content);
    assert_eq!(dz.read_at(50, 20).unwrap(), &content[50..70]);
}

#[test]
fn plain_gzip_is_not_random_access() {
    let bytes = support::gzip_bytes(b"just an ordinary gzip stream");
    let err = DictZip::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));
}

#[test]
fn dictzip_rejects_bad_magic() {
    let bytes = vec![0x50u8, 0x4b, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
    let err = DictZip::open(Cursor::new(bytes)).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));
}

#[test]
fn dictzip_truncated_chunk_table_serves_prefix() {
    use flate2::write::DeflateEncoder;
    use flate2::Compression;
    use std::io::Write;

    let content = sample_content(48);
    let chunks: Vec<Vec<u8>> = content
        .chunks(16)
        .map(|chunk| {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(chunk).unwrap();
            encoder.finish().unwrap()
        })
        .collect();

    // The table declares ten chunks but carries lengths for only three.
    let mut ra = Vec::new();
    ra.extend_from_slice(&1u16.to_le_bytes());
    ra.extend_from_slice(&16u16.to_le_bytes());
    ra.extend_from_slice(&10u16.to_le_bytes());
    for chunk in &chunks {
        ra.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
    }
    let mut extra = vec![b'R', b'A'];
    extra.extend_from_slice(&(ra.len() as u16).to_le_bytes());
    extra.extend_from_slice(&ra);

    let mut bytes = vec![0x1f, 0x8b, 8, 0x04, 0, 0, 0, 0, 0, 0xff];
    bytes.extend_from_slice(&(extra.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&extra);
    for chunk in &chunks {
        bytes.extend_from_slice(chunk);
    }

    let mut dz = DictZip::open(Cursor::new(bytes)).unwrap();
    assert_eq!(dz.chunk_count(), 3);
    assert_eq!(dz.read_at(0, 48).unwrap(), content);
    assert_eq!(dz.read_at(20, 10).unwrap(), &content[20..30]);

    let err = dz.read_at(40, 20).unwrap_err();
    assert!(matches!(err, StarDictError::ReadOutOfBounds { .. }));
}

#[test]
fn dictzip_corrupt_chunk_fails_that_read_only() {
    let content = sample_content(64);
    let fixture = support::build_dictzip(&content, 16);

    let chunk2_start = fixture.payload_offset + fixture.chunk_lens[0] + fixture.chunk_lens[1];
    let mut bytes = fixture.bytes;
    for byte in &mut bytes[chunk2_start..chunk2_start + fixture.chunk_lens[2]] {
        *byte = 0xff;
    }

    let mut dz = DictZip::open(Cursor::new(bytes)).unwrap();
    assert_eq!(dz.read_at(0, 16).unwrap(), &content[0..16]);

    let err = dz.read_at(32, 16).unwrap_err();
    assert!(matches!(err, StarDictError::Decompression(_)));

    // The store stays usable for ranges that avoid the corrupt chunk.
    assert_eq!(dz.read_at(16, 16).unwrap(), &content[16..32]);
    assert_eq!(dz.read_at(48, 16).unwrap(), &content[48..64]);
}

#[test]
fn read_table_removes_whole_file_gzip() {
    let raw = b"table bytes".to_vec();
    let gz = support::gzip_bytes(&raw);
    assert_eq!(read_table(Cursor::new(gz), true).unwrap(), raw);
    assert_eq!(read_table(Cursor::new(raw.clone()), false).unwrap(), raw);
}

#[test]
fn idx_parses_records_in_file_order() {
    let buf = support::idx_bytes(&[("alpha", 0, 5), ("beta", 5, 4), ("alpha", 9, 3)]);
    let entries = parse_idx(&buf, buf.len(), OffsetWidth::U32);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].word, "alpha");
    assert_eq!(entries[1].data_offset, 5);
    assert_eq!(entries[1].data_size, 4);
    assert_eq!(entries[2].word, "alpha");
}

#[test]
fn idx_truncation_keeps_valid_prefix() {
    let buf = support::idx_bytes(&[("alpha", 0, 5), ("beta", 5, 4)]);

    // Cut inside the second record's fixed-width fields.
    let cut = &buf[..buf.len() - 3];
    let entries = parse_idx(cut, cut.len(), OffsetWidth::U32);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].word, "alpha");

    // Cut inside the second word, before its terminator.
    let cut = &buf[..16];
    let entries = parse_idx(cut, cut.len(), OffsetWidth::U32);
    assert_eq!(entries.len(), 1);

    // A declared length shorter than the buffer limits the parse.
    let entries = parse_idx(&buf, 16, OffsetWidth::U32);
    assert_eq!(entries.len(), 1);
}

#[test]
fn idx_supports_64_bit_offsets() {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"word\0");
    buf.extend_from_slice(&0x1_0000_0000u64.to_be_bytes());
    buf.extend_from_slice(&7u32.to_be_bytes());
    let entries = parse_idx(&buf, buf.len(), OffsetWidth::U64);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].data_offset, 0x1_0000_0000);
    assert_eq!(entries[0].data_size, 7);
}

#[test]
fn syn_parses_and_truncates_like_idx() {
    let buf = support::syn_bytes(&[("feline", 0), ("pup", 1)]);
    let entries = parse_syn(&buf);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].word, "feline");
    assert_eq!(entries[0].original_word_index, 0);
    assert_eq!(entries[1].original_word_index, 1);

    let cut = &buf[..buf.len() - 2];
    let entries = parse_syn(cut);
    assert_eq!(entries.len(), 1);
}

#[test]
fn ifo_requires_the_magic_first_line() {
    let err = Ifo::from_reader(Cursor::new(b"bookname=Test\n".to_vec())).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));

    let err = Ifo::from_reader(Cursor::new(Vec::new())).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));
}

#[test]
fn ifo_parses_known_keys_and_ignores_the_rest() {
    let text = format!(
        "{}\r\nversion=3.0.0\r\nbookname=My Dict\r\nwordcount=42\r\nsynwordcount=7\r\n\
         idxfilesize=1234\r\nidxoffsetbits=64\r\nauthor=Someone\r\nsometypo=ignored\r\n\
         sametypesequence=h\r\n",
        IFO_MAGIC
    );
    let ifo = Ifo::from_reader(Cursor::new(text.into_bytes())).unwrap();
    assert_eq!(ifo.book_name.as_deref(), Some("My Dict"));
    assert_eq!(ifo.word_count, 42);
    assert_eq!(ifo.syn_word_count, Some(7));
    assert_eq!(ifo.idx_file_size, 1234);
    assert_eq!(ifo.offset_width, OffsetWidth::U64);
    assert_eq!(ifo.author.as_deref(), Some("Someone"));
    assert_eq!(ifo.same_type_sequence.as_deref(), Some("h"));
}

#[test]
fn ifo_rejects_non_numeric_counts_and_bad_offset_bits() {
    let text = format!("{}\nwordcount=lots\n", IFO_MAGIC);
    let err = Ifo::from_reader(Cursor::new(text.into_bytes())).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));

    let text = format!("{}\nidxoffsetbits=48\n", IFO_MAGIC);
    let err = Ifo::from_reader(Cursor::new(text.into_bytes())).unwrap_err();
    assert!(matches!(err, StarDictError::InvalidFormat(_)));
}
