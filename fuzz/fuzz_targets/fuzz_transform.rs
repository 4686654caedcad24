#![no_main]
use std::io::{Cursor, Read};

use arbitrary::Arbitrary;
use astralesc::{EscapingReader, escape_str};
use libfuzzer_sys::fuzz_target;

/// Markup fragments that steer the transformer through its modes.
static FRAGMENTS: &[&str] = &[
    "<", ">", "'", "\"", "&", ";", "<?", "?>", "<!--", "-->", "<![CDATA[", "]]>",
    "<!DOCTYPE", "<!ATTLIST", "<!ENTITY", "]", "[", "\u{1F602}", "\u{10000}", "\u{10FFFF}",
];

#[derive(Debug, Arbitrary)]
enum Piece {
    Fragment(u8),
    Text(String),
}

#[derive(Debug, Arbitrary)]
struct Input {
    pieces: Vec<Piece>,
    chunk: u8,
}

fn document(pieces: &[Piece]) -> String {
    let mut doc = String::new();
    for piece in pieces {
        match piece {
            Piece::Fragment(i) => doc.push_str(FRAGMENTS[usize::from(*i) % FRAGMENTS.len()]),
            Piece::Text(text) => doc.push_str(text),
        }
    }
    doc
}

fn transform(input: Input) {
    let doc = document(&input.pieces);
    let expected = escape_str(&doc);

    // Same text through the byte path, read in small chunks.
    let mut reader = EscapingReader::from_byte_stream(Cursor::new(doc.clone().into_bytes()));
    reader.set_encoding("UTF-8").unwrap();
    let mut units = Vec::new();
    let mut buf = vec![0u16; usize::from(input.chunk).max(1)];
    while let Some(n) = reader.read(&mut buf).unwrap() {
        units.extend_from_slice(&buf[..n]);
    }
    assert_eq!(String::from_utf16(&units).unwrap(), expected);

    // And through the UTF-8 adapter.
    let mut reader = EscapingReader::from_byte_stream(Cursor::new(doc.clone().into_bytes()));
    reader.set_encoding("UTF-8").unwrap();
    let mut text = String::new();
    reader.into_utf8().read_to_string(&mut text).unwrap();
    assert_eq!(text, expected);

    // Without supplementary characters nothing changes.
    if doc.chars().all(|c| u32::from(c) <= 0xFFFF) {
        assert_eq!(expected, doc);
    }
}

fuzz_target!(|input: Input| transform(input));
