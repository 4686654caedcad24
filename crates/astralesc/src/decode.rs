//! Turning bytes into UTF-16 code units.
//!
//! The transformer never decodes bytes itself; the reader hands byte input to
//! a [`Decode`] implementation and consumes the [`CharSource`] it returns.
//! [`XmlDecoder`] is the default: it honours an explicit encoding, and
//! otherwise picks one from a byte order mark, the UTF-16 byte pattern of
//! `<?`, or the `encoding` pseudo-attribute of the XML declaration.

use std::{
    fmt,
    io::{self, BufRead, BufReader, Cursor, Read},
};

use bstr::ByteSlice;
use log::{debug, warn};

use crate::{error::Error, options::DecoderOptions, source::CharSource};

const REPLACEMENT: u16 = 0xFFFD;

/// Character encodings understood by [`XmlDecoder`].
///
/// The UTF-16 forms are read unit by unit so that unpaired surrogates reach
/// the transformer untouched. Every other encoding is decoded by
/// [`encoding_rs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// UTF-16 with the byte order taken from a leading byte order mark,
    /// big endian without one.
    Utf16,
    /// UTF-16, little endian.
    Utf16Le,
    /// UTF-16, big endian.
    Utf16Be,
    /// Any other encoding known to `encoding_rs`, UTF-8 included.
    Charset(&'static encoding_rs::Encoding),
}

impl Encoding {
    /// UTF-8, the encoding XML assumes when nothing else is known.
    #[must_use]
    pub fn utf8() -> Self {
        Encoding::Charset(encoding_rs::UTF_8)
    }

    /// Looks up an encoding by one of its names, ignoring ASCII case and
    /// surrounding whitespace.
    ///
    /// Labels follow the WHATWG Encoding Standard, so `ISO-8859-1` and
    /// `US-ASCII` both select windows-1252. A bare `UTF-16` label keeps its
    /// XML meaning of byte-order-mark detection.
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        let label = label.trim();
        if label.eq_ignore_ascii_case("utf-16") || label.eq_ignore_ascii_case("utf16") {
            return Some(Encoding::Utf16);
        }
        let encoding = encoding_rs::Encoding::for_label_no_replacement(label.as_bytes())?;
        Some(if encoding == encoding_rs::UTF_16LE {
            Encoding::Utf16Le
        } else if encoding == encoding_rs::UTF_16BE {
            Encoding::Utf16Be
        } else {
            Encoding::Charset(encoding)
        })
    }

    /// Canonical name of the encoding.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Encoding::Utf16 => "UTF-16",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Charset(encoding) => encoding.name(),
        }
    }

    const fn is_utf16(self) -> bool {
        matches!(self, Encoding::Utf16 | Encoding::Utf16Le | Encoding::Utf16Be)
    }
}

/// Strategy for decoding byte input.
pub trait Decode {
    /// Wraps `input` in a source of code units.
    ///
    /// With `encoding` set, exactly that encoding is used. Without it, the
    /// implementation detects the encoding from the input.
    ///
    /// # Errors
    ///
    /// Fails if the encoding is unknown or reading the document head fails.
    fn decode(
        &self,
        input: Box<dyn Read>,
        encoding: Option<&str>,
    ) -> Result<Box<dyn CharSource>, Error>;
}

/// The default [`Decode`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder {
    options: DecoderOptions,
}

impl XmlDecoder {
    /// Creates a decoder with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder with the given options.
    #[must_use]
    pub fn with_options(options: DecoderOptions) -> Self {
        Self { options }
    }

    /// Determines the encoding of a document from its first bytes.
    ///
    /// Returns the encoding and the length of the byte order mark to skip.
    ///
    /// # Errors
    ///
    /// Fails if the XML declaration names an unknown encoding.
    pub fn sniff(&self, head: &[u8]) -> Result<(Encoding, usize), Error> {
        let detected = match head {
            [0xEF, 0xBB, 0xBF, ..] => (Encoding::utf8(), 3),
            [0xFE, 0xFF, ..] => (Encoding::Utf16Be, 2),
            [0xFF, 0xFE, ..] => (Encoding::Utf16Le, 2),
            [0x00, b'<', 0x00, b'?', ..] => (Encoding::Utf16Be, 0),
            [b'<', 0x00, b'?', 0x00, ..] => (Encoding::Utf16Le, 0),
            _ => match declared_encoding(head) {
                Some(label) => {
                    let encoding = Encoding::for_label(label)
                        .ok_or_else(|| Error::UnsupportedEncoding(label.to_owned()))?;
                    if encoding.is_utf16() {
                        // The declaration was readable as ASCII, so the bytes
                        // cannot be UTF-16.
                        warn!("ignoring declared encoding {label} of an 8-bit document");
                        (self.options.fallback_encoding, 0)
                    } else {
                        (encoding, 0)
                    }
                }
                None => (self.options.fallback_encoding, 0),
            },
        };
        Ok(detected)
    }
}

impl Decode for XmlDecoder {
    fn decode(
        &self,
        mut input: Box<dyn Read>,
        encoding: Option<&str>,
    ) -> Result<Box<dyn CharSource>, Error> {
        let capacity = self.options.buffer_capacity;
        if let Some(label) = encoding {
            let encoding = Encoding::for_label(label)
                .ok_or_else(|| Error::UnsupportedEncoding(label.to_owned()))?;
            debug!("decoding byte input as {}", encoding.name());
            let reader = BufReader::with_capacity(capacity, input);
            return Ok(Box::new(DecodedUnits::new(reader, encoding)));
        }

        let mut head = read_head(&mut input, self.options.declaration_limit)?;
        let (encoding, bom_len) = self.sniff(&head)?;
        debug!(
            "detected {} from document head {:?}",
            encoding.name(),
            head[..head.len().min(16)].as_bstr()
        );
        head.drain(..bom_len);
        let reader = BufReader::with_capacity(capacity, Cursor::new(head).chain(input));
        Ok(Box::new(DecodedUnits::new(reader, encoding)))
    }
}

/// Reads enough of the document to sniff its encoding. An XML declaration is
/// read up to its closing `>` unless that lies beyond `limit` bytes.
fn read_head(input: &mut dyn Read, limit: usize) -> io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(64);
    fill_to(input, &mut head, 4)?;
    if head.starts_with(b"<?xm") {
        while head.len() < limit && !head.contains(&b'>') {
            let want = (head.len() + 64).min(limit);
            if !fill_to(input, &mut head, want)? {
                break;
            }
        }
    }
    Ok(head)
}

/// Appends bytes until `buf` holds `len` bytes. Returns `false` at end of
/// input.
fn fill_to(input: &mut dyn Read, buf: &mut Vec<u8>, len: usize) -> io::Result<bool> {
    let mut chunk = [0u8; 64];
    while buf.len() < len {
        let want = (len - buf.len()).min(chunk.len());
        match input.read(&mut chunk[..want]) {
            Ok(0) => return Ok(false),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(true)
}

/// Extracts the `encoding` pseudo-attribute of an XML declaration.
fn declared_encoding(head: &[u8]) -> Option<&str> {
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let decl = &head[..head.find("?>")?];
    let after = decl.find("encoding")? + "encoding".len();
    let rest = decl[after..].trim_start_with(|c| c.is_ascii_whitespace());
    let rest = rest.strip_prefix(b"=")?.trim_start_with(|c| c.is_ascii_whitespace());
    let (&quote, rest) = rest.split_first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &rest[..rest.find_byte(quote)?];
    std::str::from_utf8(value).ok()
}

/// Size of the buffer holding code units decoded by `encoding_rs`.
const DECODED_CAPACITY: usize = 1024;

/// A [`CharSource`] decoding buffered bytes in a fixed encoding.
///
/// Malformed input decodes to U+FFFD. UTF-16 code units are passed through
/// as read, unpaired surrogates included.
pub struct DecodedUnits<R> {
    reader: R,
    encoding: Encoding,
    decoder: Option<encoding_rs::Decoder>,
    decoded: Vec<u16>,
    decoded_pos: usize,
    finished: bool,
}

impl<R> fmt::Debug for DecodedUnits<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedUnits")
            .field("encoding", &self.encoding.name())
            .field("buffered", &(self.decoded.len() - self.decoded_pos))
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl<R: BufRead> DecodedUnits<R> {
    /// Decodes `reader` as `encoding`. No byte order mark is stripped,
    /// except the one that settles the byte order of [`Encoding::Utf16`].
    pub fn new(reader: R, encoding: Encoding) -> Self {
        let decoder = match encoding {
            Encoding::Charset(charset) => Some(charset.new_decoder_without_bom_handling()),
            Encoding::Utf16 | Encoding::Utf16Le | Encoding::Utf16Be => None,
        };
        Self {
            reader,
            encoding,
            decoder,
            decoded: Vec::with_capacity(DECODED_CAPACITY),
            decoded_pos: 0,
            finished: false,
        }
    }

    /// The encoding in use. For [`Encoding::Utf16`] this turns into the
    /// concrete byte order once the first unit has been read.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            let byte = match self.reader.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            if byte.is_some() {
                self.reader.consume(1);
            }
            return Ok(byte);
        }
    }

    fn next_utf16(&mut self, big_endian: bool) -> io::Result<Option<u16>> {
        let Some(a) = self.next_byte()? else {
            return Ok(None);
        };
        let Some(b) = self.next_byte()? else {
            return Ok(Some(REPLACEMENT));
        };
        Ok(Some(if big_endian {
            u16::from_be_bytes([a, b])
        } else {
            u16::from_le_bytes([a, b])
        }))
    }

    /// Decodes the next run of bytes into `decoded`. Returns `false` once
    /// the input and the decoder are both exhausted.
    fn refill(&mut self) -> io::Result<bool> {
        self.decoded.clear();
        self.decoded.resize(DECODED_CAPACITY, 0);
        self.decoded_pos = 0;
        while !self.finished {
            let Some(decoder) = self.decoder.as_mut() else {
                break;
            };
            let input = match self.reader.fill_buf() {
                Ok(input) => input,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            let last = input.is_empty();
            let (_, read, written, _) = decoder.decode_to_utf16(input, &mut self.decoded, last);
            self.reader.consume(read);
            self.finished = last;
            if written > 0 {
                self.decoded.truncate(written);
                return Ok(true);
            }
        }
        self.decoded.clear();
        Ok(false)
    }

    fn next_decoded(&mut self) -> io::Result<Option<u16>> {
        if self.decoded_pos == self.decoded.len() && !self.refill()? {
            return Ok(None);
        }
        let unit = self.decoded[self.decoded_pos];
        self.decoded_pos += 1;
        Ok(Some(unit))
    }
}

impl<R: BufRead> CharSource for DecodedUnits<R> {
    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        match self.encoding {
            Encoding::Charset(_) => self.next_decoded(),
            Encoding::Utf16 => {
                let first = self.next_utf16(true)?;
                match first {
                    Some(0xFEFF) => {
                        self.encoding = Encoding::Utf16Be;
                        self.next_utf16(true)
                    }
                    Some(0xFFFE) => {
                        self.encoding = Encoding::Utf16Le;
                        self.next_utf16(false)
                    }
                    other => {
                        self.encoding = Encoding::Utf16Be;
                        Ok(other)
                    }
                }
            }
            Encoding::Utf16Be => self.next_utf16(true),
            Encoding::Utf16Le => self.next_utf16(false),
        }
    }
}
