//! Pull-based reader over the transformer.
//!
//! An [`EscapingReader`] is configured with exactly the inputs an XML input
//! source offers: a character stream, a byte stream, a system id and an
//! optional encoding name. Nothing is opened until the first read. At that
//! point the input is resolved once, in priority order
//!
//! 1. the character stream,
//! 2. the byte stream, decoded by the [`Decode`] collaborator,
//! 3. the system id, opened by the [`Resolve`] collaborator and decoded,
//!
//! and the configuration is frozen: every mutator fails from then on.

use std::{fmt, io::Read};

use log::debug;

use crate::{
    decode::{Decode, XmlDecoder},
    engine::Transformer,
    error::{Error, Setter},
    resolve::{DefaultResolver, Resolve},
    source::CharSource,
};

#[derive(Default)]
struct Config {
    character_stream: Option<Box<dyn CharSource>>,
    byte_stream: Option<Box<dyn Read>>,
    encoding: Option<String>,
}

enum State {
    Configuring(Config),
    Streaming(Transformer<Box<dyn CharSource>>),
    Closed,
}

/// A reader of UTF-16 code units in which supplementary characters inside
/// attribute values have been replaced by numeric character references.
///
/// ```rust
/// use astralesc::{EscapingReader, Utf16Units};
///
/// let mut reader = EscapingReader::from_character_stream(Utf16Units::from_text(
///     "<elem attr='\u{1F602}'/>",
/// ));
/// let mut buf = [0u16; 64];
/// let n = reader.read(&mut buf)?.unwrap_or(0);
/// assert_eq!(String::from_utf16_lossy(&buf[..n]), "<elem attr='&#128514;'/>");
/// assert_eq!(reader.read(&mut buf)?, None);
/// # Ok::<(), astralesc::Error>(())
/// ```
pub struct EscapingReader {
    state: State,
    system_id: Option<String>,
    decoder: Box<dyn Decode>,
    resolver: Box<dyn Resolve>,
}

impl fmt::Debug for EscapingReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Configuring(_) => "Configuring",
            State::Streaming(_) => "Streaming",
            State::Closed => "Closed",
        };
        f.debug_struct("EscapingReader")
            .field("state", &state)
            .field("system_id", &self.system_id)
            .finish_non_exhaustive()
    }
}

impl Default for EscapingReader {
    fn default() -> Self {
        Self::new()
    }
}

impl EscapingReader {
    /// Creates an unconfigured reader using [`XmlDecoder`] and
    /// [`DefaultResolver`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_collaborators(XmlDecoder::new(), DefaultResolver)
    }

    /// Creates an unconfigured reader with custom decoding and resolution.
    pub fn with_collaborators<D, R>(decoder: D, resolver: R) -> Self
    where
        D: Decode + 'static,
        R: Resolve + 'static,
    {
        Self {
            state: State::Configuring(Config::default()),
            system_id: None,
            decoder: Box::new(decoder),
            resolver: Box::new(resolver),
        }
    }

    /// Creates a reader over a byte stream.
    pub fn from_byte_stream(input: impl Read + 'static) -> Self {
        let mut reader = Self::new();
        reader.state = State::Configuring(Config {
            byte_stream: Some(Box::new(input)),
            ..Config::default()
        });
        reader
    }

    /// Creates a reader over a stream of UTF-16 code units.
    pub fn from_character_stream(input: impl CharSource + 'static) -> Self {
        let mut reader = Self::new();
        reader.state = State::Configuring(Config {
            character_stream: Some(Box::new(input)),
            ..Config::default()
        });
        reader
    }

    /// Creates a reader over the resource named by a URI or file path.
    pub fn from_system_id(system_id: impl Into<String>) -> Self {
        let mut reader = Self::new();
        reader.system_id = Some(system_id.into());
        reader
    }

    fn configuring(&mut self, setter: Setter) -> Result<&mut Config, Error> {
        match &mut self.state {
            State::Configuring(config) => Ok(config),
            State::Streaming(_) | State::Closed => Err(Error::ConfiguredAfterStart(setter)),
        }
    }

    /// Sets the encoding used to decode byte input. Without one, the
    /// decoder detects it.
    ///
    /// # Errors
    ///
    /// [`Error::ConfiguredAfterStart`] once reading has started.
    pub fn set_encoding(&mut self, encoding: impl Into<String>) -> Result<(), Error> {
        self.configuring(Setter::Encoding)?.encoding = Some(encoding.into());
        Ok(())
    }

    /// Sets the character stream. It takes precedence over all other inputs.
    ///
    /// # Errors
    ///
    /// [`Error::ConfiguredAfterStart`] once reading has started.
    pub fn set_character_stream(
        &mut self,
        input: impl CharSource + 'static,
    ) -> Result<(), Error> {
        self.configuring(Setter::CharacterStream)?.character_stream = Some(Box::new(input));
        Ok(())
    }

    /// Sets the byte stream, used when no character stream is set.
    ///
    /// # Errors
    ///
    /// [`Error::ConfiguredAfterStart`] once reading has started.
    pub fn set_byte_stream(&mut self, input: impl Read + 'static) -> Result<(), Error> {
        self.configuring(Setter::ByteStream)?.byte_stream = Some(Box::new(input));
        Ok(())
    }

    /// Sets the system id, opened only when neither stream is set.
    ///
    /// # Errors
    ///
    /// [`Error::ConfiguredAfterStart`] once reading has started.
    pub fn set_system_id(&mut self, system_id: impl Into<String>) -> Result<(), Error> {
        self.configuring(Setter::SystemId)?;
        self.system_id = Some(system_id.into());
        Ok(())
    }

    /// The configured system id.
    #[must_use]
    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    /// Whether the input has been resolved and the configuration frozen.
    ///
    /// A start that fails to resolve the input leaves the reader closed.
    #[must_use]
    pub fn has_started(&self) -> bool {
        !matches!(self.state, State::Configuring(_))
    }

    fn transformer(&mut self) -> Result<&mut Transformer<Box<dyn CharSource>>, Error> {
        if let State::Configuring(config) = &mut self.state {
            if config.character_stream.is_none()
                && config.byte_stream.is_none()
                && self.system_id.is_none()
            {
                return Err(Error::NoInput);
            }
            let config = std::mem::take(config);
            // The streams are consumed either way; a failed start closes.
            self.state = match resolve_source(
                config,
                self.system_id.as_deref(),
                &*self.decoder,
                &*self.resolver,
            ) {
                Ok(source) => State::Streaming(Transformer::new(source)),
                Err(err) => {
                    self.state = State::Closed;
                    return Err(err);
                }
            };
        }
        match &mut self.state {
            State::Streaming(transformer) => Ok(transformer),
            State::Configuring(_) | State::Closed => Err(Error::Closed),
        }
    }

    /// Reads transformed code units into `buf`.
    ///
    /// Returns `Some(n)` with the number of units written, or `None` at end
    /// of stream. An empty `buf` yields `Some(0)` without touching the
    /// input.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be resolved or read, or after
    /// [`close`](Self::close).
    pub fn read(&mut self, buf: &mut [u16]) -> Result<Option<usize>, Error> {
        if buf.is_empty() {
            return Ok(Some(0));
        }
        let transformer = self.transformer()?;
        for (i, slot) in buf.iter_mut().enumerate() {
            match transformer.next_unit()? {
                Some(unit) => *slot = unit,
                None if i == 0 => return Ok(None),
                None => return Ok(Some(i)),
            }
        }
        Ok(Some(buf.len()))
    }

    /// Reads a single transformed code unit.
    ///
    /// # Errors
    ///
    /// Same as [`read`](Self::read).
    pub fn read_unit(&mut self) -> Result<Option<u16>, Error> {
        Ok(self.transformer()?.next_unit()?)
    }

    /// Closes the underlying input. Later reads fail with
    /// [`Error::Closed`]; closing again does nothing.
    ///
    /// # Errors
    ///
    /// Propagates the input's close failure.
    pub fn close(&mut self) -> Result<(), Error> {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Streaming(mut transformer) => Ok(transformer.close()?),
            State::Configuring(mut config) => {
                if let Some(mut stream) = config.character_stream.take() {
                    stream.close()?;
                }
                Ok(())
            }
            State::Closed => Ok(()),
        }
    }

    /// Adapts this reader to [`std::io::Read`], producing UTF-8.
    #[must_use]
    pub fn into_utf8(self) -> Utf8Reader {
        Utf8Reader {
            inner: self,
            pending_unit: None,
            encoded: [0; 4],
            encoded_pos: 0,
            encoded_len: 0,
        }
    }
}

fn resolve_source(
    config: Config,
    system_id: Option<&str>,
    decoder: &dyn Decode,
    resolver: &dyn Resolve,
) -> Result<Box<dyn CharSource>, Error> {
    if let Some(stream) = config.character_stream {
        debug!("reading from character stream");
        return Ok(stream);
    }
    let input = match (config.byte_stream, system_id) {
        (Some(stream), _) => {
            debug!("reading from byte stream");
            stream
        }
        (None, Some(id)) => {
            debug!("reading from system id {id}");
            resolver.open(id)?
        }
        (None, None) => return Err(Error::NoInput),
    };
    decoder.decode(input, config.encoding.as_deref())
}

/// [`std::io::Read`] over an [`EscapingReader`], encoding its output as
/// UTF-8.
///
/// UTF-8 cannot carry unpaired surrogates; they are written as U+FFFD.
#[derive(Debug)]
pub struct Utf8Reader {
    inner: EscapingReader,
    pending_unit: Option<u16>,
    encoded: [u8; 4],
    encoded_pos: usize,
    encoded_len: usize,
}

impl Utf8Reader {
    /// Gives back the wrapped reader. Partially written characters are lost.
    #[must_use]
    pub fn into_inner(self) -> EscapingReader {
        self.inner
    }

    /// Decodes the next character from the inner reader into `encoded`.
    fn encode_next(&mut self) -> Result<bool, Error> {
        let unit = match self.pending_unit.take() {
            Some(unit) => Some(unit),
            None => self.inner.read_unit()?,
        };
        let Some(unit) = unit else {
            return Ok(false);
        };
        let c = if (0xD800..=0xDBFF).contains(&unit) {
            match self.inner.read_unit()? {
                Some(low) if (0xDC00..=0xDFFF).contains(&low) => {
                    char::decode_utf16([unit, low]).next().and_then(Result::ok)
                }
                next => {
                    self.pending_unit = next;
                    None
                }
            }
        } else {
            char::from_u32(u32::from(unit))
        };
        let c = c.unwrap_or(char::REPLACEMENT_CHARACTER);
        self.encoded_len = c.encode_utf8(&mut self.encoded).len();
        self.encoded_pos = 0;
        Ok(true)
    }
}

impl Read for Utf8Reader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let mut written = 0;
        while written < buf.len() {
            if self.encoded_pos == self.encoded_len && !self.encode_next()? {
                break;
            }
            let n = (self.encoded_len - self.encoded_pos).min(buf.len() - written);
            buf[written..written + n]
                .copy_from_slice(&self.encoded[self.encoded_pos..self.encoded_pos + n]);
            self.encoded_pos += n;
            written += n;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use super::*;
    use crate::source::Utf16Units;

    fn read_all(reader: &mut EscapingReader) -> Vec<u16> {
        let mut out = Vec::new();
        let mut buf = [0u16; 3];
        while let Some(n) = reader.read(&mut buf).unwrap() {
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn empty_read_does_not_start() {
        let mut reader = EscapingReader::from_character_stream(Utf16Units::from_text("<a/>"));
        assert_eq!(reader.read(&mut []).unwrap(), Some(0));
        assert!(!reader.has_started());
        reader.set_encoding("UTF-8").unwrap();
    }

    #[test]
    fn character_stream_wins() {
        let mut reader = EscapingReader::new();
        reader.set_system_id("/does/not/exist.xml").unwrap();
        reader.set_byte_stream(Cursor::new(b"<bytes/>".to_vec())).unwrap();
        reader
            .set_character_stream(Utf16Units::from_text("<chars/>"))
            .unwrap();
        assert_eq!(String::from_utf16(&read_all(&mut reader)).unwrap(), "<chars/>");
    }

    #[test]
    fn byte_stream_beats_system_id() {
        let mut reader = EscapingReader::from_system_id("/does/not/exist.xml");
        reader.set_byte_stream(Cursor::new(b"<bytes/>".to_vec())).unwrap();
        assert_eq!(String::from_utf16(&read_all(&mut reader)).unwrap(), "<bytes/>");
        assert_eq!(reader.system_id(), Some("/does/not/exist.xml"));
    }

    #[test]
    fn missing_input_is_reported() {
        let mut reader = EscapingReader::new();
        assert!(matches!(reader.read(&mut [0; 4]), Err(Error::NoInput)));
    }

    #[test]
    fn closed_reader_refuses_reads() {
        let mut reader = EscapingReader::from_character_stream(Utf16Units::from_text("<a/>"));
        assert_eq!(reader.read_unit().unwrap(), Some(u16::from(b'<')));
        reader.close().unwrap();
        reader.close().unwrap();
        assert!(matches!(reader.read(&mut [0; 4]), Err(Error::Closed)));
        assert!(matches!(
            reader.set_system_id("x.xml"),
            Err(Error::ConfiguredAfterStart(Setter::SystemId))
        ));
    }

    #[test]
    fn io_errors_propagate() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
            }
        }
        let mut reader = EscapingReader::from_byte_stream(Broken);
        match reader.read(&mut [0; 4]) {
            Err(Error::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::ConnectionReset),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn utf8_output_escapes_attribute() {
        let reader = EscapingReader::from_byte_stream(Cursor::new(
            "<e a=\"\u{1F602}\">\u{1F602}</e>".as_bytes().to_vec(),
        ));
        let mut text = String::new();
        reader.into_utf8().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<e a=\"&#128514;\">\u{1F602}</e>");
    }

    #[test]
    fn utf8_output_replaces_lone_surrogates() {
        let mut units: Vec<u16> = "<e>".encode_utf16().collect();
        units.extend([0xD83D, u16::from(b'x'), 0xDE02]);
        units.extend("</e>".encode_utf16());
        let reader = EscapingReader::from_character_stream(Utf16Units::new(units.into_iter()));
        let mut text = String::new();
        reader.into_utf8().read_to_string(&mut text).unwrap();
        assert_eq!(text, "<e>\u{FFFD}x\u{FFFD}</e>");
    }

    #[test]
    fn utf8_output_handles_tiny_buffers() {
        let reader = EscapingReader::from_character_stream(Utf16Units::from_text(
            "<e>\u{E9}\u{1F602}</e>",
        ));
        let mut utf8 = reader.into_utf8();
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        while utf8.read(&mut byte).unwrap() == 1 {
            bytes.push(byte[0]);
        }
        assert_eq!(String::from_utf8(bytes).unwrap(), "<e>\u{E9}\u{1F602}</e>");
    }
}
