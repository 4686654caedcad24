use crate::decode::Encoding;

/// Configuration of the default byte decoder, [`XmlDecoder`](crate::XmlDecoder).
///
/// # Examples
///
/// ```rust
/// use astralesc::{DecoderOptions, Encoding, EscapingReader, XmlDecoder};
///
/// let decoder = XmlDecoder::with_options(DecoderOptions {
///     fallback_encoding: Encoding::for_label("windows-1252").unwrap(),
///     ..Default::default()
/// });
/// let reader = EscapingReader::with_collaborators(decoder, astralesc::DefaultResolver);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderOptions {
    /// Capacity of the buffer placed in front of byte input.
    ///
    /// # Default
    ///
    /// `8192`
    pub buffer_capacity: usize,

    /// How many bytes to look at when searching the XML declaration for its
    /// `encoding` pseudo-attribute.
    ///
    /// The declaration must end within this many bytes from the start of the
    /// document, otherwise it is ignored.
    ///
    /// # Default
    ///
    /// `1024`
    pub declaration_limit: usize,

    /// Encoding used when neither a byte order mark, a UTF-16 byte pattern
    /// nor an XML declaration names one.
    ///
    /// # Default
    ///
    /// UTF-8 ([`Encoding::utf8`]), as XML prescribes.
    pub fallback_encoding: Encoding,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 8192,
            declaration_limit: 1024,
            fallback_encoding: Encoding::utf8(),
        }
    }
}
