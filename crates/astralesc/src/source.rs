use std::io;

/// A pull source of UTF-16 code units.
///
/// This is the character-stream input of the transformer. Working on code
/// units rather than `char`s keeps unpaired surrogates representable, so a
/// source that yields one is passed through instead of rejected.
pub trait CharSource {
    /// Returns the next code unit, or `None` once the source is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates any I/O failure of the underlying input.
    fn next_unit(&mut self) -> io::Result<Option<u16>>;

    /// Releases the underlying input.
    ///
    /// # Errors
    ///
    /// Propagates any I/O failure reported while closing.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: CharSource + ?Sized> CharSource for Box<S> {
    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        (**self).next_unit()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: CharSource + ?Sized> CharSource for &mut S {
    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        (**self).next_unit()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A [`CharSource`] over an in-memory sequence of code units.
#[derive(Debug, Clone)]
pub struct Utf16Units<I> {
    units: I,
}

impl<I: Iterator<Item = u16>> Utf16Units<I> {
    /// Wraps an iterator of UTF-16 code units.
    pub fn new(units: I) -> Self {
        Self { units }
    }
}

impl Utf16Units<std::vec::IntoIter<u16>> {
    /// Encodes `text` as UTF-16 and serves the resulting code units.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self::new(text.encode_utf16().collect::<Vec<_>>().into_iter())
    }
}

impl<I: Iterator<Item = u16>> CharSource for Utf16Units<I> {
    #[inline]
    fn next_unit(&mut self) -> io::Result<Option<u16>> {
        Ok(self.units.next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_served_as_utf16() {
        let mut src = Utf16Units::from_text("a\u{1F602}");
        assert_eq!(src.next_unit().unwrap(), Some(0x61));
        assert_eq!(src.next_unit().unwrap(), Some(0xD83D));
        assert_eq!(src.next_unit().unwrap(), Some(0xDE02));
        assert_eq!(src.next_unit().unwrap(), None);
        assert_eq!(src.next_unit().unwrap(), None);
    }

    #[test]
    fn boxed_sources_delegate() {
        let mut src: Box<dyn CharSource> = Box::new(Utf16Units::new([0xD800u16].into_iter()));
        assert_eq!(src.next_unit().unwrap(), Some(0xD800));
        assert_eq!(src.next_unit().unwrap(), None);
        src.close().unwrap();
    }
}
