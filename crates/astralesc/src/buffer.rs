#![expect(clippy::inline_always)]

use std::{collections::VecDeque, io};

use crate::source::CharSource;

/// Code units read from the source but not yet classified.
///
/// Only ever refilled from the source at the back and drained at the front.
#[derive(Debug, Default)]
pub(crate) struct Lookahead {
    data: VecDeque<u16>,
}

impl Lookahead {
    pub(crate) fn new() -> Self {
        Self {
            data: VecDeque::new(),
        }
    }

    /// Pulls from `source` until at least `count` units are buffered or the
    /// source runs dry. A shorter buffer afterwards means end of input.
    pub(crate) fn ensure<S: CharSource + ?Sized>(
        &mut self,
        count: usize,
        source: &mut S,
    ) -> io::Result<()> {
        while self.data.len() < count {
            match source.next_unit()? {
                Some(unit) => self.data.push_back(unit),
                None => break,
            }
        }
        Ok(())
    }

    /// Moves `candidate` from the front of the buffer to `output` if the
    /// buffer starts with it. On mismatch both buffers are left untouched.
    pub(crate) fn try_consume<S: CharSource + ?Sized>(
        &mut self,
        candidate: &str,
        source: &mut S,
        output: &mut OutputQueue,
    ) -> io::Result<bool> {
        let len = candidate.len();
        self.ensure(len, source)?;
        if self.data.len() < len {
            return Ok(false);
        }
        let matches = candidate
            .bytes()
            .zip(self.data.iter())
            .all(|(expected, &unit)| u16::from(expected) == unit);
        if !matches {
            return Ok(false);
        }
        self.data.drain(..len);
        output.push_ascii(candidate);
        Ok(true)
    }

    #[inline(always)]
    pub(crate) fn get(&self, index: usize) -> Option<u16> {
        self.data.get(index).copied()
    }

    #[inline(always)]
    pub(crate) fn front(&self) -> Option<u16> {
        self.get(0)
    }

    pub(crate) fn discard(&mut self, count: usize) {
        self.data.drain(..count.min(self.data.len()));
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Code units already decided on and waiting to be handed out.
#[derive(Debug, Default)]
pub(crate) struct OutputQueue {
    data: VecDeque<u16>,
}

impl OutputQueue {
    pub(crate) fn new() -> Self {
        Self {
            data: VecDeque::new(),
        }
    }

    #[inline(always)]
    pub(crate) fn push_unit(&mut self, unit: u16) {
        self.data.push_back(unit);
    }

    pub(crate) fn push_units(&mut self, units: &[u16]) {
        self.data.extend(units.iter().copied());
    }

    /// Appends ASCII text, one code unit per byte.
    pub(crate) fn push_ascii(&mut self, text: &str) {
        debug_assert!(text.is_ascii());
        self.data.extend(text.bytes().map(u16::from));
    }

    #[inline(always)]
    pub(crate) fn pop(&mut self) -> Option<u16> {
        self.data.pop_front()
    }

    #[inline(always)]
    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    #[inline(always)]
    pub(crate) fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Utf16Units;

    fn drain(output: &mut OutputQueue) -> String {
        let mut units = Vec::new();
        while let Some(u) = output.pop() {
            units.push(u);
        }
        String::from_utf16(&units).unwrap()
    }

    #[test]
    fn ensure_stops_at_end_of_input() {
        let mut src = Utf16Units::from_text("ab");
        let mut buf = Lookahead::new();
        buf.ensure(5, &mut src).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.front(), Some(u16::from(b'a')));
        assert_eq!(buf.get(1), Some(u16::from(b'b')));
        assert_eq!(buf.get(2), None);
    }

    #[test]
    fn ensure_reads_no_more_than_needed() {
        let mut src = Utf16Units::from_text("abcdef");
        let mut buf = Lookahead::new();
        buf.ensure(2, &mut src).unwrap();
        assert_eq!(buf.len(), 2);
        assert_eq!(src.next_unit().unwrap(), Some(u16::from(b'c')));
    }

    #[test]
    fn try_consume_moves_match_to_output() {
        let mut src = Utf16Units::from_text("<!--x");
        let mut buf = Lookahead::new();
        let mut out = OutputQueue::new();
        assert!(buf.try_consume("<!--", &mut src, &mut out).unwrap());
        assert_eq!(drain(&mut out), "<!--");
        buf.ensure(1, &mut src).unwrap();
        assert_eq!(buf.front(), Some(u16::from(b'x')));
    }

    #[test]
    fn try_consume_mismatch_leaves_buffers_alone() {
        let mut src = Utf16Units::from_text("<elem/>");
        let mut buf = Lookahead::new();
        let mut out = OutputQueue::new();
        assert!(!buf.try_consume("<!DOCTYPE", &mut src, &mut out).unwrap());
        assert!(out.is_empty());
        assert_eq!(buf.len(), 7);
        assert!(buf.try_consume("<", &mut src, &mut out).unwrap());
        assert_eq!(buf.len(), 6);
    }

    #[test]
    fn try_consume_short_input_is_a_mismatch() {
        let mut src = Utf16Units::from_text("--");
        let mut buf = Lookahead::new();
        let mut out = OutputQueue::new();
        assert!(!buf.try_consume("-->", &mut src, &mut out).unwrap());
        assert_eq!(buf.len(), 2);
        assert!(out.is_empty());
    }

    #[test]
    fn discard_is_clamped() {
        let mut src = Utf16Units::from_text("abc");
        let mut buf = Lookahead::new();
        buf.ensure(3, &mut src).unwrap();
        buf.discard(2);
        assert_eq!(buf.front(), Some(u16::from(b'c')));
        buf.discard(5);
        assert!(buf.is_empty());
    }

    #[test]
    fn output_is_fifo() {
        let mut out = OutputQueue::new();
        out.push_ascii("&#");
        out.push_units(&[0xD83D, 0xDE02]);
        out.push_unit(u16::from(b';'));
        assert_eq!(out.len(), 5);
        assert_eq!(out.pop(), Some(u16::from(b'&')));
        assert_eq!(out.pop(), Some(u16::from(b'#')));
        assert_eq!(out.pop(), Some(0xD83D));
        assert_eq!(out.pop(), Some(0xDE02));
        assert_eq!(out.pop(), Some(u16::from(b';')));
        assert_eq!(out.pop(), None);
    }
}
