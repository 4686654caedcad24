//! The transformer that rewrites supplementary characters in attribute
//! values.
//!
//! Overview
//! - Input is pulled one UTF-16 code unit at a time from a [`CharSource`]
//!   into a small lookahead buffer. The buffer never holds more than
//!   [`MAX_INDICATOR_LEN`](crate::grammar::MAX_INDICATOR_LEN) units.
//! - Whenever output is requested and none is queued, the mode on top of the
//!   stack gets one step: either one of its indicators matches and is copied
//!   verbatim (pushing or popping a mode), or exactly one code point is moved
//!   to the output.
//! - A code point is escaped as `&#<decimal>;` only if it is supplementary
//!   (a valid surrogate pair) and the top mode escapes. Unpaired surrogates
//!   are moved as single units and never escaped.
//!
//! Every decision needs at most one indicator's worth of lookahead; there is
//! no backtracking and no recursion tied to document nesting.

use std::io;

use crate::{
    buffer::{Lookahead, OutputQueue},
    grammar::{Action, Mode},
    mode_stack::ModeStack,
    source::{CharSource, Utf16Units},
};

/// Streaming transformer over a [`CharSource`].
///
/// Yields the transformed document one code unit at a time through
/// [`next_unit`](Self::next_unit) or the [`Iterator`] implementation.
#[derive(Debug)]
pub struct Transformer<S> {
    source: S,
    modes: ModeStack,
    lookahead: Lookahead,
    output: OutputQueue,
}

impl<S: CharSource> Transformer<S> {
    /// Creates a transformer that starts at the top level of a document.
    pub fn new(source: S) -> Self {
        Self {
            source,
            modes: ModeStack::new(),
            lookahead: Lookahead::new(),
            output: OutputQueue::new(),
        }
    }

    /// Returns the next transformed code unit, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Propagates I/O failures of the source.
    pub fn next_unit(&mut self) -> io::Result<Option<u16>> {
        if self.output.is_empty() {
            self.transform_next()?;
        }
        Ok(self.output.pop())
    }

    /// The mode governing the next decision.
    #[must_use]
    pub fn current_mode(&self) -> Mode {
        self.modes.top()
    }

    /// Number of open grammatical units, counting the top level.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.modes.depth()
    }

    /// Code units read or produced but not yet handed out.
    #[must_use]
    pub fn buffered_units(&self) -> usize {
        self.lookahead.len() + self.output.len()
    }

    /// Closes the underlying source.
    ///
    /// # Errors
    ///
    /// Propagates the source's close failure.
    pub fn close(&mut self) -> io::Result<()> {
        self.source.close()
    }

    /// Gives back the source. Buffered units are lost.
    pub fn into_source(self) -> S {
        self.source
    }

    fn transform_next(&mut self) -> io::Result<()> {
        self.lookahead.ensure(1, &mut self.source)?;
        if self.lookahead.is_empty() {
            return Ok(());
        }

        let mode = self.modes.top();
        for transition in mode.transitions() {
            if self
                .lookahead
                .try_consume(transition.indicator, &mut self.source, &mut self.output)?
            {
                match transition.action {
                    Action::Push(next) => self.modes.push(next),
                    Action::Pop => self.modes.pop(),
                }
                return Ok(());
            }
        }

        self.transfer_code_point(mode.escapes())
    }

    fn transfer_code_point(&mut self, escape: bool) -> io::Result<()> {
        // A high surrogate needs its partner to form a code point.
        self.lookahead.ensure(2, &mut self.source)?;
        let Some(first) = self.lookahead.front() else {
            return Ok(());
        };

        let pair = self
            .lookahead
            .get(1)
            .and_then(|second| combine_surrogates(first, second).map(|cp| (second, cp)));

        match pair {
            Some((_, code_point)) if escape => {
                self.lookahead.discard(2);
                self.output.push_ascii(&format!("&#{code_point};"));
            }
            Some((second, _)) => {
                self.lookahead.discard(2);
                self.output.push_units(&[first, second]);
            }
            None => {
                self.lookahead.discard(1);
                self.output.push_unit(first);
            }
        }
        Ok(())
    }
}

impl<S: CharSource> Iterator for Transformer<S> {
    type Item = io::Result<u16>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_unit().transpose()
    }
}

/// Decodes a surrogate pair into a supplementary code point.
#[inline]
fn combine_surrogates(high: u16, low: u16) -> Option<u32> {
    if (0xD800..=0xDBFF).contains(&high) && (0xDC00..=0xDFFF).contains(&low) {
        Some(0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00))
    } else {
        None
    }
}

/// Transforms a complete document held as UTF-16 code units.
#[must_use]
pub fn escape_units(units: &[u16]) -> Vec<u16> {
    let transformer = Transformer::new(Utf16Units::new(units.iter().copied()));
    // In-memory sources cannot fail.
    transformer.map_while(Result::ok).collect()
}

/// Transforms a complete document held as a string.
///
/// ```rust
/// assert_eq!(
///     astralesc::escape_str("<elem attr='\u{1F602}'>\u{1F602}</elem>"),
///     "<elem attr='&#128514;'>\u{1F602}</elem>"
/// );
/// ```
#[must_use]
pub fn escape_str(xml: &str) -> String {
    let units: Vec<u16> = xml.encode_utf16().collect();
    char::decode_utf16(escape_units(&units))
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
