//! A streaming XML reader that replaces supplementary characters (code points
//! above U+FFFF) with decimal numeric character references, but only inside
//! attribute values.
//!
//! Some XML parsers mishandle surrogate pairs in attribute values while
//! coping fine with `&#128514;`. This crate rewrites exactly those
//! characters and leaves everything else, including the same characters in
//! text, comments, CDATA sections and processing instructions, untouched.
//!
//! The document is not validated. A small fixed grammar of nested modes
//! (see [`Mode`]) recognises just enough structure to know whether the
//! current position is inside an attribute value.
//!
//! ```rust
//! assert_eq!(
//!     astralesc::escape_str("<!--\u{1F602}--><elem attr=\"\u{1F602}\"/>"),
//!     "<!--\u{1F602}--><elem attr=\"&#128514;\"/>"
//! );
//! ```

mod buffer;
mod decode;
mod engine;
mod error;
mod grammar;
mod mode_stack;
mod options;
mod reader;
mod resolve;
mod source;

#[cfg(test)]
mod tests;

pub use decode::{Decode, DecodedUnits, Encoding, XmlDecoder};
pub use engine::{Transformer, escape_str, escape_units};
pub use error::{Error, Setter};
pub use grammar::{Action, MAX_INDICATOR_LEN, Mode, Transition};
pub use options::DecoderOptions;
pub use reader::{EscapingReader, Utf8Reader};
pub use resolve::{DefaultResolver, Resolve, SystemId};
pub use source::{CharSource, Utf16Units};
