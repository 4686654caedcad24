//! Opening the resource named by a system id.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use log::debug;

use crate::error::Error;

/// Strategy for opening a system id as a byte stream.
pub trait Resolve {
    /// Opens the resource named by `system_id`.
    ///
    /// # Errors
    ///
    /// Fails if the resource cannot be opened.
    fn open(&self, system_id: &str) -> Result<Box<dyn Read>, Error>;
}

/// How a system id is interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemId<'a> {
    /// An absolute URI.
    Uri {
        /// The scheme, without the trailing `:`.
        scheme: &'a str,
        /// Everything after the `:`.
        rest: &'a str,
    },
    /// Anything else is a local file path.
    Path(&'a Path),
}

impl<'a> SystemId<'a> {
    /// Classifies a system id.
    ///
    /// An id is an absolute URI if it is a syntactically valid URI reference
    /// with a scheme. Single-letter schemes are taken as Windows drive
    /// letters and therefore as paths.
    #[must_use]
    pub fn classify(id: &'a str) -> Self {
        match split_scheme(id) {
            Some((scheme, rest)) if scheme.len() > 1 && is_uri_reference(rest) => {
                SystemId::Uri { scheme, rest }
            }
            _ => SystemId::Path(Path::new(id)),
        }
    }
}

fn split_scheme(id: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = id.split_once(':')?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    let valid = first.is_ascii_alphabetic()
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some((scheme, rest))
}

/// Rejects characters that may not appear unescaped in a URI, and malformed
/// percent escapes.
fn is_uri_reference(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let escaped = bytes
                    .get(i + 1..i + 3)
                    .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
                if !escaped {
                    return false;
                }
                i += 3;
                continue;
            }
            b' ' | b'"' | b'<' | b'>' | b'\\' | b'^' | b'`' | b'{' | b'|' | b'}' => return false,
            b if b.is_ascii_control() => return false,
            _ => {}
        }
        i += 1;
    }
    true
}

fn percent_decode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let decoded = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match decoded {
            Some(byte) => {
                out.push(byte);
                i += 3;
            }
            None => {
                out.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Local path named by the part of a `file:` URI after the scheme.
///
/// Only an empty host or `localhost` is local; any other host is refused.
fn file_uri_path(rest: &str) -> Result<PathBuf, Error> {
    let path = match rest.strip_prefix("//") {
        Some(authority_and_path) => {
            let (host, path) = match authority_and_path.find('/') {
                Some(slash) => authority_and_path.split_at(slash),
                None => (authority_and_path, ""),
            };
            if !host.is_empty() && !host.eq_ignore_ascii_case("localhost") {
                return Err(Error::RemoteFileHost(host.to_owned()));
            }
            path
        }
        None => rest,
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    Ok(PathBuf::from(percent_decode(path)))
}

/// Opens local paths and `file:` URIs.
///
/// Unlike a full URL stack this never touches the network: other schemes
/// such as `http` and `https` fail with [`Error::UnsupportedScheme`], and a
/// `file:` URI naming a remote host fails with [`Error::RemoteFileHost`].
/// Supply a custom [`Resolve`] to reach remote documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultResolver;

impl Resolve for DefaultResolver {
    fn open(&self, system_id: &str) -> Result<Box<dyn Read>, Error> {
        let path = match SystemId::classify(system_id) {
            SystemId::Uri { scheme, rest } if scheme.eq_ignore_ascii_case("file") => {
                file_uri_path(rest)?
            }
            SystemId::Uri { scheme, .. } => {
                return Err(Error::UnsupportedScheme(scheme.to_owned()));
            }
            SystemId::Path(path) => path.to_path_buf(),
        };
        debug!("opening {}", path.display());
        Ok(Box::new(File::open(path)?))
    }
}
