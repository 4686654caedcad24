use std::{fmt, io};

use thiserror::Error;

/// Configuration mutators of [`EscapingReader`](crate::EscapingReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setter {
    /// `set_encoding`
    Encoding,
    /// `set_character_stream`
    CharacterStream,
    /// `set_byte_stream`
    ByteStream,
    /// `set_system_id`
    SystemId,
}

impl fmt::Display for Setter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Setter::Encoding => "set_encoding",
            Setter::CharacterStream => "set_character_stream",
            Setter::ByteStream => "set_byte_stream",
            Setter::SystemId => "set_system_id",
        })
    }
}

/// Errors reported by the reader and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// The underlying input failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A configuration mutator was called after reading started.
    #[error("stream has already been read when calling {0}")]
    ConfiguredAfterStart(Setter),

    /// The encoding label, explicit or declared, names no known encoding.
    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// The system id is a URI whose scheme the resolver cannot open.
    #[error("unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    /// A `file:` URI names a host other than the local one.
    #[error("file URI names a remote host: {0}")]
    RemoteFileHost(String),

    /// None of character stream, byte stream or system id was configured.
    #[error("no input configured")]
    NoInput,

    /// The reader was closed, or failed to start.
    #[error("reader has been closed")]
    Closed,
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(err) => err,
            Error::UnsupportedEncoding(_)
            | Error::UnsupportedScheme(_)
            | Error::RemoteFileHost(_) => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
            other => io::Error::other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_the_misused_setter() {
        let err = Error::ConfiguredAfterStart(Setter::ByteStream);
        assert_eq!(
            err.to_string(),
            "stream has already been read when calling set_byte_stream"
        );
    }

    #[test]
    fn io_errors_unwrap() {
        let err: io::Error = Error::Io(io::Error::new(io::ErrorKind::NotFound, "gone")).into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        let err: io::Error = Error::UnsupportedEncoding("EBCDIC".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        let err: io::Error = Error::RemoteFileHost("fileserver".into()).into();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        let err: io::Error = Error::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
