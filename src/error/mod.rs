//! Error types for parsing, tree editing, and serialization.
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! side is the single [`Error`] enum. Parse failures carry a
//! [`SourceLocation`] so callers can point at the offending input.
//!
//! Recoverable well-formedness problems never reach this type unless
//! strict parsing is enabled; in the default recovery mode they are only
//! reported through `tracing` debug events.

use std::fmt;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Source location within an XML document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number (in characters, not bytes).
    pub column: u32,
    /// 0-based byte offset from the start of the decoded input.
    pub byte_offset: usize,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A fatal parse failure.
///
/// Produced for well-formedness problems under strict parsing, and for
/// problems no amount of recovery can paper over (nesting limits).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at {location}: {message}")]
pub struct ParseError {
    /// The primary error message.
    pub message: String,
    /// Where in the source the error occurred.
    pub location: SourceLocation,
}

/// The error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The input contained no markup at all.
    #[error("input is empty")]
    EmptyInput,

    /// Reading the input or writing the output failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// An encoding name was not recognized.
    #[error("unsupported encoding '{0}'")]
    UnsupportedEncoding(String),

    /// The input bytes are not valid in the resolved encoding.
    #[error("malformed byte sequence for encoding {encoding}")]
    MalformedEncoding {
        /// Canonical name of the encoding used for decoding.
        encoding: String,
    },

    /// The markup could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A name is not usable as an element name, attribute name, or PI target.
    #[error("invalid XML name '{0}'")]
    InvalidName(String),

    /// A serializer configuration was refused before any output was written.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A child index was outside `0..=len`.
    #[error("index {index} out of bounds for {len} children")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The number of children the container had.
        len: usize,
    },

    /// A tree operation would break the single-parent tree shape.
    #[error("invalid tree operation: {0}")]
    Hierarchy(String),

    /// A character sink refused output.
    #[error("formatting failure")]
    Format(#[from] fmt::Error),
}

impl Error {
    /// Returns the source location for parse errors.
    #[must_use]
    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            Self::Parse(err) => Some(err.location),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location_display() {
        let loc = SourceLocation {
            line: 10,
            column: 5,
            byte_offset: 42,
        };
        assert_eq!(loc.to_string(), "10:5");
    }

    #[test]
    fn test_parse_error_display() {
        let err = ParseError {
            message: "unexpected end of input".to_string(),
            location: SourceLocation {
                line: 1,
                column: 15,
                byte_offset: 14,
            },
        };
        assert_eq!(
            err.to_string(),
            "parse error at 1:15: unexpected end of input"
        );
    }

    #[test]
    fn test_parse_error_converts_transparently() {
        let err: Error = ParseError {
            message: "mismatched end tag".to_string(),
            location: SourceLocation::default(),
        }
        .into();
        assert_eq!(err.to_string(), "parse error at 0:0: mismatched end tag");
        assert_eq!(err.location(), Some(SourceLocation::default()));
    }

    #[test]
    fn test_index_error_message() {
        let err = Error::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "index 4 out of bounds for 2 children");
        assert!(err.location().is_none());
    }

    #[test]
    fn test_unsupported_encoding_message() {
        let err = Error::UnsupportedEncoding("EBCDIC-XYZ".to_string());
        assert_eq!(err.to_string(), "unsupported encoding 'EBCDIC-XYZ'");
    }
}
