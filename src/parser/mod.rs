//! XML parser.
//!
//! A hand-rolled recursive descent parser that builds a [`Document`] and
//! captures the formatting of the input alongside its content, so that an
//! unmodified document serializes back to exactly the text it came from.
//!
//! By default the parser recovers from malformed input (mismatched or
//! unclosed tags, bare `&`, unquoted attribute values, and so on) and keeps
//! as much of the document as it can. Set
//! [`Config::strict_parsing`](crate::Config::strict_parsing) to turn every
//! well-formedness problem into an error instead.
//!
//! The parser is hand-rolled (not combinator-based) because recovery and
//! whitespace capture need fine-grained control over parse state.

pub(crate) mod input;
mod xml;

use std::io::Read;

use crate::config::Config;
use crate::encoding::{self, DecodedInput};
use crate::parser::input::DEFAULT_MAX_DEPTH;
use crate::error::{Error, Result};
use crate::tree::{is_xml_whitespace, Document};

use xml::XmlParser;

/// Parses XML text and byte streams into [`Document`]s.
///
/// # Examples
///
/// ```
/// use xmlsplice::{Config, Parser};
///
/// let parser = Parser::new(Config::default().strict_parsing(true));
/// assert!(parser.parse_str("<a><b></a>").is_err());
/// assert!(parser.parse_str("<a><b/></a>").is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Parser {
    config: Config,
    max_depth: u32,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl Parser {
    /// Creates a parser with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Sets the maximum element nesting depth (default 256). Deeper input
    /// fails with [`Error::Parse`] whether or not parsing is strict.
    #[must_use]
    pub fn max_depth(mut self, max: u32) -> Self {
        self.max_depth = max;
        self
    }

    /// Returns the parser's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Parses an XML string.
    ///
    /// A leading U+FEFF is treated as a byte order mark: it is stripped and
    /// recorded in [`Document::has_bom`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] for empty or whitespace-only input,
    /// and [`Error::Parse`] for excessive nesting or, under strict parsing,
    /// any well-formedness problem.
    pub fn parse_str(&self, input: &str) -> Result<Document> {
        let (text, has_bom) = match input.strip_prefix('\u{FEFF}') {
            Some(rest) => (rest, true),
            None => (input, false),
        };
        let mut doc = self.parse_text(text)?;
        doc.has_bom = has_bom;
        Ok(doc)
    }

    /// Parses XML bytes, detecting their encoding from a byte order mark,
    /// the XML declaration, or [`Config::default_encoding`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for an unknown encoding,
    /// [`Error::MalformedEncoding`] for bytes that do not decode, and the
    /// errors of [`parse_str`](Self::parse_str).
    pub fn parse_bytes(&self, input: &[u8]) -> Result<Document> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        let decoded = encoding::decode_document(input, &self.config.default_encoding)?;
        self.parse_decoded(decoded)
    }

    /// Parses XML bytes in a known encoding, ignoring the declaration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for an unknown encoding and
    /// the errors of [`parse_bytes`](Self::parse_bytes).
    pub fn parse_bytes_with_encoding(&self, input: &[u8], encoding: &str) -> Result<Document> {
        if input.is_empty() {
            return Err(Error::EmptyInput);
        }
        let decoded = encoding::decode_with_encoding(input, encoding)?;
        self.parse_decoded(decoded)
    }

    /// Reads a whole stream and parses it as bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if reading fails and the errors of
    /// [`parse_bytes`](Self::parse_bytes).
    pub fn parse_reader<R: Read>(&self, mut reader: R) -> Result<Document> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.parse_bytes(&bytes)
    }

    fn parse_decoded(&self, decoded: DecodedInput) -> Result<Document> {
        let declared = encoding::declared_encoding(decoded.text.as_bytes()).is_some();
        let mut doc = self.parse_text(&decoded.text)?;
        doc.has_bom = decoded.had_bom;
        if !declared {
            doc.encoding = decoded.charset.name().to_string();
        }
        Ok(doc)
    }

    fn parse_text(&self, text: &str) -> Result<Document> {
        if is_xml_whitespace(text) {
            return Err(Error::EmptyInput);
        }
        let doc = XmlParser::new(text, self.config.strict_parsing)
            .with_max_depth(self.max_depth)
            .parse()?;
        tracing::debug!(nodes = doc.node_count(), "parsed document");
        Ok(doc)
    }
}

/// Parses an XML string with the default configuration.
///
/// # Errors
///
/// See [`Parser::parse_str`].
///
/// # Examples
///
/// ```
/// let doc = xmlsplice::parser::parse_str("<root>\n  <child/>\n</root>").unwrap();
/// assert_eq!(doc.to_xml(), "<root>\n  <child/>\n</root>");
/// ```
pub fn parse_str(input: &str) -> Result<Document> {
    Parser::default().parse_str(input)
}

/// Parses XML bytes with the default configuration.
///
/// # Errors
///
/// See [`Parser::parse_bytes`].
pub fn parse_bytes(input: &[u8]) -> Result<Document> {
    Parser::default().parse_bytes(input)
}
