//! XML serialization.
//!
//! The [`Serializer`] renders a [`Document`] in one of two modes:
//!
//! - **Preserve** (the default): captured formatting is reproduced exactly
//!   and missing formatting is inferred from the surrounding document, so
//!   an unmodified document round-trips byte for byte and edits blend in.
//! - **Pretty** ([`Config::pretty_print`]): the document is re-laid out
//!   with uniform indentation, or on a single line with [`Config::raw`].
//!
//! Every check (configuration, encoding, names) runs before any output is
//! produced.

mod escape;
mod infer;
mod pretty;
mod xml;

use std::fmt;
use std::io;

use crate::config::Config;
use crate::encoding::{self, Charset};
use crate::error::{Error, Result};
use crate::tree::{Document, NodeId, NodeKind};
use crate::util::qname::is_valid_name;

use pretty::PrettyWriter;
use xml::PreserveWriter;

/// Renders documents and subtrees to text or encoded bytes.
///
/// # Examples
///
/// ```
/// use xmlsplice::{Config, Document, Serializer};
///
/// let doc = Document::parse_str("<a><b>text</b></a>").unwrap();
///
/// let preserved = Serializer::default().serialize(&doc).unwrap();
/// assert_eq!(preserved, "<a><b>text</b></a>");
///
/// let pretty = Serializer::new(Config::pretty().indent_string("  "))
///     .serialize(&doc)
///     .unwrap();
/// assert_eq!(pretty, "<a>\n  <b>text</b>\n</a>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    config: Config,
}

impl Serializer {
    /// Creates a serializer with the given configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the serializer's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Renders a whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] or [`Error::UnsupportedEncoding`]
    /// for an unusable configuration, and [`Error::InvalidName`] for an
    /// element, attribute or PI target that is not a valid XML name when
    /// [`Config::validate_xml_names`] is set.
    pub fn serialize(&self, doc: &Document) -> Result<String> {
        self.check(doc, doc.root().node())?;
        let mut out = String::new();
        self.render(doc, doc.root().node(), &mut out);
        Ok(out)
    }

    /// Renders one node and its descendants.
    ///
    /// The node's own preceding whitespace is not included. Serializing the
    /// document node is the same as [`serialize`](Self::serialize).
    ///
    /// # Errors
    ///
    /// See [`serialize`](Self::serialize).
    pub fn serialize_node(&self, doc: &Document, node: impl Into<NodeId>) -> Result<String> {
        let node = node.into();
        self.check(doc, node)?;
        let mut out = String::new();
        self.render(doc, node, &mut out);
        Ok(out)
    }

    /// Renders a document, or returns `""` when there is none.
    ///
    /// # Errors
    ///
    /// See [`serialize`](Self::serialize).
    pub fn serialize_opt(&self, doc: Option<&Document>) -> Result<String> {
        doc.map_or_else(|| Ok(String::new()), |doc| self.serialize(doc))
    }

    /// Renders a document into a text sink. Does nothing when either the
    /// document or the sink is missing.
    ///
    /// # Errors
    ///
    /// See [`serialize`](Self::serialize); sink failures are returned as
    /// [`Error::Format`].
    pub fn write_to<W: fmt::Write>(&self, doc: Option<&Document>, out: Option<&mut W>) -> Result<()> {
        let (Some(doc), Some(out)) = (doc, out) else {
            return Ok(());
        };
        let text = self.serialize(doc)?;
        out.write_str(&text)?;
        Ok(())
    }

    /// Renders a document into a byte sink, encoded in `encoding` or, when
    /// that is `None`, in the document's own encoding. Does nothing when
    /// either the document or the sink is missing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedEncoding`] for an unknown encoding,
    /// [`Error::Io`] if the sink fails, and the errors of
    /// [`serialize`](Self::serialize).
    pub fn write_bytes<W: io::Write>(
        &self,
        doc: Option<&Document>,
        out: Option<&mut W>,
        encoding: Option<&str>,
    ) -> Result<()> {
        let (Some(doc), Some(out)) = (doc, out) else {
            return Ok(());
        };
        let bytes = self.to_bytes(doc, encoding)?;
        out.write_all(&bytes)?;
        Ok(())
    }

    /// Renders a document to bytes in `encoding`, or in the document's own
    /// encoding when that is `None`.
    ///
    /// # Errors
    ///
    /// See [`write_bytes`](Self::write_bytes).
    pub fn to_bytes(&self, doc: &Document, encoding: Option<&str>) -> Result<Vec<u8>> {
        let encoding = encoding.unwrap_or_else(|| doc.encoding());
        if Charset::for_label(encoding).is_none() {
            return Err(Error::UnsupportedEncoding(encoding.to_string()));
        }
        let text = self.serialize(doc)?;
        let bytes = encoding::encode_document(&text, encoding)?;
        tracing::debug!(encoding, bytes = bytes.len(), "encoded document");
        Ok(bytes)
    }

    fn check(&self, doc: &Document, scope: NodeId) -> Result<()> {
        self.config.validate()?;
        if self.config.validate_xml_names {
            validate_names(doc, scope)?;
        }
        Ok(())
    }

    fn render(&self, doc: &Document, node: NodeId, out: &mut String) {
        if self.config.pretty_print {
            PrettyWriter::new(doc, &self.config).write_subtree(node, out);
        } else {
            PreserveWriter::new(doc, &self.config, self.config.preserve_whitespace)
                .write_subtree(node, out);
        }
    }
}

/// Checks every element name, attribute name and PI target under `scope`.
fn validate_names(doc: &Document, scope: NodeId) -> Result<()> {
    for id in doc.descendants(scope) {
        match doc.kind(id) {
            NodeKind::Element(element) => {
                check_name(element.name())?;
                for attribute in element.attributes() {
                    check_name(attribute.name())?;
                }
            }
            NodeKind::ProcessingInstruction(pi) => check_name(pi.target())?,
            _ => {}
        }
    }
    Ok(())
}

fn check_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(Error::InvalidName(name.to_string()))
    }
}

/// Renders a document in preserve mode with the default configuration and
/// no name validation.
pub(crate) fn render_preserved(doc: &Document) -> String {
    let config = Config::default();
    let mut out = String::new();
    PreserveWriter::new(doc, &config, true).write_document(&mut out);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_matches_to_xml() {
        let doc = Document::parse_str("<?xml version=\"1.0\"?>\n<a>\n  <b/>\n</a>\n").unwrap();
        assert_eq!(Serializer::default().serialize(&doc).unwrap(), doc.to_xml());
    }

    #[test]
    fn test_serialize_node_subtree() {
        let doc = Document::parse_str("<a>\n  <b x=\"1\">t</b>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.element_children(a).next().unwrap();
        let serializer = Serializer::default();
        assert_eq!(serializer.serialize_node(&doc, b).unwrap(), "<b x=\"1\">t</b>");
        assert_eq!(
            serializer.serialize_node(&doc, doc.root()).unwrap(),
            doc.to_xml()
        );
    }

    #[test]
    fn test_missing_document_or_sink() {
        let serializer = Serializer::default();
        assert_eq!(serializer.serialize_opt(None).unwrap(), "");

        let doc = Document::parse_str("<a/>").unwrap();
        let mut sink = String::new();
        serializer.write_to::<String>(Some(&doc), None).unwrap();
        serializer.write_to(None, Some(&mut sink)).unwrap();
        assert!(sink.is_empty());
        serializer.write_to(Some(&doc), Some(&mut sink)).unwrap();
        assert_eq!(sink, "<a/>");

        let mut bytes = Vec::new();
        serializer
            .write_bytes::<Vec<u8>>(None, Some(&mut bytes), None)
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut doc = Document::parse_str("<a/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "1bad", "v").unwrap();
        let err = Serializer::default().serialize(&doc).unwrap_err();
        assert!(matches!(err, Error::InvalidName(ref name) if name == "1bad"));

        let lenient = Serializer::new(Config::default().validate_xml_names(false));
        assert_eq!(lenient.serialize(&doc).unwrap(), "<a 1bad=\"v\"/>");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let doc = Document::parse_str("<a/>").unwrap();
        let serializer = Serializer::new(Config::default().indent_string("--"));
        assert!(matches!(
            serializer.serialize(&doc),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_unknown_output_encoding() {
        let doc = Document::parse_str("<a/>").unwrap();
        let mut bytes = Vec::new();
        let result = Serializer::default().write_bytes(Some(&doc), Some(&mut bytes), Some("bogus"));
        assert!(matches!(result, Err(Error::UnsupportedEncoding(_))));
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_to_bytes_uses_document_encoding() {
        let doc = Document::parse_str("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><a>é</a>")
            .unwrap();
        let bytes = Serializer::default().to_bytes(&doc, None).unwrap();
        assert!(bytes.ends_with(b"<a>\xE9</a>"));

        let utf8 = Serializer::default().to_bytes(&doc, Some("UTF-8")).unwrap();
        assert!(utf8.ends_with("<a>é</a>".as_bytes()));
    }
}
