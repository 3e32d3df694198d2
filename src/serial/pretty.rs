//! Pretty-print and raw rendering.
//!
//! Captured whitespace is discarded and the document is laid out from
//! scratch: every top-level node on its own line, element content indented
//! one [`Config::indent_string`] per level, text-only elements kept on one
//! line. With an empty indent string and line ending the same rules yield
//! compact single-line output.
//!
//! Subtrees under `xml:space="preserve"` keep their captured formatting.

use crate::config::Config;
use crate::tree::{Document, ElementId, NodeId, NodeKind};

use super::escape::{write_attr_value, write_laid_out_text_node, write_text_node};
use super::xml::PreserveWriter;

pub(crate) struct PrettyWriter<'a> {
    doc: &'a Document,
    config: &'a Config,
}

impl<'a> PrettyWriter<'a> {
    pub fn new(doc: &'a Document, config: &'a Config) -> Self {
        Self { doc, config }
    }

    /// Writes the declaration and top-level nodes, one per line, without a
    /// trailing line ending.
    pub fn write_document(&self, out: &mut String) {
        if self.doc.has_bom() {
            out.push('\u{FEFF}');
        }
        let mut first = true;
        if !self.config.omit_xml_declaration && !self.doc.xml_declaration().is_empty() {
            out.push_str(self.doc.xml_declaration());
            first = false;
        }
        for child in self.doc.children(self.doc.root()) {
            if !self.is_rendered(child) {
                continue;
            }
            if !first {
                out.push_str(&self.config.line_ending);
            }
            self.write_node(child, 0, true, out);
            first = false;
        }
    }

    /// Writes a subtree as if its root were at the top level.
    pub fn write_subtree(&self, id: NodeId, out: &mut String) {
        if matches!(self.doc.kind(id), NodeKind::Document(_)) {
            self.write_document(out);
        } else if self.is_rendered(id) {
            self.write_node(id, 0, true, out);
        }
    }

    fn is_rendered(&self, id: NodeId) -> bool {
        match self.doc.kind(id) {
            NodeKind::Comment(_) => self.config.preserve_comments,
            NodeKind::ProcessingInstruction(_) => self.config.preserve_processing_instructions,
            NodeKind::Text(text) => {
                text.is_cdata() || text.preserves_whitespace() || !text.is_whitespace_only()
            }
            _ => true,
        }
    }

    fn indent(&self, depth: usize, out: &mut String) {
        for _ in 0..depth {
            out.push_str(&self.config.indent_string);
        }
    }

    /// Writes a node's markup at `depth`. Text on a line of its own loses
    /// the edge whitespace the layout replaces, unless whitespace must be
    /// kept.
    fn write_node(&self, id: NodeId, depth: usize, own_line: bool, out: &mut String) {
        match self.doc.kind(id) {
            NodeKind::Element(_) => {
                if let Some(element) = self.doc.as_element(id) {
                    self.write_element(element, depth, out);
                }
            }
            NodeKind::Text(text) => {
                if own_line && !self.config.preserve_whitespace && !text.preserves_whitespace() {
                    let layout_has_whitespace = !self.config.line_ending.is_empty()
                        || !self.config.indent_string.is_empty();
                    write_laid_out_text_node(out, text, self.config, layout_has_whitespace);
                } else {
                    write_text_node(out, text, self.config);
                }
            }
            NodeKind::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment.content());
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(pi.target());
                if !pi.data().is_empty() {
                    out.push(' ');
                    out.push_str(pi.data());
                }
                out.push_str("?>");
            }
            NodeKind::DocType(doctype) => out.push_str(doctype.text()),
            NodeKind::Document(_) => {}
        }
    }

    fn write_element(&self, id: ElementId, depth: usize, out: &mut String) {
        let element = self.doc.element(id);
        if element.attribute_value("xml:space") == Some("preserve") {
            PreserveWriter::new(self.doc, self.config, true).write_subtree(id.node(), out);
            return;
        }

        let mut attributes = String::new();
        for attribute in element.attributes() {
            let quote = attribute
                .quote_style()
                .unwrap_or(self.config.default_quote_style);
            attributes.push(' ');
            attributes.push_str(attribute.name());
            attributes.push('=');
            attributes.push(quote.char());
            write_attr_value(&mut attributes, attribute, quote, self.config);
            attributes.push(quote.char());
        }

        let children: Vec<NodeId> = self
            .doc
            .children(id)
            .filter(|&child| self.is_rendered(child))
            .collect();
        if children.is_empty() {
            out.push_str(&self.config.empty_element_style.format(element.name(), &attributes));
            return;
        }

        out.push('<');
        out.push_str(element.name());
        out.push_str(&attributes);
        out.push('>');

        let text_only = children
            .iter()
            .all(|&child| matches!(self.doc.kind(child), NodeKind::Text(_)));
        if text_only {
            for &child in &children {
                self.write_node(child, depth + 1, false, out);
            }
        } else {
            for &child in &children {
                out.push_str(&self.config.line_ending);
                self.indent(depth + 1, out);
                self.write_node(child, depth + 1, true, out);
            }
            out.push_str(&self.config.line_ending);
            self.indent(depth, out);
        }

        out.push_str("</");
        out.push_str(element.name());
        out.push('>');
    }
}
