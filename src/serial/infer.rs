//! Formatting inference for nodes without captured formatting.
//!
//! Parsed nodes carry every whitespace run they were written with.
//! Programmatically created nodes (and nodes whose formatting was reset to
//! `None`) borrow it from their surroundings instead:
//!
//! - an element, comment or PI copies the preceding whitespace of the
//!   nearest element sibling that has some, and otherwise sits on its own
//!   line one indent unit deeper than its parent;
//! - an attribute lines up under a vertically aligned predecessor, and
//!   otherwise follows a single space;
//! - an attribute quote follows the element's majority quote;
//! - the whitespace before an end tag puts it on its own line exactly when
//!   the children are on their own lines.
//!
//! The line ending and indent unit are detected once per document.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::config::Config;
use crate::tree::{Document, Element, ElementId, NodeId, NodeKind, QuoteStyle};

/// Longest run accepted as an indent unit.
const MAX_INDENT_UNIT: usize = 8;

/// Resolves formatting fields for one render pass.
pub(crate) struct Inference<'a> {
    doc: &'a Document,
    config: &'a Config,
    /// Whether captured whitespace is used at all.
    use_captured: bool,
    line_ending: Cow<'a, str>,
    indent_unit: Cow<'a, str>,
}

impl<'a> Inference<'a> {
    pub fn new(doc: &'a Document, config: &'a Config, use_captured: bool) -> Self {
        let (line_ending, indent_unit) = if use_captured {
            let line_ending: &'a str =
                detect_line_ending(doc).unwrap_or(config.line_ending.as_str());
            (
                Cow::Borrowed(line_ending),
                detect_indent_unit(doc).map_or(Cow::Borrowed(config.indent_string.as_str()), Cow::Owned),
            )
        } else {
            (
                Cow::Borrowed(config.line_ending.as_str()),
                Cow::Borrowed(config.indent_string.as_str()),
            )
        };
        tracing::trace!(
            line_ending = ?line_ending,
            indent_unit = ?indent_unit,
            "formatting context"
        );
        Self {
            doc,
            config,
            use_captured,
            line_ending,
            indent_unit,
        }
    }

    /// Captured whitespace, unless captured whitespace is ignored.
    fn captured(&self, whitespace: Option<&'a str>) -> Option<&'a str> {
        whitespace.filter(|_| self.use_captured)
    }

    /// Returns `true` if the node appears in the output.
    pub fn is_rendered(&self, id: NodeId) -> bool {
        match self.doc.kind(id) {
            NodeKind::Comment(_) => self.config.preserve_comments,
            NodeKind::ProcessingInstruction(_) => self.config.preserve_processing_instructions,
            NodeKind::Text(text) => {
                self.use_captured
                    || text.is_cdata()
                    || text.preserves_whitespace()
                    || !text.is_whitespace_only()
            }
            _ => true,
        }
    }

    // --- Node whitespace ---

    /// The whitespace written before a node.
    pub fn preceding_whitespace(&self, id: NodeId) -> Cow<'a, str> {
        let doc = self.doc;
        if let Some(whitespace) = self.captured(doc.node(id).preceding_whitespace()) {
            return Cow::Borrowed(whitespace);
        }
        if matches!(doc.kind(id), NodeKind::Text(_) | NodeKind::Document(_)) {
            return Cow::Borrowed("");
        }
        let Some(parent) = doc.parent(id) else {
            return Cow::Borrowed("");
        };

        if parent == doc.root() {
            return if self.has_output_before(id) {
                self.line_ending.clone()
            } else {
                Cow::Borrowed("")
            };
        }

        if let Some(whitespace) = self.sibling_whitespace(id) {
            return Cow::Borrowed(whitespace);
        }
        let mut whitespace = self.line_ending.to_string();
        whitespace.push_str(&self.indentation(parent.node()));
        whitespace.push_str(&self.indent_unit);
        Cow::Owned(whitespace)
    }

    /// Captured whitespace of the nearest element sibling, looking back
    /// first and then forward.
    fn sibling_whitespace(&self, id: NodeId) -> Option<&'a str> {
        let doc = self.doc;
        let captured_element_whitespace = |sibling: NodeId| {
            matches!(doc.kind(sibling), NodeKind::Element(_))
                .then(|| self.captured(doc.node(sibling).preceding_whitespace()))
                .flatten()
        };
        std::iter::successors(doc.prev_sibling(id), |&s| doc.prev_sibling(s))
            .find_map(captured_element_whitespace)
            .or_else(|| {
                std::iter::successors(doc.next_sibling(id), |&s| doc.next_sibling(s))
                    .find_map(captured_element_whitespace)
            })
    }

    /// Whether the declaration or an earlier top-level node is written
    /// before `id`.
    fn has_output_before(&self, id: NodeId) -> bool {
        let declaration = !self.config.omit_xml_declaration
            && !self.doc.xml_declaration().is_empty();
        declaration
            || std::iter::successors(self.doc.prev_sibling(id), |&s| self.doc.prev_sibling(s))
                .any(|s| self.is_rendered(s))
    }

    /// The indentation of a node's line: what follows the last line break
    /// of its preceding whitespace.
    ///
    /// Nodes that do not start a line are considered one unit deeper than
    /// their parent; top-level nodes and detached subtree roots are at the
    /// margin.
    pub fn indentation(&self, id: NodeId) -> String {
        let whitespace = self.preceding_whitespace(id);
        if let Some(pos) = whitespace.rfind('\n') {
            return whitespace[pos + 1..].to_string();
        }
        match self.doc.parent(id) {
            Some(parent) if parent != self.doc.root() => {
                let mut indentation = self.indentation(parent.node());
                indentation.push_str(&self.indent_unit);
                indentation
            }
            _ => String::new(),
        }
    }

    /// The whitespace written before an element's end tag.
    pub fn inner_whitespace(&self, id: ElementId) -> Cow<'a, str> {
        let element = self.doc.element(id);
        if let Some(whitespace) = self.captured(element.inner_preceding_whitespace()) {
            return Cow::Borrowed(whitespace);
        }
        let children_on_own_lines = self
            .doc
            .children(id)
            .filter(|&child| self.is_rendered(child))
            .any(|child| self.preceding_whitespace(child).contains('\n'));
        if children_on_own_lines {
            let mut whitespace = self.line_ending.to_string();
            whitespace.push_str(&self.indentation(id.node()));
            Cow::Owned(whitespace)
        } else {
            Cow::Borrowed("")
        }
    }

    /// Whitespace inside the start tag before `>` or `/>`.
    pub fn open_tag_whitespace(&self, element: &'a Element) -> &'a str {
        self.captured(Some(element.open_tag_whitespace()))
            .unwrap_or("")
    }

    /// Whitespace between `</` and the name, and between the name and `>`.
    pub fn close_tag_whitespace(&self, element: &'a Element) -> (&'a str, &'a str) {
        if self.use_captured {
            (
                element.close_tag_whitespace(),
                element.close_tag_trailing_whitespace(),
            )
        } else {
            ("", "")
        }
    }

    // --- Attributes ---

    /// The whitespace before the attribute at `index`.
    pub fn attribute_whitespace(&self, element: &'a Element, index: usize) -> Cow<'a, str> {
        let attributes = element.attributes();
        if let Some(whitespace) = self.captured(attributes[index].preceding_whitespace()) {
            return Cow::Borrowed(whitespace);
        }
        if index == 0 {
            return Cow::Borrowed(" ");
        }
        let previous = self.attribute_whitespace(element, index - 1);
        if previous.contains('\n') {
            previous
        } else {
            Cow::Borrowed(" ")
        }
    }

    /// The `=` between an attribute's name and value.
    pub fn separator(&self, element: &'a Element, index: usize) -> &'a str {
        let separator = element.attributes()[index].separator();
        if self.use_captured {
            separator
        } else {
            "="
        }
    }

    /// The quote for attributes without one: the element's majority quote,
    /// or the configured default on a tie.
    pub fn majority_quote(&self, element: &Element) -> QuoteStyle {
        let (mut single, mut double) = (0usize, 0usize);
        for quote in element.attributes().iter().filter_map(|a| a.quote_style()) {
            match quote {
                QuoteStyle::Single => single += 1,
                QuoteStyle::Double => double += 1,
            }
        }
        match single.cmp(&double) {
            std::cmp::Ordering::Greater => QuoteStyle::Single,
            std::cmp::Ordering::Less => QuoteStyle::Double,
            std::cmp::Ordering::Equal => self.config.default_quote_style,
        }
    }

    // --- Processing instructions ---

    /// Whitespace between a PI target and its data.
    pub fn pi_whitespace(&self, captured: Option<&'a str>, data: &str) -> &'a str {
        match self.captured(captured) {
            Some(whitespace) => whitespace,
            None if data.is_empty() => "",
            None => " ",
        }
    }
}

/// Detects the line ending used by a document's captured whitespace.
///
/// Returns `None` if the document has no line breaks at all.
pub(crate) fn detect_line_ending(doc: &Document) -> Option<&'static str> {
    let mut found_newline = false;
    for whitespace in captured_whitespace(doc) {
        if whitespace.contains("\r\n") {
            return Some("\r\n");
        }
        found_newline |= whitespace.contains('\n');
    }
    found_newline.then_some("\n")
}

/// Every captured whitespace run of elements, comments and PIs, including
/// inner and attribute whitespace.
fn captured_whitespace(doc: &Document) -> impl Iterator<Item = &str> + '_ {
    doc.descendants(doc.root()).flat_map(move |id| {
        let node = doc.node(id);
        let mut runs: Vec<&str> = node.preceding_whitespace().into_iter().collect();
        if let NodeKind::Element(element) = node.kind() {
            runs.extend(element.inner_preceding_whitespace());
            runs.extend(element.attributes().iter().filter_map(|a| a.preceding_whitespace()));
        }
        runs
    })
}

/// Detects the indent unit of a document.
///
/// Every node that starts a line contributes the part of its indentation
/// that exceeds its parent's. The most frequent contribution wins, the
/// shorter one on a tie. Contributions mixing tabs and spaces, or longer
/// than eight characters, are ignored.
pub(crate) fn detect_indent_unit(doc: &Document) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for id in doc.descendants(doc.root()) {
        if !matches!(
            doc.kind(id),
            NodeKind::Element(_) | NodeKind::Comment(_) | NodeKind::ProcessingInstruction(_)
        ) {
            continue;
        }
        let Some(indent) = line_indentation(doc.node(id).preceding_whitespace()) else {
            continue;
        };
        let parent_indent = doc
            .parent(id)
            .filter(|&parent| parent != doc.root())
            .and_then(|parent| line_indentation(doc.node(parent).preceding_whitespace()))
            .unwrap_or("");
        let Some(unit) = indent.strip_prefix(parent_indent) else {
            continue;
        };
        let uniform = unit.bytes().all(|b| b == b' ') || unit.bytes().all(|b| b == b'\t');
        if unit.is_empty() || unit.len() > MAX_INDENT_UNIT || !uniform {
            continue;
        }
        *counts.entry(unit).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.len().cmp(&a.0.len())))
        .map(|(unit, _)| unit.to_string())
}

/// The text after the last line break, if the whitespace has one.
fn line_indentation(whitespace: Option<&str>) -> Option<&str> {
    let whitespace = whitespace?;
    whitespace.rfind('\n').map(|pos| &whitespace[pos + 1..])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_line_ending() {
        let lf = Document::parse_str("<a>\n  <b/>\n</a>").unwrap();
        assert_eq!(detect_line_ending(&lf), Some("\n"));
        let crlf = Document::parse_str("<a>\r\n  <b/>\r\n</a>").unwrap();
        assert_eq!(detect_line_ending(&crlf), Some("\r\n"));
        let flat = Document::parse_str("<a><b/></a>").unwrap();
        assert_eq!(detect_line_ending(&flat), None);
    }

    #[test]
    fn test_detect_indent_unit() {
        let doc = Document::parse_str("<a>\n  <b>\n    <c/>\n  </b>\n  <d/>\n</a>").unwrap();
        assert_eq!(detect_indent_unit(&doc).as_deref(), Some("  "));

        let tabs = Document::parse_str("<a>\n\t<b>\n\t\t<c/>\n\t</b>\n</a>").unwrap();
        assert_eq!(detect_indent_unit(&tabs).as_deref(), Some("\t"));

        let flat = Document::parse_str("<a><b/></a>").unwrap();
        assert_eq!(detect_indent_unit(&flat), None);
    }

    #[test]
    fn test_majority_quote() {
        let config = Config::default();
        let doc = Document::parse_str("<a x='1' y='2' z=\"3\"/>").unwrap();
        let inference = Inference::new(&doc, &config, true);
        let a = doc.element(doc.root_element().unwrap());
        assert_eq!(inference.majority_quote(a), QuoteStyle::Single);

        let tie = Document::parse_str("<a x='1' z=\"3\"/>").unwrap();
        let inference = Inference::new(&tie, &config, true);
        let a = tie.element(tie.root_element().unwrap());
        assert_eq!(inference.majority_quote(a), QuoteStyle::Double);
    }

    #[test]
    fn test_new_element_copies_sibling_whitespace() {
        let config = Config::default();
        let mut doc = Document::parse_str("<a>\n\t<b/>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let c = doc.create_element("c").unwrap();
        doc.add_child(a, c).unwrap();
        let inference = Inference::new(&doc, &config, true);
        assert_eq!(inference.preceding_whitespace(c.node()), "\n\t");
    }

    #[test]
    fn test_new_element_without_siblings_indents_one_unit() {
        let config = Config::default();
        let mut doc = Document::parse_str("<a>\n  <b>x</b>\n</a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.element_children(a).next().unwrap();
        let c = doc.create_element("c").unwrap();
        doc.add_child(b, c).unwrap();
        let inference = Inference::new(&doc, &config, true);
        assert_eq!(inference.preceding_whitespace(c.node()), "\n    ");
        assert_eq!(inference.indentation(b.node()), "  ");
    }

    #[test]
    fn test_top_level_whitespace() {
        let config = Config::default();
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.add_child(doc.root(), root).unwrap();
        let inference = Inference::new(&doc, &config, true);
        assert_eq!(inference.preceding_whitespace(root.node()), "");

        doc.generate_xml_declaration();
        let inference = Inference::new(&doc, &config, true);
        assert_eq!(inference.preceding_whitespace(root.node()), "\n");
    }

    #[test]
    fn test_attribute_whitespace_follows_alignment() {
        let config = Config::default();
        let mut doc = Document::parse_str("<a\n    x='1'\n    y='2'/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "z", "3").unwrap();
        let inference = Inference::new(&doc, &config, true);
        assert_eq!(inference.attribute_whitespace(doc.element(a), 2), "\n    ");

        let mut flat = Document::parse_str("<a x='1'/>").unwrap();
        let a = flat.root_element().unwrap();
        flat.set_attribute(a, "z", "3").unwrap();
        let inference = Inference::new(&flat, &config, true);
        assert_eq!(inference.attribute_whitespace(flat.element(a), 1), " ");
    }
}
