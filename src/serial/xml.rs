//! Preserve-mode rendering.
//!
//! Every node is written as its preceding whitespace followed by its
//! markup, using the captured formatting where there is one and the
//! [`Inference`] rules where there is not. An unmodified parsed document
//! renders back to its source text exactly.

use crate::config::Config;
use crate::tree::{Document, ElementId, NodeId, NodeKind};

use super::escape::{write_attr_value, write_text_node};
use super::infer::Inference;

pub(crate) struct PreserveWriter<'a> {
    doc: &'a Document,
    config: &'a Config,
    inference: Inference<'a>,
}

impl<'a> PreserveWriter<'a> {
    /// Creates a writer. `use_captured` selects whether captured whitespace
    /// is reused or every whitespace field is inferred.
    pub fn new(doc: &'a Document, config: &'a Config, use_captured: bool) -> Self {
        Self {
            doc,
            config,
            inference: Inference::new(doc, config, use_captured),
        }
    }

    /// Writes the whole document: BOM, declaration, then every top-level
    /// node.
    pub fn write_document(&self, out: &mut String) {
        if self.doc.has_bom() {
            out.push('\u{FEFF}');
        }
        if !self.config.omit_xml_declaration {
            out.push_str(self.doc.xml_declaration());
        }
        for child in self.doc.children(self.doc.root()) {
            self.write_node(child, out);
        }
    }

    /// Writes a subtree without the preceding whitespace of its root.
    pub fn write_subtree(&self, id: NodeId, out: &mut String) {
        if matches!(self.doc.kind(id), NodeKind::Document(_)) {
            self.write_document(out);
        } else if self.inference.is_rendered(id) {
            self.write_markup(id, out);
        }
    }

    /// Writes a node preceded by its whitespace.
    fn write_node(&self, id: NodeId, out: &mut String) {
        if !self.inference.is_rendered(id) {
            return;
        }
        out.push_str(&self.inference.preceding_whitespace(id));
        self.write_markup(id, out);
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        match self.doc.kind(id) {
            NodeKind::Element(_) => {
                if let Some(element) = self.doc.as_element(id) {
                    self.write_element(element, out);
                }
            }
            NodeKind::Text(text) => write_text_node(out, text, self.config),
            NodeKind::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment.content());
                out.push_str("-->");
            }
            NodeKind::ProcessingInstruction(pi) => {
                out.push_str("<?");
                out.push_str(pi.target());
                out.push_str(self.inference.pi_whitespace(pi.data_whitespace(), pi.data()));
                out.push_str(pi.data());
                out.push_str("?>");
            }
            NodeKind::DocType(doctype) => out.push_str(doctype.text()),
            NodeKind::Document(_) => {}
        }
    }

    fn write_element(&self, id: ElementId, out: &mut String) {
        let element = self.doc.element(id);
        out.push('<');
        out.push_str(element.name());
        self.write_attributes(id, out);
        out.push_str(self.inference.open_tag_whitespace(element));

        if element.is_self_closing() && element.child_count() == 0 {
            out.push_str("/>");
            return;
        }

        out.push('>');
        for child in self.doc.children(id) {
            self.write_node(child, out);
        }
        out.push_str(&self.inference.inner_whitespace(id));
        let (close_whitespace, trailing_whitespace) = self.inference.close_tag_whitespace(element);
        out.push_str("</");
        out.push_str(close_whitespace);
        out.push_str(element.name());
        out.push_str(trailing_whitespace);
        out.push('>');
    }

    fn write_attributes(&self, id: ElementId, out: &mut String) {
        let element = self.doc.element(id);
        let majority = self.inference.majority_quote(element);
        for (index, attribute) in element.attributes().iter().enumerate() {
            let quote = attribute.quote_style().unwrap_or(majority);
            out.push_str(&self.inference.attribute_whitespace(element, index));
            out.push_str(attribute.name());
            out.push_str(self.inference.separator(element, index));
            out.push(quote.char());
            write_attr_value(out, attribute, quote, self.config);
            out.push(quote.char());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::tree::QuoteStyle;

    fn render(doc: &Document, config: &Config) -> String {
        let mut out = String::new();
        PreserveWriter::new(doc, config, config.preserve_whitespace).write_document(&mut out);
        out
    }

    #[test]
    fn test_round_trip_is_exact() {
        let sources = [
            "<?xml version=\"1.0\"?>\n<!-- head -->\n<root a='1'  b = \"2\" >\n\t<x/>\n  <y ></y >\n</root>\n",
            "<a>text &amp; &#65; <![CDATA[<raw>]]><?pi  data?></a>",
            "<!DOCTYPE a [<!ENTITY e \"v\">]>\n<a\n   x=\"1\"\n   y=\"2\"/>",
            "<a></ a ><!--tail-->",
        ];
        for source in sources {
            let doc = Document::parse_str(source).unwrap();
            assert_eq!(render(&doc, &Config::default()), source);
        }
    }

    #[test]
    fn test_new_attribute_follows_majority_quote() {
        let mut doc = Document::parse_str("<a x='1' y='2'/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "z", "3").unwrap();
        assert_eq!(doc.to_xml(), "<a x='1' y='2' z='3'/>");
    }

    #[test]
    fn test_quote_in_value_forces_escape() {
        let mut doc = Document::parse_str("<a/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute_with_quote(a, "q", "it's", QuoteStyle::Single)
            .unwrap();
        assert_eq!(doc.to_xml(), "<a q='it&apos;s'/>");
    }

    #[test]
    fn test_aligned_attributes_stay_aligned() {
        let mut doc = Document::parse_str("<a\n    x=\"1\"\n    y=\"2\"/>").unwrap();
        let a = doc.root_element().unwrap();
        doc.set_attribute(a, "z", "3").unwrap();
        assert_eq!(doc.to_xml(), "<a\n    x=\"1\"\n    y=\"2\"\n    z=\"3\"/>");
    }

    #[test]
    fn test_new_elements_cascade_indentation() {
        let mut doc = Document::parse_str("<project>\n  <name>x</name>\n</project>").unwrap();
        let project = doc.root_element().unwrap();
        let dependencies = doc.create_element("dependencies").unwrap();
        doc.add_child(project, dependencies).unwrap();
        let dependency = doc.create_element("dependency").unwrap();
        doc.add_child(dependencies, dependency).unwrap();
        let group = doc.create_element("groupId").unwrap();
        doc.add_child(dependency, group).unwrap();
        let text = doc.create_text("org.example");
        doc.add_child(group, text).unwrap();

        assert_eq!(
            doc.to_xml(),
            "<project>\n  <name>x</name>\n  <dependencies>\n    <dependency>\n      \
             <groupId>org.example</groupId>\n    </dependency>\n  </dependencies>\n</project>"
        );
    }

    #[test]
    fn test_self_closing_does_not_come_back() {
        let mut doc = Document::parse_str("<r><empty/></r>").unwrap();
        let r = doc.root_element().unwrap();
        let empty = doc.element_children(r).next().unwrap();
        doc.set_text_content(empty, "x");
        assert_eq!(doc.to_xml(), "<r><empty>x</empty></r>");
        doc.set_text_content(empty, "");
        assert_eq!(doc.to_xml(), "<r><empty></empty></r>");
    }

    #[test]
    fn test_ignoring_captured_whitespace() {
        let doc = Document::parse_str("<a  x='1'>\n\n<b/>   <c  />\n</a>").unwrap();
        let config = Config::default().preserve_whitespace(false).indent_string("  ");
        assert_eq!(render(&doc, &config), "<a x='1'>\n  <b/>\n  <c/>\n</a>");
    }

    #[test]
    fn test_dropping_comments_and_pis() {
        let doc = Document::parse_str("<a>\n  <!--c-->\n  <?p d?>\n  <b/>\n</a>").unwrap();
        let config = Config::default()
            .preserve_comments(false)
            .preserve_processing_instructions(false);
        assert_eq!(render(&doc, &config), "<a>\n  <b/>\n</a>");
    }

    #[test]
    fn test_cdata_as_text() {
        let doc = Document::parse_str("<a><![CDATA[<x> & y]]></a>").unwrap();
        let config = Config::default().preserve_cdata(false);
        assert_eq!(render(&doc, &config), "<a>&lt;x&gt; &amp; y</a>");
    }

    #[test]
    fn test_entities_re_escaped_when_not_preserved() {
        let doc = Document::parse_str("<a v=\"&#65;&lt;\">&#66;&gt;</a>").unwrap();
        let config = Config::default().preserve_entities(false);
        assert_eq!(render(&doc, &config), "<a v=\"A&lt;\">B&gt;</a>");
    }

    #[test]
    fn test_new_pi_gets_separator() {
        let mut doc = Document::parse_str("<a/>").unwrap();
        let pi = doc.create_processing_instruction("target", "data").unwrap();
        doc.add_child(doc.root(), pi).unwrap();
        let bare = doc.create_processing_instruction("bare", "").unwrap();
        doc.add_child(doc.root(), bare).unwrap();
        assert_eq!(doc.to_xml(), "<a/>\n<?target data?>\n<?bare?>");
    }

    #[test]
    fn test_write_subtree_excludes_own_whitespace() {
        let doc = Document::parse_str("<a>\n  <b>\n    <c/>\n  </b>\n</a>").unwrap();
        let config = Config::default();
        let a = doc.root_element().unwrap();
        let b = doc.element_children(a).next().unwrap();
        let mut out = String::new();
        PreserveWriter::new(&doc, &config, true).write_subtree(b.node(), &mut out);
        assert_eq!(out, "<b>\n    <c/>\n  </b>");
    }
}
