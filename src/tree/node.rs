//! Node type definitions.
//!
//! The `NodeKind` enum is the closed set of node kinds in a document tree.
//! Only the two container kinds (`Document` and `Element`) carry a
//! [`ChildList`]; leaf kinds have nowhere to put children. Navigation links
//! shared by every node (parent, siblings) live in `NodeData`.

use super::{Attribute, NodeId, Value};
use crate::util::qname::split_qname;

/// Links to the children of a container node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildList {
    pub(crate) first: Option<NodeId>,
    pub(crate) last: Option<NodeId>,
    pub(crate) len: usize,
}

impl ChildList {
    /// The number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if there are no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The kind of a node and its associated data.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The document node; there is exactly one per `Document`.
    Document(ChildList),
    /// An element, e.g. `<dependency scope="test">`.
    Element(Element),
    /// Character data, either plain text or a CDATA section.
    Text(Text),
    /// A comment, e.g. `<!-- note -->`.
    Comment(Comment),
    /// A processing instruction, e.g. `<?xml-stylesheet href="a.xsl"?>`.
    ProcessingInstruction(ProcessingInstruction),
    /// A document type declaration, kept as opaque text.
    DocType(DocType),
}

impl NodeKind {
    /// Returns `true` for the kinds that can own children.
    #[must_use]
    pub fn is_container(&self) -> bool {
        matches!(self, Self::Document(_) | Self::Element(_))
    }

    pub(crate) fn child_list(&self) -> Option<&ChildList> {
        match self {
            Self::Document(children) => Some(children),
            Self::Element(element) => Some(&element.children),
            _ => None,
        }
    }

    pub(crate) fn child_list_mut(&mut self) -> Option<&mut ChildList> {
        match self {
            Self::Document(children) => Some(children),
            Self::Element(element) => Some(&mut element.children),
            _ => None,
        }
    }

    /// A copy of this payload with no children, for building clones.
    pub(crate) fn without_children(&self) -> Self {
        match self {
            Self::Document(_) => Self::Document(ChildList::default()),
            Self::Element(element) => Self::Element(Element {
                children: ChildList::default(),
                ..element.clone()
            }),
            other => other.clone(),
        }
    }
}

/// An element and the formatting of its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) children: ChildList,
    pub(crate) self_closing: bool,
    pub(crate) open_tag_whitespace: String,
    pub(crate) close_tag_whitespace: String,
    pub(crate) close_tag_trailing_whitespace: String,
    pub(crate) inner_preceding_whitespace: Option<String>,
}

impl Element {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: Vec::new(),
            children: ChildList::default(),
            self_closing: false,
            open_tag_whitespace: String::new(),
            close_tag_whitespace: String::new(),
            close_tag_trailing_whitespace: String::new(),
            inner_preceding_whitespace: None,
        }
    }

    /// The qualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The namespace prefix, if the name has one.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        split_qname(&self.name).0
    }

    /// The name without its prefix.
    #[must_use]
    pub fn local_name(&self) -> &str {
        split_qname(&self.name).1
    }

    /// The attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Looks up an attribute by qualified name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up an attribute's decoded value.
    #[must_use]
    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(Attribute::value)
    }

    pub(crate) fn attribute_index(&self, name: &str) -> Option<usize> {
        self.attributes.iter().position(|a| a.name == name)
    }

    /// The number of child nodes.
    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.len
    }

    /// Whether the element is written as `<name/>` while it has no content.
    #[must_use]
    pub fn is_self_closing(&self) -> bool {
        self.self_closing
    }

    /// Whitespace before the `>` or `/>` of the start tag.
    #[must_use]
    pub fn open_tag_whitespace(&self) -> &str {
        &self.open_tag_whitespace
    }

    /// Whitespace between `</` and the name in the end tag.
    #[must_use]
    pub fn close_tag_whitespace(&self) -> &str {
        &self.close_tag_whitespace
    }

    /// Whitespace between the name and `>` in the end tag.
    #[must_use]
    pub fn close_tag_trailing_whitespace(&self) -> &str {
        &self.close_tag_trailing_whitespace
    }

    /// Whitespace right before the end tag, or the whole content of an
    /// element without children. `None` until captured or set.
    #[must_use]
    pub fn inner_preceding_whitespace(&self) -> Option<&str> {
        self.inner_preceding_whitespace.as_deref()
    }
}

/// Character data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    pub(crate) value: Value,
    pub(crate) cdata: bool,
    pub(crate) preserve_whitespace: bool,
}

impl Text {
    pub(crate) fn new(value: Value, cdata: bool) -> Self {
        Self {
            value,
            cdata,
            preserve_whitespace: false,
        }
    }

    /// The decoded content. CDATA content is the literal section text.
    #[must_use]
    pub fn content(&self) -> &str {
        self.value.as_str()
    }

    /// The content exactly as written, for parsed and unchanged text.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.value.raw()
    }

    /// The content with its source form, if any.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Whether this is a CDATA section.
    #[must_use]
    pub fn is_cdata(&self) -> bool {
        self.cdata
    }

    /// Whether pretty printing must leave this text untouched.
    #[must_use]
    pub fn preserves_whitespace(&self) -> bool {
        self.preserve_whitespace
    }

    /// Returns `true` if the content is empty or only XML whitespace.
    #[must_use]
    pub fn is_whitespace_only(&self) -> bool {
        is_xml_whitespace(self.content())
    }
}

/// A comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub(crate) content: String,
}

impl Comment {
    /// The text between `<!--` and `-->`.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// A processing instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingInstruction {
    pub(crate) target: String,
    pub(crate) data: String,
    pub(crate) data_whitespace: Option<String>,
}

impl ProcessingInstruction {
    /// The target name.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The opaque data after the target.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Whitespace between the target and the data, if captured.
    #[must_use]
    pub fn data_whitespace(&self) -> Option<&str> {
        self.data_whitespace.as_deref()
    }
}

/// A document type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocType {
    pub(crate) text: String,
}

impl DocType {
    /// The whole declaration, from `<!DOCTYPE` through the final `>`.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Returns `true` if `s` consists only of XML whitespace (`#x20 | #x9 | #xD | #xA`).
#[must_use]
pub fn is_xml_whitespace(s: &str) -> bool {
    s.bytes().all(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
}
