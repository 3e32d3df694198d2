//! Arena-based XML document tree with formatting capture.
//!
//! All nodes live in a contiguous `Vec<NodeData>` owned by the
//! [`Document`] and are referenced by [`NodeId`], a newtype over
//! `NonZeroU32`. Parent and sibling links are arena indices, so the tree
//! has no reference counting and no cycles for the borrow checker to trip
//! over.
//!
//! # Containers and leaves
//!
//! Only the document node and elements can own children. Child-management
//! operations take a [`ContainerId`], which can only be obtained for those
//! two kinds (from [`Document::root`], from an [`ElementId`], or through
//! [`Document::as_container`]). Text, comments, PIs and the DOCTYPE are
//! leaves and never carry a child list.
//!
//! # Formatting fields
//!
//! Every node records the whitespace that preceded it, and elements record
//! the whitespace inside their tags and before their end tag. Fields that
//! are `None` were never captured (the node was created programmatically)
//! and are inferred by the serializer.
//!
//! # Modification tracking
//!
//! Parsed nodes start unmodified, created nodes start modified, and every
//! mutation marks the touched node and its ancestors. Clearing the flag on
//! a container clears its whole subtree.

mod attribute;
mod node;
mod value;

pub use attribute::{Attribute, QuoteStyle};
pub use node::{
    is_xml_whitespace, ChildList, Comment, DocType, Element, NodeKind, ProcessingInstruction,
    Text,
};
pub use value::Value;

use std::num::NonZeroU32;

use crate::error::{Error, Result};

/// A typed index into the document's node arena.
///
/// `NodeId` is a newtype over `NonZeroU32`, meaning it can never be zero
/// and `Option<NodeId>` has the same size as `NodeId` (niche optimization).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Creates a `NodeId` from a raw index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0.
    #[allow(clippy::expect_used, clippy::cast_possible_truncation)]
    fn from_index(index: usize) -> Self {
        Self(NonZeroU32::new(index as u32).expect("NodeId index must be non-zero"))
    }

    /// Returns the raw index as a `usize` for indexing into the arena.
    fn as_index(self) -> usize {
        self.0.get() as usize
    }
}

/// A `NodeId` known to refer to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) NodeId);

impl ElementId {
    /// The underlying node id.
    #[must_use]
    pub fn node(self) -> NodeId {
        self.0
    }
}

/// A `NodeId` known to refer to a node that can own children: the document
/// node or an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub(crate) NodeId);

impl ContainerId {
    /// The underlying node id.
    #[must_use]
    pub fn node(self) -> NodeId {
        self.0
    }
}

impl From<ElementId> for NodeId {
    fn from(id: ElementId) -> Self {
        id.0
    }
}

impl From<ContainerId> for NodeId {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

impl From<ElementId> for ContainerId {
    fn from(id: ElementId) -> Self {
        Self(id.0)
    }
}

/// Storage for a single node in the document arena.
///
/// Each node stores its kind, its links to parent and siblings, the
/// whitespace that preceded it, and its modification flag. Access
/// individual nodes via [`Document::node`].
#[derive(Debug, Clone)]
pub struct NodeData {
    kind: NodeKind,
    parent: Option<ContainerId>,
    next_sibling: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    preceding_whitespace: Option<String>,
    modified: bool,
}

impl NodeData {
    /// What kind of node this is and its payload.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The owning container, if attached.
    #[must_use]
    pub fn parent(&self) -> Option<ContainerId> {
        self.parent
    }

    /// The whitespace run captured before this node, if any.
    #[must_use]
    pub fn preceding_whitespace(&self) -> Option<&str> {
        self.preceding_whitespace.as_deref()
    }

    /// Whether the node changed since it was parsed or last cleared.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }
}

/// An XML document.
///
/// The `Document` owns all nodes in an arena and provides methods for
/// tree navigation and mutation. All tree operations go through
/// `&Document` (navigation) or `&mut Document` (mutation).
///
/// `Clone` produces a deep, independent copy of the whole tree.
///
/// # Examples
///
/// ```
/// use xmlsplice::Document;
///
/// let doc = Document::parse_str("<root attr='1'>\n  <child/>\n</root>").unwrap();
/// let root = doc.root_element().unwrap();
/// assert_eq!(doc.element(root).name(), "root");
/// assert_eq!(doc.to_xml(), "<root attr='1'>\n  <child/>\n</root>");
/// ```
#[derive(Debug, Clone)]
pub struct Document {
    /// The node arena. Index 0 is unused (placeholder for `NonZeroU32`).
    nodes: Vec<NodeData>,
    /// The document node (not the root element).
    root: ContainerId,
    pub(crate) xml_declaration: String,
    pub(crate) version: String,
    pub(crate) encoding: String,
    pub(crate) standalone: Option<bool>,
    pub(crate) has_bom: bool,
}

impl Document {
    /// Creates a new empty document with no XML declaration.
    #[must_use]
    pub fn new() -> Self {
        let blank = || NodeData {
            kind: NodeKind::Document(ChildList::default()),
            parent: None,
            next_sibling: None,
            prev_sibling: None,
            preceding_whitespace: Some(String::new()),
            modified: false,
        };
        let mut nodes = Vec::with_capacity(64);
        // Index 0: placeholder (NodeId uses NonZeroU32)
        nodes.push(blank());
        // Index 1: the document node
        nodes.push(blank());
        Self {
            nodes,
            root: ContainerId(NodeId::from_index(1)),
            xml_declaration: String::new(),
            version: "1.0".to_string(),
            encoding: "UTF-8".to_string(),
            standalone: None,
            has_bom: false,
        }
    }

    /// Parses an XML string with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyInput`] for blank input; with the default
    /// configuration malformed markup is recovered from rather than
    /// reported.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlsplice::Document;
    ///
    /// let doc = Document::parse_str("<root><child/></root>").unwrap();
    /// assert!(doc.root_element().is_some());
    /// ```
    pub fn parse_str(input: &str) -> Result<Self> {
        crate::parser::parse_str(input)
    }

    /// Parses XML bytes, detecting their encoding.
    ///
    /// # Errors
    ///
    /// Returns an error for blank input, an unknown declared encoding, or
    /// bytes that are invalid in the detected encoding.
    pub fn parse_bytes(input: &[u8]) -> Result<Self> {
        crate::parser::parse_bytes(input)
    }

    /// Renders the document in preserve mode with the default configuration.
    ///
    /// Unmodified documents reproduce their source exactly. Names are not
    /// validated; use [`Serializer`](crate::serial::Serializer) for that.
    #[must_use]
    pub fn to_xml(&self) -> String {
        crate::serial::render_preserved(self)
    }

    // --- Declaration ---

    /// The XML declaration exactly as written, or `""` if there is none.
    #[must_use]
    pub fn xml_declaration(&self) -> &str {
        &self.xml_declaration
    }

    /// Replaces the XML declaration text verbatim. An empty string removes it.
    ///
    /// A declaration added to a document that had none goes on its own
    /// line: a first node written flush against the start of the document
    /// has its whitespace inferred instead.
    pub fn set_xml_declaration(&mut self, declaration: &str) {
        if self.xml_declaration.is_empty() && !declaration.is_empty() {
            let first = self.first_child(self.root);
            self.release_flush_whitespace(first);
        }
        self.xml_declaration = declaration.to_string();
        self.mark_modified(self.root);
    }

    /// Writes a declaration from the version, encoding and standalone
    /// fields, replacing any existing one.
    pub fn generate_xml_declaration(&mut self) {
        let declaration = self.declaration_text();
        self.set_xml_declaration(&declaration);
    }

    /// Resets captured empty whitespace to `None`, so that a node which
    /// new content is placed before starts its own line.
    fn release_flush_whitespace(&mut self, id: Option<NodeId>) {
        if let Some(id) = id {
            let data = self.node_mut(id);
            if data.preceding_whitespace.as_deref() == Some("") {
                data.preceding_whitespace = None;
            }
        }
    }

    /// The XML version (`"1.0"` unless declared otherwise).
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sets the version, regenerating an existing declaration.
    pub fn set_version(&mut self, version: &str) {
        self.version = version.to_string();
        self.refresh_declaration();
    }

    /// The document encoding (declared, detected, or `"UTF-8"`).
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Sets the encoding, regenerating an existing declaration.
    ///
    /// Byte output without an explicit encoding uses this value.
    pub fn set_encoding(&mut self, encoding: &str) {
        self.encoding = encoding.to_string();
        self.refresh_declaration();
    }

    /// The standalone flag, if declared.
    #[must_use]
    pub fn standalone(&self) -> Option<bool> {
        self.standalone
    }

    /// Sets the standalone flag, regenerating an existing declaration.
    pub fn set_standalone(&mut self, standalone: Option<bool>) {
        self.standalone = standalone;
        self.refresh_declaration();
    }

    /// Whether the source started with a byte order mark.
    #[must_use]
    pub fn has_bom(&self) -> bool {
        self.has_bom
    }

    /// Sets whether output starts with a byte order mark.
    pub fn set_bom(&mut self, bom: bool) {
        self.has_bom = bom;
        self.mark_modified(self.root);
    }

    fn refresh_declaration(&mut self) {
        if !self.xml_declaration.is_empty() {
            self.xml_declaration = self.declaration_text();
        }
        self.mark_modified(self.root);
    }

    fn declaration_text(&self) -> String {
        let mut decl = format!("<?xml version=\"{}\"", self.version);
        if !self.encoding.is_empty() {
            decl.push_str(" encoding=\"");
            decl.push_str(&self.encoding);
            decl.push('"');
        }
        if let Some(standalone) = self.standalone {
            decl.push_str(if standalone {
                " standalone=\"yes\""
            } else {
                " standalone=\"no\""
            });
        }
        decl.push_str("?>");
        decl
    }

    /// The DOCTYPE declaration text, if the document has one.
    #[must_use]
    pub fn doctype(&self) -> Option<&str> {
        self.children(self.root).find_map(|id| match self.kind(id) {
            NodeKind::DocType(doctype) => Some(doctype.text()),
            _ => None,
        })
    }

    /// Sets or removes the DOCTYPE declaration.
    ///
    /// A new declaration is placed right before the root element (or at the
    /// end of the prolog when there is no root element yet).
    pub fn set_doctype(&mut self, text: Option<&str>) {
        let existing = self
            .children(self.root)
            .find(|&id| matches!(self.kind(id), NodeKind::DocType(_)));
        match (existing, text) {
            (Some(id), Some(text)) => {
                if let NodeKind::DocType(doctype) = &mut self.node_mut(id).kind {
                    doctype.text = text.to_string();
                }
                self.mark_modified(id);
            }
            (Some(id), None) => self.detach(id),
            (None, Some(text)) => {
                let id = self.create_doctype(text);
                let root_element = self.root_element().map(NodeId::from);
                self.release_flush_whitespace(root_element);
                self.attach(self.root, root_element, id);
            }
            (None, None) => {}
        }
    }

    // --- Node access ---

    /// Returns the document node.
    #[must_use]
    pub fn root(&self) -> ContainerId {
        self.root
    }

    /// Returns the root element, if any.
    #[must_use]
    pub fn root_element(&self) -> Option<ElementId> {
        self.children(self.root).find_map(|id| self.as_element(id))
    }

    /// Returns a reference to the node data for `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` does not belong to this document.
    #[must_use]
    pub fn node(&self, id: impl Into<NodeId>) -> &NodeData {
        &self.nodes[id.into().as_index()]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.as_index()]
    }

    /// Returns the kind and payload of a node.
    #[must_use]
    pub fn kind(&self, id: impl Into<NodeId>) -> &NodeKind {
        &self.node(id).kind
    }

    /// Returns the element payload behind an element handle.
    #[must_use]
    pub fn element(&self, id: ElementId) -> &Element {
        match &self.node(id).kind {
            NodeKind::Element(element) => element,
            _ => unreachable!("ElementId always refers to an element"),
        }
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> &mut Element {
        match &mut self.node_mut(id.0).kind {
            NodeKind::Element(element) => element,
            _ => unreachable!("ElementId always refers to an element"),
        }
    }

    /// Returns an element handle if `id` is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<ElementId> {
        matches!(self.kind(id), NodeKind::Element(_)).then_some(ElementId(id))
    }

    /// Returns a container handle if `id` is the document node or an element.
    #[must_use]
    pub fn as_container(&self, id: NodeId) -> Option<ContainerId> {
        self.kind(id).is_container().then_some(ContainerId(id))
    }

    /// Returns the text payload if `id` is a text or CDATA node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&Text> {
        match self.kind(id) {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the comment payload if `id` is a comment.
    #[must_use]
    pub fn comment(&self, id: NodeId) -> Option<&Comment> {
        match self.kind(id) {
            NodeKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    /// Returns the PI payload if `id` is a processing instruction.
    #[must_use]
    pub fn processing_instruction(&self, id: NodeId) -> Option<&ProcessingInstruction> {
        match self.kind(id) {
            NodeKind::ProcessingInstruction(pi) => Some(pi),
            _ => None,
        }
    }

    /// Returns the element name or PI target of a node.
    #[must_use]
    pub fn node_name(&self, id: impl Into<NodeId>) -> Option<&str> {
        match self.kind(id) {
            NodeKind::Element(element) => Some(element.name()),
            NodeKind::ProcessingInstruction(pi) => Some(pi.target()),
            _ => None,
        }
    }

    /// Returns the number of nodes in the arena, including detached ones.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len() - 1 // subtract placeholder at index 0
    }

    // --- Navigation ---

    /// Returns the owning container of a node.
    #[must_use]
    pub fn parent(&self, id: impl Into<NodeId>) -> Option<ContainerId> {
        self.node(id).parent
    }

    /// Returns the first child of a container.
    #[must_use]
    pub fn first_child(&self, parent: impl Into<ContainerId>) -> Option<NodeId> {
        self.child_list(parent.into()).first
    }

    /// Returns the last child of a container.
    #[must_use]
    pub fn last_child(&self, parent: impl Into<ContainerId>) -> Option<NodeId> {
        self.child_list(parent.into()).last
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: impl Into<NodeId>) -> Option<NodeId> {
        self.node(id).next_sibling
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: impl Into<NodeId>) -> Option<NodeId> {
        self.node(id).prev_sibling
    }

    /// Returns an iterator over the children of a container.
    pub fn children(&self, parent: impl Into<ContainerId>) -> Children<'_> {
        Children {
            doc: self,
            next: self.child_list(parent.into()).first,
        }
    }

    /// Returns an iterator over the element children of a container.
    pub fn element_children(
        &self,
        parent: impl Into<ContainerId>,
    ) -> impl Iterator<Item = ElementId> + '_ {
        self.children(parent).filter_map(|id| self.as_element(id))
    }

    /// Returns the number of children of a container.
    #[must_use]
    pub fn child_count(&self, parent: impl Into<ContainerId>) -> usize {
        self.child_list(parent.into()).len
    }

    /// Returns the position of a node among its siblings.
    #[must_use]
    pub fn child_index(&self, id: impl Into<NodeId>) -> Option<usize> {
        let id = id.into();
        let parent = self.parent(id)?;
        self.children(parent).position(|child| child == id)
    }

    /// Returns an iterator over a node and its ancestors, innermost first.
    pub fn ancestors(&self, id: impl Into<NodeId>) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: Some(id.into()),
        }
    }

    /// Returns a depth-first iterator over a node and all its descendants.
    pub fn descendants(&self, id: impl Into<NodeId>) -> Descendants<'_> {
        let id = id.into();
        Descendants {
            doc: self,
            root: id,
            next: Some(id),
        }
    }

    /// Returns the number of element ancestors of a node.
    #[must_use]
    pub fn depth(&self, id: impl Into<NodeId>) -> usize {
        self.ancestors(id)
            .skip(1)
            .filter(|&a| matches!(self.kind(a), NodeKind::Element(_)))
            .count()
    }

    /// Returns the concatenated content of all text nodes in a subtree.
    #[must_use]
    pub fn text_content(&self, id: impl Into<NodeId>) -> String {
        self.descendants(id)
            .filter_map(|d| self.text(d).map(Text::content))
            .collect()
    }

    fn first_child_of(&self, id: NodeId) -> Option<NodeId> {
        self.kind(id).child_list().and_then(|list| list.first)
    }

    fn child_list(&self, parent: ContainerId) -> &ChildList {
        match self.kind(parent).child_list() {
            Some(list) => list,
            None => unreachable!("ContainerId always refers to a container"),
        }
    }

    fn child_list_mut(&mut self, parent: ContainerId) -> &mut ChildList {
        match self.node_mut(parent.0).kind.child_list_mut() {
            Some(list) => list,
            None => unreachable!("ContainerId always refers to a container"),
        }
    }

    // --- Creation ---

    /// Creates a detached element.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is empty or contains
    /// whitespace.
    pub fn create_element(&mut self, name: &str) -> Result<ElementId> {
        check_new_name(name)?;
        let id = self.push_node(NodeKind::Element(Element::new(name)), None, true);
        Ok(ElementId(id))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push_node(NodeKind::Text(Text::new(content.into(), false)), None, true)
    }

    /// Creates a detached CDATA section.
    pub fn create_cdata(&mut self, content: &str) -> NodeId {
        self.push_node(NodeKind::Text(Text::new(content.into(), true)), None, true)
    }

    /// Creates a detached comment.
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        let comment = Comment {
            content: content.to_string(),
        };
        self.push_node(NodeKind::Comment(comment), None, true)
    }

    /// Creates a detached processing instruction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `target` is empty or contains
    /// whitespace.
    pub fn create_processing_instruction(&mut self, target: &str, data: &str) -> Result<NodeId> {
        check_new_name(target)?;
        let pi = ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
            data_whitespace: None,
        };
        Ok(self.push_node(NodeKind::ProcessingInstruction(pi), None, true))
    }

    /// Creates a detached DOCTYPE node holding `text` verbatim.
    pub fn create_doctype(&mut self, text: &str) -> NodeId {
        let doctype = DocType {
            text: text.to_string(),
        };
        self.push_node(NodeKind::DocType(doctype), None, true)
    }

    fn push_node(
        &mut self,
        kind: NodeKind,
        preceding_whitespace: Option<String>,
        modified: bool,
    ) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            next_sibling: None,
            prev_sibling: None,
            preceding_whitespace,
            modified,
        });
        id
    }

    /// Appends a parsed node without touching modification flags.
    pub(crate) fn append_parsed(
        &mut self,
        parent: ContainerId,
        kind: NodeKind,
        preceding_whitespace: String,
    ) -> NodeId {
        let id = self.push_node(kind, Some(preceding_whitespace), false);
        self.link(parent, None, id);
        id
    }

    // --- Attachment ---

    /// Appends `child` to `parent`, moving it out of its current parent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Hierarchy`] if `child` is the document node, an
    /// ancestor of `parent`, or a second root element.
    pub fn add_child(
        &mut self,
        parent: impl Into<ContainerId>,
        child: impl Into<NodeId>,
    ) -> Result<()> {
        let (parent, child) = (parent.into(), child.into());
        self.check_attach(parent, child)?;
        self.attach(parent, None, child);
        Ok(())
    }

    /// Inserts `child` at `index` among the children of `parent`, moving it
    /// out of its current parent.
    ///
    /// The index counts the children that remain once `child` is taken out
    /// of its old position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IndexOutOfBounds`] if `index` exceeds the child
    /// count (the tree is left untouched), and the errors of
    /// [`add_child`](Self::add_child).
    pub fn insert_child(
        &mut self,
        parent: impl Into<ContainerId>,
        index: usize,
        child: impl Into<NodeId>,
    ) -> Result<()> {
        let (parent, child) = (parent.into(), child.into());
        self.check_attach(parent, child)?;
        let mut len = self.child_count(parent);
        if self.node(child).parent == Some(parent) {
            len -= 1;
        }
        if index > len {
            return Err(Error::IndexOutOfBounds { index, len });
        }
        let reference = self.children(parent).filter(|&c| c != child).nth(index);
        self.attach(parent, reference, child);
        Ok(())
    }

    /// Removes `child` from `parent`. Returns `false` if it was not a child.
    pub fn remove_child(
        &mut self,
        parent: impl Into<ContainerId>,
        child: impl Into<NodeId>,
    ) -> bool {
        let (parent, child) = (parent.into(), child.into());
        if self.node(child).parent != Some(parent) {
            return false;
        }
        self.unlink(child);
        self.mark_modified(parent);
        true
    }

    /// Detaches a node from its parent. The node stays in the arena and can
    /// be attached again.
    pub fn detach(&mut self, id: impl Into<NodeId>) {
        if let Some(parent) = self.unlink(id.into()) {
            self.mark_modified(parent);
        }
    }

    fn check_attach(&self, parent: ContainerId, child: NodeId) -> Result<()> {
        if child == self.root.0 {
            return Err(Error::Hierarchy(
                "the document node cannot become a child".to_string(),
            ));
        }
        if self.ancestors(parent).any(|a| a == child) {
            return Err(Error::Hierarchy(
                "a node cannot become its own descendant".to_string(),
            ));
        }
        if parent == self.root && matches!(self.kind(child), NodeKind::Element(_)) {
            if let Some(existing) = self.root_element() {
                if existing.0 != child {
                    return Err(Error::Hierarchy(
                        "the document already has a root element".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Moves `child` under `parent`, before `reference` (or last), applying
    /// the expansion rules for elements that gain content.
    fn attach(&mut self, parent: ContainerId, reference: Option<NodeId>, child: NodeId) {
        if let Some(old_parent) = self.unlink(child) {
            self.mark_modified(old_parent);
        }
        let adds_content = !matches!(
            self.kind(child),
            NodeKind::Text(text) if !text.is_cdata() && text.content().is_empty()
        );
        if let NodeKind::Element(element) = &mut self.node_mut(parent.0).kind {
            if element.children.is_empty() && element.inner_preceding_whitespace.as_deref() == Some("")
            {
                element.inner_preceding_whitespace = None;
            }
            if adds_content {
                element.self_closing = false;
            }
        }
        self.link(parent, reference, child);
        self.mark_modified(parent);
    }

    /// Links a detached node into `parent` before `reference`, or last.
    fn link(&mut self, parent: ContainerId, reference: Option<NodeId>, child: NodeId) {
        let prev = match reference {
            Some(next) => self.node(next).prev_sibling,
            None => self.child_list(parent).last,
        };

        let data = self.node_mut(child);
        data.parent = Some(parent);
        data.prev_sibling = prev;
        data.next_sibling = reference;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = Some(child),
            None => self.child_list_mut(parent).first = Some(child),
        }
        match reference {
            Some(next) => self.node_mut(next).prev_sibling = Some(child),
            None => self.child_list_mut(parent).last = Some(child),
        }
        self.child_list_mut(parent).len += 1;
    }

    /// Unlinks a node from its parent, returning the former parent.
    fn unlink(&mut self, id: NodeId) -> Option<ContainerId> {
        let parent = self.node(id).parent?;
        let prev = self.node(id).prev_sibling;
        let next = self.node(id).next_sibling;

        match prev {
            Some(p) => self.node_mut(p).next_sibling = next,
            None => self.child_list_mut(parent).first = next,
        }
        match next {
            Some(n) => self.node_mut(n).prev_sibling = prev,
            None => self.child_list_mut(parent).last = prev,
        }
        self.child_list_mut(parent).len -= 1;

        let data = self.node_mut(id);
        data.parent = None;
        data.prev_sibling = None;
        data.next_sibling = None;
        Some(parent)
    }

    // --- Attributes ---

    /// Creates or updates an attribute.
    ///
    /// An existing attribute keeps its quote style and preceding whitespace;
    /// a new one is left for the serializer to format. The raw source form
    /// is always dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is empty or contains
    /// whitespace.
    pub fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()> {
        self.write_attribute(element, name, value, None)
    }

    /// Like [`set_attribute`](Self::set_attribute), but also sets the quote
    /// style (and only the quote style) of an existing attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is empty or contains
    /// whitespace.
    pub fn set_attribute_with_quote(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
        quote: QuoteStyle,
    ) -> Result<()> {
        self.write_attribute(element, name, value, Some(quote))
    }

    fn write_attribute(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
        quote: Option<QuoteStyle>,
    ) -> Result<()> {
        check_new_name(name)?;
        let payload = self.element_mut(element);
        match payload.attribute_index(name) {
            Some(index) => {
                let attr = &mut payload.attributes[index];
                attr.value = Value::from(value);
                if quote.is_some() {
                    attr.quote = quote;
                }
            }
            None => {
                let mut attr = Attribute::new(name, Value::from(value));
                attr.quote = quote;
                payload.attributes.push(attr);
            }
        }
        self.mark_modified(element);
        Ok(())
    }

    /// Removes an attribute. Returns `false` if it did not exist.
    pub fn remove_attribute(&mut self, element: ElementId, name: &str) -> bool {
        let payload = self.element_mut(element);
        let Some(index) = payload.attribute_index(name) else {
            return false;
        };
        payload.attributes.remove(index);
        self.mark_modified(element);
        true
    }

    /// Sets the whitespace before an attribute; `None` lets the serializer
    /// infer it. Returns `false` if the attribute does not exist.
    pub fn set_attribute_whitespace(
        &mut self,
        element: ElementId,
        name: &str,
        whitespace: Option<&str>,
    ) -> bool {
        let payload = self.element_mut(element);
        let Some(index) = payload.attribute_index(name) else {
            return false;
        };
        payload.attributes[index].preceding_whitespace = whitespace.map(str::to_string);
        self.mark_modified(element);
        true
    }

    // --- Element fields ---

    /// Renames an element. End tags follow automatically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `name` is empty or contains
    /// whitespace.
    pub fn set_name(&mut self, element: ElementId, name: &str) -> Result<()> {
        check_new_name(name)?;
        self.element_mut(element).name = name.to_string();
        self.mark_modified(element);
        Ok(())
    }

    /// Sets whether the element is written as `<name/>` while empty.
    pub fn set_self_closing(&mut self, element: ElementId, self_closing: bool) {
        self.element_mut(element).self_closing = self_closing;
        self.mark_modified(element);
    }

    /// Sets the whitespace before the `>` or `/>` of the start tag.
    pub fn set_open_tag_whitespace(&mut self, element: ElementId, whitespace: &str) {
        self.element_mut(element).open_tag_whitespace = whitespace.to_string();
        self.mark_modified(element);
    }

    /// Sets the whitespace between `</` and the name of the end tag.
    pub fn set_close_tag_whitespace(&mut self, element: ElementId, whitespace: &str) {
        self.element_mut(element).close_tag_whitespace = whitespace.to_string();
        self.mark_modified(element);
    }

    /// Sets the whitespace between the name and `>` of the end tag.
    pub fn set_close_tag_trailing_whitespace(&mut self, element: ElementId, whitespace: &str) {
        self.element_mut(element).close_tag_trailing_whitespace = whitespace.to_string();
        self.mark_modified(element);
    }

    /// Sets the whitespace before the end tag; `None` lets the serializer
    /// infer it.
    pub fn set_inner_preceding_whitespace(&mut self, element: ElementId, whitespace: Option<&str>) {
        self.element_mut(element).inner_preceding_whitespace = whitespace.map(str::to_string);
        self.mark_modified(element);
    }

    /// Replaces all text children of an element with a single text node.
    ///
    /// The new text takes the place of the first text child removed. An
    /// empty `content` only removes.
    pub fn set_text_content(&mut self, element: ElementId, content: &str) {
        let texts: Vec<NodeId> = self
            .children(element)
            .filter(|&id| matches!(self.kind(id), NodeKind::Text(_)))
            .collect();
        // First surviving sibling after the first text child.
        let anchor = texts.first().and_then(|&first| {
            let mut next = self.next_sibling(first);
            while let Some(candidate) = next {
                if !texts.contains(&candidate) {
                    break;
                }
                next = self.next_sibling(candidate);
            }
            next
        });
        for id in texts {
            self.unlink(id);
        }
        if !content.is_empty() {
            let text = self.create_text(content);
            self.attach(element.into(), anchor, text);
        }
        self.mark_modified(element);
    }

    // --- Leaf fields ---

    /// Sets the whitespace before a node; `None` lets the serializer infer it.
    pub fn set_preceding_whitespace(&mut self, id: impl Into<NodeId>, whitespace: Option<&str>) {
        let id = id.into();
        self.node_mut(id).preceding_whitespace = whitespace.map(str::to_string);
        self.mark_modified(id);
    }

    /// Replaces the content of a text or CDATA node. Returns `false` for
    /// other node kinds.
    pub fn set_text(&mut self, id: NodeId, content: &str) -> bool {
        let NodeKind::Text(text) = &mut self.node_mut(id).kind else {
            return false;
        };
        text.value = Value::from(content);
        if !content.is_empty() {
            self.expand_parent(id);
        }
        self.mark_modified(id);
        true
    }

    /// Clears the self-closing flag of the element holding `id`, which now
    /// has content.
    fn expand_parent(&mut self, id: NodeId) {
        if let Some(parent) = self.node(id).parent {
            if let NodeKind::Element(element) = &mut self.node_mut(parent.0).kind {
                element.self_closing = false;
            }
        }
    }

    /// Turns a text node into a CDATA section or back. Returns `false` for
    /// other node kinds.
    pub fn set_cdata(&mut self, id: NodeId, cdata: bool) -> bool {
        let NodeKind::Text(text) = &mut self.node_mut(id).kind else {
            return false;
        };
        text.cdata = cdata;
        text.value = Value::Decoded(std::mem::take(&mut text.value).into_decoded());
        if cdata {
            self.expand_parent(id);
        }
        self.mark_modified(id);
        true
    }

    /// Marks a text node as exempt from pretty-print reformatting. Returns
    /// `false` for other node kinds.
    pub fn set_preserve_whitespace(&mut self, id: NodeId, preserve: bool) -> bool {
        let NodeKind::Text(text) = &mut self.node_mut(id).kind else {
            return false;
        };
        text.preserve_whitespace = preserve;
        self.mark_modified(id);
        true
    }

    /// Replaces the content of a comment. Returns `false` for other node
    /// kinds.
    pub fn set_comment(&mut self, id: NodeId, content: &str) -> bool {
        let NodeKind::Comment(comment) = &mut self.node_mut(id).kind else {
            return false;
        };
        comment.content = content.to_string();
        self.mark_modified(id);
        true
    }

    /// Replaces the target of a processing instruction. Returns `Ok(false)`
    /// for other node kinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidName`] if `target` is empty or contains
    /// whitespace.
    pub fn set_pi_target(&mut self, id: NodeId, target: &str) -> Result<bool> {
        check_new_name(target)?;
        let NodeKind::ProcessingInstruction(pi) = &mut self.node_mut(id).kind else {
            return Ok(false);
        };
        pi.target = target.to_string();
        self.mark_modified(id);
        Ok(true)
    }

    /// Replaces the data of a processing instruction. Returns `false` for
    /// other node kinds.
    pub fn set_pi_data(&mut self, id: NodeId, data: &str) -> bool {
        let NodeKind::ProcessingInstruction(pi) = &mut self.node_mut(id).kind else {
            return false;
        };
        pi.data = data.to_string();
        self.mark_modified(id);
        true
    }

    // --- Modification tracking ---

    /// Returns whether a node changed since parsing or the last clear.
    #[must_use]
    pub fn is_modified(&self, id: impl Into<NodeId>) -> bool {
        self.node(id).modified
    }

    /// Marks a node and all its ancestors as modified.
    pub fn mark_modified(&mut self, id: impl Into<NodeId>) {
        let mut current = Some(id.into());
        while let Some(node) = current {
            let data = self.node_mut(node);
            data.modified = true;
            current = data.parent.map(NodeId::from);
        }
    }

    /// Clears the modified flag on a node and its whole subtree.
    pub fn clear_modified(&mut self, id: impl Into<NodeId>) {
        let subtree: Vec<NodeId> = self.descendants(id).collect();
        for node in subtree {
            self.node_mut(node).modified = false;
        }
    }

    // --- Cloning ---

    /// Deep-copies a subtree into a new detached subtree of this document.
    ///
    /// Returns `None` for the document node; use `Document::clone` for
    /// whole documents.
    pub fn clone_node(&mut self, id: impl Into<NodeId>) -> Option<NodeId> {
        let id = id.into();
        if id == self.root.0 {
            return None;
        }
        Some(self.copy_within(id))
    }

    /// Deep-copies an element into a new detached element of this document.
    pub fn clone_element(&mut self, element: ElementId) -> ElementId {
        ElementId(self.copy_within(element.0))
    }

    /// Deep-copies a subtree of another document into this one, detached.
    ///
    /// Returns `None` for the source's document node.
    pub fn import_node(&mut self, source: &Document, id: impl Into<NodeId>) -> Option<NodeId> {
        let id = id.into();
        if id == source.root.0 {
            return None;
        }
        Some(self.copy_from(source, id))
    }

    /// Copies bottom-up: children first, then their new parent, then links.
    fn copy_within(&mut self, id: NodeId) -> NodeId {
        let originals: Vec<NodeId> = Children {
            doc: self,
            next: self.first_child_of(id),
        }
        .collect();
        let copies: Vec<NodeId> = originals.into_iter().map(|c| self.copy_within(c)).collect();

        let data = self.node(id);
        let kind = data.kind.without_children();
        let whitespace = data.preceding_whitespace.clone();
        let modified = data.modified;
        let copy = self.push_node(kind, whitespace, modified);
        for child in copies {
            self.link(ContainerId(copy), None, child);
        }
        copy
    }

    fn copy_from(&mut self, source: &Document, id: NodeId) -> NodeId {
        let copies: Vec<NodeId> = Children {
            doc: source,
            next: source.first_child_of(id),
        }
        .map(|c| self.copy_from(source, c))
        .collect();

        let data = source.node(id);
        let copy = self.push_node(
            data.kind.without_children(),
            data.preceding_whitespace.clone(),
            true,
        );
        for child in copies {
            self.link(ContainerId(copy), None, child);
        }
        copy
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Rejects names no serializer could write back: empty or containing
/// whitespace. Full XML name validation happens at serialization time.
fn check_new_name(name: &str) -> Result<()> {
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

// --- Iterators ---

/// Iterator over the children of a node.
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).next_sibling;
        Some(current)
    }
}

/// Iterator over a node and its ancestors.
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.doc.node(current).parent.map(NodeId::from);
        Some(current)
    }
}

/// Depth-first iterator over a node and all its descendants.
pub struct Descendants<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;

        // Try to go deeper first
        if let Some(child) = self.doc.first_child_of(current) {
            self.next = Some(child);
            return Some(current);
        }
        if current == self.root {
            self.next = None;
            return Some(current);
        }

        // Try next sibling
        if let Some(sibling) = self.doc.next_sibling(current) {
            self.next = Some(sibling);
            return Some(current);
        }

        // Walk up to find an ancestor with a next sibling
        let mut ancestor = self.doc.parent(current).map(NodeId::from);
        while let Some(anc) = ancestor {
            if anc == self.root {
                self.next = None;
                return Some(current);
            }
            if let Some(sibling) = self.doc.next_sibling(anc) {
                self.next = Some(sibling);
                return Some(current);
            }
            ancestor = self.doc.parent(anc).map(NodeId::from);
        }

        self.next = None;
        Some(current)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn names(doc: &Document, parent: impl Into<ContainerId>) -> Vec<String> {
        doc.children(parent)
            .map(|id| doc.node_name(id).unwrap_or("#text").to_string())
            .collect()
    }

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(matches!(doc.kind(doc.root()), NodeKind::Document(_)));
        assert_eq!(doc.node_count(), 1);
        assert!(doc.root_element().is_none());
        assert_eq!(doc.xml_declaration(), "");
        assert!(!doc.is_modified(doc.root()));
    }

    #[test]
    fn test_add_children_in_order() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        doc.add_child(doc.root(), root).unwrap();
        for name in ["a", "b", "c"] {
            let child = doc.create_element(name).unwrap();
            doc.add_child(root, child).unwrap();
        }
        assert_eq!(names(&doc, root), ["a", "b", "c"]);
        assert_eq!(doc.child_count(root), 3);
        assert_eq!(doc.root_element(), Some(root));
    }

    #[test]
    fn test_insert_child_positions() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let a = doc.create_element("a").unwrap();
        let c = doc.create_element("c").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.add_child(root, a).unwrap();
        doc.add_child(root, c).unwrap();
        doc.insert_child(root, 1, b).unwrap();
        assert_eq!(names(&doc, root), ["a", "b", "c"]);

        let z = doc.create_element("z").unwrap();
        doc.insert_child(root, 3, z).unwrap();
        assert_eq!(names(&doc, root), ["a", "b", "c", "z"]);
    }

    #[test]
    fn test_insert_child_out_of_bounds_leaves_tree_untouched() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let other = doc.create_element("other").unwrap();
        let a = doc.create_element("a").unwrap();
        doc.add_child(other, a).unwrap();

        let err = doc.insert_child(root, 1, a).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfBounds { index: 1, len: 0 }));
        assert_eq!(doc.parent(a), Some(other.into()));
    }

    #[test]
    fn test_reinsert_within_same_parent() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        doc.add_child(root, a).unwrap();
        doc.add_child(root, b).unwrap();
        doc.insert_child(root, 1, a).unwrap();
        assert_eq!(names(&doc, root), ["b", "a"]);
        assert!(doc.insert_child(root, 2, a).is_err());
    }

    #[test]
    fn test_add_child_moves_between_parents() {
        let mut doc = Document::new();
        let first = doc.create_element("first").unwrap();
        let second = doc.create_element("second").unwrap();
        let child = doc.create_element("child").unwrap();
        doc.add_child(first, child).unwrap();
        doc.add_child(second, child).unwrap();
        assert_eq!(doc.child_count(first), 0);
        assert_eq!(doc.parent(child), Some(second.into()));
    }

    #[test]
    fn test_remove_child() {
        let mut doc = Document::new();
        let root = doc.create_element("root").unwrap();
        let a = doc.create_element("a").unwrap();
        let b = doc.create_element("b").unwrap();
        let c = doc.create_element("c").unwrap();
        for child in [a, b, c] {
            doc.add_child(root, child).unwrap();
        }
        assert!(doc.remove_child(root, b));
        assert!(!doc.remove_child(root, b));
        assert_eq!(names(&doc, root), ["a", "c"]);
        assert_eq!(doc.parent(b), None);
        assert_eq!(doc.next_sibling(a), Some(c.node()));
        assert_eq!(doc.prev_sibling(c), Some(a.node()));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut doc = Document::new();
        let outer = doc.create_element("outer").unwrap();
        let inner = doc.create_element("inner").unwrap();
        doc.add_child(outer, inner).unwrap();
        assert!(matches!(doc.add_child(inner, outer), Err(Error::Hierarchy(_))));
        assert!(matches!(doc.add_child(outer, outer), Err(Error::Hierarchy(_))));
        assert!(matches!(
            doc.add_child(outer, doc.root()),
            Err(Error::Hierarchy(_))
        ));
    }

    #[test]
    fn test_single_root_element() {
        let mut doc = Document::new();
        let first = doc.create_element("first").unwrap();
        let second = doc.create_element("second").unwrap();
        doc.add_child(doc.root(), first).unwrap();
        assert!(matches!(
            doc.add_child(doc.root(), second),
            Err(Error::Hierarchy(_))
        ));
        let comment = doc.create_comment("ok");
        assert!(doc.add_child(doc.root(), comment).is_ok());
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let mut doc = Document::new();
        assert!(matches!(doc.create_element(""), Err(Error::InvalidName(_))));
        assert!(matches!(doc.create_element("a b"), Err(Error::InvalidName(_))));
        let el = doc.create_element("ok").unwrap();
        assert!(doc.set_attribute(el, "", "v").is_err());
        assert!(doc.create_processing_instruction("", "data").is_err());
    }

    #[test]
    fn test_set_attribute_update_keeps_formatting() {
        let mut doc = Document::parse_str("<a  x='1'/>").unwrap();
        let root = doc.root_element().unwrap();
        doc.set_attribute(root, "x", "2").unwrap();
        let attr = doc.element(root).attribute("x").unwrap();
        assert_eq!(attr.value(), "2");
        assert_eq!(attr.raw_value(), None);
        assert_eq!(attr.quote_style(), Some(QuoteStyle::Single));
        assert_eq!(attr.preceding_whitespace(), Some("  "));

        doc.set_attribute_with_quote(root, "x", "3", QuoteStyle::Double)
            .unwrap();
        let attr = doc.element(root).attribute("x").unwrap();
        assert_eq!(attr.quote_style(), Some(QuoteStyle::Double));
        assert_eq!(attr.preceding_whitespace(), Some("  "));
    }

    #[test]
    fn test_set_attribute_last_write_wins() {
        let mut doc = Document::new();
        let el = doc.create_element("e").unwrap();
        doc.set_attribute(el, "k", "1").unwrap();
        doc.set_attribute(el, "j", "2").unwrap();
        doc.set_attribute(el, "k", "3").unwrap();
        let attrs: Vec<_> = doc
            .element(el)
            .attributes()
            .iter()
            .map(|a| (a.name(), a.value()))
            .collect();
        assert_eq!(attrs, [("k", "3"), ("j", "2")]);
        assert!(doc.remove_attribute(el, "k"));
        assert!(!doc.remove_attribute(el, "k"));
    }

    #[test]
    fn test_parsed_nodes_start_clean_and_mutation_propagates() {
        let mut doc = Document::parse_str("<a><b><c/></b><d/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let b = doc.element_children(a).next().unwrap();
        let c = doc.element_children(b).next().unwrap();
        let d = doc.element_children(a).nth(1).unwrap();
        assert!(!doc.is_modified(c));

        doc.set_attribute(c, "k", "v").unwrap();
        assert!(doc.is_modified(c));
        assert!(doc.is_modified(b));
        assert!(doc.is_modified(a));
        assert!(doc.is_modified(doc.root()));
        assert!(!doc.is_modified(d));

        doc.clear_modified(doc.root());
        assert!(!doc.is_modified(c));
        assert!(!doc.is_modified(a));
    }

    #[test]
    fn test_created_nodes_start_modified() {
        let mut doc = Document::new();
        let el = doc.create_element("x").unwrap();
        let text = doc.create_text("t");
        assert!(doc.is_modified(el));
        assert!(doc.is_modified(text));
    }

    #[test]
    fn test_self_closing_is_sticky() {
        let mut doc = Document::parse_str("<r><empty/></r>").unwrap();
        let root = doc.root_element().unwrap();
        let empty = doc.element_children(root).next().unwrap();
        assert!(doc.element(empty).is_self_closing());

        doc.set_text_content(empty, "text");
        assert!(!doc.element(empty).is_self_closing());
        doc.set_text_content(empty, "");
        assert!(!doc.element(empty).is_self_closing());
        assert_eq!(doc.child_count(empty), 0);
    }

    #[test]
    fn test_set_text_content_keeps_position() {
        let mut doc = Document::parse_str("<p>one<b/>two</p>").unwrap();
        let p = doc.root_element().unwrap();
        doc.set_text_content(p, "new");
        assert_eq!(names(&doc, p), ["#text", "b"]);
        assert_eq!(doc.text_content(p), "new");
    }

    #[test]
    fn test_clone_element_is_detached_and_independent() {
        let mut doc = Document::parse_str("<r><a k='v'><b>t</b></a></r>").unwrap();
        let root = doc.root_element().unwrap();
        let a = doc.element_children(root).next().unwrap();
        let copy = doc.clone_element(a);

        assert_eq!(doc.parent(copy), None);
        let b_copy = doc.element_children(copy).next().unwrap();
        assert_eq!(doc.parent(b_copy), Some(copy.into()));
        assert_eq!(doc.text_content(copy), "t");

        doc.set_attribute(copy, "k", "changed").unwrap();
        assert_eq!(doc.element(a).attribute_value("k"), Some("v"));
    }

    #[test]
    fn test_clone_document_is_independent() {
        let doc = Document::parse_str("<r><a/></r>").unwrap();
        let mut copy = doc.clone();
        let root = copy.root_element().unwrap();
        copy.set_attribute(root, "added", "yes").unwrap();
        assert_eq!(doc.to_xml(), "<r><a/></r>");
        assert_ne!(copy.to_xml(), doc.to_xml());
    }

    #[test]
    fn test_import_node_from_other_document() {
        let source = Document::parse_str("<s>\n  <dep id='1'/>\n</s>").unwrap();
        let dep = source
            .element_children(source.root_element().unwrap())
            .next()
            .unwrap();

        let mut doc = Document::parse_str("<t/>").unwrap();
        let imported = doc.import_node(&source, dep).unwrap();
        let target = doc.root_element().unwrap();
        doc.add_child(target, imported).unwrap();
        assert_eq!(doc.text_content(target), "");
        assert_eq!(
            doc.element(doc.as_element(imported).unwrap()).attribute_value("id"),
            Some("1")
        );
        assert!(doc.import_node(&source, source.root()).is_none());
    }

    #[test]
    fn test_descendants_and_depth() {
        let doc = Document::parse_str("<a><b><c/></b><d/></a>").unwrap();
        let a = doc.root_element().unwrap();
        let order: Vec<_> = doc
            .descendants(a)
            .filter_map(|id| doc.node_name(id))
            .collect();
        assert_eq!(order, ["a", "b", "c", "d"]);
        let c = doc.descendants(a).nth(2).unwrap();
        assert_eq!(doc.depth(c), 2);
        assert_eq!(doc.depth(a), 0);
    }

    #[test]
    fn test_descendants_of_leaf() {
        let doc = Document::parse_str("<a>t</a>").unwrap();
        let text = doc.first_child(doc.root_element().unwrap()).unwrap();
        assert_eq!(doc.descendants(text).count(), 1);
    }

    #[test]
    fn test_declaration_fields_regenerate() {
        let mut doc = Document::parse_str("<?xml version='1.0'?><r/>").unwrap();
        assert_eq!(doc.version(), "1.0");
        doc.set_standalone(Some(true));
        assert_eq!(
            doc.xml_declaration(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>"
        );

        let mut bare = Document::parse_str("<r/>").unwrap();
        bare.set_encoding("ISO-8859-1");
        assert_eq!(bare.xml_declaration(), "");
        bare.generate_xml_declaration();
        assert_eq!(
            bare.xml_declaration(),
            "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"
        );
    }

    #[test]
    fn test_doctype_accessors() {
        let mut doc = Document::parse_str("<!DOCTYPE r><r/>").unwrap();
        assert_eq!(doc.doctype(), Some("<!DOCTYPE r>"));
        doc.set_doctype(Some("<!DOCTYPE r SYSTEM \"r.dtd\">"));
        assert_eq!(doc.to_xml(), "<!DOCTYPE r SYSTEM \"r.dtd\"><r/>");
        doc.set_doctype(None);
        assert_eq!(doc.doctype(), None);
        assert_eq!(doc.to_xml(), "<r/>");
    }

    #[test]
    fn test_leaf_setters_reject_wrong_kinds() {
        let mut doc = Document::parse_str("<r><!--c-->t</r>").unwrap();
        let root = doc.root_element().unwrap();
        let comment = doc.first_child(root).unwrap();
        let text = doc.last_child(root).unwrap();
        assert!(!doc.set_text(comment, "x"));
        assert!(!doc.set_comment(text, "x"));
        assert!(doc.set_comment(comment, " changed "));
        assert!(doc.set_text(text, "new"));
        assert_eq!(doc.to_xml(), "<r><!-- changed -->new</r>");
    }
}
