//! Core XML parser state machine.
//!
//! A hand-rolled recursive descent parser that builds a [`Document`] while
//! recording every piece of formatting the serializer needs to reproduce
//! the input: the whitespace run before each node, the whitespace inside
//! tags, quote characters, and the raw spelling of text and attribute
//! values.
//!
//! Character data between markup is accumulated as a run. A run made only
//! of whitespace becomes the preceding whitespace of the next node (or the
//! inner whitespace of the enclosing element when it is followed by an end
//! tag); any other run becomes a text node.

use crate::error::ParseError;
use crate::tree::{
    is_xml_whitespace, Attribute, Comment, ContainerId, DocType, Document, Element, ElementId,
    NodeKind, ProcessingInstruction, QuoteStyle, Text, Value,
};
use crate::util::qname::is_name_start_char;

use super::input::{
    parse_cdata_content, parse_comment_content, parse_pi_content, parse_xml_decl, scan_doctype,
    ParserInput,
};

/// An end tag that closes an element currently open.
#[derive(Debug, Clone, Copy)]
struct EndTag<'a> {
    name: &'a str,
    /// Whitespace between `</` and the name.
    whitespace: &'a str,
    /// Whitespace between the name and `>`.
    trailing: &'a str,
    /// The character data run right before the end tag.
    run: &'a str,
}

/// Why a content loop stopped.
enum ContentEnd<'a> {
    /// End of input, with the pending character data run.
    Eof { run: &'a str },
    /// An end tag for the current element or one of its ancestors.
    EndTag(EndTag<'a>),
}

/// The core XML parser.
pub(crate) struct XmlParser<'a> {
    /// Low-level input state (position, peek, advance, name parsing, etc.).
    input: ParserInput<'a>,
    /// The document being built.
    doc: Document,
    /// Names of the open elements, outermost first.
    open: Vec<&'a str>,
}

impl<'a> XmlParser<'a> {
    pub fn new(input: &'a str, strict: bool) -> Self {
        let mut pi = ParserInput::new(input);
        pi.set_strict(strict);
        Self {
            input: pi,
            doc: Document::new(),
            open: Vec::new(),
        }
    }

    /// Replaces the default nesting limit.
    pub fn with_max_depth(mut self, max: u32) -> Self {
        self.input.set_max_depth(max);
        self
    }

    /// Main parse entry point. Parses the entire document.
    pub fn parse(mut self) -> Result<Document, ParseError> {
        tracing::trace!(
            bytes = self.input.remaining().len(),
            strict = self.input.strict(),
            "parsing document"
        );

        // The XML declaration is only recognized at the very start.
        if self.looking_at_xml_decl() {
            self.parse_xml_declaration()?;
        }

        let root = self.doc.root();
        let run = match self.parse_content(root)? {
            ContentEnd::Eof { run } => run,
            ContentEnd::EndTag(tag) => tag.run,
        };
        if !run.is_empty() {
            if !is_xml_whitespace(run) {
                self.input.recoverable("text after the root element")?;
            }
            self.push_text(root, run)?;
        }

        if self.doc.root_element().is_none() {
            self.input.recoverable("missing root element")?;
        }
        Ok(self.doc)
    }

    // --- XML Declaration ---

    fn looking_at_xml_decl(&self) -> bool {
        self.input.looking_at(b"<?xml")
            && matches!(
                self.input.peek_at(5),
                Some(b' ' | b'\t' | b'\r' | b'\n' | b'?')
            )
    }

    fn parse_xml_declaration(&mut self) -> Result<(), ParseError> {
        let decl = parse_xml_decl(&mut self.input)?;
        self.doc.xml_declaration = decl.raw.to_string();
        if let Some(version) = decl.version {
            self.doc.version = version.to_string();
        }
        if let Some(encoding) = decl.encoding {
            self.doc.encoding = encoding.to_string();
        }
        self.doc.standalone = decl.standalone;
        Ok(())
    }

    // --- Content ---

    /// Parses children of `parent` until end of input or an end tag that
    /// closes an open element.
    fn parse_content(&mut self, parent: ContainerId) -> Result<ContentEnd<'a>, ParseError> {
        let mut run_start = self.input.pos();
        loop {
            if self.input.at_end() {
                let run = self.input.slice(run_start, self.input.pos());
                return Ok(ContentEnd::Eof { run });
            }

            if self.input.peek() != Some(b'<') {
                let text_len = self
                    .input
                    .remaining()
                    .find('<')
                    .unwrap_or(self.input.remaining().len());
                self.input.advance(text_len);
                continue;
            }

            let run = self.input.slice(run_start, self.input.pos());

            if self.input.looking_at(b"</") {
                let markup_start = self.input.save_position();
                match self.parse_end_tag(run)? {
                    Some(tag) if self.open.contains(&tag.name) => {
                        return Ok(ContentEnd::EndTag(tag));
                    }
                    Some(tag) => {
                        // A stray end tag is dropped; text around it is kept.
                        let whitespace = self.flush_run(parent, run)?;
                        self.input
                            .recoverable(format!("unexpected end tag </{}>", tag.name))?;
                        if !whitespace.is_empty() {
                            self.push_text(parent, whitespace)?;
                        }
                        run_start = self.input.pos();
                    }
                    None => {
                        // Not an end tag after all: keep "</" as text.
                        self.input.restore_position(markup_start);
                        self.input.recoverable("'</' not followed by a name")?;
                        self.input.advance(2);
                    }
                }
                continue;
            }

            if !self.looking_at_markup() {
                self.input.recoverable("'<' not followed by markup")?;
                self.input.advance(1);
                continue;
            }

            let whitespace = self.flush_run(parent, run)?;
            if let Some(tag) = self.parse_markup(parent, whitespace)? {
                return Ok(ContentEnd::EndTag(tag));
            }
            run_start = self.input.pos();
        }
    }

    /// Returns `true` if the input is at a start tag, comment, CDATA
    /// section, declaration or processing instruction.
    fn looking_at_markup(&self) -> bool {
        match self.input.peek_at(1) {
            Some(b'!' | b'?') => true,
            _ => self.input.remaining()[1..]
                .chars()
                .next()
                .is_some_and(is_name_start_char),
        }
    }

    /// Turns a pending character data run into a text node, or returns it
    /// when it is whitespace to attach to the next node.
    fn flush_run(&mut self, parent: ContainerId, run: &'a str) -> Result<&'a str, ParseError> {
        if is_xml_whitespace(run) {
            return Ok(run);
        }
        if parent == self.doc.root() {
            self.input.recoverable("text outside the root element")?;
        }
        self.push_text(parent, run)?;
        Ok("")
    }

    fn push_text(&mut self, parent: ContainerId, raw: &'a str) -> Result<(), ParseError> {
        let value = Value::with_raw(self.input.decode_entities(raw)?, raw);
        self.append(parent, NodeKind::Text(Text::new(value, false)), "");
        Ok(())
    }

    /// Parses the construct starting at `<`. Returns an end tag when a
    /// child element was closed by a tag belonging to one of its ancestors.
    fn parse_markup(
        &mut self,
        parent: ContainerId,
        whitespace: &'a str,
    ) -> Result<Option<EndTag<'a>>, ParseError> {
        if self.input.looking_at(b"<!--") {
            let content = parse_comment_content(&mut self.input)?;
            let comment = Comment {
                content: content.to_string(),
            };
            self.append(parent, NodeKind::Comment(comment), whitespace);
        } else if self.input.looking_at(b"<![CDATA[") {
            if parent == self.doc.root() {
                self.input.recoverable("CDATA section outside the root element")?;
            }
            let content = parse_cdata_content(&mut self.input)?;
            let text = Text::new(Value::Decoded(content.to_string()), true);
            self.append(parent, NodeKind::Text(text), whitespace);
        } else if self.input.looking_at(b"<!DOCTYPE") || self.input.looking_at(b"<!doctype") {
            if parent != self.doc.root() || self.doc.root_element().is_some() {
                self.input.recoverable("DOCTYPE declaration out of place")?;
            }
            let text = scan_doctype(&mut self.input)?;
            let doctype = DocType {
                text: text.to_string(),
            };
            self.append(parent, NodeKind::DocType(doctype), whitespace);
        } else if self.input.looking_at(b"<!") {
            self.input.recoverable("unsupported markup declaration")?;
            if self.input.take_until(">").is_none() {
                self.input.take_rest();
            }
            tracing::debug!("skipped unsupported markup declaration");
        } else if self.input.looking_at(b"<?") {
            self.parse_processing_instruction(parent, whitespace)?;
        } else {
            if parent == self.doc.root() && self.doc.root_element().is_some() {
                self.input.recoverable("multiple root elements")?;
            }
            return self.parse_element(parent, whitespace);
        }
        Ok(None)
    }

    fn append(&mut self, parent: ContainerId, kind: NodeKind, whitespace: &str) {
        self.doc.append_parsed(parent, kind, whitespace.to_string());
    }

    // --- Elements ---

    fn parse_element(
        &mut self,
        parent: ContainerId,
        whitespace: &'a str,
    ) -> Result<Option<EndTag<'a>>, ParseError> {
        self.input.increment_depth()?;
        self.input.advance(1);
        let Some(name) = self.input.parse_name() else {
            return Err(self.input.fatal("expected element name"));
        };
        let mut element = Element::new(name);
        let closed = self.parse_start_tag(&mut element)?;

        if closed == TagClose::SelfClosing {
            element.self_closing = true;
            element.inner_preceding_whitespace = Some(String::new());
            self.append(parent, NodeKind::Element(element), whitespace);
            self.input.decrement_depth();
            return Ok(None);
        }

        let id = ElementId(self.doc.append_parsed(
            parent,
            NodeKind::Element(element),
            whitespace.to_string(),
        ));
        if closed == TagClose::Eof {
            self.input.decrement_depth();
            return Ok(None);
        }

        self.open.push(name);
        let end = self.parse_content(id.into());
        self.open.pop();
        self.input.decrement_depth();

        match end? {
            ContentEnd::Eof { run } => {
                self.input
                    .recoverable(format!("element <{name}> is not closed"))?;
                self.finish_content(id, run)?;
                Ok(None)
            }
            ContentEnd::EndTag(tag) => {
                self.finish_content(id, tag.run)?;
                if tag.name == name {
                    let element = self.doc.element_mut(id);
                    element.close_tag_whitespace = tag.whitespace.to_string();
                    element.close_tag_trailing_whitespace = tag.trailing.to_string();
                    return Ok(None);
                }
                self.input.recoverable(format!(
                    "end tag </{}> does not match <{name}>",
                    tag.name
                ))?;
                Ok(Some(EndTag { run: "", ..tag }))
            }
        }
    }

    /// Applies the character data run that precedes an element's end.
    fn finish_content(&mut self, id: ElementId, run: &'a str) -> Result<(), ParseError> {
        let inner = if is_xml_whitespace(run) {
            run
        } else {
            self.push_text(id.into(), run)?;
            ""
        };
        self.doc.element_mut(id).inner_preceding_whitespace = Some(inner.to_string());
        Ok(())
    }

    /// Parses attributes through the end of the start tag.
    fn parse_start_tag(&mut self, element: &mut Element) -> Result<TagClose, ParseError> {
        loop {
            let whitespace = self.input.take_whitespace();
            if self.input.at_end() {
                self.input
                    .recoverable(format!("unterminated start tag <{}>", element.name))?;
                element.open_tag_whitespace = whitespace.to_string();
                return Ok(TagClose::Eof);
            }
            if self.input.looking_at(b"/>") {
                self.input.advance(2);
                element.open_tag_whitespace = whitespace.to_string();
                return Ok(TagClose::SelfClosing);
            }
            if self.input.peek() == Some(b'>') {
                self.input.advance(1);
                element.open_tag_whitespace = whitespace.to_string();
                return Ok(TagClose::Open);
            }

            let Some(name) = self.input.parse_name() else {
                self.input.recoverable("unexpected character in start tag")?;
                let skip = self.input.peek_char().map_or(1, char::len_utf8);
                self.input.advance(skip);
                continue;
            };
            if whitespace.is_empty() {
                self.input
                    .recoverable("whitespace required before attribute")?;
            }

            let attr = self.parse_attribute(name, whitespace)?;
            match element.attribute_index(name) {
                Some(index) => {
                    self.input
                        .recoverable(format!("duplicate attribute '{name}'"))?;
                    element.attributes[index] = attr;
                }
                None => element.attributes.push(attr),
            }
        }
    }

    /// Parses `= "value"` after an attribute name.
    fn parse_attribute(
        &mut self,
        name: &'a str,
        whitespace: &'a str,
    ) -> Result<Attribute, ParseError> {
        let separator_start = self.input.pos();
        let before_separator = self.input.save_position();
        self.input.take_whitespace();
        if self.input.peek() != Some(b'=') {
            self.input.restore_position(before_separator);
            self.input
                .recoverable(format!("attribute '{name}' has no value"))?;
            let mut attr = Attribute::new(name, Value::default());
            attr.preceding_whitespace = Some(whitespace.to_string());
            return Ok(attr);
        }
        self.input.advance(1);
        self.input.take_whitespace();
        let separator = self.input.slice(separator_start, self.input.pos());

        let quote = self
            .input
            .peek_char()
            .and_then(QuoteStyle::from_char);
        let raw = match quote {
            Some(quote) => {
                self.input.advance(1);
                let delimiter = quote.char().to_string();
                match self.input.take_until(&delimiter) {
                    Some(raw) => raw,
                    None => {
                        self.input.recoverable("unterminated attribute value")?;
                        self.input.take_while(|c| c != '>')
                    }
                }
            }
            None => {
                self.input.recoverable("unquoted attribute value")?;
                self.input
                    .take_while(|c| !matches!(c, ' ' | '\t' | '\r' | '\n' | '>'))
            }
        };
        if raw.contains('<') {
            self.input.recoverable("'<' not allowed in attribute values")?;
        }

        let value = Value::with_raw(self.input.decode_entities(raw)?, raw);
        let mut attr = Attribute::new(name, value);
        attr.quote = quote;
        attr.preceding_whitespace = Some(whitespace.to_string());
        attr.separator = separator.to_string();
        Ok(attr)
    }

    /// Parses `</name ws>`. Returns `None` if no name follows `</`.
    fn parse_end_tag(&mut self, run: &'a str) -> Result<Option<EndTag<'a>>, ParseError> {
        self.input.advance(2);
        let whitespace = self.input.take_whitespace();
        let Some(name) = self.input.parse_name() else {
            return Ok(None);
        };
        let trailing = self.input.take_whitespace();
        if self.input.peek() == Some(b'>') {
            self.input.advance(1);
        } else {
            self.input
                .recoverable(format!("malformed end tag </{name}>"))?;
            if self.input.take_until(">").is_none() {
                self.input.take_rest();
            }
        }
        Ok(Some(EndTag {
            name,
            whitespace,
            trailing,
            run,
        }))
    }

    // --- Processing instructions ---

    fn parse_processing_instruction(
        &mut self,
        parent: ContainerId,
        whitespace: &'a str,
    ) -> Result<(), ParseError> {
        let pi = parse_pi_content(&mut self.input)?;
        if pi.target.eq_ignore_ascii_case("xml") {
            self.input
                .recoverable("XML declaration is only allowed at the start of the document")?;
        }
        let node = ProcessingInstruction {
            target: pi.target.to_string(),
            data: pi.data.to_string(),
            data_whitespace: Some(pi.whitespace.to_string()),
        };
        self.append(parent, NodeKind::ProcessingInstruction(node), whitespace);
        Ok(())
    }
}

/// How a start tag ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagClose {
    /// `>`: content follows.
    Open,
    /// `/>`
    SelfClosing,
    /// End of input inside the tag.
    Eof,
}
