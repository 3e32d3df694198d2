//! Parser and serializer configuration.
//!
//! A [`Config`] is a plain value passed explicitly to
//! [`Parser::new`](crate::parser::Parser::new) and
//! [`Serializer::new`](crate::serial::Serializer::new). There is no global
//! default instance; `Config::default()` is simply the preserve-everything
//! configuration.
//!
//! ```
//! use xmlsplice::config::{Config, EmptyElementStyle};
//!
//! let config = Config::default()
//!     .pretty_print(true)
//!     .indent_string("  ")
//!     .empty_element_style(EmptyElementStyle::SelfClosingSpaced);
//! assert!(config.validate().is_ok());
//! ```

use crate::encoding::Charset;
use crate::error::{Error, Result};
use crate::tree::{Document, NodeKind, QuoteStyle};

/// How an element without content is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmptyElementStyle {
    /// `<tag></tag>`
    Expanded,
    /// `<tag/>`
    #[default]
    SelfClosing,
    /// `<tag />`
    SelfClosingSpaced,
}

impl EmptyElementStyle {
    /// Renders an empty element in this style.
    ///
    /// `attributes` is the already rendered attribute text, including the
    /// whitespace before each attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlsplice::config::EmptyElementStyle;
    ///
    /// assert_eq!(EmptyElementStyle::Expanded.format("br", ""), "<br></br>");
    /// assert_eq!(EmptyElementStyle::SelfClosing.format("br", " a=\"1\""), "<br a=\"1\"/>");
    /// assert_eq!(EmptyElementStyle::SelfClosingSpaced.format("br", ""), "<br />");
    /// ```
    #[must_use]
    pub fn format(self, name: &str, attributes: &str) -> String {
        match self {
            Self::Expanded => format!("<{name}{attributes}></{name}>"),
            Self::SelfClosing => format!("<{name}{attributes}/>"),
            Self::SelfClosingSpaced => format!("<{name}{attributes} />"),
        }
    }

    /// Detects the style a document already uses for its empty elements.
    ///
    /// Counts every element without children by the style it was written
    /// in. The strictly most frequent style wins; a tie, a document without
    /// empty elements, or no document at all resolves to
    /// [`SelfClosing`](Self::SelfClosing).
    #[must_use]
    pub fn detect(doc: Option<&Document>) -> Self {
        let Some(doc) = doc else {
            return Self::SelfClosing;
        };

        let (mut expanded, mut closing, mut spaced) = (0usize, 0usize, 0usize);
        for id in doc.descendants(doc.root()) {
            let NodeKind::Element(element) = doc.kind(id) else {
                continue;
            };
            if element.child_count() > 0 {
                continue;
            }
            if !element.is_self_closing() {
                expanded += 1;
            } else if element.open_tag_whitespace().is_empty() {
                closing += 1;
            } else {
                spaced += 1;
            }
        }

        if expanded > closing && expanded > spaced {
            Self::Expanded
        } else if spaced > closing && spaced > expanded {
            Self::SelfClosingSpaced
        } else {
            Self::SelfClosing
        }
    }
}

/// Options shared by the parser and the serializer.
///
/// All options are independently settable through the builder methods of
/// the same name. The parser reads `strict_parsing` and
/// `default_encoding`; everything else shapes serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Reuse captured whitespace when rendering in preserve mode. When
    /// `false`, every whitespace field is inferred as if it were unset.
    pub preserve_whitespace: bool,
    /// Emit comments.
    pub preserve_comments: bool,
    /// Emit the original encoded form of text and attribute values.
    pub preserve_entities: bool,
    /// Emit processing instructions.
    pub preserve_processing_instructions: bool,
    /// Emit CDATA sections as CDATA rather than escaped text.
    pub preserve_cdata: bool,
    /// Encoding assumed for byte input without BOM or declaration, and used
    /// for byte output when the document declares none.
    pub default_encoding: String,
    /// Quote style for new attributes when inference has nothing to copy.
    pub default_quote_style: QuoteStyle,
    /// Refuse to serialize element, attribute, or PI names that are not
    /// valid XML names.
    pub validate_xml_names: bool,
    /// Turn well-formedness problems into parse errors instead of
    /// recovering from them.
    pub strict_parsing: bool,
    /// Regenerate all formatting instead of preserving it.
    pub pretty_print: bool,
    /// One level of indentation.
    pub indent_string: String,
    /// Line terminator for generated line breaks.
    pub line_ending: String,
    /// How empty elements are written when pretty printing.
    pub empty_element_style: EmptyElementStyle,
    /// Leave the XML declaration out of the output.
    pub omit_xml_declaration: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preserve_whitespace: true,
            preserve_comments: true,
            preserve_entities: true,
            preserve_processing_instructions: true,
            preserve_cdata: true,
            default_encoding: "UTF-8".to_string(),
            default_quote_style: QuoteStyle::Double,
            validate_xml_names: true,
            strict_parsing: false,
            pretty_print: false,
            indent_string: "    ".to_string(),
            line_ending: "\n".to_string(),
            empty_element_style: EmptyElementStyle::SelfClosing,
            omit_xml_declaration: false,
        }
    }
}

impl Config {
    /// Preset for uniformly indented output with four-space indentation.
    #[must_use]
    pub fn pretty() -> Self {
        Self::default().pretty_print(true).preserve_whitespace(false)
    }

    /// Preset for the smallest faithful output: no comments, no PIs, no
    /// declaration, everything on one line.
    #[must_use]
    pub fn minimal() -> Self {
        Self::raw()
            .preserve_comments(false)
            .preserve_processing_instructions(false)
            .omit_xml_declaration(true)
    }

    /// Preset for single-line output: pretty printing with empty
    /// indentation and line ending.
    #[must_use]
    pub fn raw() -> Self {
        Self::pretty().indent_string("").line_ending("")
    }

    /// Sets [`preserve_whitespace`](Self::preserve_whitespace).
    #[must_use]
    pub fn preserve_whitespace(mut self, yes: bool) -> Self {
        self.preserve_whitespace = yes;
        self
    }

    /// Sets [`preserve_comments`](Self::preserve_comments).
    #[must_use]
    pub fn preserve_comments(mut self, yes: bool) -> Self {
        self.preserve_comments = yes;
        self
    }

    /// Sets [`preserve_entities`](Self::preserve_entities).
    #[must_use]
    pub fn preserve_entities(mut self, yes: bool) -> Self {
        self.preserve_entities = yes;
        self
    }

    /// Sets [`preserve_processing_instructions`](Self::preserve_processing_instructions).
    #[must_use]
    pub fn preserve_processing_instructions(mut self, yes: bool) -> Self {
        self.preserve_processing_instructions = yes;
        self
    }

    /// Sets [`preserve_cdata`](Self::preserve_cdata).
    #[must_use]
    pub fn preserve_cdata(mut self, yes: bool) -> Self {
        self.preserve_cdata = yes;
        self
    }

    /// Sets [`default_encoding`](Self::default_encoding).
    #[must_use]
    pub fn default_encoding(mut self, encoding: &str) -> Self {
        self.default_encoding = encoding.to_string();
        self
    }

    /// Sets [`default_quote_style`](Self::default_quote_style).
    #[must_use]
    pub fn default_quote_style(mut self, quote: QuoteStyle) -> Self {
        self.default_quote_style = quote;
        self
    }

    /// Sets [`validate_xml_names`](Self::validate_xml_names).
    #[must_use]
    pub fn validate_xml_names(mut self, yes: bool) -> Self {
        self.validate_xml_names = yes;
        self
    }

    /// Sets [`strict_parsing`](Self::strict_parsing).
    #[must_use]
    pub fn strict_parsing(mut self, yes: bool) -> Self {
        self.strict_parsing = yes;
        self
    }

    /// Sets [`pretty_print`](Self::pretty_print).
    #[must_use]
    pub fn pretty_print(mut self, yes: bool) -> Self {
        self.pretty_print = yes;
        self
    }

    /// Sets [`indent_string`](Self::indent_string).
    #[must_use]
    pub fn indent_string(mut self, indent: &str) -> Self {
        self.indent_string = indent.to_string();
        self
    }

    /// Sets [`line_ending`](Self::line_ending).
    #[must_use]
    pub fn line_ending(mut self, line_ending: &str) -> Self {
        self.line_ending = line_ending.to_string();
        self
    }

    /// Sets [`empty_element_style`](Self::empty_element_style).
    #[must_use]
    pub fn empty_element_style(mut self, style: EmptyElementStyle) -> Self {
        self.empty_element_style = style;
        self
    }

    /// Sets [`omit_xml_declaration`](Self::omit_xml_declaration).
    #[must_use]
    pub fn omit_xml_declaration(mut self, yes: bool) -> Self {
        self.omit_xml_declaration = yes;
        self
    }

    /// Adopts the empty-element style the document already uses.
    ///
    /// See [`EmptyElementStyle::detect`].
    #[must_use]
    pub fn with_detected_empty_element_style(mut self, doc: Option<&Document>) -> Self {
        self.empty_element_style = EmptyElementStyle::detect(doc);
        self
    }

    /// Returns `true` when the settings amount to single-line output.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        self.pretty_print && self.indent_string.is_empty() && self.line_ending.is_empty()
    }

    /// Checks that the configuration can produce well-formed output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the indent string contains
    /// anything besides spaces and tabs or the line ending is not one of
    /// `""`, `"\n"`, `"\r\n"`, `"\r"`, and [`Error::UnsupportedEncoding`] if
    /// the default encoding is unknown.
    pub fn validate(&self) -> Result<()> {
        if !self.indent_string.chars().all(|c| c == ' ' || c == '\t') {
            return Err(Error::InvalidConfig(format!(
                "indent string {:?} may only contain spaces and tabs",
                self.indent_string
            )));
        }
        if !matches!(self.line_ending.as_str(), "" | "\n" | "\r\n" | "\r") {
            return Err(Error::InvalidConfig(format!(
                "line ending {:?} is not a line terminator",
                self.line_ending
            )));
        }
        if Charset::for_label(&self.default_encoding).is_none() {
            return Err(Error::UnsupportedEncoding(self.default_encoding.clone()));
        }
        Ok(())
    }
}
