//! # xmlsplice
//!
//! A lossless XML document model for editing existing files. Documents
//! remember how they were written (whitespace between and inside tags,
//! attribute quotes and spacing, entity forms, CDATA, the XML declaration)
//! so that an unmodified document serializes back byte for byte, and an
//! edited one changes only where it was edited. Nodes added in code pick
//! up the indentation, quoting and line endings of their surroundings.
//!
//! ## Quick Start
//!
//! ```
//! use xmlsplice::Document;
//!
//! let source = "<project>\n  <name>demo</name>\n</project>\n";
//! let mut doc = Document::parse_str(source).unwrap();
//! assert_eq!(doc.to_xml(), source);
//!
//! let project = doc.root_element().unwrap();
//! let version = doc.create_element("version").unwrap();
//! let text = doc.create_text("1.0");
//! doc.add_child(version, text).unwrap();
//! doc.add_child(project, version).unwrap();
//!
//! assert_eq!(
//!     doc.to_xml(),
//!     "<project>\n  <name>demo</name>\n  <version>1.0</version>\n</project>\n"
//! );
//! ```
//!
//! Use a [`Serializer`] with a [`Config`] for pretty printing, encoded
//! byte output, or to drop comments and processing instructions.

pub mod config;
pub mod encoding;
pub mod error;
pub mod parser;
pub mod serial;
pub mod tree;
pub mod util;

// Re-export primary types at the crate root for convenience.
pub use config::{Config, EmptyElementStyle};
pub use error::{Error, ParseError, Result, SourceLocation};
pub use parser::Parser;
pub use serial::Serializer;
pub use tree::{
    Attribute, Comment, ContainerId, DocType, Document, Element, ElementId, NodeId, NodeKind,
    ProcessingInstruction, QuoteStyle, Text, Value,
};
