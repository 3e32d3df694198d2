//! Utility modules for xmlsplice.
//!
//! Contains XML name character classes and qualified-name handling shared
//! by the tree, the parser, and the serializer.

pub mod qname;
