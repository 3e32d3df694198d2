//! Attributes and their quoting.

use super::Value;
use crate::util::qname::split_qname;

/// The quote character around an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuoteStyle {
    /// `'value'`
    Single,
    /// `"value"`
    #[default]
    Double,
}

impl QuoteStyle {
    /// Returns the quote character.
    #[must_use]
    pub fn char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    /// Returns the quote style for `'` or `"`.
    #[must_use]
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '\'' => Some(Self::Single),
            '"' => Some(Self::Double),
            _ => None,
        }
    }

    /// Returns the entity that escapes this quote inside a value.
    #[must_use]
    pub fn entity(self) -> &'static str {
        match self {
            Self::Single => "&apos;",
            Self::Double => "&quot;",
        }
    }
}

/// An attribute of an element, with the formatting it was written in.
///
/// Unset formatting (`None` quote or preceding whitespace) is filled in by
/// the serializer's inference rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub(crate) name: String,
    pub(crate) value: Value,
    pub(crate) quote: Option<QuoteStyle>,
    pub(crate) preceding_whitespace: Option<String>,
    pub(crate) separator: String,
}

impl Attribute {
    pub(crate) fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value,
            quote: None,
            preceding_whitespace: None,
            separator: "=".to_string(),
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

    /// The decoded value.
    #[must_use]
    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// The value exactly as written in the source, if it was parsed and not
    /// changed since.
    #[must_use]
    pub fn raw_value(&self) -> Option<&str> {
        self.value.raw()
    }

    /// The value with its source form, if any.
    #[must_use]
    pub fn full_value(&self) -> &Value {
        &self.value
    }

    /// The quote style, if known.
    #[must_use]
    pub fn quote_style(&self) -> Option<QuoteStyle> {
        self.quote
    }

    /// Whitespace before the attribute name, if known.
    #[must_use]
    pub fn preceding_whitespace(&self) -> Option<&str> {
        self.preceding_whitespace.as_deref()
    }

    /// The `=` between name and value, including any whitespace around it.
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_chars() {
        assert_eq!(QuoteStyle::Single.char(), '\'');
        assert_eq!(QuoteStyle::from_char('"'), Some(QuoteStyle::Double));
        assert_eq!(QuoteStyle::from_char('`'), None);
        assert_eq!(QuoteStyle::Double.entity(), "&quot;");
    }

    #[test]
    fn test_new_attribute_has_unset_formatting() {
        let attr = Attribute::new("xml:lang", Value::from("en"));
        assert_eq!(attr.prefix(), Some("xml"));
        assert_eq!(attr.local_name(), "lang");
        assert_eq!(attr.value(), "en");
        assert!(attr.quote_style().is_none());
        assert!(attr.preceding_whitespace().is_none());
        assert_eq!(attr.separator(), "=");
    }
}
