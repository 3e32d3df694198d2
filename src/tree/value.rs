//! Decoded values with an optional original encoding.

use std::fmt;

/// The value of a text node or attribute.
///
/// Parsed values keep the exact source text next to the decoded form so
/// that an untouched value is written back byte for byte. Values set
/// programmatically are [`Decoded`](Value::Decoded) only and are escaped
/// at render time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// A value with no source form.
    Decoded(String),
    /// A parsed value and the text it was decoded from.
    DecodedWithRaw {
        /// Entity and character references resolved.
        value: String,
        /// The text exactly as it appeared in the source.
        raw: String,
    },
}

impl Value {
    /// Returns the decoded value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Decoded(value) | Self::DecodedWithRaw { value, .. } => value,
        }
    }

    /// Returns the source text, if the value was parsed.
    #[must_use]
    pub fn raw(&self) -> Option<&str> {
        match self {
            Self::Decoded(_) => None,
            Self::DecodedWithRaw { raw, .. } => Some(raw),
        }
    }

    /// Drops the source text, keeping only the decoded value.
    #[must_use]
    pub fn into_decoded(self) -> String {
        match self {
            Self::Decoded(value) | Self::DecodedWithRaw { value, .. } => value,
        }
    }

    pub(crate) fn with_raw(value: String, raw: &str) -> Self {
        Self::DecodedWithRaw {
            value,
            raw: raw.to_string(),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::Decoded(String::new())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Decoded(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Decoded(value.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
