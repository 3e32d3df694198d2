//! Encoding detection and transcoding.
//!
//! Implements BOM sniffing and XML declaration encoding detection per
//! XML 1.0 Section 4.3.3 and Appendix F, bridging to `encoding_rs` for the
//! actual conversion. `encoding_rs` follows the WHATWG Encoding Standard,
//! which has no UTF-32 and only decodes UTF-16, so [`Charset`] fills those
//! two gaps itself.
//!
//! # Encoding Detection Strategy
//!
//! 1. A Byte Order Mark (UTF-8, UTF-16 BE/LE, UTF-32 BE/LE) wins outright.
//! 2. Without a BOM, the first four bytes are matched against the `<?`
//!    patterns of Appendix F to recognize BOM-less UTF-16 and UTF-32.
//! 3. Otherwise the XML declaration is scanned as ASCII for `encoding=`.
//! 4. Otherwise the caller-supplied default (normally UTF-8) is used.

use std::borrow::Cow;

use encoding_rs::Encoding;

use crate::error::{Error, Result};

/// A character encoding the parser can read and the serializer can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Any encoding known to `encoding_rs`.
    Standard(&'static Encoding),
    /// UTF-32, little endian.
    Utf32Le,
    /// UTF-32, big endian.
    Utf32Be,
}

impl Charset {
    /// UTF-8, the XML default.
    #[must_use]
    pub fn utf8() -> Self {
        Self::Standard(encoding_rs::UTF_8)
    }

    /// Looks up an encoding by its IANA label (case-insensitive).
    ///
    /// Returns `None` for unknown labels and for labels that `encoding_rs`
    /// maps to its "replacement" decoder.
    ///
    /// # Examples
    ///
    /// ```
    /// use xmlsplice::encoding::Charset;
    ///
    /// assert_eq!(Charset::for_label("utf-8"), Some(Charset::utf8()));
    /// assert_eq!(Charset::for_label("UCS-4"), Some(Charset::Utf32Be));
    /// assert!(Charset::for_label("no-such-encoding").is_none());
    /// ```
    #[must_use]
    pub fn for_label(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "UTF-32" | "UTF32" | "UTF-32BE" | "UCS-4" | "ISO-10646-UCS-4" => {
                return Some(Self::Utf32Be)
            }
            "UTF-32LE" => return Some(Self::Utf32Le),
            _ => {}
        }
        let encoding = Encoding::for_label(trimmed.as_bytes())?;
        if encoding == encoding_rs::REPLACEMENT {
            return None;
        }
        Some(Self::Standard(encoding))
    }

    /// Returns the canonical name of this encoding.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard(encoding) => encoding.name(),
            Self::Utf32Le => "UTF-32LE",
            Self::Utf32Be => "UTF-32BE",
        }
    }

    /// Returns `true` for the Unicode transformation formats, which can
    /// carry a byte order mark.
    #[must_use]
    pub fn is_unicode(self) -> bool {
        match self {
            Self::Standard(encoding) => {
                encoding == encoding_rs::UTF_8
                    || encoding == encoding_rs::UTF_16LE
                    || encoding == encoding_rs::UTF_16BE
            }
            Self::Utf32Le | Self::Utf32Be => true,
        }
    }

    /// Decodes bytes that carry no BOM into a `String`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedEncoding`] if the bytes are not valid in
    /// this encoding.
    pub fn decode(self, bytes: &[u8]) -> Result<String> {
        let malformed = || Error::MalformedEncoding {
            encoding: self.name().to_string(),
        };
        match self {
            Self::Standard(encoding) => encoding
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(Cow::into_owned)
                .ok_or_else(malformed),
            Self::Utf32Le | Self::Utf32Be => {
                let chunks = bytes.chunks_exact(4);
                if !chunks.remainder().is_empty() {
                    return Err(malformed());
                }
                let mut text = String::with_capacity(bytes.len() / 4);
                for chunk in chunks {
                    let quad = [chunk[0], chunk[1], chunk[2], chunk[3]];
                    let scalar = if self == Self::Utf32Le {
                        u32::from_le_bytes(quad)
                    } else {
                        u32::from_be_bytes(quad)
                    };
                    text.push(char::from_u32(scalar).ok_or_else(malformed)?);
                }
                Ok(text)
            }
        }
    }

    /// Encodes text into this encoding.
    ///
    /// Characters the target cannot represent are written as decimal
    /// character references (`&#NNNN;`), which keeps the output valid XML.
    #[must_use]
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Standard(encoding) if encoding == encoding_rs::UTF_16LE => {
                text.encode_utf16().flat_map(u16::to_le_bytes).collect()
            }
            Self::Standard(encoding) if encoding == encoding_rs::UTF_16BE => {
                text.encode_utf16().flat_map(u16::to_be_bytes).collect()
            }
            Self::Standard(encoding) => {
                let (bytes, _, _) = encoding.encode(text);
                bytes.into_owned()
            }
            Self::Utf32Le => text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect(),
            Self::Utf32Be => text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect(),
        }
    }
}

/// The result of decoding a byte stream.
#[derive(Debug, Clone)]
pub struct DecodedInput {
    /// The decoded text, without any byte order mark.
    pub text: String,
    /// The encoding that was used.
    pub charset: Charset,
    /// Whether the input started with a byte order mark.
    pub had_bom: bool,
}

/// Detects a Byte Order Mark.
///
/// Returns the indicated encoding and the number of BOM bytes to skip.
/// UTF-32 marks are checked before UTF-16 because `FF FE 00 00` also
/// starts with the UTF-16LE mark.
///
/// # Examples
///
/// ```
/// use xmlsplice::encoding::{detect_bom, Charset};
///
/// assert_eq!(detect_bom(b"\xEF\xBB\xBF<a/>"), Some((Charset::utf8(), 3)));
/// assert_eq!(detect_bom(b"<a/>"), None);
/// ```
#[must_use]
pub fn detect_bom(bytes: &[u8]) -> Option<(Charset, usize)> {
    match bytes {
        [0xFF, 0xFE, 0x00, 0x00, ..] => Some((Charset::Utf32Le, 4)),
        [0x00, 0x00, 0xFE, 0xFF, ..] => Some((Charset::Utf32Be, 4)),
        [0xEF, 0xBB, 0xBF, ..] => Some((Charset::utf8(), 3)),
        [0xFE, 0xFF, ..] => Some((Charset::Standard(encoding_rs::UTF_16BE), 2)),
        [0xFF, 0xFE, ..] => Some((Charset::Standard(encoding_rs::UTF_16LE), 2)),
        _ => None,
    }
}

/// Recognizes BOM-less UTF-16 and UTF-32 from the bytes of `<?` or `<`
/// (XML 1.0 Appendix F.1).
fn sniff_without_bom(bytes: &[u8]) -> Option<Charset> {
    match bytes {
        [0x00, 0x00, 0x00, 0x3C, ..] => Some(Charset::Utf32Be),
        [0x3C, 0x00, 0x00, 0x00, ..] => Some(Charset::Utf32Le),
        [0x00, 0x3C, 0x00, 0x3F, ..] => Some(Charset::Standard(encoding_rs::UTF_16BE)),
        [0x3C, 0x00, 0x3F, 0x00, ..] => Some(Charset::Standard(encoding_rs::UTF_16LE)),
        _ => None,
    }
}

/// Extracts the `encoding` pseudo-attribute of an XML declaration by
/// treating the leading bytes as ASCII.
///
/// Returns `None` if there is no declaration or it declares no encoding.
#[must_use]
pub fn declared_encoding(bytes: &[u8]) -> Option<String> {
    // The declaration is short; a generous prefix is enough.
    let scan = &bytes[..bytes.len().min(512)];
    if !scan.starts_with(b"<?xml") {
        return None;
    }
    let decl_end = scan.windows(2).position(|w| w == b"?>")?;
    let decl = &scan[..decl_end];

    let needle = b"encoding";
    let enc_pos = decl.windows(needle.len()).position(|w| w == needle)?;
    let after_enc = skip_ascii_whitespace(&decl[enc_pos + needle.len()..]);
    let after_eq = skip_ascii_whitespace(after_enc.strip_prefix(b"=")?);

    let quote = *after_eq.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let after_quote = &after_eq[1..];
    let end = after_quote.iter().position(|&b| b == quote)?;
    let name = &after_quote[..end];
    if name.is_empty() || !name.iter().all(u8::is_ascii) {
        return None;
    }
    Some(String::from_utf8_lossy(name).into_owned())
}

/// Skips leading ASCII whitespace bytes (space, tab, CR, LF).
fn skip_ascii_whitespace(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|&&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

/// Decodes raw XML bytes, detecting the encoding.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] if the declared or default
/// encoding is unknown, and [`Error::MalformedEncoding`] if the bytes are
/// invalid for the resolved encoding.
///
/// # Examples
///
/// ```
/// use xmlsplice::encoding::decode_document;
///
/// let decoded = decode_document(b"<?xml version=\"1.0\"?><root/>", "UTF-8").unwrap();
/// assert_eq!(decoded.text, "<?xml version=\"1.0\"?><root/>");
/// assert!(!decoded.had_bom);
/// ```
pub fn decode_document(bytes: &[u8], default_encoding: &str) -> Result<DecodedInput> {
    if let Some((charset, skip)) = detect_bom(bytes) {
        tracing::debug!(encoding = charset.name(), "encoding detected from byte order mark");
        return Ok(DecodedInput {
            text: charset.decode(&bytes[skip..])?,
            charset,
            had_bom: true,
        });
    }

    let charset = if let Some(charset) = sniff_without_bom(bytes) {
        charset
    } else if let Some(label) = declared_encoding(bytes) {
        Charset::for_label(&label).ok_or(Error::UnsupportedEncoding(label))?
    } else {
        Charset::for_label(default_encoding)
            .ok_or_else(|| Error::UnsupportedEncoding(default_encoding.to_string()))?
    };
    tracing::debug!(encoding = charset.name(), "encoding resolved");

    Ok(DecodedInput {
        text: charset.decode(bytes)?,
        charset,
        had_bom: false,
    })
}

/// Decodes raw XML bytes with an explicit encoding, bypassing detection.
///
/// A byte order mark matching the requested encoding is skipped.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] for an unknown label and
/// [`Error::MalformedEncoding`] for invalid bytes.
pub fn decode_with_encoding(bytes: &[u8], encoding: &str) -> Result<DecodedInput> {
    let charset =
        Charset::for_label(encoding).ok_or_else(|| Error::UnsupportedEncoding(encoding.to_string()))?;
    let (content, had_bom) = match detect_bom(bytes) {
        Some((bom_charset, skip)) if bom_charset == charset => (&bytes[skip..], true),
        _ => (bytes, false),
    };
    Ok(DecodedInput {
        text: charset.decode(content)?,
        charset,
        had_bom,
    })
}

/// Encodes serialized text for output.
///
/// A leading U+FEFF (a preserved byte order mark) is dropped for
/// encodings that have no byte order mark.
///
/// # Errors
///
/// Returns [`Error::UnsupportedEncoding`] for an unknown label.
pub fn encode_document(text: &str, encoding: &str) -> Result<Vec<u8>> {
    let charset =
        Charset::for_label(encoding).ok_or_else(|| Error::UnsupportedEncoding(encoding.to_string()))?;
    let text = if charset.is_unicode() {
        text
    } else {
        text.strip_prefix('\u{FEFF}').unwrap_or(text)
    };
    Ok(charset.encode(text))
}
