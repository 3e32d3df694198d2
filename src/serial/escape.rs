//! Escaping of text, attribute values and CDATA sections.

use crate::config::Config;
use crate::tree::{Attribute, QuoteStyle, Text};

/// Escapes character data: `&`, `<` and `>`.
pub(crate) fn write_escaped_text(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes an attribute value for the given quote.
///
/// Besides markup characters and the active quote, `\n`, `\r` and `\t`
/// are written as character references so that attribute-value
/// normalization cannot alter them on the next parse.
pub(crate) fn write_escaped_attr(out: &mut String, value: &str, quote: QuoteStyle) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c if c == quote.char() => out.push_str(quote.entity()),
            _ => out.push(ch),
        }
    }
}

/// Writes a CDATA section, splitting any `]]>` in the content across two
/// sections.
pub(crate) fn write_cdata(out: &mut String, content: &str) {
    out.push_str("<![CDATA[");
    out.push_str(&content.replace("]]>", "]]]]><![CDATA[>"));
    out.push_str("]]>");
}

/// Writes an attribute value, original entity form included when it can
/// stand inside the chosen quote.
pub(crate) fn write_attr_value(
    out: &mut String,
    attribute: &Attribute,
    quote: QuoteStyle,
    config: &Config,
) {
    match attribute.raw_value() {
        Some(raw) if config.preserve_entities && !raw.contains(quote.char()) => {
            out.push_str(raw);
        }
        _ => write_escaped_attr(out, attribute.value(), quote),
    }
}

/// Writes a text node, as CDATA, original entity form, or escaped text.
pub(crate) fn write_text_node(out: &mut String, text: &Text, config: &Config) {
    if text.is_cdata() {
        if config.preserve_cdata {
            write_cdata(out, text.content());
        } else {
            write_escaped_text(out, text.content());
        }
        return;
    }
    match text.raw_value() {
        Some(raw) if config.preserve_entities => out.push_str(raw),
        _ => write_escaped_text(out, text.content()),
    }
}

/// Writes a text node that the layout places on a line of its own.
///
/// Whitespace at either edge is dropped when the layout supplies its own
/// line break and indentation, and collapsed to one space when it does not,
/// so word boundaries survive compact output. CDATA is written unchanged.
pub(crate) fn write_laid_out_text_node(
    out: &mut String,
    text: &Text,
    config: &Config,
    layout_has_whitespace: bool,
) {
    if text.is_cdata() {
        write_text_node(out, text, config);
        return;
    }
    let (source, raw) = match text.raw_value() {
        Some(raw) if config.preserve_entities => (raw, true),
        _ => (text.content(), false),
    };
    let is_space = |c: char| matches!(c, ' ' | '\t' | '\n' | '\r');
    let body = source.trim_matches(is_space);
    let collapse = !layout_has_whitespace;
    if collapse && source.starts_with(is_space) {
        out.push(' ');
    }
    if raw {
        out.push_str(body);
    } else {
        write_escaped_text(out, body);
    }
    if collapse && !body.is_empty() && source.ends_with(is_space) {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escaped_text(s: &str) -> String {
        let mut out = String::new();
        write_escaped_text(&mut out, s);
        out
    }

    fn escaped_attr(s: &str, quote: QuoteStyle) -> String {
        let mut out = String::new();
        write_escaped_attr(&mut out, s, quote);
        out
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escaped_text("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escaped_text("\"quotes\" 'kept'"), "\"quotes\" 'kept'");
        assert_eq!(escaped_text("line\nbreak"), "line\nbreak");
    }

    #[test]
    fn test_escape_attr_uses_active_quote() {
        assert_eq!(escaped_attr("say \"hi\" 'x'", QuoteStyle::Double), "say &quot;hi&quot; 'x'");
        assert_eq!(escaped_attr("say \"hi\" 'x'", QuoteStyle::Single), "say \"hi\" &apos;x&apos;");
    }

    #[test]
    fn test_escape_attr_whitespace_characters() {
        assert_eq!(escaped_attr("a\nb\rc\td", QuoteStyle::Double), "a&#10;b&#13;c&#9;d");
    }

    #[test]
    fn test_cdata_split() {
        let mut out = String::new();
        write_cdata(&mut out, "a]]>b");
        assert_eq!(out, "<![CDATA[a]]]]><![CDATA[>b]]>");
    }
}
