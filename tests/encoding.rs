//! Tests for byte input and output in different character encodings.

#![allow(clippy::unwrap_used)]

use xmlsplice::{Config, Document, Error, Parser, Serializer};

fn utf16le(text: &str, bom: bool) -> Vec<u8> {
    let mut bytes = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
    bytes.extend(text.encode_utf16().flat_map(u16::to_le_bytes));
    bytes
}

#[test]
fn test_utf8_bom_round_trip() {
    let input = b"\xEF\xBB\xBF<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\xC3\xA9</a>";
    let doc = Document::parse_bytes(input).unwrap();
    assert!(doc.has_bom());
    assert_eq!(Serializer::default().to_bytes(&doc, None).unwrap(), input);
}

#[test]
fn test_latin1_round_trip() {
    let input = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<name>Ren\xE9e M\xFCller</name>";
    let doc = Document::parse_bytes(input).unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "Renée Müller");
    assert_eq!(Serializer::default().to_bytes(&doc, None).unwrap(), input);
}

#[test]
fn test_utf16_with_bom_round_trip() {
    let input = utf16le("<?xml version=\"1.0\" encoding=\"UTF-16\"?>\n<a>\u{263A}</a>", true);
    let doc = Document::parse_bytes(&input).unwrap();
    assert!(doc.has_bom());
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "\u{263A}");
    let output = Serializer::default()
        .to_bytes(&doc, Some("UTF-16LE"))
        .unwrap();
    assert_eq!(output, input);
}

#[test]
fn test_utf16_without_bom_is_sniffed() {
    let input = utf16le("<?xml version=\"1.0\"?>\n<a>x</a>", false);
    let doc = Document::parse_bytes(&input).unwrap();
    assert!(!doc.has_bom());
    assert_eq!(doc.encoding(), "UTF-16LE");
    assert_eq!(doc.to_xml(), "<?xml version=\"1.0\"?>\n<a>x</a>");
}

#[test]
fn test_default_encoding_applies_without_declaration() {
    let parser = Parser::new(Config::default().default_encoding("windows-1252"));
    let doc = parser.parse_bytes(b"<a>\x80</a>").unwrap();
    assert_eq!(doc.text_content(doc.root_element().unwrap()), "\u{20AC}");
    assert_eq!(doc.encoding(), "windows-1252");
}

#[test]
fn test_transcoding_on_output() {
    let doc = Document::parse_str("<a>caf\u{E9}</a>").unwrap();
    let latin1 = Serializer::default()
        .to_bytes(&doc, Some("ISO-8859-1"))
        .unwrap();
    assert_eq!(latin1, b"<a>caf\xE9</a>");
    let utf8 = Serializer::default().to_bytes(&doc, None).unwrap();
    assert_eq!(utf8, "<a>caf\u{E9}</a>".as_bytes());
}

#[test]
fn test_write_bytes_to_sink() {
    let doc = Document::parse_str("<a>\n  <b/>\n</a>").unwrap();
    let mut sink = Vec::new();
    Serializer::default()
        .write_bytes(Some(&doc), Some(&mut sink), None)
        .unwrap();
    assert_eq!(sink, b"<a>\n  <b/>\n</a>");
}

#[test]
fn test_unsupported_declared_encoding() {
    let result = Document::parse_bytes(b"<?xml version=\"1.0\" encoding=\"x-klingon\"?><a/>");
    assert!(matches!(result, Err(Error::UnsupportedEncoding(ref name)) if name == "x-klingon"));
}

#[test]
fn test_malformed_bytes() {
    let result = Document::parse_bytes(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><a>\xFF\xFE\xFD</a>");
    assert!(matches!(result, Err(Error::MalformedEncoding { .. })));
}

#[test]
fn test_unsupported_output_encoding() {
    let doc = Document::parse_str("<a/>").unwrap();
    assert!(matches!(
        Serializer::default().to_bytes(&doc, Some("x-klingon")),
        Err(Error::UnsupportedEncoding(_))
    ));
}

#[test]
fn test_encoding_change_updates_declaration() {
    let mut doc = Document::parse_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<a>\u{E9}</a>").unwrap();
    doc.set_encoding("ISO-8859-1");
    assert_eq!(
        doc.xml_declaration(),
        "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"
    );
    let bytes = Serializer::default().to_bytes(&doc, None).unwrap();
    assert_eq!(bytes, b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<a>\xE9</a>");
}
