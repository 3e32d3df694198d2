//! Tests for pretty-print and raw output modes.

#![allow(clippy::unwrap_used)]

use xmlsplice::{Config, Document, EmptyElementStyle, Serializer};

fn render(input: &str, config: Config) -> String {
    let doc = Document::parse_str(input).unwrap();
    Serializer::new(config).serialize(&doc).unwrap()
}

const MESSY: &str = "<?xml version=\"1.0\"?>\n\n<catalog>   <book id=\"1\">\n\
                     <title>Rust</title>   <price>10</price></book>\n\n\n<!-- more -->\
                     <book id=\"2\"/></catalog>\n";

#[test]
fn test_pretty_default_indentation() {
    assert_eq!(
        render(MESSY, Config::pretty()),
        "<?xml version=\"1.0\"?>\n<catalog>\n    <book id=\"1\">\n        <title>Rust</title>\n        \
         <price>10</price>\n    </book>\n    <!-- more -->\n    <book id=\"2\"/>\n</catalog>"
    );
}

#[test]
fn test_pretty_custom_indentation_and_line_ending() {
    let config = Config::pretty().indent_string("\t").line_ending("\r\n");
    assert_eq!(
        render("<a><b><c>x</c></b></a>", config),
        "<a>\r\n\t<b>\r\n\t\t<c>x</c>\r\n\t</b>\r\n</a>"
    );
}

#[test]
fn test_raw_output_is_single_line() {
    assert_eq!(
        render(MESSY, Config::raw()),
        "<?xml version=\"1.0\"?><catalog><book id=\"1\"><title>Rust</title><price>10</price></book>\
         <!-- more --><book id=\"2\"/></catalog>"
    );
}

#[test]
fn test_minimal_output_drops_extras() {
    assert_eq!(
        render(MESSY, Config::minimal()),
        "<catalog><book id=\"1\"><title>Rust</title><price>10</price></book><book id=\"2\"/></catalog>"
    );
}

#[test]
fn test_pretty_output_is_idempotent() {
    for config in [Config::pretty(), Config::raw(), Config::pretty().indent_string("  ")] {
        let once = render(MESSY, config.clone());
        let twice = render(&once, config);
        assert_eq!(once, twice);
    }
}

#[test]
fn test_pretty_keeps_attribute_quotes_and_entities() {
    assert_eq!(
        render("<a x='1' y=\"&lt;\">  &amp;  </a>", Config::pretty()),
        "<a x='1' y=\"&lt;\">  &amp;  </a>"
    );
}

#[test]
fn test_pretty_trims_text_in_element_content() {
    assert_eq!(
        render("<a>\n   intro   <b/>\n   outro\n</a>", Config::pretty().indent_string("  ")),
        "<a>\n  intro\n  <b/>\n  outro\n</a>"
    );
}

#[test]
fn test_pretty_with_whitespace_preservation_keeps_text() {
    let config = Config::pretty()
        .indent_string("  ")
        .preserve_whitespace(true);
    assert_eq!(
        render("<a> intro <b/></a>", config),
        "<a>\n   intro \n  <b/>\n</a>"
    );
}

#[test]
fn test_text_flagged_to_keep_whitespace() {
    let mut doc = Document::parse_str("<a> intro <b/></a>").unwrap();
    let a = doc.root_element().unwrap();
    let text = doc.first_child(a).unwrap();
    assert!(doc.set_preserve_whitespace(text, true));
    let output = Serializer::new(Config::pretty().indent_string("  "))
        .serialize(&doc)
        .unwrap();
    assert_eq!(output, "<a>\n   intro \n  <b/>\n</a>");
}

#[test]
fn test_xml_space_preserve_is_respected() {
    let input = "<doc><code xml:space=\"preserve\">fn main() {\n    body();\n}</code><p>x</p></doc>";
    assert_eq!(
        render(input, Config::pretty().indent_string("  ")),
        "<doc>\n  <code xml:space=\"preserve\">fn main() {\n    body();\n}</code>\n  <p>x</p>\n</doc>"
    );
}

#[test]
fn test_empty_element_styles() {
    let input = "<a><b></b><c/></a>";
    let expanded = Config::raw().empty_element_style(EmptyElementStyle::Expanded);
    assert_eq!(render(input, expanded), "<a><b></b><c></c></a>");
    let spaced = Config::raw().empty_element_style(EmptyElementStyle::SelfClosingSpaced);
    assert_eq!(render(input, spaced), "<a><b /><c /></a>");
}

#[test]
fn test_detected_empty_element_style() {
    let doc = Document::parse_str("<a><b></b><c></c><d/></a>").unwrap();
    let config = Config::raw().with_detected_empty_element_style(Some(&doc));
    assert_eq!(config.empty_element_style, EmptyElementStyle::Expanded);
    assert_eq!(
        Serializer::new(config).serialize(&doc).unwrap(),
        "<a><b></b><c></c><d></d></a>"
    );
}

#[test]
fn test_omit_declaration() {
    let config = Config::pretty().omit_xml_declaration(true);
    assert_eq!(render("<?xml version=\"1.0\"?><a/>", config), "<a/>");
}

#[test]
fn test_pretty_doctype_and_prolog_nodes() {
    assert_eq!(
        render(
            "<?xml version=\"1.0\"?><!DOCTYPE a><?style  href='x'?><a/><!--end-->",
            Config::pretty()
        ),
        "<?xml version=\"1.0\"?>\n<!DOCTYPE a>\n<?style href='x'?>\n<a/>\n<!--end-->"
    );
}

#[test]
fn test_pretty_cdata_kept() {
    assert_eq!(
        render("<a>\n  <![CDATA[ x < y ]]>\n</a>", Config::pretty()),
        "<a><![CDATA[ x < y ]]></a>"
    );
}

#[test]
fn test_pretty_serialize_node() {
    let doc = Document::parse_str("<a><b><c/></b></a>").unwrap();
    let a = doc.root_element().unwrap();
    let b = doc.element_children(a).next().unwrap();
    let output = Serializer::new(Config::pretty().indent_string("  "))
        .serialize_node(&doc, b)
        .unwrap();
    assert_eq!(output, "<b>\n  <c/>\n</b>");
}
