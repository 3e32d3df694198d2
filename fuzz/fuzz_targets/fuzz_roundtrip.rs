#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlsplice::{Config, Document, Parser, Serializer};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Well-formed input must reproduce exactly
        let strict = Parser::new(Config::default().strict_parsing(true));
        if let Ok(doc) = strict.parse_str(s) {
            assert_eq!(doc.to_xml(), s);
        }
        // Recovered documents must serialize without panicking
        if let Ok(doc) = Document::parse_str(s) {
            if let Ok(pretty) = Serializer::new(Config::pretty()).serialize(&doc) {
                let _ = Document::parse_str(&pretty);
            }
        }
    }
});
