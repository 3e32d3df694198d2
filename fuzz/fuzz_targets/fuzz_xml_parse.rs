#![no_main]
use libfuzzer_sys::fuzz_target;
use xmlsplice::{Config, Parser};

fuzz_target!(|data: &[u8]| {
    // Byte input with encoding detection, recovering and strict: never panic
    let _ = Parser::default().parse_bytes(data);
    let _ = Parser::new(Config::default().strict_parsing(true)).parse_bytes(data);
});
