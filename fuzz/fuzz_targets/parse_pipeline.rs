#![no_main]

use libfuzzer_sys::fuzz_target;

use feedproxy::normalizer::normalize;
use feedproxy::parser::{self, fallback};

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to a string, handling invalid UTF-8 gracefully
    let body = String::from_utf8_lossy(data).to_string();

    // The pipeline should never panic regardless of input: structured
    // parse, regex fallback on failure, then normalization.
    let doc = match parser::parse(&body) {
        Ok(doc) => doc,
        Err(_) => fallback::extract(&body, "https://example.com/feed"),
    };
    let feed = normalize(doc, "https://example.com/feed", &[]);

    // Normalized item ids are pairwise distinct.
    let mut seen = std::collections::HashSet::new();
    for item in &feed.items {
        assert!(seen.insert(item.id.clone()), "duplicate id: {}", item.id);
    }
});
