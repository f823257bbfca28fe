#![no_main]

//! Fuzz target for spec file parsing.
//!
//! Any UTF-8 input either fails with an error or renders back byte for byte.

use libfuzzer_sys::fuzz_target;
use specprune_spec::{Document, MacroTable};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(mut doc) = Document::parse_str(text, MacroTable::bootstrap()) else {
        return;
    };
    assert_eq!(doc.render(), text);

    // An untouched session must not change the rendering.
    doc.sections().commit();
    assert_eq!(doc.render(), text);
});
