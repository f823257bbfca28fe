#![no_main]

//! Fuzz target for merging a parsed fragment into a parsed primary.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use specprune_edit::{InsertionPoint, merge_document};
use specprune_spec::{Document, MacroTable};

#[derive(Debug, Arbitrary)]
struct Input {
    primary: String,
    fragment: String,
    offset: u8,
}

fuzz_target!(|input: Input| {
    let Ok(mut primary) = Document::parse_str(&input.primary, MacroTable::bootstrap()) else {
        return;
    };
    let Ok(fragment) = Document::parse_str(&input.fragment, MacroTable::bootstrap()) else {
        return;
    };

    let before = primary.collection().len();
    let had_preamble = primary.collection().preamble().is_some();
    let at = InsertionPoint::FromEnd(usize::from(input.offset));
    if let Ok(report) = merge_document(&mut primary, &fragment, &at) {
        let created = !had_preamble && !report.definitions.is_empty();
        assert_eq!(
            primary.collection().len(),
            before + report.inserted.len() + usize::from(created)
        );
    }
});
