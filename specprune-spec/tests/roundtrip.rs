//! Property-based tests for spec parsing.
//!
//! These tests verify key invariants:
//! - Lossless rendering: render(parse(text)) == text
//! - Header detection: every generated header opens exactly one section
//! - Macro bootstrap: seeded self-references always resolve

use proptest::prelude::*;
use specprune_spec::{Document, MacroTable, SectionId};

/// Strategy for one body line that can never be mistaken for a header.
fn arb_body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        prop::string::string_regex(r"[a-zA-Z0-9 /._=-]{1,30}").unwrap(),
        prop::string::string_regex(r"install -p [a-z]{1,8} %\{buildroot\}/[a-z/]{1,12}").unwrap(),
    ]
}

/// Strategy for a preamble tag line.
fn arb_tag_line() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[A-Z][a-zA-Z]{0,10}: [a-z0-9.]{1,10}").unwrap()
}

/// Strategy for a section header line.
fn arb_header() -> impl Strategy<Value = (String, SectionId)> {
    (
        prop::sample::select(vec!["package", "description", "files", "post", "preun"]),
        prop::string::string_regex(r"[a-z][a-z0-9-]{0,12}").unwrap(),
    )
        .prop_map(|(kind, name)| (format!("%{kind} {name}"), SectionId::new(kind, name)))
}

/// Strategy for a whole spec text plus the section ids it should yield.
fn arb_spec() -> impl Strategy<Value = (String, Vec<SectionId>)> {
    (
        prop::collection::vec(arb_tag_line(), 0..4),
        prop::collection::vec(
            (arb_header(), prop::collection::vec(arb_body_line(), 0..5)),
            0..6,
        ),
        any::<bool>(),
    )
        .prop_map(|(preamble, sections, trailing)| {
            let mut lines = preamble.clone();
            let mut ids = Vec::new();
            if !preamble.is_empty() {
                ids.push(SectionId::new("package", ""));
            }
            for ((header, id), body) in sections {
                lines.push(header);
                lines.extend(body);
                ids.push(id);
            }
            let mut text = lines.join("\n");
            // A lone newline would parse as a one-line preamble.
            if trailing && !lines.is_empty() {
                text.push('\n');
            }
            (text, ids)
        })
}

proptest! {
    /// Rendering a freshly parsed document reproduces the input byte for byte.
    #[test]
    fn render_is_lossless(text in "[ -~\n\r%]{0,200}") {
        // Arbitrary text may hold broken macro definitions; only successful parses must round-trip.
        if let Ok(doc) = Document::parse_str(&text, MacroTable::bootstrap()) {
            prop_assert_eq!(doc.render(), text);
        }
    }

    /// Every header opens one section, in file order.
    #[test]
    fn headers_become_sections((text, ids) in arb_spec()) {
        let doc = Document::parse_str(&text, MacroTable::bootstrap()).unwrap();
        prop_assert_eq!(doc.section_ids(), ids);
        prop_assert_eq!(doc.render(), text);
    }

    /// Seeded self-references resolve to the seed value.
    #[test]
    fn seeded_self_reference_resolves(value in "[0-9]{1,3}\\.[0-9]{1,3}") {
        let macros: MacroTable = [("version", value.clone())].into_iter().collect();
        let doc = Document::parse_str("%global version %{version}\n", macros).unwrap();
        prop_assert_eq!(doc.macros().get("version"), Some(value.as_str()));
    }
}
