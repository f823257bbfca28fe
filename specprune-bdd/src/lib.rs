//! BDD harness (cucumber-rs).
//!
//! This crate exists to keep scenario tests isolated from the production crates.
//! The shared helpers below turn the compact list notation used in feature
//! files into values.

use specprune_spec::{Section, SectionCollection, SectionId};

/// Split `"a, b, c"` into trimmed, non-empty items.
pub fn comma_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split `"a||b"` on `|`, keeping empty items as blank lines.
pub fn line_list(text: &str) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split('|').map(str::to_string).collect()
}

/// Build a collection of empty sections from `"package foo, files"`.
pub fn sections(text: &str) -> anyhow::Result<SectionCollection> {
    let sections = comma_list(text)
        .iter()
        .map(|id| Ok(Section::new(id.parse::<SectionId>()?, Vec::new())))
        .collect::<anyhow::Result<Vec<_>>>()?;
    Ok(SectionCollection::new(sections))
}
