#![no_main]

//! Fuzz target for install-line filtering.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use specprune_edit::filter_install_lines;

#[derive(Debug, Arbitrary)]
struct Input {
    lines: Vec<String>,
    keywords: Vec<String>,
}

fuzz_target!(|input: Input| {
    let keywords: Vec<&String> = input.keywords.iter().filter(|k| !k.is_empty()).collect();

    let once = filter_install_lines(&input.lines, &keywords);
    let twice = filter_install_lines(&once.kept, &keywords);
    assert_eq!(twice.kept, once.kept);
    assert!(twice.dropped.is_empty());
    assert!(once.kept.len() + once.dropped.len() <= input.lines.len());
    assert!(
        once.kept
            .windows(2)
            .all(|w| !(w[0].is_empty() && w[1].is_empty()))
    );
});
