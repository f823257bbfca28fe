use crate::error::EditResult;
use specprune_spec::{Document, Section, SectionCollection, SectionId, macro_definitions};
use std::fmt;
use tracing::{debug, info, warn};

/// Section kinds copied from a fragment into the primary spec.
pub const MERGEABLE_KINDS: &[&str] = &["package", "description", "files"];

/// Number of trailer sections (changelog and friends) kept at the end of the
/// primary spec by default.
pub const DEFAULT_TRAILER_LEN: usize = 3;

/// Where merged sections are spliced into the primary spec.
///
/// Resolved again before every insert, so consecutive inserts keep the
/// fragment's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertionPoint {
    /// `n` positions before the current end (clamped to the start).
    FromEnd(usize),
    /// Immediately before the last section of this kind; at the end if none exists.
    BeforeLast(String),
}

impl Default for InsertionPoint {
    fn default() -> Self {
        InsertionPoint::FromEnd(DEFAULT_TRAILER_LEN)
    }
}

impl InsertionPoint {
    pub fn resolve(&self, sections: &SectionCollection) -> usize {
        match self {
            InsertionPoint::FromEnd(n) => sections.len().saturating_sub(*n),
            InsertionPoint::BeforeLast(kind) => sections
                .iter()
                .rposition(|s| !s.is_preamble() && s.id().is_kind(kind))
                .unwrap_or(sections.len()),
        }
    }
}

impl fmt::Display for InsertionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionPoint::FromEnd(n) => write!(f, "{n} sections before the end"),
            InsertionPoint::BeforeLast(kind) => write!(f, "before the last %{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedSection {
    pub id: SectionId,
    /// Index in the primary collection right after insertion.
    pub index: usize,
}

/// What folding one fragment changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub inserted: Vec<MergedSection>,
    pub appended_lines: Vec<String>,
    /// `%define` / `%global` lines carried from the fragment preamble.
    pub definitions: Vec<String>,
    /// Fragment sections left out (install, scriptlets, preamble).
    pub skipped: Vec<SectionId>,
}

/// Copy the mergeable sections of `secondary` into `primary`, then append its
/// install lines to the primary's `%install`.
///
/// Macro definitions in the fragment preamble are carried into the primary
/// preamble, since the copied sections may reference them. A copied section
/// that lands before another section ends with an empty line.
///
/// No filtering happens here. Appending to a primary without `%install`
/// fails with the descriptor's not-found error.
pub fn merge_sections(
    primary: &mut SectionCollection,
    secondary: &SectionCollection,
    at: &InsertionPoint,
) -> EditResult<MergeReport> {
    let mut report = MergeReport::default();

    for section in secondary {
        if section.is_preamble() {
            let blocks = macro_definitions(section.lines());
            let defined: usize = blocks.iter().map(Vec::len).sum();
            let content = section.lines().iter().filter(|l| !l.trim().is_empty()).count();
            if content > defined {
                warn!("fragment preamble has content besides macro definitions; it is not merged");
            }
            report.definitions.extend(carry_definitions(primary, blocks));
            report.skipped.push(section.id().clone());
            continue;
        }
        if !MERGEABLE_KINDS.iter().any(|kind| section.id().is_kind(kind)) {
            debug!(section = %section.id(), "not a mergeable section, skipping");
            report.skipped.push(section.id().clone());
            continue;
        }

        let index = at.resolve(primary);
        let mut copy = section.clone();
        if index < primary.len() && copy.lines().last().is_none_or(|l| !l.is_empty()) {
            copy.lines_mut().push(String::new());
        }
        let index = primary.insert(index, copy);
        info!(section = %section.id(), index, "merged section");
        report.inserted.push(MergedSection {
            id: section.id().clone(),
            index,
        });
    }

    let extra = match secondary.install_lines() {
        Ok(lines) => lines.to_vec(),
        Err(err) if err.is_not_found() => Vec::new(),
        Err(err) => return Err(err.into()),
    };
    if !extra.is_empty() {
        primary.install_lines_mut()?.extend(extra.iter().cloned());
        info!(lines = extra.len(), "appended install lines");
    }
    report.appended_lines = extra;

    Ok(report)
}

/// Splice definition blocks into the primary preamble, before its trailing
/// empty lines. Blocks whose first line the primary already has are skipped.
fn carry_definitions(primary: &mut SectionCollection, blocks: Vec<Vec<String>>) -> Vec<String> {
    let existing = primary
        .preamble()
        .map(|p| p.lines().to_vec())
        .unwrap_or_default();
    let carried: Vec<String> = blocks
        .into_iter()
        .filter(|block| block.first().is_some_and(|head| !existing.contains(head)))
        .flatten()
        .collect();
    if carried.is_empty() {
        return carried;
    }

    match primary.preamble_mut() {
        Some(preamble) => {
            let lines = preamble.lines_mut();
            let at = lines.iter().rposition(|l| !l.is_empty()).map_or(0, |i| i + 1);
            lines.splice(at..at, carried.iter().cloned());
        }
        None => {
            let mut lines = carried.clone();
            lines.push(String::new());
            primary.insert(0, Section::preamble(lines));
        }
    }
    info!(lines = carried.len(), "carried fragment macro definitions");
    carried
}

/// [`merge_sections`] inside one editing session of `primary`.
pub fn merge_document(
    primary: &mut Document,
    secondary: &Document,
    at: &InsertionPoint,
) -> EditResult<MergeReport> {
    let mut sections = primary.sections();
    let report = merge_sections(&mut sections, secondary.collection(), at)?;
    sections.commit();
    Ok(report)
}
