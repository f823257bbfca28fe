use crate::error::{SpecError, SpecResult};
use crate::macros::MacroTable;
use crate::section::{Section, SectionCollection, SectionId, section_header};
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::ops::{Deref, DerefMut};
use tracing::debug;

const DIRECTIVES: &[&str] = &["%define", "%global", "%undefine"];
const DEFINITIONS: &[&str] = &["%define", "%global"];

/// A parsed spec file.
///
/// Edits go through [`Document::sections`]; nothing touches the disk until
/// [`Document::save`] is called.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<Utf8PathBuf>,
    sections: SectionCollection,
    macros: MacroTable,
    trailing_newline: bool,
}

impl Document {
    /// Read and parse `path`, seeding the macro table with `macros`.
    pub fn parse(path: &Utf8Path, macros: MacroTable) -> SpecResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| SpecError::Io {
            action: "read",
            path: path.to_path_buf(),
            source,
        })?;
        let mut doc = Self::parse_str(&text, macros)?;
        doc.path = Some(path.to_path_buf());
        debug!(path = %path, sections = doc.sections.len(), "parsed spec file");
        Ok(doc)
    }

    pub fn parse_str(text: &str, mut macros: MacroTable) -> SpecResult<Self> {
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };

        let mut sections = Vec::new();
        let mut current = Section::preamble(Vec::new());
        // (first line number, accumulated text) of a backslash-continued definition
        let mut pending: Option<(usize, String)> = None;

        let raw_lines: Vec<&str> = if text.is_empty() {
            Vec::new()
        } else {
            body.split('\n').collect()
        };

        for (idx, raw) in raw_lines.into_iter().enumerate() {
            let line_no = idx + 1;
            let logical = raw.trim_end_matches('\r');
            let continued = logical.strip_suffix('\\');

            let in_directive = match pending.take() {
                Some((start, mut acc)) => {
                    acc.push('\n');
                    acc.push_str(continued.unwrap_or(logical));
                    if continued.is_some() {
                        pending = Some((start, acc));
                    } else {
                        macros.apply_directive(&acc, start)?;
                    }
                    true
                }
                None if is_directive(logical) => {
                    match continued {
                        Some(head) => pending = Some((line_no, head.to_string())),
                        None => macros.apply_directive(logical, line_no)?,
                    }
                    true
                }
                None => false,
            };

            if !in_directive && let Some(id) = section_header(raw) {
                let finished =
                    std::mem::replace(&mut current, Section::with_header(id, raw.to_string()));
                push_section(&mut sections, finished);
                continue;
            }
            current.push_line(raw.to_string());
        }

        if let Some((start, acc)) = pending {
            macros.apply_directive(&acc, start)?;
        }
        push_section(&mut sections, current);

        Ok(Self {
            path: None,
            sections: SectionCollection::new(sections),
            macros,
            trailing_newline,
        })
    }

    pub fn path(&self) -> Option<&Utf8Path> {
        self.path.as_deref()
    }

    /// Attach the path [`Document::save`] writes to.
    pub fn set_path(&mut self, path: impl Into<Utf8PathBuf>) {
        self.path = Some(path.into());
    }

    /// Macro table after every definition in the file has been evaluated.
    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Read-only view of the sections.
    pub fn collection(&self) -> &SectionCollection {
        &self.sections
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        self.sections.ids()
    }

    /// Open a scoped editing session. Edits land in the document when the
    /// session is dropped, whichever way the scope is left.
    pub fn sections(&mut self) -> SectionsSession<'_> {
        let working = self.sections.clone();
        SectionsSession {
            doc: self,
            working,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for section in &self.sections {
            section.render_into(&mut lines);
        }
        let mut out = lines.join("\n");
        if self.trailing_newline {
            out.push('\n');
        }
        out
    }

    /// Write the document back to the path it was parsed from.
    pub fn save(&self) -> SpecResult<()> {
        let path = self.path.as_deref().ok_or(SpecError::NoPath)?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: &Utf8Path) -> SpecResult<()> {
        fs::write(path, self.render()).map_err(|source| SpecError::Io {
            action: "write",
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path, "saved spec file");
        Ok(())
    }
}

/// The `%define` / `%global` blocks among `lines`, each with its
/// backslash-continued lines.
pub fn macro_definitions(lines: &[String]) -> Vec<Vec<String>> {
    let mut blocks: Vec<Vec<String>> = Vec::new();
    let mut continuing = false;
    for line in lines {
        let logical = line.trim_end_matches('\r');
        if continuing {
            if let Some(block) = blocks.last_mut() {
                block.push(line.clone());
            }
        } else if starts_with_keyword(logical, DEFINITIONS) {
            blocks.push(vec![line.clone()]);
        } else {
            continue;
        }
        continuing = logical.ends_with('\\');
    }
    blocks
}

fn is_directive(line: &str) -> bool {
    starts_with_keyword(line, DIRECTIVES)
}

fn starts_with_keyword(line: &str, keywords: &[&str]) -> bool {
    let trimmed = line.trim_start();
    keywords.iter().any(|kw| {
        trimmed
            .strip_prefix(kw)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

fn push_section(sections: &mut Vec<Section>, section: Section) {
    if section.is_preamble() && section.lines().is_empty() {
        return;
    }
    sections.push(section);
}

/// Scoped mutable access to a document's sections.
pub struct SectionsSession<'doc> {
    doc: &'doc mut Document,
    working: SectionCollection,
}

impl SectionsSession<'_> {
    /// Close the session explicitly.
    pub fn commit(self) {}
}

impl Deref for SectionsSession<'_> {
    type Target = SectionCollection;

    fn deref(&self) -> &Self::Target {
        &self.working
    }
}

impl DerefMut for SectionsSession<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.working
    }
}

impl Drop for SectionsSession<'_> {
    fn drop(&mut self) {
        self.doc.sections = std::mem::take(&mut self.working);
    }
}
