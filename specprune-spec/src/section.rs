use crate::error::{SpecError, SpecResult};
use std::fmt;
use std::str::FromStr;

/// Section names rpmbuild recognises at the start of a line.
pub const SECTION_NAMES: &[&str] = &[
    "package",
    "description",
    "prep",
    "generate_buildrequires",
    "conf",
    "build",
    "install",
    "check",
    "clean",
    "files",
    "changelog",
    "pre",
    "post",
    "preun",
    "postun",
    "pretrans",
    "posttrans",
    "preuntrans",
    "postuntrans",
    "verifyscript",
    "trigger",
    "triggerin",
    "triggerun",
    "triggerpostun",
    "filetriggerin",
    "filetriggerun",
    "filetriggerpostun",
    "transfiletriggerin",
    "transfiletriggerun",
    "transfiletriggerpostun",
    "sepolicy",
    "patchlist",
    "sourcelist",
];

/// Kind of the section holding the install-step lines.
pub const INSTALL_KIND: &str = "install";

/// Kind given to the lines preceding the first header.
const PREAMBLE_KIND: &str = "package";

/// Composite section identity: `<kind> <qualifier>`.
///
/// The kind is stored lowercase; the qualifier is whitespace-normalized but
/// otherwise compared exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId {
    kind: String,
    qualifier: String,
}

impl SectionId {
    pub fn new(kind: impl AsRef<str>, qualifier: impl AsRef<str>) -> Self {
        Self {
            kind: kind.as_ref().trim().to_ascii_lowercase(),
            qualifier: qualifier
                .as_ref()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// The `%install` section.
    pub fn install() -> Self {
        Self::new(INSTALL_KIND, "")
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn qualifier(&self) -> &str {
        &self.qualifier
    }

    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind)
    }

    /// Header line rpmbuild would accept for this identifier.
    pub fn header_line(&self) -> String {
        format!("%{self}")
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.qualifier.is_empty() {
            f.write_str(&self.kind)
        } else {
            write!(f, "{} {}", self.kind, self.qualifier)
        }
    }
}

impl FromStr for SectionId {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('%');
        let (kind, qualifier) = match trimmed.split_once(char::is_whitespace) {
            Some((kind, rest)) => (kind, rest),
            None => (trimmed, ""),
        };
        if kind.is_empty() {
            return Err(SpecError::InvalidSectionId(s.to_string()));
        }
        Ok(Self::new(kind, qualifier))
    }
}

/// Recognise a section header line, returning the identifier it opens.
pub fn section_header(line: &str) -> Option<SectionId> {
    let rest = line.strip_prefix('%')?;
    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (name, after) = rest.split_at(name_end);
    if !after.is_empty() && !after.starts_with(char::is_whitespace) {
        return None;
    }
    let name = name.to_ascii_lowercase();
    if !SECTION_NAMES.contains(&name.as_str()) {
        return None;
    }
    Some(SectionId::new(name, after))
}

/// A named region of a spec file: an optional header line and its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    header: Option<String>,
    lines: Vec<String>,
}

impl Section {
    /// A section with a header synthesized from its identifier.
    pub fn new(id: SectionId, lines: Vec<String>) -> Self {
        let header = Some(id.header_line());
        Self { id, header, lines }
    }

    pub(crate) fn with_header(id: SectionId, header: String) -> Self {
        Self {
            id,
            header: Some(header),
            lines: Vec::new(),
        }
    }

    /// The headerless block before the first section header.
    pub fn preamble(lines: Vec<String>) -> Self {
        Self {
            id: SectionId::new(PREAMBLE_KIND, ""),
            header: None,
            lines,
        }
    }

    pub fn id(&self) -> &SectionId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        self.id.kind()
    }

    pub fn qualifier(&self) -> &str {
        self.id.qualifier()
    }

    /// The header line exactly as written; `None` for the preamble.
    pub fn header(&self) -> Option<&str> {
        self.header.as_deref()
    }

    pub fn is_preamble(&self) -> bool {
        self.header.is_none()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut Vec<String> {
        &mut self.lines
    }

    pub(crate) fn push_line(&mut self, line: String) {
        self.lines.push(line);
    }

    pub(crate) fn render_into(&self, out: &mut Vec<String>) {
        if let Some(header) = &self.header {
            out.push(header.clone());
        }
        out.extend(self.lines.iter().cloned());
    }
}

/// Ordered sections of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionCollection {
    sections: Vec<Section>,
}

impl SectionCollection {
    pub fn new(sections: Vec<Section>) -> Self {
        Self { sections }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn ids(&self) -> Vec<SectionId> {
        self.sections.iter().map(|s| s.id().clone()).collect()
    }

    pub fn position(&self, id: &SectionId) -> Option<usize> {
        self.sections.iter().position(|s| s.id() == id)
    }

    pub fn contains(&self, id: &SectionId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &SectionId) -> SpecResult<&Section> {
        self.sections
            .iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| SpecError::NotFound(id.clone()))
    }

    pub fn get_mut(&mut self, id: &SectionId) -> SpecResult<&mut Section> {
        self.sections
            .iter_mut()
            .find(|s| s.id() == id)
            .ok_or_else(|| SpecError::NotFound(id.clone()))
    }

    /// Remove the first section carrying `id`.
    pub fn remove(&mut self, id: &SectionId) -> SpecResult<Section> {
        let idx = self
            .position(id)
            .ok_or_else(|| SpecError::NotFound(id.clone()))?;
        Ok(self.sections.remove(idx))
    }

    /// Insert at `index`, clamped to the current length. Returns the index used.
    pub fn insert(&mut self, index: usize, section: Section) -> usize {
        let index = index.min(self.sections.len());
        self.sections.insert(index, section);
        index
    }

    pub fn push(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// The preamble, if the document has one. It is always first.
    pub fn preamble(&self) -> Option<&Section> {
        self.sections.first().filter(|s| s.is_preamble())
    }

    pub fn preamble_mut(&mut self) -> Option<&mut Section> {
        self.sections.first_mut().filter(|s| s.is_preamble())
    }

    /// Body of the `%install` section.
    pub fn install_lines(&self) -> SpecResult<&[String]> {
        self.get(&SectionId::install()).map(Section::lines)
    }

    pub fn install_lines_mut(&mut self) -> SpecResult<&mut Vec<String>> {
        self.get_mut(&SectionId::install()).map(Section::lines_mut)
    }
}

impl<'a> IntoIterator for &'a SectionCollection {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
