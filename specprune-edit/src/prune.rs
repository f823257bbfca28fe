use crate::error::EditResult;
use crate::plan::PrunePlan;
use specprune_spec::{Document, SectionCollection, SectionId};
use tracing::{debug, info, warn};

/// Result of filtering one install line list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallFilter {
    pub kept: Vec<String>,
    /// Lines dropped because they matched a keyword, in input order.
    pub dropped: Vec<String>,
}

/// What a prune pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed_sections: Vec<SectionId>,
    pub dropped_lines: Vec<String>,
}

impl PruneReport {
    pub fn is_noop(&self) -> bool {
        self.removed_sections.is_empty() && self.dropped_lines.is_empty()
    }
}

/// Remove every section carrying one of `ids`.
///
/// Absent identifiers are skipped; any other lookup failure is returned.
pub fn remove_unsupported_sections(
    sections: &mut SectionCollection,
    ids: &[SectionId],
) -> EditResult<Vec<SectionId>> {
    let mut removed = Vec::new();
    for id in ids {
        let before = removed.len();
        loop {
            match sections.remove(id) {
                Ok(section) => {
                    info!(section = %section.id(), "removing section");
                    removed.push(section.id().clone());
                }
                Err(err) if err.is_not_found() => break,
                Err(err) => return Err(err.into()),
            }
        }
        if removed.len() == before {
            debug!(section = %id, "section absent, skipping");
        }
    }
    Ok(removed)
}

/// Drop lines containing any keyword and collapse runs of blank lines.
///
/// An empty line is kept only if the previously *kept* line was not empty.
/// Whitespace-only lines are content and are never collapsed.
pub fn filter_install_lines<L: AsRef<str>, K: AsRef<str>>(
    lines: &[L],
    keywords: &[K],
) -> InstallFilter {
    let mut out = InstallFilter::default();
    let mut last_kept_blank = false;

    for line in lines {
        let line = line.as_ref();
        if keywords.iter().any(|kw| line.contains(kw.as_ref())) {
            debug!(line, "dropping install line");
            out.dropped.push(line.to_string());
            continue;
        }

        let blank = line.is_empty();
        if blank && last_kept_blank {
            continue;
        }
        last_kept_blank = blank;
        out.kept.push(line.to_string());
    }

    out
}

/// Remove the plan's sections and filter `%install`, in one editing session.
pub fn prune_document(doc: &mut Document, plan: &PrunePlan) -> EditResult<PruneReport> {
    let ids = plan.section_ids();
    let mut sections = doc.sections();

    let removed_sections = remove_unsupported_sections(&mut sections, &ids)?;

    let dropped_lines = match sections.install_lines_mut() {
        Ok(lines) => {
            let filtered = filter_install_lines(lines.as_slice(), plan.install_keywords());
            *lines = filtered.kept;
            filtered.dropped
        }
        Err(err) if err.is_not_found() => {
            warn!("no %install section; install lines left untouched");
            Vec::new()
        }
        Err(err) => return Err(err.into()),
    };

    sections.commit();
    Ok(PruneReport {
        removed_sections,
        dropped_lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use specprune_spec::{MacroTable, Section};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn collection(ids: &[&str]) -> SectionCollection {
        SectionCollection::new(
            ids.iter()
                .map(|id| Section::new(id.parse().unwrap(), vec![]))
                .collect(),
        )
    }

    #[test]
    fn keyword_lines_dropped_and_blanks_collapsed() {
        let out = filter_install_lines(&["a", "multus-cni", "", "", "b"], &["multus"]);
        assert_eq!(out.kept, strings(&["a", "", "b"]));
        assert_eq!(out.dropped, strings(&["multus-cni"]));
    }

    #[test]
    fn blank_after_dropped_line_follows_last_kept() {
        let out = filter_install_lines(&["", "multus", "", "x", "", ""], &["multus"]);
        assert_eq!(out.kept, strings(&["", "x", ""]));
    }

    #[test]
    fn whitespace_only_lines_are_not_blank() {
        let out = filter_install_lines(&["x", "  ", ""], &["multus"]);
        assert_eq!(out.kept, strings(&["x", "  ", ""]));

        let out = filter_install_lines(&["", "\t", "", "y"], &["multus"]);
        assert_eq!(out.kept, strings(&["", "\t", "", "y"]));
    }

    #[test]
    fn leading_blank_is_kept() {
        let out = filter_install_lines(&["", "a"], &["zzz"]);
        assert_eq!(out.kept, strings(&["", "a"]));
    }

    #[test]
    fn no_keywords_only_collapses() {
        let none: [&str; 0] = [];
        let out = filter_install_lines(&["a", "", "", "", "b", ""], &none);
        assert_eq!(out.kept, strings(&["a", "", "b", ""]));
        assert!(out.dropped.is_empty());
    }

    #[test]
    fn removes_present_and_skips_absent() {
        let mut col = collection(&[
            "package",
            "package multus",
            "description multus",
            "files multus-release-info",
            "files",
        ]);
        let ids = crate::section_ids_to_remove(&["package", "description", "files"], &["multus"]);
        let removed = remove_unsupported_sections(&mut col, &ids).unwrap();
        assert_eq!(
            removed,
            vec![
                SectionId::new("package", "multus"),
                SectionId::new("description", "multus"),
                SectionId::new("files", "multus-release-info"),
            ]
        );
        assert_eq!(col.ids(), collection(&["package", "files"]).ids());
    }

    #[test]
    fn duplicate_sections_are_all_removed() {
        let mut col = collection(&["files foo", "files", "files foo"]);
        let removed =
            remove_unsupported_sections(&mut col, &[SectionId::new("files", "foo")]).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(col.ids(), vec![SectionId::new("files", "")]);
    }

    #[test]
    fn prune_document_is_idempotent() {
        let text = "\
Name: microshift

%package multus
Summary: x

%install
install a
install multus.conf


install b

%files multus
/x
";
        let plan = PrunePlan::new(&["multus"], &["package", "files"], &[] as &[&str]).unwrap();
        let mut doc = Document::parse_str(text, MacroTable::bootstrap()).unwrap();

        let first = prune_document(&mut doc, &plan).unwrap();
        assert_eq!(first.removed_sections.len(), 2);
        assert_eq!(first.dropped_lines, strings(&["install multus.conf"]));
        assert_eq!(
            doc.render(),
            "Name: microshift\n\n%install\ninstall a\n\ninstall b\n\n"
        );

        let rendered = doc.render();
        let second = prune_document(&mut doc, &plan).unwrap();
        assert!(second.is_noop());
        assert_eq!(doc.render(), rendered);
    }

    #[test]
    fn missing_install_section_is_tolerated() {
        let plan = PrunePlan::new(&["multus"], &["files"], &[] as &[&str]).unwrap();
        let mut doc =
            Document::parse_str("Name: x\n%files multus\n/a\n", MacroTable::bootstrap()).unwrap();
        let report = prune_document(&mut doc, &plan).unwrap();
        assert_eq!(report.removed_sections.len(), 1);
        assert!(report.dropped_lines.is_empty());
        assert_eq!(doc.render(), "Name: x\n");
    }
}
