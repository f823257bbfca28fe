use crate::error::{EditError, EditResult};
use crate::ids::section_ids_to_remove;
use specprune_spec::SectionId;

/// What to remove from a primary spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrunePlan {
    packages: Vec<String>,
    section_kinds: Vec<String>,
    install_keywords: Vec<String>,
}

impl PrunePlan {
    /// Build a plan whose install keywords are `packages` followed by `extra_keywords`.
    ///
    /// Duplicates are dropped (first occurrence wins). Empty entries are
    /// rejected: an empty keyword would match every install line.
    pub fn new<P, K, E>(packages: &[P], section_kinds: &[K], extra_keywords: &[E]) -> EditResult<Self>
    where
        P: AsRef<str>,
        K: AsRef<str>,
        E: AsRef<str>,
    {
        let packages = dedup_non_empty("package name", packages, false)?;
        let section_kinds = dedup_non_empty("section kind", section_kinds, false)?;
        let extras = dedup_non_empty("install keyword", extra_keywords, true)?;

        let mut install_keywords = packages.clone();
        for kw in extras {
            if !install_keywords.contains(&kw) {
                install_keywords.push(kw);
            }
        }

        Ok(Self {
            packages,
            section_kinds,
            install_keywords,
        })
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn section_kinds(&self) -> &[String] {
        &self.section_kinds
    }

    pub fn install_keywords(&self) -> &[String] {
        &self.install_keywords
    }

    pub fn section_ids(&self) -> Vec<SectionId> {
        section_ids_to_remove(&self.section_kinds, &self.packages)
    }
}

fn dedup_non_empty<S: AsRef<str>>(
    what: &str,
    items: &[S],
    allow_whitespace: bool,
) -> EditResult<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let item = item.as_ref().trim();
        if item.is_empty() {
            return Err(EditError::InvalidPlan {
                message: format!("empty {what}"),
            });
        }
        if !allow_whitespace && item.chars().any(char::is_whitespace) {
            return Err(EditError::InvalidPlan {
                message: format!("{what} '{item}' contains whitespace"),
            });
        }
        if !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keywords_are_packages_plus_extras() {
        let plan = PrunePlan::new(
            &["multus", "low-latency"],
            &["package", "files"],
            &["lib/tuned", "multus", "microshift-tuned"],
        )
        .unwrap();
        assert_eq!(
            plan.install_keywords(),
            &["multus", "low-latency", "lib/tuned", "microshift-tuned"]
        );
        assert_eq!(plan.section_ids().len(), 2 * 2 * 2);
    }

    #[test]
    fn duplicates_collapse() {
        let plan = PrunePlan::new(&["a", "a"], &["files", "files"], &[] as &[&str]).unwrap();
        assert_eq!(plan.packages(), &["a"]);
        assert_eq!(plan.section_kinds(), &["files"]);
        assert_eq!(plan.section_ids().len(), 2);
    }

    #[test]
    fn empty_entries_are_rejected() {
        let err = PrunePlan::new(&["a"], &["files"], &[" "]).unwrap_err();
        assert!(err.to_string().contains("empty install keyword"));
        assert!(PrunePlan::new(&[""], &["files"], &[] as &[&str]).is_err());
    }

    #[test]
    fn whitespace_only_allowed_in_keywords() {
        assert!(PrunePlan::new(&["a b"], &["files"], &[] as &[&str]).is_err());
        assert!(PrunePlan::new(&["a"], &["files"], &["rm -f"]).is_ok());
    }
}
