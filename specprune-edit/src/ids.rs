use specprune_spec::SectionId;

/// Suffix of the companion subpackage carrying release metadata.
pub const RELEASE_INFO_SUFFIX: &str = "-release-info";

/// Qualifier suffixes tried for every package.
pub const ID_SUFFIXES: [&str; 2] = ["", RELEASE_INFO_SUFFIX];

/// Every `<kind> <package><suffix>` identifier, kind-major.
///
/// The order only matters for logs; membership is the full cross product.
pub fn section_ids_to_remove<K: AsRef<str>, P: AsRef<str>>(
    kinds: &[K],
    packages: &[P],
) -> Vec<SectionId> {
    let mut ids = Vec::with_capacity(kinds.len() * packages.len() * ID_SUFFIXES.len());
    for kind in kinds {
        for package in packages {
            for suffix in ID_SUFFIXES {
                ids.push(SectionId::new(
                    kind.as_ref(),
                    format!("{}{suffix}", package.as_ref()),
                ));
            }
        }
    }
    ids
}
