//! Edit engine for downstream spec files.
//!
//! Responsibilities:
//! - Derive the section identifiers owned by unsupported subpackages.
//! - Remove those sections and filter the `%install` lines of a primary spec.
//! - Fold the subpackage sections and install lines of spec fragments into it.
//!
//! Every function here works on in-memory [`specprune_spec::Document`]s; saving
//! is left to the caller.

mod error;
mod ids;
mod merge;
mod plan;
mod prune;

pub use error::{EditError, EditResult};
pub use ids::{ID_SUFFIXES, RELEASE_INFO_SUFFIX, section_ids_to_remove};
pub use merge::{
    DEFAULT_TRAILER_LEN, InsertionPoint, MERGEABLE_KINDS, MergeReport, MergedSection,
    merge_document, merge_sections,
};
pub use plan::PrunePlan;
pub use prune::{
    InstallFilter, PruneReport, filter_install_lines, prune_document, remove_unsupported_sections,
};
