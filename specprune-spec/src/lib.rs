//! Section-level model of RPM spec files.
//!
//! Responsibilities:
//! - Split a spec file into ordered, named sections (`%package foo`, `%files foo`, ...).
//! - Evaluate `%define` / `%global` against a seeded macro table so that
//!   self-referential definitions resolve.
//! - Hand out scoped mutable access to the sections ([`SectionsSession`]).
//! - Render the document back losslessly and save it.
//!
//! Nothing here understands what a section *means*; callers address sections
//! only through their [`SectionId`].

mod document;
mod error;
mod macros;
mod section;

pub use document::{Document, SectionsSession, macro_definitions};
pub use error::{SpecError, SpecResult};
pub use macros::{BOOTSTRAP_MACROS, MAX_EXPANSION_DEPTH, MacroTable};
pub use section::{
    INSTALL_KIND, SECTION_NAMES, Section, SectionCollection, SectionId, section_header,
};
