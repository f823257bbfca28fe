//! Port traits abstracting all I/O away from the pipeline.

use camino::Utf8Path;
use specprune_spec::{Document, MacroTable};

/// Source of parsed spec files.
pub trait DescriptorSource {
    /// Parse the spec at `path`, seeding its macro table with `macros`.
    fn load(&self, path: &Utf8Path, macros: &MacroTable) -> anyhow::Result<Document>;
}

/// Destination for the edited primary spec.
pub trait DescriptorSink {
    fn save(&self, doc: &Document) -> anyhow::Result<()>;
}
