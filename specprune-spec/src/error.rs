//! Error types for specprune-spec.
//!
//! `NotFound` is the only variant callers are expected to recover from;
//! everything else means the descriptor could not be read, parsed or saved.

use crate::section::SectionId;
use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SpecError {
    /// No section carries the requested identifier.
    #[error("section '{0}' not found")]
    NotFound(SectionId),

    /// The identifier string has no kind.
    #[error("invalid section identifier '{0}'")]
    InvalidSectionId(String),

    /// A line could not be interpreted (e.g. a macro definition without a name).
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A macro definition refers to itself and no earlier value exists to seed it.
    #[error("line {line}: macro '%{name}' refers to itself and has no prior definition")]
    SelfReferentialMacro { name: String, line: usize },

    /// Expansion did not terminate within the depth limit.
    #[error("line {line}: expanding '%{name}' exceeded {limit} levels of recursion")]
    MacroRecursion {
        name: String,
        line: usize,
        limit: usize,
    },

    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document was parsed from a string and has nowhere to be saved.
    #[error("document has no backing path")]
    NoPath,
}

impl SpecError {
    /// Returns true if this is an expected absence rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpecError::NotFound(_))
    }

    /// Returns true if the descriptor text itself could not be understood.
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            SpecError::Parse { .. }
                | SpecError::SelfReferentialMacro { .. }
                | SpecError::MacroRecursion { .. }
        )
    }
}

pub type SpecResult<T> = Result<T, SpecError>;
