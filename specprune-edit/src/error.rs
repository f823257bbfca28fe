//! Error types for specprune-edit.

use specprune_spec::SpecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditError {
    /// The descriptor layer failed (anything but an expected absence).
    #[error(transparent)]
    Descriptor(#[from] SpecError),

    /// The prune plan cannot be applied safely.
    #[error("invalid prune plan: {message}")]
    InvalidPlan { message: String },
}

impl EditError {
    /// Returns true if a descriptor could not be parsed.
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, EditError::Descriptor(e) if e.is_parse_failure())
    }
}

pub type EditResult<T> = Result<T, EditError>;
