//! Error types for channel configuration handling.

use thiserror::Error;

/// Errors raised while reading channel descriptions.
///
/// Unresolvable tokens are not errors: they leave the property unset and
/// are only logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfError {
    /// The line carries no channel.
    #[error("Empty channel line")]
    EmptyLine,

    /// The line is a `#` comment or header.
    #[error("Comment line")]
    Comment,

    /// A DVBv5 file whose first section lacks a required key.
    #[error("Incorrect file format: section [{section}] has no {missing}")]
    IncorrectFormat {
        section: String,
        missing: &'static str,
    },

    /// A DVBv5 file without any `[section]`.
    #[error("Incorrect file format: no sections found")]
    NoSections,
}

impl ConfError {
    /// Returns true for lines that are skipped silently on read.
    pub fn is_skippable(&self) -> bool {
        matches!(self, ConfError::EmptyLine | ConfError::Comment)
    }
}
