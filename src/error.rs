// Error taxonomy for the authoring core.
// Both conditions are local and recoverable: the operation is rejected and
// the document is left untouched.

use thiserror::Error;

/// Result of an editing operation
pub type EditResult<T> = Result<T, EditorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// The selection provider handed over an out-of-bounds or otherwise
    /// malformed anchor/focus pair.
    #[error("invalid selection: {message}")]
    InvalidSelection { message: String },

    /// Markup input could not be parsed back into a document.
    #[error("malformed markup at byte {offset}: {message}")]
    MalformedMarkup { offset: usize, message: String },
}

impl EditorError {
    pub(crate) fn invalid_selection(message: impl Into<String>) -> Self {
        EditorError::InvalidSelection {
            message: message.into(),
        }
    }

    pub(crate) fn malformed_markup(offset: usize, message: impl Into<String>) -> Self {
        EditorError::MalformedMarkup {
            offset,
            message: message.into(),
        }
    }
}
