//! Error taxonomy for the dialog stack engine
//!
//! Errors fall into three families:
//! - usage errors, raised at the call that violated a precondition
//! - state-integrity errors, raised when a persisted frame references a dialog
//!   the current catalog does not know
//! - dialog-internal errors, raised by a dialog's own hooks and passed through
//!   untouched

use thiserror::Error;

/// Errors produced by the dialog stack engine and the dialogs it drives
#[derive(Debug, Error)]
pub enum DialogError {
    /// A dialog with this id is already registered in the catalog
    #[error("dialog '{0}' already added")]
    DuplicateId(String),

    /// The requested dialog is not registered in the catalog
    #[error("dialog '{dialog_id}' not found in catalog{}", frame_origin(.persisted))]
    UnknownDialog {
        dialog_id: String,
        /// True when the id came from a persisted stack frame rather than a caller
        persisted: bool,
    },

    /// The operation needs an active dialog but the stack is empty
    #[error("dialog stack is empty")]
    EmptyStack,

    /// A required argument was missing or empty
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    /// The propagation loop ran more hook invocations than allowed for one turn
    #[error("turn exceeded {0} dialog steps")]
    StepLimitExceeded(usize),

    /// The turn was cancelled through its cancellation token
    #[error("turn cancelled")]
    Cancelled,

    /// Persisted state or dialog options could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The state repository failed to load or save
    #[error("storage error: {0}")]
    Storage(String),

    /// Failure raised by a dialog's own logic
    #[error(transparent)]
    Dialog(#[from] anyhow::Error),
}

impl DialogError {
    pub(crate) fn unknown(dialog_id: impl Into<String>) -> Self {
        Self::UnknownDialog {
            dialog_id: dialog_id.into(),
            persisted: false,
        }
    }

    pub(crate) fn unknown_persisted(dialog_id: impl Into<String>) -> Self {
        Self::UnknownDialog {
            dialog_id: dialog_id.into(),
            persisted: true,
        }
    }

    /// Errors the caller should fix at the call site rather than retry
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateId(_)
                | Self::EmptyStack
                | Self::MissingArgument(_)
                | Self::UnknownDialog { persisted: false, .. }
        )
    }

    /// Errors signalling that persisted state no longer matches the catalog
    pub fn is_state_integrity_error(&self) -> bool {
        matches!(self, Self::UnknownDialog { persisted: true, .. })
    }
}

fn frame_origin(persisted: &bool) -> &'static str {
    if *persisted { " (persisted frame)" } else { "" }
}

/// Result alias used across the crate
pub type DialogResult<T> = Result<T, DialogError>;
