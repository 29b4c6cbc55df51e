// Résumé editing sessions: the in-memory draft, its mutation paths, the
// debounced preview, and the save/delete hand-off to the store.

pub mod controller;
pub mod fields;
pub mod handlers;
pub mod preview;
pub mod sessions;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::resume::Section;
use crate::schema::ValidationErrors;
use crate::store::StoreError;

pub use controller::{DeleteOutcome, EditorController};
pub use fields::ResumeField;
pub use preview::PreviewConfig;
pub use sessions::SessionRegistry;

/// Lifecycle of one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Draft matches the last loaded or saved value.
    Clean,
    Dirty,
    Saving,
    /// Terminal: the record is gone and the session has ended.
    Deleted,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("'{0}' is not an editable field")]
    UnknownField(String),

    #[error("Field '{field}' cannot take that value: {message}")]
    FieldType { field: String, message: String },

    #[error("No {section} entry at index {index} (length {len})")]
    IndexOutOfRange {
        section: Section,
        index: usize,
        len: usize,
    },

    #[error("Resume failed validation: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Persistence failed: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("A {0} is already in progress")]
    Busy(&'static str),

    #[error("Operation not allowed while the session is {0:?}")]
    InvalidState(SessionState),

    #[error("Editing session has ended")]
    SessionEnded,

    #[error("Background completion failed: {0}")]
    Interrupted(String),
}
