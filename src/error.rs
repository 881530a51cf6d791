//! Error types for clip lookup, frame access and animation data loading.
//!
//! Lookup failures are hard errors: asking for a clip that does not exist is
//! a caller bug, so nothing here degrades to a silent no-op.

use thiserror::Error;

/// Convenience alias used by every fallible animation API.
pub type Result<T> = std::result::Result<T, AnimationError>;

#[derive(Error, Debug)]
pub enum AnimationError {
    /// A clip lookup by name or id matched nothing.
    #[error("no such animation with {kind}: {key}")]
    NotFound {
        /// Which key was used (`"name"` or `"id"`).
        kind: &'static str,
        /// The key as text.
        key: String,
    },

    /// Index-based clip or frame access outside `[0, len)`.
    #[error("{what} index {index} out of range (len {len})")]
    OutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Clip data breaking the frame/duration invariants.
    #[error("invalid animation '{clip}': {reason}")]
    InvalidAsset { clip: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse animation data: {0}")]
    Parse(#[from] serde_json::Error),
}

impl AnimationError {
    pub(crate) fn not_found_name(name: &str) -> Self {
        AnimationError::NotFound {
            kind: "name",
            key: name.to_string(),
        }
    }

    pub(crate) fn not_found_id(id: impl std::fmt::Display) -> Self {
        AnimationError::NotFound {
            kind: "id",
            key: id.to_string(),
        }
    }

    pub(crate) fn invalid(clip: &str, reason: impl Into<String>) -> Self {
        AnimationError::InvalidAsset {
            clip: clip.to_string(),
            reason: reason.into(),
        }
    }
}
