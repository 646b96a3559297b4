#![forbid(unsafe_code)]

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing bindings or loading options.
///
/// Navigation itself never fails; these only surface from constructors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid key binding {binding:?}: {reason}")]
    KeyBinding { binding: String, reason: String },

    #[error("invalid option {name}: {reason}")]
    InvalidOption { name: String, reason: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    #[must_use]
    pub fn key_binding(binding: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyBinding {
            binding: binding.into(),
            reason: reason.into(),
        }
    }
}
