// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every command is a single linear pipeline, so every error
// is fatal for that command. The variants only exist to give
// the user a precise diagnostic:
//
//   Config        — bad hyperparameter or unknown model name
//   DataFormat    — malformed CSV row or undecodable image
//   ShapeMismatch — checkpoint does not fit the requested model,
//                   or a model emits something other than one
//                   logit per letter
//   Io            — missing / unreadable / unwritable path

use std::path::Path;
use thiserror::Error;

use crate::domain::sample::NUM_CLASSES;

#[derive(Debug, Error)]
pub enum SignError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed data in '{path}': {reason}")]
    DataFormat { path: String, reason: String },

    #[error("'{path}' does not match '{expected}': {reason}")]
    ShapeMismatch {
        path:     String,
        expected: String,
        reason:   String,
    },

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SignError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    pub fn data_format(path: &Path, reason: impl Into<String>) -> Self {
        Self::DataFormat {
            path:   path.display().to_string(),
            reason: reason.into(),
        }
    }

    /// Model output that cannot be read as one logit per letter.
    pub fn model_output(reason: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            path:     "model output".to_string(),
            expected: format!("{NUM_CLASSES} class logits"),
            reason:   reason.into(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io { path: path.display().to_string(), source }
    }
}

pub type SignResult<T> = Result<T, SignError>;
