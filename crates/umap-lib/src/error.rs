//! Error taxonomy for the UMAP engine.
//!
//! Errors surface at well-defined boundaries: configuration problems are
//! raised from `UmapConfig::validate` (via `Umap::new`) before any
//! computation starts; shape and support problems are raised at `fit` /
//! `transform` entry. Numerical degeneracies (too few distinct points,
//! unfilled neighbor slots) are warnings, not errors — the pipeline truncates
//! or skips and continues.

use thiserror::Error;

/// Errors reported by the library API.
#[derive(Debug, Error)]
pub enum UmapError {
    /// An invalid configuration value. Raised synchronously from
    /// validation, never mid-computation.
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter {
        name: &'static str,
        reason: String,
    },

    /// Two inputs whose shapes must agree do not.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    /// An operation the fitted model cannot support.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl UmapError {
    /// Convenience constructor for configuration errors.
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        UmapError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
