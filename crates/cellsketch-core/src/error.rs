//! Error kinds surfaced at the boundary of this crate's public API.
//!
//! Internal index arithmetic that a caller-facing method has already
//! bounds-checked (e.g. a position computed modulo `m` by a [`crate::strategy::HashStrategy`])
//! does not re-validate and does not return a [`Result`].

use std::borrow::Cow;

/// Errors produced by bit-packed cell/bit storage and filter operations.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SketchError {
    /// A dimension (cell count, hash count, bits-per-cell, expected
    /// insertions, false-positive target, or cell index) was out of range.
    #[error("invalid dimension: {reason}")]
    InvalidDimension {
        /// Human-readable description of which dimension failed and why.
        reason: Cow<'static, str>,
    },

    /// Two structures cannot be combined (`union`) or compared (`equals`)
    /// because they differ in size, hash multiplicity, bits-per-cell,
    /// strategy, or funnel identity.
    #[error("incompatible: {reason}")]
    Incompatible {
        /// Human-readable description of the mismatched field.
        reason: Cow<'static, str>,
    },

    /// The operation is declared but deliberately not implemented.
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation {
        /// Name of the operation that was rejected.
        operation: &'static str,
    },

    /// A raw word buffer supplied to `wrap` does not match the expected
    /// logical size.
    #[error("size mismatch: expected {expected} words, got {actual}")]
    SizeMismatch {
        /// Expected word count.
        expected: usize,
        /// Actual word count supplied.
        actual: usize,
    },
}

impl SketchError {
    pub(crate) fn invalid_dimension(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidDimension {
            reason: reason.into(),
        }
    }

    pub(crate) fn incompatible(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Incompatible {
            reason: reason.into(),
        }
    }
}

/// Convenience alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, SketchError>;
