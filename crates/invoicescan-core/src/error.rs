// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for invoicescan.

use thiserror::Error;

/// Top-level error type for all normalization operations.
///
/// Failing to find a document boundary is deliberately absent: it is an
/// expected outcome, handled by passing the uncropped image through.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Codec errors --
    #[error("image decoding failed: {0}")]
    ImageDecode(String),

    #[error("image encoding failed: {0}")]
    ImageEncode(String),

    // -- Precondition errors --
    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{stage} received an image with zero area")]
    EmptyImage { stage: &'static str },

    // -- Internal failures --
    #[error("{stage} failed: {detail}")]
    Stage { stage: &'static str, detail: String },

    // -- I/O and serialization (CLI, config loading) --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScanError {
    /// Shorthand for building an [`ScanError::InvalidParameter`].
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
