// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for people uploading receipt photos.
//
// Every technical error maps to a plain message plus a suggestion. The
// severity tells the HTTP layer whether the caller or the service is at fault.

use crate::error::ScanError;

/// Who has to act for the request to succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The upload or its parameters are wrong; resubmitting unchanged fails again.
    ClientFault,
    /// Something broke inside the pipeline.
    ServerFault,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary.
    pub message: String,
    /// What the user should try next.
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::ImageDecode(detail) => HumanError {
            message: "We couldn't read that picture.".into(),
            suggestion: format!("Upload the receipt as a JPEG or PNG photo. ({detail})"),
            severity: Severity::ClientFault,
        },

        ScanError::InvalidParameter { name, reason } => HumanError {
            message: format!("The setting `{name}` isn't valid."),
            suggestion: format!("Fix the value and try again: {reason}."),
            severity: Severity::ClientFault,
        },

        ScanError::EmptyImage { .. } => HumanError {
            message: "The picture is empty.".into(),
            suggestion: "Take a new photo of the receipt and upload it again.".into(),
            severity: Severity::ClientFault,
        },

        ScanError::ImageEncode(detail) => HumanError {
            message: "We processed the receipt but couldn't save the result.".into(),
            suggestion: format!("Try again in a moment. ({detail})"),
            severity: Severity::ServerFault,
        },

        ScanError::Stage { stage, .. } => HumanError {
            message: format!("Processing stopped during the {stage} step."),
            suggestion: "Try again with a sharper, better-lit photo.".into(),
            severity: Severity::ServerFault,
        },

        ScanError::Io(io_err) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check the path and permissions. ({io_err})"),
            severity: Severity::ServerFault,
        },

        ScanError::Serialization(detail) => HumanError {
            message: "The settings file couldn't be understood.".into(),
            suggestion: format!("Make sure it is valid JSON. ({detail})"),
            severity: Severity::ClientFault,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_errors_blame_the_upload() {
        let human = humanize_error(&ScanError::ImageDecode("not a PNG".into()));
        assert_eq!(human.severity, Severity::ClientFault);
        assert!(human.suggestion.contains("not a PNG"));
    }

    #[test]
    fn parameter_errors_name_the_field() {
        let human = humanize_error(&ScanError::invalid("clahe_grid", "must be at least 1"));
        assert_eq!(human.severity, Severity::ClientFault);
        assert!(human.message.contains("clahe_grid"));
    }

    #[test]
    fn empty_images_blame_the_upload() {
        let human = humanize_error(&ScanError::EmptyImage { stage: "denoise" });
        assert_eq!(human.severity, Severity::ClientFault);
    }

    #[test]
    fn encode_failures_are_server_faults() {
        let human = humanize_error(&ScanError::ImageEncode("png".into()));
        assert_eq!(human.severity, Severity::ServerFault);
    }

    #[test]
    fn stage_failures_are_server_faults() {
        let human = humanize_error(&ScanError::Stage {
            stage: "contrast equalization",
            detail: "tile overflow".into(),
        });
        assert_eq!(human.severity, Severity::ServerFault);
        assert!(human.message.contains("contrast equalization"));
    }
}
