// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain language with a clear suggestion.
// Local file problems and ledger problems need different remedies (pick
// another file vs. check the wallet or network), so they get different
// wording and severities.

use crate::error::HashmarkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout — trying again may work.
    Transient,
    /// User must do something (choose another file, shorten a title).
    ActionRequired,
    /// Cannot be fixed by retrying or by user action.
    Permanent,
}

/// A human-readable error with a plain-language message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether trying again unchanged can succeed.
    pub retriable: bool,
    pub severity: Severity,
}

impl HumanError {
    fn new(message: &str, suggestion: impl Into<String>, retriable: bool, severity: Severity) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
            retriable,
            severity,
        }
    }
}

/// Convert a `HashmarkError` into a `HumanError`.
pub fn humanize_error(err: &HashmarkError) -> HumanError {
    use Severity::*;

    match err {
        // -- Input validation --
        HashmarkError::NoFileSelected | HashmarkError::UnsupportedInput => HumanError::new(
            "No file selected.",
            "Please choose a document, then try again.",
            false,
            ActionRequired,
        ),

        HashmarkError::FileTooLarge { limit, .. } => HumanError::new(
            "This file is too large.",
            format!(
                "The maximum size is {}. Try a smaller file.",
                format_size(*limit)
            ),
            false,
            ActionRequired,
        ),

        HashmarkError::UnsupportedMediaType(kind) => HumanError::new(
            "Only PDF files are allowed.",
            format!("Save the document as a PDF and upload that instead. (File type: {kind})"),
            false,
            ActionRequired,
        ),

        HashmarkError::MissingTitle => HumanError::new(
            "The record needs a title.",
            "Enter a title for the record, then try again.",
            false,
            ActionRequired,
        ),

        HashmarkError::TitleTooLong { limit, .. } => HumanError::new(
            "The record title is too long.",
            format!("Please keep the title under {limit} characters."),
            false,
            ActionRequired,
        ),

        HashmarkError::PdfError(_) => HumanError::new(
            "There's a problem with this PDF file.",
            "The file may be damaged. Try opening it on a computer first, or choose a different file.",
            false,
            Permanent,
        ),

        // -- Digest errors --
        HashmarkError::ReadError(_) => HumanError::new(
            "The file couldn't be read.",
            "Something interrupted reading the file. Please try again.",
            true,
            Transient,
        ),

        HashmarkError::InvalidDigest(_) => HumanError::new(
            "That fingerprint doesn't look right.",
            "A document fingerprint is 0x followed by 64 hexadecimal characters.",
            false,
            ActionRequired,
        ),

        HashmarkError::InvalidAddress(_) => HumanError::new(
            "That wallet address doesn't look right.",
            "A wallet address is 0x followed by 40 hexadecimal characters.",
            false,
            ActionRequired,
        ),

        HashmarkError::IntegrityMismatch { .. } => HumanError::new(
            "This file has been changed.",
            "Its fingerprint doesn't match the recorded one. Get the file again from the original source.",
            false,
            Permanent,
        ),

        // -- References and ledger --
        HashmarkError::ReferenceUnavailable(_) => HumanError::new(
            "The reference document couldn't be loaded.",
            "It may have been removed. Choose another reference or store it again.",
            false,
            ActionRequired,
        ),

        HashmarkError::LedgerUnavailable(detail) => humanize_ledger_detail(detail),

        HashmarkError::LedgerRejected(detail) => HumanError::new(
            "The ledger refused the request.",
            format!("Check that your wallet owns this document and has enough balance. ({detail})"),
            false,
            ActionRequired,
        ),

        HashmarkError::LedgerResponse(_) => HumanError::new(
            "The ledger sent back data we couldn't understand.",
            "Try again later. If this keeps happening, please report it.",
            true,
            Transient,
        ),

        HashmarkError::Unauthorized => HumanError::new(
            "You're not signed in for publishing.",
            "Sign in and connect your Web3 wallet to continue.",
            false,
            ActionRequired,
        ),

        // -- Storage / config --
        HashmarkError::Database(_) => HumanError::new(
            "The local data store had a problem.",
            "Try again. Your stored references should still be there.",
            true,
            Transient,
        ),

        HashmarkError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError::new(
                "The file couldn't be found.",
                "It may have been moved or deleted. Try choosing the file again.",
                false,
                ActionRequired,
            ),
            std::io::ErrorKind::PermissionDenied => HumanError::new(
                "We don't have permission to read that file.",
                "Check the file permissions, or copy the file somewhere else first.",
                false,
                ActionRequired,
            ),
            _ => HumanError::new(
                "There was a problem reading or writing a file.",
                "Try again. If this keeps happening, your storage may be full.",
                true,
                Transient,
            ),
        },

        HashmarkError::Serialization(_) => HumanError::new(
            "There was an internal data problem.",
            "Try again. If this keeps happening, please report it.",
            true,
            Transient,
        ),

        HashmarkError::Config(detail) => HumanError::new(
            "The settings file has a problem.",
            format!("Fix the setting or delete the file to restore defaults. ({detail})"),
            false,
            Permanent,
        ),
    }
}

/// Parse ledger transport details into human-readable messages.
fn humanize_ledger_detail(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("timed out") || lower.contains("timeout") {
        HumanError::new(
            "The ledger didn't respond in time.",
            "The network may be busy. Check your connection, then try again.",
            true,
            Severity::Transient,
        )
    } else if lower.contains("connection refused") || lower.contains("unreachable") {
        HumanError::new(
            "We couldn't reach the ledger.",
            "Check your internet connection and wallet network, then try again.",
            true,
            Severity::Transient,
        )
    } else if lower.contains("rejected by user") || lower.contains("user denied") {
        HumanError::new(
            "The request was cancelled in your wallet.",
            "Approve the request in your wallet to continue.",
            false,
            Severity::ActionRequired,
        )
    } else {
        HumanError::new(
            "The ledger had a problem.",
            format!("Check your wallet and network connection, then try again. (Detail: {detail})"),
            true,
            Severity::Transient,
        )
    }
}

/// Format a byte count as the largest whole binary unit, e.g. `100 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".into();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_transient() {
        let err = HashmarkError::LedgerUnavailable("getIdByHash timed out after 30s".into());
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::Transient);
        assert!(human.retriable);
    }

    #[test]
    fn no_file_is_action_required() {
        let human = humanize_error(&HashmarkError::NoFileSelected);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(!human.retriable);
    }

    #[test]
    fn oversize_mentions_limit() {
        let err = HashmarkError::FileTooLarge {
            name: "big.pdf".into(),
            size: 101 * 1024 * 1024,
            limit: 100 * 1024 * 1024,
        };
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("100 MB"));
    }

    #[test]
    fn wallet_rejection_needs_action() {
        let err = HashmarkError::LedgerUnavailable("request rejected by user".into());
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn sizes_are_formatted() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(1000), "1000 Bytes");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(10 * 1024 * 1024), "10 MB");
    }
}
