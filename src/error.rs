//! Error types for the cards2docx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ExportError`] — **Fatal** for the current export attempt: nothing to
//!   export, required fields missing, the packer or the download failed.
//!   Returned as `Err(ExportError)` from [`crate::export::export`] and
//!   friends. The session itself is untouched, so the caller can fix the
//!   cards and try again straight away.
//!
//! * [`ImageError`] — **Non-fatal**: one card's photo could not be read or
//!   embedded. At ingestion time the card simply stays without an image;
//!   at assembly time the image is left out and the card's text still
//!   makes it into the document. Collected in
//!   [`crate::output::ExportOutput::skipped_images`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by an export attempt.
#[derive(Debug, Error)]
pub enum ExportError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The session holds no cards.
    #[error("Nothing to export: add at least one card first")]
    NothingToExport,

    /// At least one card is missing a required field or its photo.
    ///
    /// The per-field details live on the cards themselves
    /// (see [`crate::card::Card::status`]); this message stays generic.
    #[error("Please fill in all required fields ({invalid_cards} card(s) incomplete)")]
    ValidationFailed { invalid_cards: usize },

    // ── Manifest errors ───────────────────────────────────────────────────
    /// Card manifest was not found at the given path.
    #[error("Card manifest not found: '{path}'")]
    ManifestNotFound { path: PathBuf },

    /// Card manifest exists but is not valid JSON of the expected shape.
    #[error("Card manifest '{path}' is invalid: {detail}")]
    ManifestInvalid { path: PathBuf, detail: String },

    // ── Packing errors ────────────────────────────────────────────────────
    /// The document packer failed to produce a byte blob.
    #[error("An error occurred while exporting the document: {0}")]
    PackingFailed(String),

    // ── Download errors ───────────────────────────────────────────────────
    /// The packed document could not be handed to the download sink.
    #[error("Failed to save '{filename}': {source}")]
    DownloadFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ExportError {
    /// True when the export was refused before any document work started.
    ///
    /// The busy indicator is never shown for these.
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            ExportError::NothingToExport | ExportError::ValidationFailed { .. }
        )
    }
}

/// A non-fatal error for a single card's photo.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum ImageError {
    /// The selected file could not be read.
    #[error("Cannot read image '{path}': {detail}")]
    Unreadable { path: PathBuf, detail: String },

    /// The selected file is not an image type we accept.
    #[error("'{path}' is not a supported image (png, jpeg, gif, webp, bmp)")]
    UnsupportedFormat { path: PathBuf },

    /// The stored encoded image is not valid base64 / data-URL.
    #[error("Card {card}: image data is malformed: {detail}")]
    Malformed { card: usize, detail: String },

    /// The image bytes could not be decoded or re-encoded for embedding.
    #[error("Card {card}: image could not be embedded: {detail}")]
    EmbedFailed { card: usize, detail: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failed_display() {
        let e = ExportError::ValidationFailed { invalid_cards: 2 };
        let msg = e.to_string();
        assert!(msg.contains("fill in all required fields"), "got: {msg}");
        assert!(msg.contains('2'));
    }

    #[test]
    fn packing_failed_carries_description() {
        let e = ExportError::PackingFailed("zip writer closed".into());
        assert!(e.to_string().contains("zip writer closed"));
    }

    #[test]
    fn rejected_input_classification() {
        assert!(ExportError::NothingToExport.is_rejected_input());
        assert!(ExportError::ValidationFailed { invalid_cards: 1 }.is_rejected_input());
        assert!(!ExportError::PackingFailed("x".into()).is_rejected_input());
    }

    #[test]
    fn image_error_mentions_card() {
        let e = ImageError::EmbedFailed {
            card: 3,
            detail: "bad huffman table".into(),
        };
        assert!(e.to_string().contains("Card 3"));
    }
}
