//! Result types returned by a successful export.

use crate::error::ImageError;
use crate::pipeline::assemble::CardPlacement;
use serde::Serialize;
use std::path::PathBuf;

/// Everything known about a finished export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportOutput {
    /// Name the document was delivered under.
    pub filename: String,
    /// Where it was saved, for sinks that save to disk.
    pub location: Option<PathBuf>,
    /// Size of the packed document.
    pub bytes: usize,
    /// Grid position of every card.
    pub placements: Vec<CardPlacement>,
    /// Photos left out of the document.
    pub skipped_images: Vec<ImageError>,
    pub stats: ExportStats,
}

/// Counters and timings for one export.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportStats {
    pub total_cards: usize,
    pub images_embedded: usize,
    pub images_skipped: usize,
    pub pages: usize,
    pub page_breaks: usize,
    pub column_breaks: usize,
    pub assemble_duration_ms: u64,
    pub pack_duration_ms: u64,
    pub total_duration_ms: u64,
}
