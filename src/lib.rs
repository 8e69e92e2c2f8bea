//! # cards2docx
//!
//! Collect site-inspection cards (a photo, a serial number, a location and
//! free-form comments) and export them as a Word document laid out in a
//! two-column grid, four cards to a page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! cards
//!  │
//!  ├─ 1. Ingest    read each selected photo → base64 + MIME
//!  ├─ 2. Validate  mark missing fields / photos on every card
//!  ├─ 3. Assemble  content tree: text, photo, spacer, page/column breaks
//!  ├─ 4. Pack      docx-rs + column layout patch (spawn_blocking)
//!  └─ 5. Download  save under a fixed .docx name via a transient handle
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cards2docx::{CardField, ExportConfig, InspectionSession};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = InspectionSession::new();
//!     let card = session.add_card();
//!     session.set_field(card, CardField::SerialNumber, "A1");
//!     session.set_field(card, CardField::Location, "Room 1");
//!     session.set_field(card, CardField::Comments, "ok");
//!     session.attach_image_file(card, Some(Path::new("a1.jpg"))).await;
//!
//!     let config = ExportConfig::default();
//!     let output = session.export_to_file("site_inspection.docx", &config).await?;
//!     eprintln!("{} cards, {} bytes", output.stats.total_cards, output.bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `cards2docx` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! cards2docx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod card;
pub mod config;
pub mod error;
pub mod export;
pub mod manifest;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use card::{Card, CardField, CardId, CardStatus, EncodedImage, FieldStatus};
pub use config::{
    ExportConfig, ExportConfigBuilder, LayoutConfig, Orientation, PageMargins, PageSize,
    DEFAULT_FILENAME, DOCX_MIME_TYPE,
};
pub use error::{ExportError, ImageError};
pub use export::{export, export_sync, export_to_file};
pub use manifest::{LoadedManifest, Manifest, ManifestCard};
pub use output::{ExportOutput, ExportStats};
pub use pipeline::assemble::{assemble, plan_layout, Assembly, BreakKind, CardPlacement, ContentTree};
pub use pipeline::download::{Delivered, Download, DownloadSink, FileDownload};
pub use pipeline::ingest::IngestOutcome;
pub use pipeline::pack::{DocumentPacker, DocxPacker};
pub use pipeline::validate::{issues, validate, FieldIssue};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::InspectionSession;
