//! Export driver: validate, assemble, pack and deliver a card list.
//!
//! ## Order of operations
//!
//! 1. Refuse an empty list ([`ExportError::NothingToExport`]).
//! 2. Validate every card; refuse if any field is missing
//!    ([`ExportError::ValidationFailed`]). Marks are left on the cards.
//! 3. Show the busy indicator.
//! 4. Assemble the content tree (per-card photo failures are skipped).
//! 5. Pack it. Assembly and packing share one blocking thread.
//! 6. Deliver the bytes to the download sink under the configured name.
//! 7. Log and return any failure from steps 3–6.
//! 8. Hide the busy indicator, whatever happened.
//!
//! Nothing here mutates the cards beyond their validation marks, so a failed
//! export can be retried as soon as the cause is fixed.

use crate::card::Card;
use crate::config::{docx_filename, ExportConfig, DOCX_MIME_TYPE};
use crate::error::ExportError;
use crate::output::{ExportOutput, ExportStats};
use crate::pipeline::assemble::{assemble_with, BreakKind};
use crate::pipeline::download::{Download, DownloadSink, FileDownload};
use crate::pipeline::pack::{DocumentPacker, DocxPacker};
use crate::pipeline::validate;
use crate::progress::{BusyGuard, ExportProgressCallback, ProgressCallback};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Export a card list to a `.docx` and deliver it to `sink`.
///
/// # Errors
/// - [`ExportError::NothingToExport`] — `cards` is empty
/// - [`ExportError::ValidationFailed`] — a card misses a field or its photo
/// - [`ExportError::InvalidConfig`] — the layout or filename is unusable
/// - [`ExportError::PackingFailed`] — the packer could not produce a document
/// - [`ExportError::DownloadFailed`] — the sink could not save it
pub async fn export(
    cards: &mut [Card],
    config: &ExportConfig,
    sink: Arc<dyn DownloadSink>,
) -> Result<ExportOutput, ExportError> {
    let total_start = Instant::now();

    // ── Step 1: Guard against an empty list ──────────────────────────────
    if cards.is_empty() {
        info!("Nothing to export");
        return Err(ExportError::NothingToExport);
    }

    // ── Step 2: Validate ─────────────────────────────────────────────────
    if !validate::validate(cards) {
        let invalid_cards = validate::invalid_card_count(cards);
        warn!(
            "Export refused: {}/{} cards incomplete",
            invalid_cards,
            cards.len()
        );
        return Err(ExportError::ValidationFailed { invalid_cards });
    }

    // Configs assembled field by field never went through the builder.
    config.layout.validate()?;
    let filename = docx_filename(&config.filename)?;

    // ── Step 3: Busy indicator on (off again when `busy` drops) ──────────
    info!("Exporting {} cards to {}", cards.len(), filename);
    let busy = BusyGuard::start(config.progress_callback.as_ref(), cards.len());

    match run(cards, config, filename, sink, total_start).await {
        Ok(output) => {
            busy.succeed();
            info!(
                "Export complete: {} cards, {} bytes, {}ms",
                output.stats.total_cards, output.bytes, output.stats.total_duration_ms
            );
            Ok(output)
        }
        Err(e) => {
            error!("Export failed: {}", e);
            Err(e)
        }
    }
}

/// Export and save the document to `output_path`.
///
/// The file name in `output_path` wins over `config.filename` and gets a
/// `.docx` extension when it lacks one, so `report.pdf` is saved as
/// `report.pdf.docx`. [`ExportOutput::filename`] names the file written.
pub async fn export_to_file(
    cards: &mut [Card],
    output_path: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportOutput, ExportError> {
    let (dir, filename) = split_output_path(output_path.as_ref())?;
    let config = ExportConfig {
        filename,
        ..config.clone()
    };
    let sink = Arc::new(FileDownload::into_dir(dir));
    export(cards, &config, sink).await
}

/// Synchronous wrapper around [`export`].
///
/// Creates a temporary tokio runtime internally.
pub fn export_sync(
    cards: &mut [Card],
    config: &ExportConfig,
    sink: Arc<dyn DownloadSink>,
) -> Result<ExportOutput, ExportError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExportError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(export(cards, config, sink))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Steps 4–6.
async fn run(
    cards: &[Card],
    config: &ExportConfig,
    filename: String,
    sink: Arc<dyn DownloadSink>,
    total_start: Instant,
) -> Result<ExportOutput, ExportError> {
    // ── Steps 4 & 5: Assemble and pack (spawn_blocking) ──────────────────
    // Photo decoding and re-encoding happen during assembly.
    let cards = cards.to_vec();
    let layout = config.layout.clone();
    let packer = resolve_packer(config);
    let cb = config.progress_callback.clone();

    let (assembly, images_embedded, bytes, assemble_duration_ms, pack_duration_ms) =
        tokio::task::spawn_blocking(move || {
            let assemble_start = Instant::now();
            let mut assembly = assemble_with(
                &cards,
                &layout,
                |position, total| notify(&cb, |cb| cb.on_card_assembled(position, total)),
                |position, err| {
                    let reason = err.to_string();
                    notify(&cb, |cb| cb.on_image_skipped(position, &reason))
                },
            );
            let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

            let images_embedded = assembly.images_embedded();

            let pack_start = Instant::now();
            let tree = std::mem::take(&mut assembly.tree);
            let bytes = packer.pack(&tree)?;
            let pack_duration_ms = pack_start.elapsed().as_millis() as u64;

            Ok::<_, ExportError>((
                assembly,
                images_embedded,
                bytes,
                assemble_duration_ms,
                pack_duration_ms,
            ))
        })
        .await
        .map_err(|e| ExportError::Internal(format!("Pack task panicked: {}", e)))??;

    notify(&config.progress_callback, |cb| cb.on_packed(bytes.len()));
    let size = bytes.len();

    // ── Step 6: Deliver ──────────────────────────────────────────────────
    let download = Download {
        filename: filename.clone(),
        mime_type: DOCX_MIME_TYPE,
        bytes,
    };
    let delivered = tokio::task::spawn_blocking(move || sink.deliver(download))
        .await
        .map_err(|e| ExportError::Internal(format!("Download task panicked: {}", e)))??;

    let stats = ExportStats {
        total_cards: assembly.placements.len(),
        images_embedded,
        images_skipped: assembly.skipped_images.len(),
        pages: assembly.placements.last().map(|p| p.page + 1).unwrap_or(0),
        page_breaks: assembly.break_count(BreakKind::Page),
        column_breaks: assembly.break_count(BreakKind::Column),
        assemble_duration_ms,
        pack_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(ExportOutput {
        filename,
        location: delivered.path().map(Path::to_path_buf),
        bytes: size,
        placements: assembly.placements,
        skipped_images: assembly.skipped_images,
        stats,
    })
}

fn notify(cb: &Option<ProgressCallback>, f: impl FnOnce(&dyn ExportProgressCallback)) {
    if let Some(cb) = cb {
        f(cb.as_ref());
    }
}

/// Split an output path into its directory and a `.docx` file name.
fn split_output_path(path: &Path) -> Result<(PathBuf, String), ExportError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| {
            ExportError::InvalidConfig(format!(
                "Output path {:?} does not name a file",
                path.display().to_string()
            ))
        })?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, docx_filename(&name)?))
}

/// Use the configured packer, falling back to `docx-rs`.
fn resolve_packer(config: &ExportConfig) -> Arc<dyn DocumentPacker> {
    match config.packer {
        Some(ref packer) => Arc::clone(packer),
        None => Arc::new(DocxPacker),
    }
}
