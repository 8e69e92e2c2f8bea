//! The session controller: the single owner of the card list.
//!
//! All mutation goes through [`InspectionSession`]. Front-ends (the CLI, a
//! GUI, a test) render from [`InspectionSession::cards`] and never keep
//! their own copy of card state.

use crate::card::{Card, CardField, CardId, EncodedImage};
use crate::config::ExportConfig;
use crate::error::{ExportError, ImageError};
use crate::export;
use crate::output::ExportOutput;
use crate::pipeline::download::DownloadSink;
use crate::pipeline::ingest::{read_image, IngestOutcome};
use crate::pipeline::validate::{self, FieldIssue};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// An ordered, in-memory list of cards plus the operations on it.
#[derive(Debug, Default)]
pub struct InspectionSession {
    cards: Vec<Card>,
    next_id: u64,
}

impl InspectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Card store ───────────────────────────────────────────────────────

    /// Append a new, empty card and return its id.
    pub fn add_card(&mut self) -> CardId {
        let id = CardId(self.next_id);
        self.next_id += 1;
        self.cards.push(Card::new(id));
        debug!("Added card {}", id);
        id
    }

    /// Remove a card, returning it if it existed.
    pub fn remove_card(&mut self, id: CardId) -> Option<Card> {
        let idx = self.position(id)?;
        debug!("Removed card {}", id);
        Some(self.cards.remove(idx))
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut Card> {
        self.cards.iter_mut().find(|c| c.id == id)
    }

    /// Cards in display (= export) order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// 0-indexed position of a card in the list.
    pub fn position(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|c| c.id == id)
    }

    /// Set one text field. Returns `false` if the card does not exist or
    /// `field` is the image slot.
    pub fn set_field(&mut self, id: CardId, field: CardField, value: impl Into<String>) -> bool {
        self.card_mut(id)
            .map(|c| c.set_text(field, value))
            .unwrap_or(false)
    }

    /// Attach an already-encoded image. Returns `false` for an unknown card.
    pub fn attach_image(&mut self, id: CardId, image: EncodedImage) -> bool {
        match self.card_mut(id) {
            Some(card) => {
                card.attach_image(image);
                true
            }
            None => false,
        }
    }

    // ── Image ingestion ──────────────────────────────────────────────────

    /// Read the selected file (if any) and attach it to the card.
    ///
    /// Never fails loudly: a file that cannot be used is logged and the
    /// card keeps its previous image state, which the validator will
    /// report at export time.
    pub async fn attach_image_file(&mut self, id: CardId, file: Option<&Path>) -> IngestOutcome {
        let Some(path) = file else {
            return IngestOutcome::NoFile;
        };
        if self.card(id).is_none() {
            return IngestOutcome::UnknownCard;
        }
        let result = read_image(path).await;
        self.apply_ingest(id, result)
    }

    /// Read many photos concurrently and attach each to its card.
    ///
    /// Reads complete in any order; each result lands on the card it was
    /// requested for. Outcomes are returned in request order.
    pub async fn attach_images(
        &mut self,
        uploads: Vec<(CardId, PathBuf)>,
        concurrency: usize,
    ) -> Vec<(CardId, IngestOutcome)> {
        let mut reads: Vec<(usize, CardId, Result<EncodedImage, ImageError>)> =
            stream::iter(uploads.into_iter().enumerate().map(|(i, (id, path))| async move {
                let result = read_image(&path).await;
                (i, id, result)
            }))
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

        reads.sort_by_key(|(i, _, _)| *i);
        reads
            .into_iter()
            .map(|(_, id, result)| (id, self.apply_ingest(id, result)))
            .collect()
    }

    fn apply_ingest(&mut self, id: CardId, result: Result<EncodedImage, ImageError>) -> IngestOutcome {
        match result {
            Ok(image) => {
                if self.attach_image(id, image) {
                    IngestOutcome::Attached
                } else {
                    IngestOutcome::UnknownCard
                }
            }
            Err(e) => {
                warn!("Card {}: image not attached: {}", id, e);
                IngestOutcome::Rejected(e)
            }
        }
    }

    // ── Validation & export ──────────────────────────────────────────────

    /// Re-validate every card, updating its marks. See [`validate::validate`].
    pub fn validate(&mut self) -> bool {
        validate::validate(&mut self.cards)
    }

    /// Marked fields from the last validation pass.
    pub fn issues(&self) -> Vec<FieldIssue> {
        validate::issues(&self.cards)
    }

    /// Export all cards. See [`export::export`].
    pub async fn export(
        &mut self,
        config: &ExportConfig,
        sink: Arc<dyn DownloadSink>,
    ) -> Result<ExportOutput, ExportError> {
        export::export(&mut self.cards, config, sink).await
    }

    /// Export all cards and save the document to `path`.
    pub async fn export_to_file(
        &mut self,
        path: impl AsRef<Path>,
        config: &ExportConfig,
    ) -> Result<ExportOutput, ExportError> {
        export::export_to_file(&mut self.cards, path, config).await
    }
}
