//! Card manifests: a JSON description of a card list on disk.
//!
//! ```json
//! {
//!   "cards": [
//!     { "serial_number": "A1", "location": "Room 1",
//!       "comments": "ok", "image": "photos/a1.jpg" }
//!   ]
//! }
//! ```
//!
//! Every field is optional so half-finished manifests still load; missing
//! values surface as validation marks, exactly like empty form fields.
//! Relative image paths are resolved against the manifest's directory.

use crate::card::CardField;
use crate::error::ExportError;
use crate::pipeline::ingest::IngestOutcome;
use crate::session::InspectionSession;
use crate::CardId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub cards: Vec<ManifestCard>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestCard {
    #[serde(default, alias = "sn")]
    pub serial_number: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub comments: String,
    #[serde(default)]
    pub image: Option<PathBuf>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load and parse a manifest file.
    pub async fn load(path: &Path) -> Result<Self, ExportError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExportError::ManifestNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ExportError::ManifestInvalid {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                }
            }
        })?;

        Self::from_json(&text).map_err(|e| ExportError::ManifestInvalid {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

/// Summary of loading a manifest into a session.
#[derive(Debug)]
pub struct LoadedManifest {
    pub session: InspectionSession,
    /// Image outcome for every card that named an image.
    pub images: Vec<(CardId, IngestOutcome)>,
}

impl InspectionSession {
    /// Build a session from a manifest, reading all photos concurrently.
    ///
    /// `base_dir` anchors relative image paths.
    pub async fn from_manifest(
        manifest: &Manifest,
        base_dir: &Path,
        ingest_concurrency: usize,
    ) -> LoadedManifest {
        let mut session = InspectionSession::new();
        let mut uploads = Vec::new();

        for entry in &manifest.cards {
            let id = session.add_card();
            session.set_field(id, CardField::SerialNumber, entry.serial_number.clone());
            session.set_field(id, CardField::Location, entry.location.clone());
            session.set_field(id, CardField::Comments, entry.comments.clone());
            if let Some(ref image) = entry.image {
                uploads.push((id, resolve_path(base_dir, image)));
            }
        }

        let images = session.attach_images(uploads, ingest_concurrency).await;
        info!(
            "Loaded {} cards ({} of {} images attached)",
            session.len(),
            images.iter().filter(|(_, o)| o.is_attached()).count(),
            images.len()
        );

        LoadedManifest { session, images }
    }

    /// Load a manifest file into a new session.
    pub async fn load_manifest(
        path: &Path,
        ingest_concurrency: usize,
    ) -> Result<LoadedManifest, ExportError> {
        let manifest = Manifest::load(path).await?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::from_manifest(&manifest, base_dir, ingest_concurrency).await)
    }
}

fn resolve_path(base_dir: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_and_partial_cards() {
        let m = Manifest::from_json(
            r#"{"cards": [
                {"serial_number": "A1", "location": "Room 1", "comments": "ok", "image": "a.jpg"},
                {"sn": "B2"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(m.cards.len(), 2);
        assert_eq!(m.cards[0].image.as_deref(), Some(Path::new("a.jpg")));
        assert_eq!(m.cards[1].serial_number, "B2");
        assert!(m.cards[1].location.is_empty());
        assert!(m.cards[1].image.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Manifest::from_json(r#"{"cards": [{"serial": "A1"}]}"#).is_err());
    }

    #[test]
    fn empty_object_is_empty_manifest() {
        assert!(Manifest::from_json("{}").unwrap().cards.is_empty());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        assert_eq!(
            resolve_path(Path::new("/data"), Path::new("p/a.jpg")),
            PathBuf::from("/data/p/a.jpg")
        );
        assert_eq!(
            resolve_path(Path::new("/data"), Path::new("/abs/a.jpg")),
            PathBuf::from("/abs/a.jpg")
        );
    }

    #[test]
    fn missing_manifest_is_not_found() {
        let err = tokio_test::block_on(Manifest::load(Path::new("/no/such/cards.json")))
            .unwrap_err();
        assert!(matches!(err, ExportError::ManifestNotFound { .. }));
    }

    #[test]
    fn loads_session_with_text_and_image_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.jpg"), b"nope").unwrap();
        let manifest_path = dir.path().join("cards.json");
        std::fs::write(
            &manifest_path,
            r#"{"cards": [{"sn": "A1", "location": "L", "comments": "C", "image": "bad.jpg"}, {"sn": "B2"}]}"#,
        )
        .unwrap();

        let loaded =
            tokio_test::block_on(InspectionSession::load_manifest(&manifest_path, 2)).unwrap();
        assert_eq!(loaded.session.len(), 2);
        assert_eq!(loaded.session.cards()[0].serial_number, "A1");
        assert_eq!(loaded.images.len(), 1);
        assert!(matches!(loaded.images[0].1, IngestOutcome::Rejected(_)));
    }
}
