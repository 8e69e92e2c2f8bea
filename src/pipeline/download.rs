//! Download delivery: hand the packed document to the user.
//!
//! A [`DownloadSink`] receives a finished [`Download`] and makes it
//! available under its file name. The default [`FileDownload`] saves into a
//! directory through a transient [`DownloadHandle`] (a temp file next to the
//! destination): the handle is either persisted under the final name or
//! released (deleted) when dropped, so a failed save never leaves a partial
//! `.docx` behind and never leaks the temp file.

use crate::error::ExportError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// A packed document waiting to be delivered.
#[derive(Debug, Clone)]
pub struct Download {
    pub filename: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Where a delivered download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    /// Saved to this path.
    Saved(PathBuf),
    /// Accepted by a sink that does not expose a location.
    Accepted,
}

impl Delivered {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Delivered::Saved(p) => Some(p),
            Delivered::Accepted => None,
        }
    }
}

/// Receives finished documents.
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, download: Download) -> Result<Delivered, ExportError>;
}

/// Transient handle to a download being written.
///
/// Dropping it without calling [`DownloadHandle::persist`] deletes the
/// underlying temp file.
pub struct DownloadHandle {
    file: NamedTempFile,
    filename: String,
}

impl DownloadHandle {
    /// Create a handle in `dir` and write `bytes` into it.
    pub fn create(dir: &Path, filename: &str, bytes: &[u8]) -> Result<Self, ExportError> {
        let err = |source| ExportError::DownloadFailed {
            filename: filename.to_string(),
            source,
        };

        let mut file = tempfile::Builder::new()
            .prefix(".cards2docx-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(err)?;
        file.write_all(bytes).map_err(err)?;
        file.as_file().sync_all().map_err(err)?;

        debug!("Opened download handle {}", file.path().display());
        Ok(Self {
            file,
            filename: filename.to_string(),
        })
    }

    /// Temp location while the handle is live.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Move the download into place under `dest`, releasing the handle.
    pub fn persist(self, dest: &Path) -> Result<PathBuf, ExportError> {
        let filename = self.filename;
        self.file
            .persist(dest)
            .map_err(|e| ExportError::DownloadFailed {
                filename,
                source: e.error,
            })?;
        Ok(dest.to_path_buf())
    }
}

/// Saves downloads into a directory.
#[derive(Debug, Clone)]
pub struct FileDownload {
    dir: PathBuf,
}

impl FileDownload {
    /// Save under the download's own file name inside `dir`.
    pub fn into_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for FileDownload {
    fn deliver(&self, download: Download) -> Result<Delivered, ExportError> {
        let name = &download.filename;

        std::fs::create_dir_all(&self.dir).map_err(|source| ExportError::DownloadFailed {
            filename: name.clone(),
            source,
        })?;

        let handle = DownloadHandle::create(&self.dir, name, &download.bytes)?;
        let saved = handle.persist(&self.dir.join(name))?;

        info!("Saved {} ({} bytes)", saved.display(), download.bytes.len());
        Ok(Delivered::Saved(saved))
    }
}
