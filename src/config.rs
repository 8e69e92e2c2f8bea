//! Configuration types for card export.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. The page layout knobs live in a nested
//! [`LayoutConfig`] because the assembler only ever needs those, while the
//! export driver also needs the filename, the packer and the progress hook.
//!
//! Every number that shapes the document (column count, gap, margins, font
//! size, photo size, break cadence) is a named option here rather than a
//! constant buried in the assembler.

use crate::error::ExportError;
use crate::pipeline::pack::DocumentPacker;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// MIME type of the generated document.
pub const DOCX_MIME_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Default download name.
pub const DEFAULT_FILENAME: &str = "site_inspection.docx";

/// Page layout and typography for the assembled document.
///
/// Lengths on the page are in twentieths of a point (twips) as Word stores
/// them; font size is in half-points; photo size is in pixels at 96 DPI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Number of text columns per page. Default: 2.
    pub columns: u16,

    /// Gap between columns in twips. Default: 708 (≈ 1.25 cm).
    pub column_space: u32,

    /// Draw a vertical rule between columns. Default: true.
    pub column_separator: bool,

    /// Page margins in twips. Default: 1440 (1 inch) on every side.
    pub margins: PageMargins,

    /// Page size. Default: A4.
    pub page_size: PageSize,

    /// Page orientation. Default: portrait.
    pub orientation: Orientation,

    /// Font size for card text in half-points. Default: 24 (12 pt).
    pub font_size: usize,

    /// Display width of each photo in pixels. Default: 280.
    pub image_width: u32,

    /// Display height of each photo in pixels. Default: 210.
    pub image_height: u32,

    /// Longest edge, in pixels, of the photo data embedded in the file.
    /// Default: 1600.
    ///
    /// Phone cameras produce 4000 px+ images; a report with a dozen of them
    /// would weigh in at tens of megabytes while each is displayed at a few
    /// hundred pixels. Larger photos are downscaled before embedding.
    pub max_image_pixels: u32,

    /// Cards per page before a forced page break. Default: 4.
    pub cards_per_page: usize,

    /// Cards per column before a forced column break. Default: 2.
    pub cards_per_column: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            columns: 2,
            column_space: 708,
            column_separator: true,
            margins: PageMargins::uniform(1440),
            page_size: PageSize::A4,
            orientation: Orientation::Portrait,
            font_size: 24,
            image_width: 280,
            image_height: 210,
            max_image_pixels: 1600,
            cards_per_page: 4,
            cards_per_column: 2,
        }
    }
}

impl LayoutConfig {
    /// Check the cadence and sizes are coherent.
    pub fn validate(&self) -> Result<(), ExportError> {
        if self.columns == 0 {
            return Err(ExportError::InvalidConfig("Columns must be ≥ 1".into()));
        }
        if self.cards_per_column == 0 || self.cards_per_page == 0 {
            return Err(ExportError::InvalidConfig(
                "Cards per page and per column must be ≥ 1".into(),
            ));
        }
        if self.cards_per_page < self.cards_per_column {
            return Err(ExportError::InvalidConfig(format!(
                "Cards per page ({}) must be at least cards per column ({})",
                self.cards_per_page, self.cards_per_column
            )));
        }
        if self.cards_per_page > self.cards_per_column * self.columns as usize {
            return Err(ExportError::InvalidConfig(format!(
                "{} cards per page do not fit in {} column(s) of {}",
                self.cards_per_page, self.columns, self.cards_per_column
            )));
        }
        if self.image_width == 0 || self.image_height == 0 {
            return Err(ExportError::InvalidConfig(
                "Image width and height must be ≥ 1 px".into(),
            ));
        }
        if self.font_size == 0 {
            return Err(ExportError::InvalidConfig(
                "Font size must be ≥ 1 half-point".into(),
            ));
        }
        Ok(())
    }
}

/// Page margins in twips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMargins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl PageMargins {
    pub fn uniform(twips: i32) -> Self {
        Self {
            top: twips,
            right: twips,
            bottom: twips,
            left: twips,
        }
    }
}

/// Paper size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 210 × 297 mm (default).
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
    /// Custom width × height in twips (portrait).
    Custom { width: u32, height: u32 },
}

impl PageSize {
    /// Portrait `(width, height)` in twips.
    pub fn twips(self) -> (u32, u32) {
        match self {
            PageSize::A4 => (11906, 16838),
            PageSize::Letter => (12240, 15840),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Configuration for an export.
///
/// Built via [`ExportConfig::builder()`] or using
/// [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use cards2docx::ExportConfig;
///
/// let config = ExportConfig::builder()
///     .columns(2)
///     .font_size_pt(11)
///     .filename("inspection_report.docx")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Page layout and typography.
    pub layout: LayoutConfig,

    /// Name of the downloaded file. Always ends in `.docx`.
    /// Default: `site_inspection.docx`.
    pub filename: String,

    /// Pre-constructed packer. If None, uses [`crate::DocxPacker`].
    pub packer: Option<Arc<dyn DocumentPacker>>,

    /// Optional busy-indicator / progress callback.
    pub progress_callback: Option<ProgressCallback>,

    /// Number of photos read concurrently when ingesting many cards at
    /// once. Default: 4.
    pub ingest_concurrency: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            filename: DEFAULT_FILENAME.to_string(),
            packer: None,
            progress_callback: None,
            ingest_concurrency: 4,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("layout", &self.layout)
            .field("filename", &self.filename)
            .field("packer", &self.packer.as_ref().map(|_| "<dyn DocumentPacker>"))
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ExportProgressCallback>"),
            )
            .field("ingest_concurrency", &self.ingest_concurrency)
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn layout(mut self, layout: LayoutConfig) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn columns(mut self, n: u16) -> Self {
        self.config.layout.columns = n.max(1);
        self
    }

    pub fn column_space(mut self, twips: u32) -> Self {
        self.config.layout.column_space = twips;
        self
    }

    pub fn column_separator(mut self, v: bool) -> Self {
        self.config.layout.column_separator = v;
        self
    }

    pub fn margins(mut self, margins: PageMargins) -> Self {
        self.config.layout.margins = margins;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        self.config.layout.page_size = size;
        self
    }

    pub fn orientation(mut self, o: Orientation) -> Self {
        self.config.layout.orientation = o;
        self
    }

    /// Font size in half-points (Word's native unit).
    pub fn font_size(mut self, half_points: usize) -> Self {
        self.config.layout.font_size = half_points.clamp(2, 3276);
        self
    }

    /// Font size in whole points.
    pub fn font_size_pt(self, pt: usize) -> Self {
        self.font_size(pt * 2)
    }

    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.config.layout.image_width = width.max(1);
        self.config.layout.image_height = height.max(1);
        self
    }

    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.config.layout.max_image_pixels = px.max(64);
        self
    }

    pub fn cards_per_page(mut self, n: usize) -> Self {
        self.config.layout.cards_per_page = n;
        self
    }

    pub fn cards_per_column(mut self, n: usize) -> Self {
        self.config.layout.cards_per_column = n;
        self
    }

    /// Download name; `.docx` is appended when missing.
    pub fn filename(mut self, name: impl Into<String>) -> Self {
        self.config.filename = name.into();
        self
    }

    pub fn packer(mut self, packer: Arc<dyn DocumentPacker>) -> Self {
        self.config.packer = Some(packer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn ingest_concurrency(mut self, n: usize) -> Self {
        self.config.ingest_concurrency = n.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ExportConfig, ExportError> {
        self.config.layout.validate()?;
        self.config.filename = docx_filename(&self.config.filename)?;
        Ok(self.config)
    }
}

/// Check `name` is a plain file name and give it a `.docx` extension.
///
/// A name already ending in `.docx` (any case) is returned trimmed.
pub fn docx_filename(name: &str) -> Result<String, ExportError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.contains(['/', '\\']) {
        return Err(ExportError::InvalidConfig(format!(
            "Filename must be a plain file name, got {:?}",
            name
        )));
    }
    Ok(if trimmed.to_ascii_lowercase().ends_with(".docx") {
        trimmed.to_string()
    } else {
        format!("{trimmed}.docx")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExportConfig::builder().build().expect("defaults build");
        assert_eq!(config.filename, DEFAULT_FILENAME);
        assert_eq!(config.layout.columns, 2);
        assert_eq!(config.layout.cards_per_page, 4);
        assert_eq!(config.layout.cards_per_column, 2);
    }

    #[test]
    fn docx_extension_is_appended() {
        let config = ExportConfig::builder()
            .filename("inspection_report")
            .build()
            .unwrap();
        assert_eq!(config.filename, "inspection_report.docx");

        let config = ExportConfig::builder()
            .filename("Report.DOCX")
            .build()
            .unwrap();
        assert_eq!(config.filename, "Report.DOCX");
    }

    #[test]
    fn docx_filename_normalises_plain_names() {
        assert_eq!(docx_filename(" report ").unwrap(), "report.docx");
        assert_eq!(docx_filename("report.pdf").unwrap(), "report.pdf.docx");
        assert_eq!(docx_filename("a.Docx").unwrap(), "a.Docx");
        assert!(docx_filename("").is_err());
        assert!(docx_filename("dir/a.docx").is_err());
    }

    #[test]
    fn path_like_filename_is_rejected() {
        let err = ExportConfig::builder()
            .filename("../x.docx")
            .build()
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
    }

    #[test]
    fn cadence_must_fit_columns() {
        let err = ExportConfig::builder()
            .columns(2)
            .cards_per_column(2)
            .cards_per_page(6)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("do not fit"));

        let err = ExportConfig::builder()
            .cards_per_page(1)
            .cards_per_column(2)
            .build()
            .unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
    }

    #[test]
    fn setters_clamp() {
        let config = ExportConfig::builder()
            .columns(0)
            .cards_per_page(2)
            .image_size(0, 0)
            .ingest_concurrency(0)
            .font_size_pt(11)
            .build()
            .unwrap();
        assert_eq!(config.layout.columns, 1);
        assert_eq!(config.layout.image_width, 1);
        assert_eq!(config.ingest_concurrency, 1);
        assert_eq!(config.layout.font_size, 22);
    }

    #[test]
    fn landscape_keeps_portrait_twips() {
        assert_eq!(PageSize::A4.twips(), (11906, 16838));
        assert_eq!(PageSize::Letter.twips(), (12240, 15840));
    }
}
