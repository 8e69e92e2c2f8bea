//! Packing: [`ContentTree`] → `.docx` bytes.
//!
//! [`DocumentPacker`] is the seam to the document library. The default
//! [`DocxPacker`] builds the document with `docx-rs`, then patches the
//! section properties for the one thing `docx-rs` cannot express through its
//! builder: a multi-column page with a configurable gap and separator rule.
//!
//! ## Why patch the package?
//!
//! `docx-rs` always writes a single-column `<w:cols …/>` element. Rather
//! than fork the writer, the packed archive is reopened, the `<w:cols>` of
//! the body's section properties is rewritten in `word/document.xml`, and
//! every other part is copied through untouched.

use crate::config::Orientation;
use crate::error::ExportError;
use crate::pipeline::assemble::{Block, BreakKind, ContentTree, ImageBlock, SectionLayout, TextBlock};
use docx_rs::{BreakType, Docx, PageMargin, PageOrientationType, Paragraph, Pic, Run};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Turns a content tree into a packed document.
///
/// Implementations run on a blocking thread, so they may do CPU-heavy work
/// synchronously.
pub trait DocumentPacker: Send + Sync {
    fn pack(&self, tree: &ContentTree) -> Result<Vec<u8>, ExportError>;
}

/// The default packer, backed by `docx-rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxPacker;

impl DocumentPacker for DocxPacker {
    fn pack(&self, tree: &ContentTree) -> Result<Vec<u8>, ExportError> {
        let Some(first) = tree.sections.first() else {
            return Err(ExportError::PackingFailed(
                "content tree has no sections".into(),
            ));
        };

        let mut docx = page_setup(Docx::new(), &first.layout);
        for (i, section) in tree.sections.iter().enumerate() {
            // Later sections share the first section's page geometry; they
            // start on a fresh page.
            if i > 0 {
                docx = docx.add_paragraph(break_paragraph(BreakKind::Page));
            }
            for block in &section.blocks {
                docx = docx.add_paragraph(block_paragraph(block));
            }
        }

        let mut cursor = Cursor::new(Vec::new());
        docx.build()
            .pack(&mut cursor)
            .map_err(|e| ExportError::PackingFailed(e.to_string()))?;
        let packed = cursor.into_inner();
        debug!("docx-rs packed {} bytes", packed.len());

        apply_columns(&packed, &first.layout)
    }
}

fn page_setup(docx: Docx, layout: &SectionLayout) -> Docx {
    let (mut width, mut height) = layout.page_size.twips();
    if layout.orientation == Orientation::Landscape {
        std::mem::swap(&mut width, &mut height);
    }

    let margins = PageMargin::new()
        .top(layout.margins.top)
        .right(layout.margins.right)
        .bottom(layout.margins.bottom)
        .left(layout.margins.left);

    let docx = docx.page_size(width, height).page_margin(margins);
    match layout.orientation {
        Orientation::Portrait => docx,
        Orientation::Landscape => docx.page_orient(PageOrientationType::Landscape),
    }
}

fn block_paragraph(block: &Block) -> Paragraph {
    match block {
        Block::Text(text) => text_paragraph(text),
        Block::Image(image) => image_paragraph(image),
        Block::Spacer => Paragraph::new(),
        Block::Break(kind) => break_paragraph(*kind),
    }
}

/// One paragraph, lines separated by soft line breaks.
fn text_paragraph(text: &TextBlock) -> Paragraph {
    let mut para = Paragraph::new();
    for (i, line) in text.lines.iter().enumerate() {
        for (j, run) in line.iter().enumerate() {
            let mut r = Run::new();
            if i > 0 && j == 0 {
                r = r.add_break(BreakType::TextWrapping);
            }
            r = r.add_text(&run.text).size(run.size);
            if run.bold {
                r = r.bold();
            }
            para = para.add_run(r);
        }
    }
    para
}

fn image_paragraph(image: &ImageBlock) -> Paragraph {
    let pic = Pic::new_with_dimensions(image.data.clone(), image.width, image.height);
    Paragraph::new().add_run(Run::new().add_image(pic))
}

fn break_paragraph(kind: BreakKind) -> Paragraph {
    let ty = match kind {
        BreakKind::Page => BreakType::Page,
        BreakKind::Column => BreakType::Column,
    };
    Paragraph::new().add_run(Run::new().add_break(ty))
}

// ── Section column patch ─────────────────────────────────────────────────────

static RE_COLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<w:cols\b[^>]*?(?:/>|>.*?</w:cols>)").unwrap());

/// The `<w:cols>` element for a layout.
pub fn cols_element(layout: &SectionLayout) -> String {
    format!(
        r#"<w:cols w:num="{}" w:space="{}" w:sep="{}" />"#,
        layout.columns,
        layout.column_space,
        if layout.column_separator { 1 } else { 0 }
    )
}

/// Rewrite the body-level section's column settings inside `document.xml`.
///
/// Returns `None` when the document has no body-level `<w:sectPr>`.
pub fn patch_document_xml(xml: &str, layout: &SectionLayout) -> Option<String> {
    let body_end = xml.rfind("</w:body>")?;
    let sect_start = xml[..body_end].rfind("<w:sectPr")?;
    let sect_end = sect_start + xml[sect_start..body_end].find("</w:sectPr>")?;

    let section = &xml[sect_start..sect_end];
    let cols = cols_element(layout);
    let patched = if RE_COLS.is_match(section) {
        RE_COLS.replace(section, cols.as_str()).into_owned()
    } else {
        format!("{section}{cols}")
    };

    let mut out = String::with_capacity(xml.len() + cols.len());
    out.push_str(&xml[..sect_start]);
    out.push_str(&patched);
    out.push_str(&xml[sect_end..]);
    Some(out)
}

/// Reopen a packed document and apply the column layout to it.
fn apply_columns(packed: &[u8], layout: &SectionLayout) -> Result<Vec<u8>, ExportError> {
    let fail = |what: &str, e: &dyn std::fmt::Display| {
        ExportError::PackingFailed(format!("column layout: {what}: {e}"))
    };

    let mut archive = ZipArchive::new(Cursor::new(packed)).map_err(|e| fail("open package", &e))?;

    let mut document_xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| fail("find word/document.xml", &e))?
        .read_to_string(&mut document_xml)
        .map_err(|e| fail("read word/document.xml", &e))?;

    let patched = patch_document_xml(&document_xml, layout).ok_or_else(|| {
        ExportError::PackingFailed("column layout: document has no section properties".into())
    })?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(packed.len())));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let file = archive.by_index(i).map_err(|e| fail("read entry", &e))?;
        if file.name() == "word/document.xml" {
            drop(file);
            writer
                .start_file("word/document.xml", options)
                .map_err(|e| fail("write entry", &e))?;
            writer
                .write_all(patched.as_bytes())
                .map_err(|e| fail("write entry", &e))?;
        } else {
            writer.raw_copy_file(file).map_err(|e| fail("copy entry", &e))?;
        }
    }

    let out = writer
        .finish()
        .map_err(|e| fail("finish package", &e))?
        .into_inner();
    debug!(
        "Applied {}-column layout ({} bytes)",
        layout.columns,
        out.len()
    );
    Ok(out)
}
