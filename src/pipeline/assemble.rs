//! Document assembly: card list → library-agnostic [`ContentTree`].
//!
//! ## Per-card layout
//!
//! ```text
//! ┌ Text    S/N: A1        (bold)
//! │         Location: Room 1
//! │         Comments: ok
//! ├ Image   photo at the configured display size   (only if present)
//! ├ Spacer
//! └ Break   page / column / nothing, per the break policy
//! ```
//!
//! ## Break policy
//!
//! Cards flow down a column; the section has `columns` columns. After card
//! `i` (0-indexed) that is not the last card, with `p = i % cards_per_page`:
//!
//! * `p == cards_per_page - 1` → page break
//! * `(p + 1) % cards_per_column == 0` → column break
//!
//! With the defaults (2 columns, 2 cards per column, 4 per page) every page
//! holds a 2 × 2 grid. Nothing is ever emitted after the last card, so the
//! document never ends on an empty page or column.

use crate::card::{Card, CardField};
use crate::config::{LayoutConfig, Orientation, PageMargins, PageSize};
use crate::error::ImageError;
use crate::pipeline::encode::embed_image;
use serde::Serialize;
use tracing::{debug, warn};

// ── Content tree ─────────────────────────────────────────────────────────────

/// The whole document before packing.
#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    pub sections: Vec<Section>,
}

impl ContentTree {
    /// All blocks across sections, in document order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.sections.iter().flat_map(|s| s.blocks.iter())
    }
}

/// A run of blocks sharing one page layout.
#[derive(Debug, Clone)]
pub struct Section {
    pub layout: SectionLayout,
    pub blocks: Vec<Block>,
}

/// Page geometry of a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionLayout {
    pub columns: u16,
    /// Gap between columns in twips.
    pub column_space: u32,
    pub column_separator: bool,
    pub margins: PageMargins,
    pub page_size: PageSize,
    pub orientation: Orientation,
}

impl From<&LayoutConfig> for SectionLayout {
    fn from(cfg: &LayoutConfig) -> Self {
        Self {
            columns: cfg.columns,
            column_space: cfg.column_space,
            column_separator: cfg.column_separator,
            margins: cfg.margins,
            page_size: cfg.page_size,
            orientation: cfg.orientation,
        }
    }
}

/// One content block.
#[derive(Debug, Clone)]
pub enum Block {
    Text(TextBlock),
    Image(ImageBlock),
    /// An empty paragraph separating one card from the next.
    Spacer,
    Break(BreakKind),
}

/// A paragraph made of lines, each line made of styled runs.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<Vec<TextRun>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub bold: bool,
    /// Size in half-points.
    pub size: usize,
}

/// An embedded picture.
#[derive(Debug, Clone)]
pub struct ImageBlock {
    /// Encoded picture bytes.
    pub data: Vec<u8>,
    pub format: ImageFormatTag,
    /// Display size in pixels.
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormatTag {
    Png,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BreakKind {
    Page,
    Column,
}

// ── Layout planning ──────────────────────────────────────────────────────────

/// Where a card lands on the page grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CardPlacement {
    pub card_index: usize,
    /// 0-indexed page.
    pub page: usize,
    /// 0-indexed column within the page.
    pub column: usize,
    pub break_after: Option<BreakKind>,
}

/// The forced break, if any, that follows card `index` of `total`.
pub fn break_after(index: usize, total: usize, layout: &LayoutConfig) -> Option<BreakKind> {
    if index + 1 >= total {
        return None;
    }
    let per_page = layout.cards_per_page.max(1);
    let per_column = layout.cards_per_column.max(1);
    let p = index % per_page;

    if p == per_page - 1 {
        Some(BreakKind::Page)
    } else if (p + 1) % per_column == 0 {
        Some(BreakKind::Column)
    } else {
        None
    }
}

/// Compute the page/column grid position of every card.
pub fn plan_layout(total: usize, layout: &LayoutConfig) -> Vec<CardPlacement> {
    let per_page = layout.cards_per_page.max(1);
    let per_column = layout.cards_per_column.max(1);

    (0..total)
        .map(|i| CardPlacement {
            card_index: i,
            page: i / per_page,
            column: (i % per_page) / per_column,
            break_after: break_after(i, total, layout),
        })
        .collect()
}

// ── Assembly ─────────────────────────────────────────────────────────────────

/// Result of assembling a card list.
#[derive(Debug, Clone)]
pub struct Assembly {
    pub tree: ContentTree,
    pub placements: Vec<CardPlacement>,
    /// Photos that could not be embedded; their cards' text is still present.
    pub skipped_images: Vec<ImageError>,
}

impl Assembly {
    pub fn images_embedded(&self) -> usize {
        self.tree
            .blocks()
            .filter(|b| matches!(b, Block::Image(_)))
            .count()
    }

    pub fn break_count(&self, kind: BreakKind) -> usize {
        self.placements
            .iter()
            .filter(|p| p.break_after == Some(kind))
            .count()
    }
}

/// Build the text block for one card.
pub fn card_text(card: &Card, layout: &LayoutConfig) -> TextBlock {
    let line = |field: CardField, bold: bool| {
        let value = card.text(field).unwrap_or_default();
        vec![TextRun {
            text: format!("{}: {}", field.label(), value),
            bold,
            size: layout.font_size,
        }]
    };

    TextBlock {
        lines: vec![
            line(CardField::SerialNumber, true),
            line(CardField::Location, false),
            line(CardField::Comments, false),
        ],
    }
}

/// Build the blocks for one card, without the trailing break.
///
/// `position` is 1-indexed. A photo that cannot be embedded is returned as
/// the error half of the tuple and simply left out of the blocks.
pub fn assemble_card(
    card: &Card,
    position: usize,
    layout: &LayoutConfig,
) -> (Vec<Block>, Option<ImageError>) {
    let mut blocks = vec![Block::Text(card_text(card, layout))];
    let mut skipped = None;

    if let Some(ref image) = card.image {
        match embed_image(image, position, layout.max_image_pixels) {
            Ok(embedded) => blocks.push(Block::Image(ImageBlock {
                data: embedded.png,
                format: ImageFormatTag::Png,
                width: layout.image_width,
                height: layout.image_height,
            })),
            Err(e) => {
                warn!("Skipping image of card {}: {}", position, e);
                skipped = Some(e);
            }
        }
    }

    blocks.push(Block::Spacer);
    (blocks, skipped)
}

/// Assemble the whole card list into a single-section content tree.
///
/// Validation is the caller's business; incomplete cards are rendered with
/// whatever they have.
pub fn assemble(cards: &[Card], layout: &LayoutConfig) -> Assembly {
    assemble_with(cards, layout, |_, _| {}, |_, _| {})
}

/// [`assemble`] with per-card hooks, used by the export driver to report
/// progress.
pub(crate) fn assemble_with(
    cards: &[Card],
    layout: &LayoutConfig,
    mut on_card: impl FnMut(usize, usize),
    mut on_skip: impl FnMut(usize, &ImageError),
) -> Assembly {
    let total = cards.len();
    let placements = plan_layout(total, layout);
    let mut blocks = Vec::with_capacity(total * 4);
    let mut skipped_images = Vec::new();

    for (card, placement) in cards.iter().zip(&placements) {
        let position = placement.card_index + 1;
        let (card_blocks, skipped) = assemble_card(card, position, layout);
        blocks.extend(card_blocks);

        if let Some(kind) = placement.break_after {
            blocks.push(Block::Break(kind));
        }
        if let Some(e) = skipped {
            on_skip(position, &e);
            skipped_images.push(e);
        }
        on_card(position, total);
    }

    debug!(
        "Assembled {} cards into {} blocks ({} images skipped)",
        total,
        blocks.len(),
        skipped_images.len()
    );

    Assembly {
        tree: ContentTree {
            sections: vec![Section {
                layout: SectionLayout::from(layout),
                blocks,
            }],
        },
        placements,
        skipped_images,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::{CardId, EncodedImage};
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn jpeg() -> EncodedImage {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 6, Rgb([1, 2, 3])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .unwrap();
        EncodedImage::from_bytes("image/jpeg", &buf)
    }

    fn card(n: u64, with_image: bool) -> Card {
        let mut c = Card::new(CardId(n));
        c.serial_number = format!("SN-{n}");
        c.location = format!("Room {n}");
        c.comments = "ok".into();
        if with_image {
            c.attach_image(jpeg());
        }
        c
    }

    fn breaks(total: usize, layout: &LayoutConfig) -> Vec<Option<BreakKind>> {
        (0..total).map(|i| break_after(i, total, layout)).collect()
    }

    #[test]
    fn card_with_image_yields_text_image_spacer() {
        let layout = LayoutConfig::default();
        let (blocks, skipped) = assemble_card(&card(1, true), 1, &layout);
        assert!(skipped.is_none());
        assert_eq!(blocks.len(), 3);
        assert!(matches!(blocks[0], Block::Text(_)));
        assert!(matches!(blocks[1], Block::Image(_)));
        assert!(matches!(blocks[2], Block::Spacer));
    }

    #[test]
    fn card_without_image_yields_text_spacer() {
        let layout = LayoutConfig::default();
        let (blocks, skipped) = assemble_card(&card(1, false), 1, &layout);
        assert!(skipped.is_none());
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Text(_)));
        assert!(matches!(blocks[1], Block::Spacer));
    }

    #[test]
    fn text_block_has_three_labelled_lines_with_bold_serial() {
        let layout = LayoutConfig {
            font_size: 22,
            ..LayoutConfig::default()
        };
        let text = card_text(&card(7, false), &layout);
        assert_eq!(text.lines.len(), 3);
        assert_eq!(text.lines[0][0].text, "S/N: SN-7");
        assert!(text.lines[0][0].bold);
        assert_eq!(text.lines[1][0].text, "Location: Room 7");
        assert!(!text.lines[1][0].bold);
        assert_eq!(text.lines[2][0].text, "Comments: ok");
        assert!(text.lines.iter().flatten().all(|r| r.size == 22));
    }

    #[test]
    fn image_block_uses_configured_display_size() {
        let layout = LayoutConfig {
            image_width: 300,
            image_height: 200,
            ..LayoutConfig::default()
        };
        let (blocks, _) = assemble_card(&card(1, true), 1, &layout);
        match &blocks[1] {
            Block::Image(img) => {
                assert_eq!((img.width, img.height), (300, 200));
                assert_eq!(img.format, ImageFormatTag::Png);
                assert!(img.data.starts_with(b"\x89PNG"));
            }
            other => panic!("expected image block, got {other:?}"),
        }
    }

    #[test]
    fn four_cards_column_break_after_second_no_trailing_break() {
        let layout = LayoutConfig::default();
        assert_eq!(
            breaks(4, &layout),
            vec![None, Some(BreakKind::Column), None, None]
        );
    }

    #[test]
    fn page_break_after_fourth_card_when_more_follow() {
        let layout = LayoutConfig::default();
        assert_eq!(
            breaks(9, &layout),
            vec![
                None,
                Some(BreakKind::Column),
                None,
                Some(BreakKind::Page),
                None,
                Some(BreakKind::Column),
                None,
                Some(BreakKind::Page),
                None,
            ]
        );
    }

    #[test]
    fn single_card_has_no_breaks() {
        assert_eq!(breaks(1, &LayoutConfig::default()), vec![None]);
    }

    #[test]
    fn placements_form_two_by_two_grid() {
        let grid: Vec<(usize, usize)> = plan_layout(6, &LayoutConfig::default())
            .iter()
            .map(|p| (p.page, p.column))
            .collect();
        assert_eq!(grid, vec![(0, 0), (0, 0), (0, 1), (0, 1), (1, 0), (1, 0)]);
    }

    #[test]
    fn custom_cadence_three_per_column() {
        let layout = LayoutConfig {
            columns: 2,
            cards_per_column: 3,
            cards_per_page: 6,
            ..LayoutConfig::default()
        };
        assert_eq!(
            breaks(7, &layout),
            vec![
                None,
                None,
                Some(BreakKind::Column),
                None,
                None,
                Some(BreakKind::Page),
                None,
            ]
        );
    }

    #[test]
    fn assemble_counts_blocks_and_breaks() {
        let cards = vec![card(1, true), card(2, false), card(3, true), card(4, true), card(5, false)];
        let assembly = assemble(&cards, &LayoutConfig::default());

        assert_eq!(assembly.tree.sections.len(), 1);
        // 5 text + 3 images + 5 spacers + 1 column + 1 page
        assert_eq!(assembly.tree.blocks().count(), 15);
        assert_eq!(assembly.images_embedded(), 3);
        assert_eq!(assembly.break_count(BreakKind::Page), 1);
        assert_eq!(assembly.break_count(BreakKind::Column), 1);
        assert!(assembly.skipped_images.is_empty());
    }

    #[test]
    fn broken_image_is_skipped_but_text_kept() {
        let mut bad = card(2, false);
        bad.attach_image(EncodedImage {
            mime_type: "image/jpeg".into(),
            data: "%%%".into(),
        });
        let cards = vec![card(1, true), bad, card(3, true)];

        let assembly = assemble(&cards, &LayoutConfig::default());
        assert_eq!(assembly.skipped_images.len(), 1);
        assert!(matches!(
            assembly.skipped_images[0],
            ImageError::Malformed { card: 2, .. }
        ));
        assert_eq!(assembly.images_embedded(), 2);

        let texts: Vec<&TextBlock> = assembly
            .tree
            .blocks()
            .filter_map(|b| match b {
                Block::Text(t) => Some(t),
                _ => None,
            })
            .collect();
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[1].lines[0][0].text, "S/N: SN-2");
    }

    #[test]
    fn section_carries_layout() {
        let layout = LayoutConfig {
            column_space: 500,
            column_separator: false,
            ..LayoutConfig::default()
        };
        let assembly = assemble(&[card(1, false)], &layout);
        let section = &assembly.tree.sections[0].layout;
        assert_eq!(section.columns, 2);
        assert_eq!(section.column_space, 500);
        assert!(!section.column_separator);
    }
}
