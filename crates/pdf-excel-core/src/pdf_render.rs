use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};

use crate::error::ConvertError;
use crate::model::{RenderedReport, TabularData};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;

const FONT_SIZE: f32 = 10.0;
const LEADING: f32 = 12.0;
const CELL_PADDING_X: f32 = 6.0;
const CELL_PADDING_TOP: f32 = 3.0;
const BODY_PADDING_BOTTOM: f32 = 3.0;
const HEADER_PADDING_BOTTOM: f32 = 12.0;
const GRID_WIDTH: f32 = 1.0;

const BODY_FONT: &str = "F1";
const HEADER_FONT: &str = "F2";

type Rgb = (f32, f32, f32);

const HEADER_FILL: Rgb = (0.5, 0.5, 0.5);
const HEADER_TEXT: Rgb = (0.96, 0.96, 0.96);
const BODY_FILL: Rgb = (0.96, 0.96, 0.86);
const BODY_TEXT: Rgb = (0.0, 0.0, 0.0);
const GRID: Rgb = (0.0, 0.0, 0.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Header,
    Body,
}

impl RowKind {
    fn height(self) -> f32 {
        CELL_PADDING_TOP + LEADING + self.padding_bottom()
    }

    fn padding_bottom(self) -> f32 {
        match self {
            Self::Header => HEADER_PADDING_BOTTOM,
            Self::Body => BODY_PADDING_BOTTOM,
        }
    }

    fn font(self) -> &'static str {
        match self {
            Self::Header => HEADER_FONT,
            Self::Body => BODY_FONT,
        }
    }

    fn fill(self) -> Rgb {
        match self {
            Self::Header => HEADER_FILL,
            Self::Body => BODY_FILL,
        }
    }

    fn text_color(self) -> Rgb {
        match self {
            Self::Header => HEADER_TEXT,
            Self::Body => BODY_TEXT,
        }
    }
}

/// Approximate Helvetica advance width in thousandths of an em.
fn glyph_width(ch: char, bold: bool) -> f32 {
    let regular = match ch {
        'i' | 'j' | 'l' | '\'' | '|' => 222.0,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'f' | 't' | 'I' | '[' | ']' | '/' | '(' | ')' => 278.0,
        'r' | '-' => 333.0,
        'm' | 'M' => 833.0,
        'w' | 'W' => 800.0,
        '0'..='9' | 'a'..='z' => 556.0,
        'A'..='Z' => 667.0,
        _ => 600.0,
    };
    if bold { regular * 1.05 } else { regular }
}

fn text_width(text: &str, bold: bool) -> f32 {
    text.chars().map(|ch| glyph_width(ch, bold)).sum::<f32>() * FONT_SIZE / 1000.0
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
fn fit_text(text: &str, max_width: f32, bold: bool) -> String {
    if text_width(text, bold) <= max_width {
        return text.to_string();
    }

    let mut fitted = text.chars().collect::<Vec<_>>();
    while !fitted.is_empty() {
        fitted.pop();
        let candidate = format!("{}...", fitted.iter().collect::<String>());
        if text_width(&candidate, bold) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Standard 14 fonts only cover WinAnsi; anything else becomes `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match u32::from(ch) {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).unwrap_or(b'?'),
            _ => b'?',
        })
        .collect()
}

fn set_fill(ops: &mut Vec<Operation>, (r, g, b): Rgb) {
    ops.push(Operation::new("rg", vec![r.into(), g.into(), b.into()]));
}

fn set_stroke(ops: &mut Vec<Operation>, (r, g, b): Rgb) {
    ops.push(Operation::new("RG", vec![r.into(), g.into(), b.into()]));
}

struct TableLayout {
    columns: usize,
    column_width: f32,
    left: f32,
}

impl TableLayout {
    #[allow(clippy::cast_precision_loss)]
    fn new(columns: usize) -> Self {
        let frame = PAGE_WIDTH - 2.0 * MARGIN;
        let columns = columns.max(1);
        Self {
            columns,
            column_width: frame / columns as f32,
            left: MARGIN,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn draw_row(&self, ops: &mut Vec<Operation>, cells: &[String], kind: RowKind, top: f32) {
        let height = kind.height();
        let bottom = top - height;

        set_fill(ops, kind.fill());
        set_stroke(ops, GRID);
        ops.push(Operation::new("w", vec![GRID_WIDTH.into()]));
        for col in 0..self.columns {
            let x = self.left + col as f32 * self.column_width;
            ops.push(Operation::new(
                "re",
                vec![x.into(), bottom.into(), self.column_width.into(), height.into()],
            ));
            ops.push(Operation::new("B", vec![]));
        }

        let bold = kind == RowKind::Header;
        let baseline = bottom + kind.padding_bottom() + (LEADING - FONT_SIZE) / 2.0;
        let usable = self.column_width - 2.0 * CELL_PADDING_X;
        set_fill(ops, kind.text_color());
        for (col, value) in cells.iter().take(self.columns).enumerate() {
            let text = fit_text(value, usable, bold);
            if text.is_empty() {
                continue;
            }
            let x = self.left
                + col as f32 * self.column_width
                + (self.column_width - text_width(&text, bold)) / 2.0;
            ops.push(Operation::new("BT", vec![]));
            ops.push(Operation::new("Tf", vec![kind.font().into(), FONT_SIZE.into()]));
            ops.push(Operation::new("Td", vec![x.into(), baseline.into()]));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(&text), StringFormat::Literal)],
            ));
            ops.push(Operation::new("ET", vec![]));
        }
    }
}

/// Lays the header and body rows out top to bottom, starting a new page
/// whenever the next row would cross the bottom margin.
fn layout_pages(data: &TabularData) -> (Vec<Vec<Operation>>, usize) {
    let layout = TableLayout::new(data.width());
    let rows = std::iter::once((RowKind::Header, &data.columns))
        .filter(|(_, cells)| !cells.is_empty())
        .chain(data.rows.iter().map(|row| (RowKind::Body, row)));

    let top = PAGE_HEIGHT - MARGIN;
    let mut pages = Vec::new();
    let mut current = Vec::new();
    let mut cursor = top;
    let mut row_count = 0;

    for (kind, cells) in rows {
        if cursor - kind.height() < MARGIN && !current.is_empty() {
            pages.push(std::mem::take(&mut current));
            cursor = top;
        }
        layout.draw_row(&mut current, cells, kind, cursor);
        cursor -= kind.height();
        row_count += 1;
    }

    if !current.is_empty() || pages.is_empty() {
        pages.push(current);
    }
    (pages, row_count)
}

fn build_document(data: &TabularData) -> Result<(Document, RenderedReport), ConvertError> {
    let (pages, row_count) = layout_pages(data);
    let mut doc = Document::with_version("1.5");

    let pages_id: ObjectId = doc.new_object_id();
    let body_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let header_font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            BODY_FONT => body_font_id,
            HEADER_FONT => header_font_id,
        },
    });

    let mut page_ids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    let page_count = page_ids.len();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_count).unwrap_or(i64::MAX),
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    Ok((
        doc,
        RenderedReport {
            page_count,
            row_count,
        },
    ))
}

/// Renders `data` as a single grid table and writes the PDF to `path`.
pub fn render_table(path: &Path, data: &TabularData) -> Result<RenderedReport, ConvertError> {
    let (mut doc, report) = build_document(data)?;
    doc.save(path)?;
    Ok(report)
}

pub fn render_table_to_bytes(data: &TabularData) -> Result<(Vec<u8>, RenderedReport), ConvertError> {
    let (mut doc, report) = build_document(data)?;
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok((bytes, report))
}
