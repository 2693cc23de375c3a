use std::any::Any;
use std::collections::BTreeMap;
use std::panic;
use std::path::Path;

use encoding_rs::UTF_16BE;
use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};
use tracing::debug;

use crate::error::ConvertError;
use crate::model::{DocumentText, PageText, PdfText};
use crate::options::PageSelection;
use crate::table_parse::split_cells;

const PAGE_BREAK: char = '\u{000C}';

/// Kerning adjustment in a `TJ` array wide enough to read as a word gap.
const WORD_GAP_KERNING: i64 = -200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextSource {
    Layout,
    ContentStream,
    Lopdf,
}

impl TextSource {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::ContentStream => "content-stream",
            Self::Lopdf => "lopdf",
        }
    }
}

#[derive(Debug)]
struct Candidate {
    source: TextSource,
    text: String,
}

impl Candidate {
    fn new(source: TextSource, text: String) -> Option<Self> {
        (!text.trim().is_empty()).then_some(Self { source, text })
    }

    /// Lines that split into separate cells count most, since they are what
    /// table detection needs; garbled text loses to anything readable.
    fn score(&self) -> i64 {
        let (lines, cell_lines) = self
            .text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .fold((0_i64, 0_i64), |(lines, cell_lines), line| {
                let cells = i64::from(split_cells(line).len() >= 2);
                (lines + 1, cell_lines + cells)
            });
        let garbled = if is_garbled(&self.text) { 1_000 } else { 0 };
        cell_lines * 20 + lines - garbled
    }
}

fn is_garbled(text: &str) -> bool {
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let suspicious = text
        .chars()
        .filter(|ch| *ch == '\u{FFFD}' || (ch.is_control() && !matches!(ch, '\n' | '\r' | '\t')))
        .count();
    suspicious * 5 > total
}

/// Decodes a PDF string operand, recovering UTF-16 strings that lopdf's
/// font-encoding path leaves garbled.
fn decode_string(encoding: Option<&str>, bytes: &[u8]) -> String {
    let decoded = Document::decode_text(encoding, bytes);
    if !is_garbled(&decoded) {
        return decoded;
    }

    let utf16 = bytes
        .strip_prefix(&[0xFE, 0xFF])
        .or_else(|| bytes.strip_prefix(&[0xFF, 0xFE]));
    if let Some(body) = utf16 {
        let (text, had_errors) = UTF_16BE.decode_without_bom_handling(body);
        if !had_errors && !text.is_empty() {
            return text.into_owned();
        }
    }
    decoded
}

fn push_operands(out: &mut String, encoding: Option<&str>, operands: &[Object]) {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => out.push_str(&decode_string(encoding, bytes)),
            Object::Array(items) => push_operands(out, encoding, items),
            Object::Integer(offset) if *offset <= WORD_GAP_KERNING => out.push(' '),
            _ => {}
        }
    }
}

/// Walks the page's text operators directly. Unlike lopdf's own extractor
/// this starts a new line on every positioning operator and keeps the
/// spacing inside string operands intact.
fn content_stream_text(document: &Document, page_id: ObjectId) -> Option<String> {
    let content = Content::decode(&document.get_page_content(page_id).ok()?).ok()?;
    let encodings = document
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect::<BTreeMap<Vec<u8>, &str>>();

    let mut lines = Vec::new();
    let mut line = String::new();
    let mut encoding = None;
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                encoding = operation
                    .operands
                    .first()
                    .and_then(|operand| operand.as_name().ok())
                    .and_then(|name| encodings.get(name).copied());
            }
            "Tj" | "TJ" | "'" | "\"" => push_operands(&mut line, encoding, &operation.operands),
            "T*" | "Td" | "TD" | "Tm" | "ET" if !line.trim().is_empty() => {
                lines.push(std::mem::take(&mut line));
            }
            _ => {}
        }
    }
    if !line.trim().is_empty() {
        lines.push(line);
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "layout extractor panicked".to_string())
}

/// Runs the layout-preserving extractor over the whole document. Errors and
/// panics are both captured so the caller can report them.
fn layout_text(input_pdf: &[u8]) -> DocumentText {
    match panic::catch_unwind(|| pdf_extract::extract_text_from_mem(input_pdf)) {
        Ok(Ok(text)) => DocumentText::Available(text),
        Ok(Err(error)) => DocumentText::Failed(error.to_string()),
        Err(payload) => DocumentText::Failed(panic_message(payload.as_ref())),
    }
}

/// Layout text split at form feeds, usable per page only when it splits into
/// exactly one chunk per page. Otherwise it stays document-level.
fn layout_pages(document_text: &DocumentText, page_count: usize) -> Option<Vec<&str>> {
    let mut pages = document_text.text()?.split(PAGE_BREAK).collect::<Vec<_>>();
    if pages.last().is_some_and(|page| page.is_empty()) {
        pages.pop();
    }
    (pages.len() == page_count).then_some(pages)
}

fn select_page_text(page_number: u32, candidates: Vec<Candidate>) -> String {
    let best = candidates
        .into_iter()
        .map(|candidate| (candidate.score(), candidate))
        .max_by_key(|(score, _)| *score);

    match best {
        Some((score, candidate)) => {
            debug!(
                page = page_number,
                source = candidate.source.as_str(),
                score,
                "selected page text"
            );
            candidate.text
        }
        None => {
            debug!(page = page_number, "page has no text");
            String::new()
        }
    }
}

pub fn read_pdf(
    input_pdf: &Path,
    page_selection: Option<&PageSelection>,
) -> Result<PdfText, ConvertError> {
    let bytes = std::fs::read(input_pdf)?;
    read_pdf_bytes(&bytes, page_selection)
}

/// Reads every selected page's text. Each page only ever gets text from that
/// page; the whole-document layout text is handed to extraction separately.
pub fn read_pdf_bytes(
    input_pdf: &[u8],
    page_selection: Option<&PageSelection>,
) -> Result<PdfText, ConvertError> {
    let document = Document::load_mem(input_pdf)?;
    let page_ids = document.get_pages();
    let document_text = layout_text(input_pdf);
    let layout = layout_pages(&document_text, page_ids.len());

    let mut pages = Vec::new();
    for (index, (&page_number, &page_id)) in page_ids.iter().enumerate() {
        if page_selection.is_some_and(|selection| !selection.contains(page_number)) {
            continue;
        }

        let candidates = [
            layout
                .as_ref()
                .and_then(|layout| layout.get(index))
                .and_then(|text| Candidate::new(TextSource::Layout, (*text).to_string())),
            content_stream_text(&document, page_id)
                .and_then(|text| Candidate::new(TextSource::ContentStream, text)),
            document
                .extract_text(&[page_number])
                .ok()
                .and_then(|text| Candidate::new(TextSource::Lopdf, text)),
        ];

        pages.push(PageText {
            page_number,
            text: select_page_text(page_number, candidates.into_iter().flatten().collect()),
        });
    }

    if pages.is_empty() {
        return Err(ConvertError::NoPagesSelected);
    }

    Ok(PdfText {
        pages,
        document_text,
    })
}

#[cfg(test)]
mod tests {
    use super::{Candidate, TextSource, decode_string, layout_pages, panic_message};
    use crate::model::DocumentText;

    #[test]
    fn layout_text_is_split_per_page_only_when_counts_match() {
        let text = DocumentText::Available("p1\u{000C}p2\u{000C}".to_string());
        assert_eq!(layout_pages(&text, 2), Some(vec!["p1", "p2"]));
        assert_eq!(layout_pages(&text, 3), None);
        assert_eq!(layout_pages(&DocumentText::Failed("boom".to_string()), 2), None);
    }

    #[test]
    fn column_aligned_text_outscores_run_together_text() {
        let aligned = Candidate::new(
            TextSource::ContentStream,
            "Name  Age\nAlice  30\nBob  22".to_string(),
        )
        .expect("non-empty");
        let squashed =
            Candidate::new(TextSource::Lopdf, "Name Age Alice 30 Bob 22".to_string())
                .expect("non-empty");
        assert!(aligned.score() > squashed.score());
        assert!(Candidate::new(TextSource::Layout, " \n ".to_string()).is_none());
    }

    #[test]
    fn decodes_utf16_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69, 0xFF, 0xFD];
        let decoded = decode_string(None, &bytes);
        assert!(decoded.starts_with("Hi"), "decoded: {decoded:?}");
    }

    #[test]
    fn panic_payload_is_reported() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("bad xref");
        assert_eq!(panic_message(payload.as_ref()), "bad xref");
    }
}
