// file: src/parser/pdf.rs
// description: styled text extraction from pdf content streams
// reference: https://docs.rs/lopdf

use crate::error::{PipelineError, Result};
use crate::parser::layout::{
    DocumentLayout, LayoutExtractor, PageLayout, TextBlock, TextLine, TextSpan,
};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Encoding, Object, ObjectId};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const BOLD_MARKERS: [&str; 4] = ["bold", "black", "heavy", "semibold"];

/// TJ adjustments at or beyond this (thousandths of an em) read as a word gap.
const WORD_GAP_THRESHOLD: f32 = 200.0;

/// Text render mode "fill, then stroke", commonly used for synthetic bold.
const RENDER_MODE_FILL_STROKE: i64 = 2;

/// Walks each page's content stream and reports every `BT`…`ET` text object
/// as one block of styled lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLayoutExtractor;

impl PdfLayoutExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl LayoutExtractor for PdfLayoutExtractor {
    fn extract(&self, path: &Path) -> Result<DocumentLayout> {
        let name = document_name(path);
        let doc = Document::load(path).map_err(|e| PipelineError::document_parse(&name, e))?;

        if doc.is_encrypted() {
            warn!("{} is encrypted; text may be unreadable", name);
        }

        let mut pages = Vec::new();
        for (number, page_id) in doc.get_pages() {
            let fonts = page_fonts(&doc, page_id)
                .map_err(|e| PipelineError::document_parse(&name, format!("page {number}: {e}")))?;
            let raw = doc
                .get_page_content(page_id)
                .map_err(|e| PipelineError::document_parse(&name, format!("page {number}: {e}")))?;
            let content = Content::decode(&raw)
                .map_err(|e| PipelineError::document_parse(&name, format!("page {number}: {e}")))?;

            let blocks = TextObjectWalker::new(&fonts).walk(&content.operations);
            pages.push(PageLayout::new(number, blocks));
        }

        let layout = DocumentLayout::new(name, pages);
        debug!(
            "Extracted {} page(s), {} block(s) from {}",
            layout.pages.len(),
            layout.block_count(),
            layout.name
        );
        Ok(layout)
    }
}

pub fn document_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Style and text encoding of one font resource on a page.
struct PageFont<'a> {
    bold: bool,
    encoding: Option<Encoding<'a>>,
}

impl<'a> PageFont<'a> {
    fn from_dictionary(doc: &'a Document, font: &'a Dictionary) -> Self {
        let bold = font
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .map(|base| is_bold_font_name(&String::from_utf8_lossy(base)))
            .unwrap_or(false);

        let encoding = if font.type_is(b"Font") {
            font.get_font_encoding(doc)
                .inspect_err(|e| debug!("No usable encoding for font: {}", e))
                .ok()
        } else {
            None
        };

        Self { bold, encoding }
    }
}

/// Font resource name -> weight and encoding for one page.
fn page_fonts(
    doc: &Document,
    page_id: ObjectId,
) -> lopdf::Result<HashMap<Vec<u8>, PageFont<'_>>> {
    Ok(doc
        .get_page_fonts(page_id)?
        .into_iter()
        .map(|(resource, font)| (resource, PageFont::from_dictionary(doc, font)))
        .collect())
}

pub fn is_bold_font_name(base_font: &str) -> bool {
    let lowered = base_font.to_ascii_lowercase();
    BOLD_MARKERS.iter().any(|marker| lowered.contains(marker))
}

struct TextObjectWalker<'a> {
    fonts: &'a HashMap<Vec<u8>, PageFont<'a>>,
    font: Option<&'a PageFont<'a>>,
    font_size: f32,
    matrix_scale: f32,
    render_mode: i64,
    in_text_object: bool,
    blocks: Vec<TextBlock>,
    lines: Vec<TextLine>,
    line: Vec<TextSpan>,
}

impl<'a> TextObjectWalker<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, PageFont<'a>>) -> Self {
        Self {
            fonts,
            font: None,
            font_size: 0.0,
            matrix_scale: 1.0,
            render_mode: 0,
            in_text_object: false,
            blocks: Vec::new(),
            lines: Vec::new(),
            line: Vec::new(),
        }
    }

    fn walk(mut self, operations: &[Operation]) -> Vec<TextBlock> {
        for operation in operations {
            self.apply(operation);
        }
        self.end_text_object();
        self.blocks
    }

    fn apply(&mut self, operation: &Operation) {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "BT" => {
                self.end_text_object();
                self.in_text_object = true;
                self.matrix_scale = 1.0;
            }
            "ET" => self.end_text_object(),
            "Tf" => {
                if let Some(Object::Name(resource)) = operands.first() {
                    self.font = self.fonts.get(resource);
                }
                if let Some(size) = operands.get(1).and_then(as_number) {
                    self.font_size = size.abs();
                }
            }
            "Tr" => {
                if let Some(Object::Integer(mode)) = operands.first() {
                    self.render_mode = *mode;
                }
            }
            "Tm" => {
                let b = operands.get(1).and_then(as_number).unwrap_or(0.0);
                let d = operands.get(3).and_then(as_number).unwrap_or(1.0);
                let scale = (b * b + d * d).sqrt();
                self.matrix_scale = if scale > 0.0 { scale } else { 1.0 };
                self.break_line();
            }
            "Td" | "TD" | "T*" => self.break_line(),
            "Tj" | "TJ" => self.show_text(operands.first()),
            "'" => {
                self.break_line();
                self.show_text(operands.first());
            }
            "\"" => {
                self.break_line();
                self.show_text(operands.get(2));
            }
            _ => {}
        }
    }

    fn show_text(&mut self, operand: Option<&Object>) {
        let encoding = self.font.and_then(|font| font.encoding.as_ref());
        if let Some(text) = operand.and_then(|object| decode_text_operand(object, encoding)) {
            self.push_span(text);
        }
    }

    fn push_span(&mut self, text: String) {
        if !self.in_text_object || text.is_empty() {
            return;
        }
        let font_bold = self.font.is_some_and(|font| font.bold);
        let bold = font_bold || self.render_mode == RENDER_MODE_FILL_STROKE;
        let font_size = self.font_size * self.matrix_scale;

        match self.line.last_mut() {
            Some(last) if last.bold == bold && last.font_size == font_size => {
                last.text.push_str(&text);
            }
            _ => self.line.push(TextSpan::new(text, font_size, bold)),
        }
    }

    fn break_line(&mut self) {
        if !self.line.is_empty() {
            self.lines.push(TextLine::new(std::mem::take(&mut self.line)));
        }
    }

    fn end_text_object(&mut self) {
        self.break_line();
        if !self.lines.is_empty() {
            self.blocks
                .push(TextBlock::new(std::mem::take(&mut self.lines)));
        }
        self.in_text_object = false;
    }
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn decode_text_operand(object: &Object, encoding: Option<&Encoding>) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_font_string(bytes, encoding)),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => {
                        text.push_str(&decode_font_string(bytes, encoding));
                    }
                    other => {
                        // Negative adjustments move the pen right.
                        if as_number(other).is_some_and(|gap| -gap >= WORD_GAP_THRESHOLD)
                            && !text.ends_with(' ')
                        {
                            text.push(' ');
                        }
                    }
                }
            }
            Some(text)
        }
        _ => None,
    }
}

/// Decodes through the font's encoding or ToUnicode map when lopdf understands it.
fn decode_font_string(bytes: &[u8], encoding: Option<&Encoding>) -> String {
    encoding
        .and_then(|encoding| Document::decode_text(encoding, bytes).ok())
        .unwrap_or_else(|| decode_pdf_string(bytes))
}

/// UTF-16BE when BOM-prefixed or when every high byte is zero (two-byte
/// identity codes), otherwise one byte per character.
fn decode_pdf_string(bytes: &[u8]) -> String {
    let utf16 = match bytes.strip_prefix(&[0xFE, 0xFF]) {
        Some(rest) => Some(rest),
        None if looks_like_utf16(bytes) => Some(bytes),
        None => None,
    };

    match utf16 {
        Some(utf16) => {
            let units: Vec<u16> = utf16
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        None => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn looks_like_utf16(bytes: &[u8]) -> bool {
    !bytes.is_empty()
        && bytes.len() % 2 == 0
        && bytes.iter().step_by(2).all(|&high| high == 0)
        && bytes.iter().skip(1).step_by(2).all(|&low| low != 0)
}
