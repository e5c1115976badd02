// file: src/parser/layout.rs
// description: styled page/block/line/span model produced by layout extractors
// reference: pdf text-object structure

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpan {
    pub text: String,
    pub font_size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub number: u32,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayout {
    pub name: String,
    pub pages: Vec<PageLayout>,
}

/// Turns a document on disk into its styled layout.
pub trait LayoutExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<DocumentLayout>;
}

impl TextSpan {
    pub fn new(text: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self {
            text: text.into(),
            font_size,
            bold,
        }
    }
}

impl TextLine {
    pub fn new(spans: Vec<TextSpan>) -> Self {
        Self { spans }
    }

    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

impl TextBlock {
    pub fn new(lines: Vec<TextLine>) -> Self {
        Self { lines }
    }

    /// Single-line block made of one span.
    pub fn single(text: impl Into<String>, font_size: f32, bold: bool) -> Self {
        Self::new(vec![TextLine::new(vec![TextSpan::new(text, font_size, bold)])])
    }

    /// Line texts joined by a space, trimmed.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(TextLine::text)
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string()
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.lines.iter().flat_map(|line| line.spans.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.spans().next().is_none()
    }
}

impl PageLayout {
    pub fn new(number: u32, blocks: Vec<TextBlock>) -> Self {
        Self { number, blocks }
    }
}

impl DocumentLayout {
    pub fn new(name: impl Into<String>, pages: Vec<PageLayout>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }

    pub fn spans(&self) -> impl Iterator<Item = &TextSpan> {
        self.pages
            .iter()
            .flat_map(|page| page.blocks.iter())
            .flat_map(TextBlock::spans)
    }

    pub fn block_count(&self) -> usize {
        self.pages.iter().map(|page| page.blocks.len()).sum()
    }
}
