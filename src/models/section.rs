// file: src/models/section.rs
// description: logical document section assembled by the structure parser
// reference: internal data structures

use serde::{Deserialize, Serialize};

pub const INTRODUCTION_TITLE: &str = "Introduction";

/// A heading plus every body line that follows it until the next heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub start_page: u32,
    pub doc_name: String,
    lines: Vec<String>,
}

impl DocumentSection {
    pub fn new(title: impl Into<String>, start_page: u32, doc_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            start_page: start_page.max(1),
            doc_name: doc_name.into(),
            lines: Vec::new(),
        }
    }

    /// Implicit section that collects body text appearing before the first heading.
    pub fn introduction(doc_name: impl Into<String>) -> Self {
        Self::new(INTRODUCTION_TITLE, 1, doc_name)
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Body text with every line newline-terminated.
    pub fn content(&self) -> String {
        let capacity = self.lines.iter().map(|line| line.len() + 1).sum();
        self.lines
            .iter()
            .fold(String::with_capacity(capacity), |mut content, line| {
                content.push_str(line);
                content.push('\n');
                content
            })
    }

    pub fn has_content(&self) -> bool {
        self.lines.iter().any(|line| !line.trim().is_empty())
    }

    pub fn word_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.split_whitespace().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introduction_defaults() {
        let section = DocumentSection::introduction("guide.pdf");
        assert_eq!(section.title, "Introduction");
        assert_eq!(section.start_page, 1);
        assert!(!section.has_content());
    }

    #[test]
    fn test_content_joins_lines_once() {
        let mut section = DocumentSection::new("Scope", 2, "guide.pdf");
        section.push_line("first paragraph");
        section.push_line("second paragraph");

        assert_eq!(section.content(), "first paragraph\nsecond paragraph\n");
        assert_eq!(section.word_count(), 4);
    }

    #[test]
    fn test_whitespace_lines_are_not_content() {
        let mut section = DocumentSection::new("Scope", 2, "guide.pdf");
        section.push_line("   ");
        assert!(!section.has_content());
    }
}
