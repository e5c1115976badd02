// file: src/analysis/chunker.rs
// description: fixed word-count chunking of document sections
// reference: word-window chunking

use crate::models::{Chunk, DocumentSection};

pub struct SectionChunker {
    target_word_count: usize,
}

impl SectionChunker {
    pub fn new(target_word_count: usize) -> Self {
        Self {
            target_word_count: target_word_count.max(1),
        }
    }

    /// Chunks in section order, then in order within each section.
    pub fn chunk_sections(&self, sections: &[DocumentSection]) -> Vec<Chunk> {
        sections
            .iter()
            .flat_map(|section| self.chunk_section(section))
            .collect()
    }

    pub fn chunk_section(&self, section: &DocumentSection) -> Vec<Chunk> {
        let content = section.content();
        let words: Vec<&str> = content.split_whitespace().collect();

        words
            .chunks(self.target_word_count)
            .map(|group| group.join(" "))
            .filter(|text| !text.trim().is_empty())
            .map(|text| {
                Chunk::new(
                    text,
                    section.doc_name.clone(),
                    section.start_page,
                    section.title.clone(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(title: &str, page: u32, words: usize) -> DocumentSection {
        let mut section = DocumentSection::new(title, page, "report.pdf");
        let text: Vec<String> = (0..words).map(|i| format!("w{i}")).collect();
        for line in text.chunks(7) {
            section.push_line(line.join("  "));
        }
        section
    }

    #[test]
    fn test_chunk_sizes() {
        let chunker = SectionChunker::new(250);
        let chunks = chunker.chunk_section(&section("Overview", 1, 300));

        let sizes: Vec<usize> = chunks.iter().map(Chunk::word_count).collect();
        assert_eq!(sizes, vec![250, 50]);
        assert!(chunks.iter().all(|c| c.page_number == 1 && c.section_title == "Overview"));
    }

    #[test]
    fn test_rejoining_reproduces_words() {
        let chunker = SectionChunker::new(13);
        let original = section("Body", 3, 101);
        let chunks = chunker.chunk_section(&original);

        let rejoined: Vec<String> = chunks
            .iter()
            .flat_map(|c| c.text.split_whitespace().map(str::to_string))
            .collect();
        let expected: Vec<String> = original
            .content()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        assert_eq!(rejoined, expected);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_chunk() {
        let chunker = SectionChunker::new(10);
        assert_eq!(chunker.chunk_section(&section("Body", 1, 30)).len(), 3);
    }

    #[test]
    fn test_section_order_preserved() {
        let chunker = SectionChunker::new(5);
        let chunks = chunker.chunk_sections(&[section("A", 1, 7), section("B", 2, 3)]);

        let titles: Vec<&str> = chunks.iter().map(|c| c.section_title.as_str()).collect();
        assert_eq!(titles, vec!["A", "A", "B"]);
        assert_eq!(chunks[2].page_number, 2);
    }

    #[test]
    fn test_empty_section_yields_nothing() {
        let chunker = SectionChunker::new(5);
        let mut empty = DocumentSection::new("Empty", 1, "report.pdf");
        empty.push_line("   ");
        assert!(chunker.chunk_section(&empty).is_empty());
    }
}
