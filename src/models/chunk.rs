// file: src/models/chunk.rs
// description: chunk of section text and its relevance score
// reference: internal data structures

use serde::{Deserialize, Serialize};

/// Bounded slice of a section's text, the unit that gets embedded and scored.
///
/// `page_number` is the start page of the owning section, not the page the
/// text was actually printed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub doc_name: String,
    pub page_number: u32,
    pub section_title: String,
}

impl Chunk {
    pub fn new(
        text: impl Into<String>,
        doc_name: impl Into<String>,
        page_number: u32,
        section_title: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            doc_name: doc_name.into(),
            page_number,
            section_title: section_title.into(),
        }
    }

    /// Identity used to collapse chunks of the same section during ranking.
    pub fn section_key(&self) -> (&str, &str) {
        (&self.doc_name, &self.section_title)
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity to the query, in [-1, 1].
    pub score: f32,
}

impl ScoredChunk {
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}
