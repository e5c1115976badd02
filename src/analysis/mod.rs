// file: src/analysis/mod.rs
// description: chunking, relevance ranking and sentence refinement exports
// reference: internal module structure

pub mod chunker;
pub mod ranker;
pub mod refiner;

pub use chunker::SectionChunker;
pub use ranker::{RelevanceRanker, extract_sections, sort_by_relevance};
pub use refiner::{SubsectionRefiner, split_sentences};
