// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod chunk;
pub mod output;
pub mod persona;
pub mod section;

pub use chunk::{Chunk, ScoredChunk};
pub use output::{ExtractedSection, FinalOutput, RunMetadata, SubsectionAnalysis};
pub use persona::PersonaInput;
pub use section::DocumentSection;
