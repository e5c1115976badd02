// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod analysis;
pub mod config;
pub mod embedding;
pub mod error;
pub mod exporter;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod repository;
pub mod utils;

pub use analysis::{RelevanceRanker, SectionChunker, SubsectionRefiner};
pub use config::{
    Config, EmbeddingConfig, EmbeddingProviderKind, InputConfig, PipelineConfig, RankingConfig,
    StructureConfig, StyleSampling,
};
pub use embedding::{
    Embedder, HashingEmbedder, HttpEmbeddingClient, OnnxEmbedder, build_embedder,
};
pub use error::{PipelineError, Result};
pub use exporter::JsonExporter;
pub use models::{
    Chunk, DocumentSection, ExtractedSection, FinalOutput, PersonaInput, RunMetadata,
    ScoredChunk, SubsectionAnalysis,
};
pub use parser::{
    DocumentLayout, DocumentStructureParser, LayoutExtractor, PdfLayoutExtractor,
};
pub use pipeline::{PipelineOrchestrator, PipelineRun, PipelineStats, ProgressTracker};
pub use repository::{DocumentScanner, ScannedDocument, total_size};
pub use utils::{HealthCheck, HealthReport, HealthStatus, OperationTimer, Validator};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _chunker = SectionChunker::new(config.ranking.chunk_target_word_count);
        let _parser = DocumentStructureParser::new(config.structure.clone());
    }
}
