// file: src/pipeline/orchestrator.rs
// description: coordinates document discovery, parsing, ranking and refinement
// reference: orchestrates asynchronous ranking workflow

use crate::analysis::{RelevanceRanker, SectionChunker, SubsectionRefiner, extract_sections};
use crate::config::Config;
use crate::embedding::{Embedder, build_embedder};
use crate::error::{PipelineError, Result};
use crate::models::{Chunk, FinalOutput, PersonaInput, RunMetadata};
use crate::parser::{DocumentStructureParser, LayoutExtractor, PdfLayoutExtractor};
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::repository::{DocumentScanner, ScannedDocument, total_size};
use crate::utils::OperationTimer;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub output: FinalOutput,
    pub stats: PipelineStats,
}

struct ParsedDocument {
    sections: usize,
    chunks: Vec<Chunk>,
}

pub struct PipelineOrchestrator {
    config: Config,
    extractor: Arc<dyn LayoutExtractor>,
    embedder: Arc<dyn Embedder>,
}

impl PipelineOrchestrator {
    /// PDF extraction plus the embedder selected by `config.embedding`.
    pub async fn new(config: Config) -> Result<Self> {
        let embedder = build_embedder(&config.embedding).await?;
        Ok(Self::with_components(
            config,
            Arc::new(PdfLayoutExtractor::new()),
            embedder,
        ))
    }

    pub fn with_components(
        config: Config,
        extractor: Arc<dyn LayoutExtractor>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            config,
            extractor,
            embedder,
        }
    }

    pub async fn run(&self) -> Result<PipelineRun> {
        let timer = OperationTimer::new("persona digest run");

        let persona = PersonaInput::load(&self.config.input.persona_file)?;
        info!(
            "Persona '{}' with job '{}'",
            persona.persona, persona.job_to_be_done
        );

        let documents = DocumentScanner::new().scan_directory(&self.config.input.docs_dir)?;
        if documents.is_empty() {
            return Err(PipelineError::NoDocuments(
                self.config.input.docs_dir.clone(),
            ));
        }
        let input_documents: Vec<String> = documents.iter().map(|d| d.name.clone()).collect();

        let progress = Arc::new(if self.config.pipeline.show_progress {
            ProgressTracker::new(documents.len())
        } else {
            ProgressTracker::hidden(documents.len())
        });

        let chunks = self.parse_documents(documents, progress.clone()).await?;
        progress.finish();

        if chunks.is_empty() {
            return Err(PipelineError::NoChunks {
                documents: input_documents.len(),
            });
        }

        let ranking = &self.config.ranking;
        let batch_size = self.config.embedding.batch_size;

        let rank_timer = OperationTimer::new("relevance ranking");
        let ranker = RelevanceRanker::new(self.embedder.clone(), batch_size);
        let query = ranker.embed_query(&persona).await?;
        let ranked = ranker.rank(&query, chunks).await?;
        let extracted_section = extract_sections(&ranked, ranking.top_n_sections);
        rank_timer.finish_with_count(ranked.len(), "chunks");

        let refine_timer = OperationTimer::new("subsection refinement");
        let refiner = SubsectionRefiner::new(self.embedder.clone(), batch_size);
        let sub_section_analysis = refiner
            .refine_top(&ranked, &query, ranking.top_n_sub_sections)
            .await?;
        refine_timer.finish_with_count(sub_section_analysis.len(), "subsections");

        let output = FinalOutput {
            metadata: RunMetadata {
                input_documents,
                persona: persona.persona,
                job_to_be_done: persona.job_to_be_done,
                processing_timestamp: Utc::now().to_rfc3339(),
            },
            extracted_section,
            sub_section_analysis,
        };

        let mut stats = progress.get_stats();
        stats.duration_secs = timer.finish().as_secs_f64();

        Ok(PipelineRun { output, stats })
    }

    /// Parses documents concurrently but yields chunks in discovery order.
    async fn parse_documents(
        &self,
        documents: Vec<ScannedDocument>,
        progress: Arc<ProgressTracker>,
    ) -> Result<Vec<Chunk>> {
        let workers = self.config.pipeline.parallel_workers.max(1);
        let skip_failed = self.config.pipeline.skip_failed_documents;
        info!(
            "Parsing {} documents ({} bytes) with {} workers",
            documents.len(),
            total_size(&documents),
            workers
        );

        let mut results = stream::iter(documents.into_iter().map(|document| {
            let extractor = Arc::clone(&self.extractor);
            let parser = DocumentStructureParser::new(self.config.structure.clone());
            let chunker = SectionChunker::new(self.config.ranking.chunk_target_word_count);

            async move {
                let name = document.name.clone();
                let parsed = tokio::task::spawn_blocking(move || {
                    let layout = extractor.extract(&document.path)?;
                    let sections = parser.parse(&layout);
                    Ok::<_, PipelineError>(ParsedDocument {
                        sections: sections.len(),
                        chunks: chunker.chunk_sections(&sections),
                    })
                })
                .await
                .map_err(|e| PipelineError::Task(format!("parsing {} failed: {}", name, e)))
                .and_then(|result| result);
                (name, parsed)
            }
        }))
        .buffered(workers);

        let mut chunks = Vec::new();
        while let Some((name, parsed)) = results.next().await {
            match parsed {
                Ok(parsed) => {
                    info!(
                        "Parsed {}: {} sections, {} chunks",
                        name,
                        parsed.sections,
                        parsed.chunks.len()
                    );
                    progress.record_parsed(&name, parsed.sections, parsed.chunks.len());
                    chunks.extend(parsed.chunks);
                }
                Err(e) if skip_failed => {
                    warn!("Skipping {}: {}", name, e);
                    progress.record_failed(&name);
                }
                Err(e) => {
                    progress.record_failed(&name);
                    return Err(e);
                }
            }
        }

        Ok(chunks)
    }
}
