// file: src/analysis/ranker.rs
// description: persona-driven relevance scoring, stable ranking and section dedup
// reference: embedding similarity ranking

use crate::embedding::{Embedder, embed_in_batches};
use crate::error::{PipelineError, Result};
use crate::models::{Chunk, ExtractedSection, PersonaInput, ScoredChunk};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

pub struct RelevanceRanker {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

impl RelevanceRanker {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    pub fn build_query(persona: &PersonaInput) -> String {
        format!(
            "As a {}, I need to {}",
            persona.persona, persona.job_to_be_done
        )
    }

    pub async fn embed_query(&self, persona: &PersonaInput) -> Result<Vec<f32>> {
        let query = Self::build_query(persona);
        debug!("Query text: {}", query);
        self.embedder.embed_one(&query).await
    }

    /// Scores every chunk against the query, keeping input order.
    pub async fn score_chunks(&self, query: &[f32], chunks: Vec<Chunk>) -> Result<Vec<ScoredChunk>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = embed_in_batches(self.embedder.as_ref(), &texts, self.batch_size).await?;

        if let Some(vector) = vectors.iter().find(|vector| vector.len() != query.len()) {
            return Err(PipelineError::Embedding(format!(
                "chunk embedding has {} dimensions, query has {}",
                vector.len(),
                query.len()
            )));
        }

        let scores = self.embedder.cosine_similarity(query, &vectors);
        Ok(chunks
            .into_iter()
            .zip(scores)
            .map(|(chunk, score)| ScoredChunk::new(chunk, score))
            .collect())
    }

    /// Score then sort; see [`sort_by_relevance`].
    pub async fn rank(&self, query: &[f32], chunks: Vec<Chunk>) -> Result<Vec<ScoredChunk>> {
        let mut scored = self.score_chunks(query, chunks).await?;
        sort_by_relevance(&mut scored);
        info!("Ranked {} chunks", scored.len());
        Ok(scored)
    }
}

/// Descending by score. The sort is stable: equal scores keep corpus order.
pub fn sort_by_relevance(scored: &mut [ScoredChunk]) {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// First occurrence of each `(document, section_title)` in ranked order,
/// densely ranked from 1, capped at `top_n`.
pub fn extract_sections(ranked: &[ScoredChunk], top_n: usize) -> Vec<ExtractedSection> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut sections = Vec::new();

    for scored in ranked {
        if sections.len() >= top_n {
            break;
        }
        let chunk = &scored.chunk;
        if seen.insert(chunk.section_key()) {
            sections.push(ExtractedSection {
                document: chunk.doc_name.clone(),
                page_number: chunk.page_number,
                section_title: chunk.section_title.clone(),
                importance_rank: sections.len() + 1,
            });
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::TableEmbedder;
    use pretty_assertions::assert_eq;

    fn chunk(text: &str, doc: &str, title: &str, page: u32) -> Chunk {
        Chunk::new(text, doc, page, title)
    }

    fn scored(text: &str, doc: &str, title: &str, score: f32) -> ScoredChunk {
        ScoredChunk::new(chunk(text, doc, title, 1), score)
    }

    #[test]
    fn test_build_query() {
        let persona = PersonaInput::new("Analyst", "summarize findings");
        assert_eq!(
            RelevanceRanker::build_query(&persona),
            "As a Analyst, I need to summarize findings"
        );
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let mut ranked = vec![
            scored("a", "d1", "A", 0.5),
            scored("b", "d1", "B", 0.9),
            scored("c", "d2", "C", 0.5),
            scored("d", "d2", "D", 0.5),
        ];
        sort_by_relevance(&mut ranked);

        let order: Vec<&str> = ranked.iter().map(|s| s.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c", "d"]);
    }

    #[test]
    fn test_sort_orders_nan_scores_deterministically() {
        let mut ranked = vec![
            scored("low", "d", "A", 0.5),
            scored("nan", "d", "B", f32::NAN),
            scored("high", "d", "C", 1.0),
            scored("tie", "d", "D", 0.5),
        ];
        sort_by_relevance(&mut ranked);

        let order: Vec<&str> = ranked.iter().map(|s| s.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["nan", "high", "low", "tie"]);
    }

    #[test]
    fn test_extract_sections_dedups_and_ranks_densely() {
        let ranked = vec![
            scored("1", "d1", "Overview", 0.9),
            scored("2", "d1", "Overview", 0.8),
            scored("3", "d2", "Overview", 0.7),
            scored("4", "d1", "Details", 0.6),
        ];

        let sections = extract_sections(&ranked, 10);
        let summary: Vec<(&str, &str, usize)> = sections
            .iter()
            .map(|s| (s.document.as_str(), s.section_title.as_str(), s.importance_rank))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("d1", "Overview", 1),
                ("d2", "Overview", 2),
                ("d1", "Details", 3),
            ]
        );
    }

    #[test]
    fn test_extract_sections_respects_cap() {
        let ranked: Vec<ScoredChunk> = (0..20)
            .map(|i| scored("x", "d", &format!("S{i}"), 1.0 - i as f32 / 100.0))
            .collect();

        let sections = extract_sections(&ranked, 10);
        assert_eq!(sections.len(), 10);
        let ranks: Vec<usize> = sections.iter().map(|s| s.importance_rank).collect();
        assert_eq!(ranks, (1..=10).collect::<Vec<_>>());

        assert!(extract_sections(&ranked, 0).is_empty());
    }

    #[test]
    fn test_extract_sections_uses_first_chunk_page() {
        let ranked = vec![
            ScoredChunk::new(chunk("late", "d", "Body", 4), 0.9),
            ScoredChunk::new(chunk("early", "d", "Body", 2), 0.1),
        ];
        assert_eq!(extract_sections(&ranked, 5)[0].page_number, 4);
    }

    #[tokio::test]
    async fn test_rank_scores_and_orders() {
        let embedder = TableEmbedder::new(vec![0.0, 1.0])
            .with("relevant", vec![1.0, 0.0])
            .with("partial", vec![1.0, 1.0]);
        let ranker = RelevanceRanker::new(Arc::new(embedder), 2);

        let chunks = vec![
            chunk("noise", "d", "A", 1),
            chunk("partial", "d", "B", 1),
            chunk("relevant", "d", "C", 2),
        ];

        let ranked = ranker.rank(&[1.0, 0.0], chunks).await.unwrap();
        let order: Vec<&str> = ranked.iter().map(|s| s.chunk.text.as_str()).collect();
        assert_eq!(order, vec!["relevant", "partial", "noise"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-6);
        assert!(ranked[2].score.abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_batch_size_does_not_change_scores() {
        let chunks: Vec<Chunk> = (0..7)
            .map(|i| chunk(&format!("text number {i}"), "d", "S", 1))
            .collect();
        let query = [0.3, -0.2, 0.9, 0.1];

        let embedder = Arc::new(crate::embedding::HashingEmbedder::new(4));
        let one = RelevanceRanker::new(embedder.clone(), 1)
            .score_chunks(&query, chunks.clone())
            .await
            .unwrap();
        let many = RelevanceRanker::new(embedder, 32)
            .score_chunks(&query, chunks)
            .await
            .unwrap();

        for (a, b) in one.iter().zip(&many) {
            assert!((a.score - b.score).abs() < 1e-4);
        }
    }

    #[tokio::test]
    async fn test_empty_corpus() {
        let ranker = RelevanceRanker::new(Arc::new(TableEmbedder::new(vec![1.0])), 4);
        let ranked = ranker.rank(&[1.0], Vec::new()).await.unwrap();
        assert!(ranked.is_empty());
        assert!(extract_sections(&ranked, 10).is_empty());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_is_error() {
        let ranker = RelevanceRanker::new(Arc::new(TableEmbedder::new(vec![1.0, 0.0])), 4);
        let err = ranker
            .score_chunks(&[1.0, 0.0, 0.0], vec![chunk("x", "d", "S", 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
    }
}
