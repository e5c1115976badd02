// file: src/analysis/refiner.rs
// description: picks the single most relevant sentence from top-ranked chunks
// reference: sentence-level embedding similarity

use crate::embedding::{Embedder, embed_in_batches};
use crate::error::Result;
use crate::models::{ScoredChunk, SubsectionAnalysis};
use std::sync::Arc;
use tracing::debug;

pub struct SubsectionRefiner {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
}

/// Splits on `.` and keeps the trimmed, non-empty pieces.
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|sentence| !sentence.is_empty())
        .map(str::to_string)
        .collect()
}

/// Index of the first maximum.
fn first_argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (index, &score) in scores.iter().enumerate() {
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

impl SubsectionRefiner {
    pub fn new(embedder: Arc<dyn Embedder>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    /// Returns the sentence closest to the query, or the text itself when it
    /// holds no sentences.
    pub async fn refine(&self, text: &str, query: &[f32]) -> Result<String> {
        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return Ok(text.to_string());
        }

        let vectors = embed_in_batches(self.embedder.as_ref(), &sentences, self.batch_size).await?;
        let scores = self.embedder.cosine_similarity(query, &vectors);

        let best = first_argmax(&scores).unwrap_or(0);
        debug!(
            "Selected sentence {} of {} (score {:.4})",
            best + 1,
            sentences.len(),
            scores.get(best).copied().unwrap_or_default()
        );
        Ok(sentences.into_iter().nth(best).unwrap_or_else(|| text.to_string()))
    }

    /// Refines the first `top_n` ranked chunks; sections may repeat.
    pub async fn refine_top(
        &self,
        ranked: &[ScoredChunk],
        query: &[f32],
        top_n: usize,
    ) -> Result<Vec<SubsectionAnalysis>> {
        let mut analyses = Vec::with_capacity(top_n.min(ranked.len()));

        for scored in ranked.iter().take(top_n) {
            let refined_text = self.refine(&scored.chunk.text, query).await?;
            analyses.push(SubsectionAnalysis {
                document: scored.chunk.doc_name.clone(),
                page_number: scored.chunk.page_number,
                refined_text,
            });
        }

        Ok(analyses)
    }
}
