// file: src/embedding/mod.rs
// description: embedding capability trait, similarity helpers and provider selection
// reference: injected embedding providers

pub mod hashing;
pub mod http;
pub mod onnx;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbeddingClient;
pub use onnx::OnnxEmbedder;

use crate::config::{EmbeddingConfig, EmbeddingProviderKind};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns text into fixed-dimensionality vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds every text, preserving order. Defaults to one call per text.
    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }

    fn cosine_similarity(&self, query: &[f32], vectors: &[Vec<f32>]) -> Vec<f32> {
        cosine_similarity(query, vectors)
    }

    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

/// One score per vector, in input order.
pub fn cosine_similarity(query: &[f32], vectors: &[Vec<f32>]) -> Vec<f32> {
    vectors.iter().map(|vector| cosine(query, vector)).collect()
}

/// Zero for mismatched lengths or zero-norm inputs.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Calls `embed_many` on consecutive slices of at most `batch_size` texts.
pub async fn embed_in_batches(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let batch_size = batch_size.max(1);
    let mut embeddings = Vec::with_capacity(texts.len());

    for (index, batch) in texts.chunks(batch_size).enumerate() {
        let vectors = embedder.embed_many(batch).await?;
        if vectors.len() != batch.len() {
            return Err(PipelineError::Embedding(format!(
                "{} returned {} vectors for a batch of {}",
                embedder.name(),
                vectors.len(),
                batch.len()
            )));
        }
        debug!("Embedded batch {} ({} texts)", index + 1, batch.len());
        embeddings.extend(vectors);
    }

    Ok(embeddings)
}

/// Builds the configured provider. An onnx model that fails to load falls
/// back to hashing when `fallback_to_hashing` is set.
pub async fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match config.provider {
        EmbeddingProviderKind::Hashing => Arc::new(HashingEmbedder::new(config.dimensions)),
        EmbeddingProviderKind::Http => Arc::new(HttpEmbeddingClient::from_config(config)?),
        EmbeddingProviderKind::Onnx => match OnnxEmbedder::load(config).await {
            Ok(embedder) => Arc::new(embedder),
            Err(e) if config.fallback_to_hashing => {
                warn!("ONNX embedder unavailable, using hashing instead: {}", e);
                Arc::new(HashingEmbedder::new(config.dimensions))
            }
            Err(e) => return Err(e),
        },
    };
    info!(
        "Using embedding provider {} ({} dimensions)",
        embedder.name(),
        embedder.dimensions()
    );
    Ok(embedder)
}


#[cfg(test)]
mod tests {
    use super::testing::TableEmbedder;
    use super::*;

    #[test]
    fn test_cosine_basics() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine(&[1.0, 0.0], &[-2.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_preserves_order() {
        let scores = cosine_similarity(&[1.0, 0.0], &[vec![0.0, 1.0], vec![1.0, 0.0]]);
        assert_eq!(scores.len(), 2);
        assert!(scores[0] < scores[1]);
    }

    #[test]
    fn test_embed_in_batches_splits_calls() {
        let embedder = TableEmbedder::new(vec![1.0, 0.0]);
        let texts: Vec<String> = (0..5).map(|i| format!("text {i}")).collect();

        let vectors =
            tokio_test::block_on(embed_in_batches(&embedder, &texts, 2)).unwrap();
        assert_eq!(vectors.len(), 5);
        assert_eq!(embedder.batch_calls(), 3);
    }

    #[tokio::test]
    async fn test_build_default_embedder() {
        let embedder = build_embedder(&EmbeddingConfig::default()).await.unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.dimensions(), 384);
    }

    fn offline_onnx_config(cache_dir: std::path::PathBuf, fallback: bool) -> EmbeddingConfig {
        EmbeddingConfig {
            provider: EmbeddingProviderKind::Onnx,
            cache_dir,
            allow_download: false,
            fallback_to_hashing: fallback,
            ..EmbeddingConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unavailable_onnx_model_falls_back_to_hashing() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = offline_onnx_config(temp.path().join("minilm"), true);

        let embedder = build_embedder(&config).await.unwrap();
        assert_eq!(embedder.name(), "hashing");
        assert_eq!(embedder.embed_one("offline").await.unwrap().len(), 384);
    }

    #[tokio::test]
    async fn test_unavailable_onnx_model_without_fallback_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = offline_onnx_config(temp.path().join("minilm"), false);

        let err = build_embedder(&config).await.err().unwrap();
        assert!(matches!(err, PipelineError::Embedding(_)));
    }
}
