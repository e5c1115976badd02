// file: src/embedding/onnx.rs
// description: local sentence-transformer embeddings through onnx runtime
// reference: https://docs.rs/ort

use crate::config::EmbeddingConfig;
use crate::embedding::Embedder;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokenizers::Tokenizer;
use tracing::{debug, info};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    max_length: usize,
}

/// Mean-pooled, L2-normalised sentence embeddings from a local ONNX export
/// (all-MiniLM-L6-v2 by default).
pub struct OnnxEmbedder {
    model: Arc<OnnxModel>,
    dimensions: usize,
}

impl OnnxEmbedder {
    /// Loads `model.onnx` and `tokenizer.json` from `embedding.cache_dir`,
    /// downloading them first when missing and `allow_download` is set.
    pub async fn load(config: &EmbeddingConfig) -> Result<Self> {
        info!("Initializing ONNX embedder with model: {}", config.model);

        let model_path = config.cache_dir.join(MODEL_FILE);
        let tokenizer_path = config.cache_dir.join(TOKENIZER_FILE);

        for (path, remote) in [
            (&model_path, format!("onnx/{MODEL_FILE}")),
            (&tokenizer_path, TOKENIZER_FILE.to_string()),
        ] {
            if path.exists() {
                continue;
            }
            if !config.allow_download {
                return Err(PipelineError::Embedding(format!(
                    "{} not found and downloads are disabled",
                    path.display()
                )));
            }
            let url = model_file_url(&config.model, &remote);
            download(&url, path, Duration::from_secs(config.request_timeout_secs)).await?;
        }

        let max_length = config.max_length;
        let model = tokio::task::spawn_blocking(move || {
            OnnxModel::from_files(&model_path, &tokenizer_path, max_length)
        })
        .await
        .map_err(|e| PipelineError::Task(format!("loading onnx model failed: {}", e)))??;

        info!("ONNX embedder initialized successfully");
        Ok(Self {
            model: Arc::new(model),
            dimensions: config.dimensions,
        })
    }
}

impl OnnxModel {
    fn from_files(model_path: &Path, tokenizer_path: &Path, max_length: usize) -> Result<Self> {
        let session = Session::builder()
            .map_err(|e| embedding_error("Failed to create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| embedding_error("Failed to set optimization level", e))?
            .with_intra_threads(4)
            .map_err(|e| embedding_error("Failed to set threads", e))?
            .commit_from_file(model_path)
            .map_err(|e| embedding_error("Failed to load model", e))?;

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| embedding_error("Failed to load tokenizer", e))?;

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            max_length,
        })
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| embedding_error("Tokenization failed", e))?;

        let seq_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(self.max_length);

        let mut input_ids = vec![0i64; batch_size * seq_len];
        let mut attention_mask = vec![0i64; batch_size * seq_len];
        let mut token_type_ids = vec![0i64; batch_size * seq_len];

        for (row, encoding) in encodings.iter().enumerate() {
            let offset = row * seq_len;
            let tokens = encoding
                .get_ids()
                .iter()
                .zip(encoding.get_attention_mask())
                .zip(encoding.get_type_ids())
                .take(seq_len);
            for (column, ((&id, &mask), &kind)) in tokens.enumerate() {
                input_ids[offset + column] = i64::from(id);
                attention_mask[offset + column] = i64::from(mask);
                token_type_ids[offset + column] = i64::from(kind);
            }
        }

        let shape = vec![batch_size, seq_len];
        let inputs = vec![
            ("input_ids", tensor(&shape, input_ids)?.into_dyn()),
            ("attention_mask", tensor(&shape, attention_mask.clone())?.into_dyn()),
            ("token_type_ids", tensor(&shape, token_type_ids)?.into_dyn()),
        ];

        let mut session = self
            .session
            .lock()
            .map_err(|_| PipelineError::Embedding("onnx session lock poisoned".to_string()))?;
        let outputs = session
            .run(inputs)
            .map_err(|e| embedding_error("Inference failed", e))?;

        let named: Vec<_> = outputs.iter().collect();
        let hidden = named
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| named.first())
            .map(|(_, value)| value)
            .ok_or_else(|| PipelineError::Embedding("No output tensor".to_string()))?;

        let (shape, data) = hidden
            .try_extract_tensor::<f32>()
            .map_err(|e| embedding_error("Failed to extract tensor", e))?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();
        let hidden_size = dims.get(2).copied().unwrap_or(0);
        debug!(
            "Ran onnx inference on {} texts ({} tokens, {} hidden)",
            batch_size, seq_len, hidden_size
        );

        Ok(mean_pool(data, &attention_mask, batch_size, seq_len, hidden_size))
    }
}

#[async_trait]
impl Embedder for OnnxEmbedder {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_many(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| PipelineError::Embedding("Empty embedding result".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || model.embed_batch(&texts))
            .await
            .map_err(|e| PipelineError::Task(format!("onnx inference task failed: {}", e)))?
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

/// Attention-masked mean over the token axis of a `[batch, seq_len, hidden]`
/// tensor, then L2 normalisation. Rows with no attended tokens stay zero.
pub fn mean_pool(
    hidden: &[f32],
    mask: &[i64],
    batch_size: usize,
    seq_len: usize,
    hidden_size: usize,
) -> Vec<Vec<f32>> {
    let mut embeddings = Vec::with_capacity(batch_size);

    for row in 0..batch_size {
        let mut sum = vec![0.0f32; hidden_size];
        let mut count = 0.0f32;

        for token in 0..seq_len {
            let weight = mask.get(row * seq_len + token).copied().unwrap_or(0) as f32;
            if weight <= 0.0 {
                continue;
            }
            let start = (row * seq_len + token) * hidden_size;
            if let Some(values) = hidden.get(start..start + hidden_size) {
                for (total, value) in sum.iter_mut().zip(values) {
                    *total += value * weight;
                }
                count += weight;
            }
        }

        if count > 0.0 {
            sum.iter_mut().for_each(|value| *value /= count);
        }

        let norm = sum.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            sum.iter_mut().for_each(|value| *value /= norm);
        }

        embeddings.push(sum);
    }

    embeddings
}

fn tensor(shape: &[usize], values: Vec<i64>) -> Result<Tensor<i64>> {
    Tensor::from_array((shape.to_vec(), values.into_boxed_slice()))
        .map_err(|e| embedding_error("Input tensor creation failed", e))
}

fn embedding_error(context: &str, error: impl std::fmt::Display) -> PipelineError {
    PipelineError::Embedding(format!("{}: {}", context, error))
}

/// Bare model names resolve under the sentence-transformers organisation.
fn model_file_url(model: &str, file: &str) -> String {
    let repository = if model.contains('/') {
        model.to_string()
    } else {
        format!("sentence-transformers/{model}")
    };
    format!("https://huggingface.co/{repository}/resolve/main/{file}")
}

async fn download(url: &str, path: &Path, timeout: Duration) -> Result<()> {
    info!("Downloading {} to {}", url, path.display());

    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| embedding_error("Failed to build download client", e))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| embedding_error("Download failed", e))?;
    if !response.status().is_success() {
        return Err(PipelineError::Embedding(format!(
            "Download of {} failed: HTTP {}",
            url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| embedding_error("Failed to read download", e))?;

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PipelineError::FileOperation {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let partial = path.with_extension("part");
    tokio::fs::write(&partial, &bytes)
        .await
        .map_err(|e| PipelineError::FileOperation {
            path: partial.clone(),
            source: e,
        })?;
    tokio::fs::rename(&partial, path)
        .await
        .map_err(|e| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Downloaded {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
