// file: src/embedding/http.rs
// description: client for OpenAI-compatible embedding endpoints
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::EmbeddingConfig;
use crate::embedding::Embedder;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

pub struct HttpEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimensions: usize,
}

impl HttpEmbeddingClient {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        model: String,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Embedding(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint,
            api_key,
            model,
            dimensions,
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| {
                PipelineError::Config("embedding.endpoint is required for http".to_string())
            })?;

        Self::new(
            endpoint,
            config.api_key.clone(),
            config.model.clone(),
            config.dimensions,
            Duration::from_secs(config.request_timeout_secs.max(1)),
        )
    }

    async fn request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input: texts,
            model: &self.model,
        };

        debug!(
            "Requesting {} embedding(s) from {}",
            texts.len(),
            self.endpoint
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder.send().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to send embedding request: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PipelineError::Embedding(format!(
                "Embedding request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            PipelineError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        order_embeddings(body.data, texts.len())
    }
}

/// Restores request order using each item's `index`, when the server sends it.
fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(PipelineError::Embedding(format!(
            "Expected {} embeddings, received {}",
            expected,
            data.len()
        )));
    }

    if data.iter().all(|item| item.index.is_some()) {
        data.sort_by_key(|item| item.index);
    }

    Ok(data.into_iter().map(|item| item.embedding).collect())
}

#[async_trait]
impl Embedder for HttpEmbeddingClient {
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| PipelineError::Embedding("No embedding data returned".to_string()))
    }

    async fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(index: Option<usize>, value: f32) -> EmbeddingData {
        EmbeddingData {
            index,
            embedding: vec![value],
        }
    }

    #[test]
    fn test_order_embeddings_by_index() {
        let data = vec![item(Some(1), 1.0), item(Some(0), 0.0), item(Some(2), 2.0)];
        let ordered = order_embeddings(data, 3).unwrap();
        assert_eq!(ordered, vec![vec![0.0], vec![1.0], vec![2.0]]);
    }

    #[test]
    fn test_order_embeddings_without_index_keeps_order() {
        let data = vec![item(None, 5.0), item(None, 4.0)];
        let ordered = order_embeddings(data, 2).unwrap();
        assert_eq!(ordered, vec![vec![5.0], vec![4.0]]);
    }

    #[test]
    fn test_count_mismatch_is_error() {
        let err = order_embeddings(vec![item(Some(0), 0.0)], 2).unwrap_err();
        assert!(matches!(err, PipelineError::Embedding(_)));
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"object":"list","data":[{"object":"embedding","index":0,"embedding":[0.1,0.2]}],"model":"m"}"#;
        let parsed: EmbeddingResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2]);
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        assert!(HttpEmbeddingClient::from_config(&EmbeddingConfig::default()).is_err());

        let config = EmbeddingConfig {
            endpoint: Some("http://127.0.0.1:9/v1/embeddings".to_string()),
            ..EmbeddingConfig::default()
        };
        let client = HttpEmbeddingClient::from_config(&config).unwrap();
        assert_eq!(client.dimensions(), 384);
        assert_eq!(client.name(), "http");
    }
}
