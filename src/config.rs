// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub structure: StructureConfig,
    pub ranking: RankingConfig,
    pub embedding: EmbeddingConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InputConfig {
    pub docs_dir: PathBuf,
    pub persona_file: PathBuf,
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StructureConfig {
    pub h1_size_multiplier: f32,
    pub h2_size_multiplier: f32,
    /// Body size assumed when a document carries no styled spans at all.
    pub default_body_size: f32,
    pub style_sampling: StyleSampling,
}

/// Which span of a block stands in for the style of the whole block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleSampling {
    #[default]
    FirstSpan,
    Majority,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RankingConfig {
    pub chunk_target_word_count: usize,
    pub top_n_sections: usize,
    pub top_n_sub_sections: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    #[default]
    Hashing,
    Http,
    Onnx,
}

impl EmbeddingProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::Http => "http",
            Self::Onnx => "onnx",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub dimensions: usize,
    pub batch_size: usize,
    pub request_timeout_secs: u64,
    /// Holds `model.onnx` and `tokenizer.json` for the onnx provider.
    pub cache_dir: PathBuf,
    /// Token limit per text for the onnx provider.
    pub max_length: usize,
    pub allow_download: bool,
    /// Use the hashing embedder when the onnx model cannot be loaded.
    pub fallback_to_hashing: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub parallel_workers: usize,
    pub skip_failed_documents: bool,
    pub show_progress: bool,
    pub pretty_output: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("input/docs"),
            persona_file: PathBuf::from("input/challenge1b_input.json"),
            output_file: PathBuf::from("output/results.json"),
        }
    }
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            h1_size_multiplier: 1.5,
            h2_size_multiplier: 1.2,
            default_body_size: 10.0,
            style_sampling: StyleSampling::FirstSpan,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            chunk_target_word_count: 250,
            top_n_sections: 10,
            top_n_sub_sections: 15,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashing,
            endpoint: None,
            api_key: None,
            model: "all-MiniLM-L6-v2".to_string(),
            dimensions: 384,
            batch_size: 32,
            request_timeout_secs: 60,
            cache_dir: PathBuf::from("models/all-MiniLM-L6-v2"),
            max_length: 256,
            allow_download: true,
            fallback_to_hashing: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            parallel_workers: 4,
            skip_failed_documents: false,
            show_progress: true,
            pretty_output: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new("config/default.toml")).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("PERSONA_DIGEST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.ranking.chunk_target_word_count == 0 {
            return Err(PipelineError::Config(
                "chunk_target_word_count must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.parallel_workers == 0 {
            return Err(PipelineError::Config(
                "parallel_workers must be greater than 0".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(PipelineError::Config(
                "dimensions must be greater than 0".to_string(),
            ));
        }

        let structure = &self.structure;
        if structure.h2_size_multiplier <= 0.0 || structure.default_body_size <= 0.0 {
            return Err(PipelineError::Config(
                "size multipliers and default_body_size must be positive".to_string(),
            ));
        }

        if structure.h1_size_multiplier < structure.h2_size_multiplier {
            return Err(PipelineError::Config(format!(
                "h1_size_multiplier ({}) must not be below h2_size_multiplier ({})",
                structure.h1_size_multiplier, structure.h2_size_multiplier
            )));
        }

        if self.embedding.provider == EmbeddingProviderKind::Http
            && self
                .embedding
                .endpoint
                .as_deref()
                .is_none_or(|endpoint| endpoint.trim().is_empty())
        {
            return Err(PipelineError::Config(
                "the http embedding provider requires embedding.endpoint".to_string(),
            ));
        }

        if self.embedding.provider == EmbeddingProviderKind::Onnx {
            if self.embedding.max_length == 0 {
                return Err(PipelineError::Config(
                    "max_length must be greater than 0".to_string(),
                ));
            }
            if self.embedding.model.trim().is_empty() {
                return Err(PipelineError::Config(
                    "the onnx embedding provider requires embedding.model".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_values() {
        let config = Config::default_config();
        assert_eq!(config.ranking.chunk_target_word_count, 250);
        assert_eq!(config.ranking.top_n_sections, 10);
        assert_eq!(config.ranking.top_n_sub_sections, 15);
        assert_eq!(config.structure.h1_size_multiplier, 1.5);
        assert_eq!(config.structure.h2_size_multiplier, 1.2);
        assert_eq!(config.structure.style_sampling, StyleSampling::FirstSpan);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            "[ranking]\ntop_n_sections = 3\n\n[structure]\nstyle_sampling = \"majority\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.ranking.top_n_sections, 3);
        assert_eq!(config.ranking.top_n_sub_sections, 15);
        assert_eq!(config.structure.style_sampling, StyleSampling::Majority);
        assert_eq!(config.embedding.batch_size, 32);
    }

    #[test]
    fn test_validate_rejects_zero_word_count() {
        let mut config = Config::default_config();
        config.ranking.chunk_target_word_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_multipliers() {
        let mut config = Config::default_config();
        config.structure.h1_size_multiplier = 1.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_http_requires_endpoint() {
        let mut config = Config::default_config();
        config.embedding.provider = EmbeddingProviderKind::Http;
        assert!(config.validate().is_err());

        config.embedding.endpoint = Some("http://localhost:8080/v1/embeddings".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_onnx_provider_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            "[embedding]\nprovider = \"onnx\"\ncache_dir = \"cache/minilm\"\nallow_download = false\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Onnx);
        assert_eq!(config.embedding.provider.as_str(), "onnx");
        assert_eq!(config.embedding.cache_dir, PathBuf::from("cache/minilm"));
        assert!(!config.embedding.allow_download);
        assert!(config.embedding.fallback_to_hashing);
        assert_eq!(config.embedding.max_length, 256);

        let mut config = config;
        config.embedding.max_length = 0;
        assert!(config.validate().is_err());
    }
}
