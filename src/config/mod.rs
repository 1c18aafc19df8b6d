
use std::env;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::chunker::ChunkerConfig;

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_INDEX_DIR: &str = "./vectors";
pub const DEFAULT_ANSWER_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_ANSWER_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_EMBEDDING_URL: &str = "http://localhost:11434";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text:latest";

/// Process-wide configuration, built once from the environment in `main`
/// and passed by reference into each component constructor. Library modules
/// never read the environment themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Pages to fetch and index.
    pub urls: Vec<Url>,
    /// Directory where fetched HTML is persisted and loaded back from.
    pub data_dir: PathBuf,
    /// Directory backing the vector index.
    pub index_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub answer: AnswerConfig,
    pub chunking: ChunkerConfig,
}

/// Connection settings for the local embedding server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    pub base_url: Url,
    pub model: String,
    pub batch_size: u32,
}

/// Settings for the answer-generation provider. The API key is optional
/// here; its absence only becomes fatal when the QA engine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerConfig {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    /// How many retrieved chunks are stuffed into the answer prompt.
    pub top_k: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No target URLs configured (set WEBRAG_URLS to a comma-separated list)")]
    MissingUrls,
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Invalid temperature: {0} (must be between 0.0 and 2.0)")]
    InvalidTemperature(f32),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid max chunk size: 0 (must be at least 1)")]
    InvalidMaxChunkSize,
    #[error("Chunk overlap ({0}) must be smaller than the max chunk size ({1})")]
    OverlapTooLarge(usize, usize),
    #[error("OPENROUTER_API_KEY is not set; the answer-generation provider requires credentials")]
    MissingApiKey,
}

impl Config {
    /// Build the configuration from process environment variables.
    #[inline]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. This is what
    /// `from_env` delegates to and what tests drive directly.
    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let urls_raw = lookup("WEBRAG_URLS").ok_or(ConfigError::MissingUrls)?;
        let urls = parse_url_list(&urls_raw)?;
        if urls.is_empty() {
            return Err(ConfigError::MissingUrls);
        }

        let data_dir = lookup("WEBRAG_DATA_DIR")
            .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
            .into();
        let index_dir = lookup("WEBRAG_INDEX_DIR")
            .unwrap_or_else(|| DEFAULT_INDEX_DIR.to_string())
            .into();

        let embedding = EmbeddingConfig {
            base_url: parse_url(
                &lookup("WEBRAG_OLLAMA_URL").unwrap_or_else(|| DEFAULT_EMBEDDING_URL.to_string()),
            )?,
            model: lookup("WEBRAG_EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            batch_size: parse_number(&lookup, "WEBRAG_EMBEDDING_BATCH_SIZE", 16)?,
        };

        let answer = AnswerConfig {
            api_key: lookup("OPENROUTER_API_KEY").filter(|key| !key.trim().is_empty()),
            base_url: parse_url(
                &lookup("OPENROUTER_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ANSWER_BASE_URL.to_string()),
            )?,
            model: lookup("WEBRAG_ANSWER_MODEL")
                .unwrap_or_else(|| DEFAULT_ANSWER_MODEL.to_string()),
            temperature: parse_number(&lookup, "WEBRAG_TEMPERATURE", 0.0)?,
            top_k: parse_number(&lookup, "WEBRAG_TOP_K", 4)?,
        };

        let chunking = ChunkerConfig {
            max_chunk_size: parse_number(&lookup, "WEBRAG_MAX_CHUNK_SIZE", 500)?,
            chunk_overlap: parse_number(&lookup, "WEBRAG_CHUNK_OVERLAP", 30)?,
            ..ChunkerConfig::default()
        };

        let config = Self {
            urls,
            data_dir,
            index_dir,
            embedding,
            answer,
            chunking,
        };
        config.validate()?;
        Ok(config)
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.answer.validate()?;

        if self.chunking.max_chunk_size == 0 {
            return Err(ConfigError::InvalidMaxChunkSize);
        }
        if self.chunking.chunk_overlap >= self.chunking.max_chunk_size {
            return Err(ConfigError::OverlapTooLarge(
                self.chunking.chunk_overlap,
                self.chunking.max_chunk_size,
            ));
        }

        Ok(())
    }
}

impl EmbeddingConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }
        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }
        Ok(())
    }
}

impl AnswerConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidTemperature(self.temperature));
        }
        if self.top_k == 0 || self.top_k > 100 {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }
        Ok(())
    }
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))
}

fn parse_url_list(raw: &str) -> Result<Vec<Url>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_url)
        .collect()
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}
