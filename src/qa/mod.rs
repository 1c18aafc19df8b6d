#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::chunker::Chunk;
use crate::config::{AnswerConfig, Config, ConfigError};
use crate::embeddings::OllamaClient;
use crate::store::{ChunkMetadata, EmbeddingRecord, SearchResult, VectorStore};
use crate::{RagError, Result as RagResult};

const DEFAULT_TIMEOUT_SECONDS: u64 = 120;

const SYSTEM_PROMPT: &str = "Use the following pieces of context to answer the question at the \
end. If you don't know the answer, just say that you don't know, don't try to make up an answer.";

/// Client for an OpenAI-compatible chat-completions API.
#[derive(Debug, Clone)]
pub struct AnswerClient {
    base_url: Url,
    api_key: String,
    model: String,
    temperature: f32,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl AnswerClient {
    /// Build a chat client from the answer configuration.
    ///
    /// Fails with [`ConfigError::MissingApiKey`] when no API key is
    /// configured; this is the fatal credentials check the pipeline runs at
    /// index-build time.
    #[inline]
    pub fn new(config: &AnswerConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey)?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            base_url: config.base_url.clone(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            agent,
        })
    }

    /// Send a system + user message pair and return the assistant reply.
    #[inline]
    pub fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: self.temperature,
        };

        // Url::join would drop the final path segment of a base URL without
        // a trailing slash, so build the endpoint by hand.
        let url = format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        );
        debug!("Requesting chat completion from {}", url);

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize chat request")?;

        let auth = format!("Bearer {}", self.api_key);
        let response_text = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", auth.as_str())
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .context("Chat completion request failed")?;

        let response: ChatResponse =
            serde_json::from_str(&response_text).context("Failed to parse chat response")?;

        let answer = response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .context("Chat response contained no choices")?;

        Ok(answer)
    }
}

/// Question-answering interface bound to an embedded chunk index.
pub struct QaEngine {
    store: VectorStore,
    embedder: OllamaClient,
    answerer: AnswerClient,
    top_k: usize,
}

impl QaEngine {
    /// Embed every chunk, store the vectors, and bind the answer model into
    /// a queryable engine. Missing credentials abort here, before any
    /// embedding work starts.
    #[inline]
    pub async fn build_index(config: &Config, chunks: Vec<Chunk>) -> RagResult<Self> {
        let answerer = AnswerClient::new(&config.answer)?;
        let embedder = OllamaClient::new(&config.embedding);
        embedder
            .ping()
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;
        let mut store = VectorStore::new(&config.index_dir).await?;

        info!("Embedding {} chunks", chunks.len());
        let progress = embedding_progress_bar(chunks.len() as u64);

        let batch_size = config.embedding.batch_size as usize;
        let mut records = Vec::with_capacity(chunks.len());
        for (batch_index, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = embedder
                .embed_batch(&texts)
                .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

            for (offset, (chunk, vector)) in batch.iter().zip(vectors).enumerate() {
                records.push(EmbeddingRecord {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    metadata: ChunkMetadata {
                        heading_path: joined_heading_path(chunk),
                        content: chunk.text.clone(),
                        chunk_index: (batch_index * batch_size + offset) as u32,
                        created_at: Utc::now().to_rfc3339(),
                    },
                });
            }
            progress.inc(batch.len() as u64);
        }
        progress.finish_and_clear();

        store.store_embeddings_batch(records).await?;

        Ok(Self {
            store,
            embedder,
            answerer,
            top_k: config.answer.top_k,
        })
    }

    /// Answer a question from the most relevant indexed chunks.
    #[inline]
    pub async fn ask(&self, question: &str) -> RagResult<String> {
        debug!("Answering question: {}", question);

        let query_vector = self
            .embedder
            .embed_one(question)
            .map_err(|e| RagError::Embedding(format!("{:#}", e)))?;

        let results = self.store.search_similar(&query_vector, self.top_k).await?;
        debug!("Retrieved {} chunks for question", results.len());

        let system = format!("{}\n\n{}", SYSTEM_PROMPT, format_context(&results));
        let answer = self
            .answerer
            .complete(&system, question)
            .map_err(|e| RagError::Answer(format!("{:#}", e)))?;

        Ok(answer)
    }

    /// Number of embeddings currently indexed.
    #[inline]
    pub async fn indexed_chunks(&self) -> RagResult<u64> {
        self.store.count_embeddings().await
    }
}

/// Join a chunk's heading texts into the stored path form, outermost first.
fn joined_heading_path(chunk: &Chunk) -> Option<String> {
    if chunk.heading_path.is_empty() {
        return None;
    }
    Some(
        chunk
            .heading_path
            .iter()
            .map(|(_, text)| text.as_str())
            .join(" > "),
    )
}

/// Render retrieved chunks into the context block stuffed into the prompt.
fn format_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|result| {
            let metadata = &result.chunk_metadata;
            match &metadata.heading_path {
                Some(path) => format!("[{}]\n{}", path, metadata.content),
                None => metadata.content.clone(),
            }
        })
        .join("\n\n---\n\n")
}

fn embedding_progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} chunks embedded")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    )
}
