//! Embedding generation providers.

use crate::error::MemoryError;
use crate::Result;
use async_trait::async_trait;
use ragmem_core::config::EmbeddingConfig;
use ragmem_core::{SecretString, EMBEDDING_DIMENSIONS};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Generate embeddings for texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>>;

    /// Generate embedding for a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f64>> {
        let embeddings = self.embed(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::Embedding("No embedding returned".to_string()))
    }
}

/// OpenAI embeddings provider.
pub struct OpenAIEmbeddings {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_input_chars: usize,
}

impl OpenAIEmbeddings {
    /// Create a provider with default model, endpoint, and timeout.
    pub fn new(api_key: impl Into<SecretString>) -> Result<Self> {
        Self::from_config(&EmbeddingConfig::default(), api_key.into())
    }

    /// Create a provider from configuration with an explicit key.
    pub fn from_config(config: &EmbeddingConfig, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_input_chars: config.max_input_chars,
        })
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn dimension(&self) -> usize {
        match self.model.as_str() {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f64>>> {
        #[derive(Serialize)]
        #[serde(untagged)]
        enum Input<'a> {
            Single(&'a str),
            Batch(Vec<&'a str>),
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            input: Input<'a>,
        }

        #[derive(Deserialize)]
        struct Response {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            #[serde(default)]
            index: usize,
            embedding: Vec<f64>,
        }

        let inputs: Vec<&str> = texts
            .iter()
            .map(|t| truncate_utf16(t, self.max_input_chars))
            .collect();
        let input = if inputs.len() == 1 {
            Input::Single(inputs[0])
        } else {
            Input::Batch(inputs)
        };

        let request = Request {
            model: &self.model,
            input,
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", self.api_key.bearer())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(MemoryError::Embedding(format!(
                "API error {}: {}",
                status.as_u16(),
                text
            )));
        }

        let mut response: Response = response.json().await?;
        if response.data.len() != texts.len() {
            return Err(MemoryError::Embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                response.data.len()
            )));
        }
        response.data.sort_by_key(|d| d.index);

        let expected = self.dimension();
        response
            .data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == expected {
                    Ok(d.embedding)
                } else {
                    Err(MemoryError::Embedding(format!(
                        "Expected {} dimensions, got {}",
                        expected,
                        d.embedding.len()
                    )))
                }
            })
            .collect()
    }
}

/// Compute the deterministic local embedding for `text`.
///
/// Not semantic: similarity reflects coincidences of characters at positions,
/// not meaning.
///
/// Each UTF-16 code unit `c` at position `i` adds `c / 255` (mod 1) to slot
/// `(c * (i + 1)) mod 1536`; the result is L2-normalized unless it is all zeros.
pub fn fallback_embedding(text: &str) -> Vec<f64> {
    let dims = EMBEDDING_DIMENSIONS as u64;
    let mut embedding = vec![0.0_f64; EMBEDDING_DIMENSIONS];

    for (i, unit) in text.encode_utf16().enumerate() {
        let code = u64::from(unit);
        let idx = ((code * (i as u64 + 1)) % dims) as usize;
        embedding[idx] = (embedding[idx] + code as f64 / 255.0) % 1.0;
    }

    let magnitude = l2_norm(&embedding);
    if magnitude > 0.0 {
        for value in &mut embedding {
            *value /= magnitude;
        }
    }

    embedding
}

/// The embedding entry point used by the store and search.
///
/// Calls the configured remote provider and falls back to
/// [`fallback_embedding`] when no provider is configured or the call fails.
/// Never returns an error.
pub struct Embedder {
    remote: Option<Arc<dyn EmbeddingProvider>>,
}

impl Embedder {
    /// An embedder with no remote provider.
    pub fn fallback_only() -> Self {
        Self { remote: None }
    }

    /// An embedder that tries `provider` first.
    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            remote: Some(provider),
        }
    }

    /// Build from configuration. A missing API key selects fallback mode.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        match config.api_key.as_ref().filter(|k| !k.is_empty()) {
            Some(key) => {
                let provider = OpenAIEmbeddings::from_config(config, key.clone())?;
                Ok(Self::with_provider(Arc::new(provider)))
            }
            None => Ok(Self::fallback_only()),
        }
    }

    /// Whether a remote provider is configured.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Embed `text`, always producing a vector.
    pub async fn embed(&self, text: &str) -> Vec<f64> {
        let Some(remote) = &self.remote else {
            warn!("No embedding API key configured, using fallback embedding");
            return fallback_embedding(text);
        };

        match remote.embed_one(text).await {
            Ok(embedding) if embedding.len() == EMBEDDING_DIMENSIONS => {
                debug!(units = text.encode_utf16().count(), "Generated remote embedding");
                embedding
            }
            Ok(embedding) => {
                error!(
                    expected = EMBEDDING_DIMENSIONS,
                    actual = embedding.len(),
                    "Embedding provider returned wrong dimension, using fallback embedding"
                );
                fallback_embedding(text)
            }
            Err(e) => {
                error!(error = %e, "Embedding request failed, using fallback embedding");
                fallback_embedding(text)
            }
        }
    }
}

impl Default for Embedder {
    fn default() -> Self {
        Self::fallback_only()
    }
}

/// Cut `text` to at most `max_units` UTF-16 code units.
///
/// A surrogate pair that would straddle the limit is dropped whole.
pub fn truncate_utf16(text: &str, max_units: usize) -> &str {
    let mut units = 0;
    for (byte_idx, c) in text.char_indices() {
        units += c.len_utf16();
        if units > max_units {
            return &text[..byte_idx];
        }
    }
    text
}

/// Euclidean norm of a vector.
pub fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
