use async_trait::async_trait;
use creatorgraph_common::{CreatorGraphError, Result};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::provider::EmbeddingProvider;
use crate::types::{EmbedRequest, EmbedResponse};

/// Default attempts per embedding request
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Ollama embedding client
#[derive(Debug, Clone)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: Client,
    max_retries: u32,
}

impl OllamaEmbedder {
    /// Create new Ollama embedder
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(300))
            .build()
            .map_err(|e| {
                CreatorGraphError::embedding(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("Ollama embedder initialized: {} (model={})", base_url, model);
        Ok(Self {
            base_url,
            model,
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Override the number of attempts per request (minimum 1)
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Embeddings endpoint URL
    pub fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }

    /// Test connection to Ollama
    pub async fn test_connection(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            CreatorGraphError::embedding(format!("Failed to connect to Ollama: {}", e))
        })?;
        Ok(response.status().is_success())
    }

    /// Generate embedding with retry
    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.endpoint();
        let request = EmbedRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        debug!(
            "Generating embedding - Model: {}, Text length: {}",
            self.model,
            text.len()
        );

        let mut last_error = None;

        for attempt in 1..=self.max_retries {
            match self.try_embed(&url, &request).await {
                Ok(embedding) => {
                    debug!("Received embedding - Dimension: {}", embedding.len());
                    return Ok(embedding);
                }
                Err(e) => {
                    if attempt < self.max_retries {
                        let delay = std::time::Duration::from_secs(2u64.pow(attempt - 1));
                        warn!(
                            "Embedding request failed (attempt {}/{}): {}. Retrying in {:?}...",
                            attempt, self.max_retries, e, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| CreatorGraphError::embedding("All embedding attempts failed")))
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbedRequest) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                CreatorGraphError::embedding(format!("Failed to send embedding request: {}", e))
            })?
            .error_for_status()
            .map_err(|e| CreatorGraphError::embedding(format!("Ollama embedding API error: {}", e)))?;

        let result: EmbedResponse = response.json().await.map_err(|e| {
            CreatorGraphError::embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        if result.embedding.is_empty() {
            return Err(CreatorGraphError::embedding("Empty embedding from Ollama"));
        }

        Ok(result.embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_with_retry(text).await
    }
}
