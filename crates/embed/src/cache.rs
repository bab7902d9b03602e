use async_trait::async_trait;
use chrono::{DateTime, Utc};
use creatorgraph_common::{write_atomic, CreatorGraphError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::provider::EmbeddingProvider;

/// Cache key for a (model, text) pair
pub fn cache_key(model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Persistent embedding cache file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingCache {
    /// Last write time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// cache_key -> embedding
    #[serde(default)]
    pub entries: HashMap<String, Vec<f32>>,
}

impl EmbeddingCache {
    /// Load cache from file; a missing or unreadable file yields an empty cache
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(CreatorGraphError::from)
            .and_then(|data| serde_json::from_str::<Self>(&data).map_err(CreatorGraphError::from));

        match parsed {
            Ok(cache) => {
                info!(
                    "Embedding cache loaded: {} entries from {}",
                    cache.entries.len(),
                    path.display()
                );
                cache
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable embedding cache {}: {}",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Write cache atomically
    pub fn save(&mut self, path: &Path) -> Result<()> {
        self.updated_at = Some(Utc::now());
        let data = serde_json::to_vec(self)?;
        write_atomic(path, &data)
    }

    pub fn get(&self, model: &str, text: &str) -> Option<&Vec<f32>> {
        self.entries.get(&cache_key(model, text))
    }

    pub fn insert(&mut self, model: &str, text: &str, embedding: Vec<f32>) {
        self.entries.insert(cache_key(model, text), embedding);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Provider wrapper that skips texts already embedded by the same model
pub struct CachedEmbedder<P> {
    inner: P,
    path: PathBuf,
    cache: Mutex<EmbeddingCache>,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(inner: P, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let cache = EmbeddingCache::load(&path);
        Self {
            inner,
            path,
            cache: Mutex::new(cache),
        }
    }

    /// Number of cached vectors
    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| CreatorGraphError::embedding("Provider returned no embedding"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let model = self.inner.model_name().to_string();

        // Collect distinct misses
        let misses: Vec<String> = {
            let cache = self.cache.lock().await;
            let mut seen = std::collections::HashSet::new();
            let misses: Vec<String> = texts
                .iter()
                .filter(|t| cache.get(&model, t).is_none())
                .filter(|t| seen.insert(t.as_str()))
                .cloned()
                .collect();
            misses
        };

        info!(
            "Embedding cache: {} hits, {} misses",
            texts.len() - texts.iter().filter(|t| misses.contains(t)).count(),
            misses.len()
        );

        let mut cache = self.cache.lock().await;

        if !misses.is_empty() {
            let fresh = self.inner.embed_batch(&misses).await?;
            if fresh.len() != misses.len() {
                return Err(CreatorGraphError::embedding(format!(
                    "Provider returned {} embeddings for {} texts",
                    fresh.len(),
                    misses.len()
                )));
            }

            for (text, embedding) in misses.iter().zip(fresh) {
                cache.insert(&model, text, embedding);
            }
            cache.save(&self.path)?;
            debug!("Embedding cache saved: {}", self.path.display());
        }

        texts
            .iter()
            .map(|t| {
                cache.get(&model, t).cloned().ok_or_else(|| {
                    CreatorGraphError::embedding(format!("Missing cached embedding for '{}'", t))
                })
            })
            .collect()
    }
}
