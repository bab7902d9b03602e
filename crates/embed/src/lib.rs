//! creatorgraph embedding providers
//!
//! The pipeline only sees the `EmbeddingProvider` trait; model choice and
//! hardware live behind it.

mod cache;
mod hashing;
mod ollama;
mod provider;
mod text;
mod types;

pub use cache::{cache_key, CachedEmbedder, EmbeddingCache};
pub use hashing::HashingEmbedder;
pub use ollama::OllamaEmbedder;
pub use provider::EmbeddingProvider;
pub use text::{clean_description, compose_embedding_text};
pub use types::{EmbedRequest, EmbedResponse};
