use async_trait::async_trait;
use creatorgraph_common::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// Maps text to a fixed-length vector.
///
/// Implementations must be deterministic for identical model weights and
/// input order. A batch either returns one vector per input text, in
/// order, or fails as a whole.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier, part of the embedding cache key
    fn model_name(&self) -> &str;

    /// Generate embedding for one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for many texts
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let pb = ProgressBar::new(texts.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} embeddings ({eta})")
        {
            pb.set_style(style.progress_chars("#>-"));
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
            pb.inc(1);
        }

        pb.finish_and_clear();
        Ok(vectors)
    }
}
