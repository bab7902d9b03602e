use crate::error::CreatorGraphError;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix (`CREATORGRAPH_SIMILARITY_THRESHOLD`, ...)
pub const ENV_PREFIX: &str = "CREATORGRAPH";

/// Output artifact format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `{"nodes": [...], "edges": [...]}`
    Json,
    /// One row per record with cluster id and coordinates
    Csv,
}

/// Dimensionality reduction algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMethod {
    /// Exact t-SNE on the raw embeddings
    Tsne,
    /// Classical MDS on the cosine distance matrix
    Mds,
}

/// What the assembler does with a record that lacks layout data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssemblyStrictness {
    /// Abort the assembly
    Strict,
    /// Drop the record (and its edges) with a warning
    Lenient,
}

/// Which embedding provider backs the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Ollama `/api/embeddings`
    Ollama,
    /// Offline feature-hashing embedder
    Hashing,
}

/// creatorgraph pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Record collection to load (.json or .csv)
    pub input_path: PathBuf,

    /// Output artifact path
    pub output_path: PathBuf,

    /// Output artifact format
    pub output_format: OutputFormat,

    /// Edges are emitted only for similarity strictly above this value
    pub similarity_threshold: f64,

    /// Number of k-means clusters; clustering is skipped when unset
    #[serde(default)]
    pub cluster_count: Option<usize>,

    /// Projection algorithm
    pub projection_method: ProjectionMethod,

    /// Projection dimensionality (2 or 3)
    pub projection_dims: usize,

    /// Requested t-SNE perplexity, clamped to the record count at run time
    pub perplexity: f64,

    /// Uniform multiplier applied to projected coordinates
    pub coordinate_scale: f64,

    /// Seed for every random choice in projection and clustering
    pub seed: u64,

    /// Description characters kept in the embedding text
    pub max_description_chars: usize,

    /// Assembly policy for records without layout data
    pub strictness: AssemblyStrictness,

    /// Embedding provider
    pub embedding_provider: EmbeddingProviderKind,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Vector length of the hashing embedder
    pub hashing_dims: usize,

    /// Persistent embedding cache; disabled when unset
    #[serde(default)]
    pub embedding_cache_path: Option<PathBuf>,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("data/youtubers_data.json"),
            output_path: PathBuf::from("data/graph_data.json"),
            output_format: OutputFormat::Json,
            similarity_threshold: 0.45,
            cluster_count: None,
            projection_method: ProjectionMethod::Tsne,
            projection_dims: 2,
            perplexity: 30.0,
            coordinate_scale: 20.0,
            seed: 42,
            max_description_chars: 3000,
            strictness: AssemblyStrictness::Strict,
            embedding_provider: EmbeddingProviderKind::Ollama,
            ollama_base_url: "http://localhost:11434".to_string(),
            embedding_model: "all-minilm".to_string(),
            hashing_dims: 384,
            embedding_cache_path: None,
            log_dir: PathBuf::from("data/log"),
            log_level: "info".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration: defaults, then an optional file, then
    /// `CREATORGRAPH_*` environment variables (a `.env` file is read first)
    pub fn load(file: Option<&Path>) -> Result<Self, CreatorGraphError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let mut builder = Self::defaults_builder()?;

        if let Some(path) = file {
            if !path.exists() {
                return Err(CreatorGraphError::config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CreatorGraphError::config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Builder seeded with the values of `PipelineConfig::default()`
    fn defaults_builder(
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, CreatorGraphError> {
        let d = Self::default();
        let map_err = |e: config::ConfigError| CreatorGraphError::config(e.to_string());

        Config::builder()
            .set_default("input_path", d.input_path.to_string_lossy().to_string())
            .and_then(|b| b.set_default("output_path", d.output_path.to_string_lossy().to_string()))
            .and_then(|b| b.set_default("output_format", "json"))
            .and_then(|b| b.set_default("similarity_threshold", d.similarity_threshold))
            .and_then(|b| b.set_default("projection_method", "tsne"))
            .and_then(|b| b.set_default("projection_dims", d.projection_dims as i64))
            .and_then(|b| b.set_default("perplexity", d.perplexity))
            .and_then(|b| b.set_default("coordinate_scale", d.coordinate_scale))
            .and_then(|b| b.set_default("seed", d.seed as i64))
            .and_then(|b| b.set_default("max_description_chars", d.max_description_chars as i64))
            .and_then(|b| b.set_default("strictness", "strict"))
            .and_then(|b| b.set_default("embedding_provider", "ollama"))
            .and_then(|b| b.set_default("ollama_base_url", d.ollama_base_url))
            .and_then(|b| b.set_default("embedding_model", d.embedding_model))
            .and_then(|b| b.set_default("hashing_dims", d.hashing_dims as i64))
            .and_then(|b| b.set_default("log_dir", d.log_dir.to_string_lossy().to_string()))
            .and_then(|b| b.set_default("log_level", d.log_level))
            .map_err(map_err)
    }

    /// Whether a cluster label is assigned to every record
    pub fn clustering_enabled(&self) -> bool {
        self.cluster_count.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), CreatorGraphError> {
        if !self.similarity_threshold.is_finite()
            || !(-1.0..=1.0).contains(&self.similarity_threshold)
        {
            return Err(CreatorGraphError::config(format!(
                "Similarity threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }

        if !matches!(self.projection_dims, 2 | 3) {
            return Err(CreatorGraphError::config(format!(
                "Projection dims must be 2 or 3, got {}",
                self.projection_dims
            )));
        }

        if !self.perplexity.is_finite() || self.perplexity <= 0.0 {
            return Err(CreatorGraphError::config(format!(
                "Perplexity must be positive, got {}",
                self.perplexity
            )));
        }

        if !self.coordinate_scale.is_finite() || self.coordinate_scale <= 0.0 {
            return Err(CreatorGraphError::config(format!(
                "Coordinate scale must be positive, got {}",
                self.coordinate_scale
            )));
        }

        if self.cluster_count == Some(0) {
            return Err(CreatorGraphError::config("Cluster count cannot be 0"));
        }

        if self.hashing_dims == 0 {
            return Err(CreatorGraphError::config("Hashing dims cannot be 0"));
        }

        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://")
        {
            return Err(CreatorGraphError::config(
                "Ollama base URL must start with http:// or https://",
            ));
        }

        Ok(())
    }
}
