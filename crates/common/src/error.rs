/// creatorgraph error types
///
/// Every variant is fatal for the current run. The pipeline never retries;
/// the operator reruns it after fixing the input or the provider.
#[derive(Debug, thiserror::Error)]
pub enum CreatorGraphError {
    /// Missing/malformed input file, duplicate id, missing required field
    #[error("Load error: {0}")]
    Load(String),

    /// Embedding provider failure
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Invalid projection input or hyperparameter
    #[error("Projection error: {0}")]
    Projection(String),

    /// Invalid cluster count for the record set
    #[error("Clustering error: {0}")]
    Clustering(String),

    /// Internal consistency failure while joining nodes and edges
    #[error("Assembly error: {0}")]
    Assembly(String),

    /// Output artifact could not be produced
    #[error("Export error: {0}")]
    Export(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CreatorGraphError {
    /// Create load error
    pub fn load<S: Into<String>>(msg: S) -> Self {
        Self::Load(msg.into())
    }

    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create projection error
    pub fn projection<S: Into<String>>(msg: S) -> Self {
        Self::Projection(msg.into())
    }

    /// Create clustering error
    pub fn clustering<S: Into<String>>(msg: S) -> Self {
        Self::Clustering(msg.into())
    }

    /// Create assembly error
    pub fn assembly<S: Into<String>>(msg: S) -> Self {
        Self::Assembly(msg.into())
    }

    /// Create export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::Export(msg.into())
    }

    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

impl CreatorGraphError {
    /// Pipeline stage the error belongs to, for the final log line
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Load(_) => "load",
            Self::Embedding(_) => "embedding",
            Self::Projection(_) => "projection",
            Self::Clustering(_) => "clustering",
            Self::Assembly(_) => "assembly",
            Self::Export(_) => "export",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}
