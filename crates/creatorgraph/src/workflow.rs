use creatorgraph_common::logger::stage_span;
use creatorgraph_common::{
    CreatorGraphError, EmbeddingProviderKind, OutputFormat, PipelineConfig, Result,
};
use creatorgraph_embed::{
    compose_embedding_text, CachedEmbedder, EmbeddingProvider, HashingEmbedder, OllamaEmbedder,
};
use creatorgraph_graph::{export, load_records, GraphAssembler, Record, SimilarityEdge};
use creatorgraph_vector::{
    Coordinate, EdgeFinder, EmbeddingMatrix, ExhaustiveEdgeFinder, KMeans, ProjectionOptions,
    Projector,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn, Instrument};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStep {
    Load,
    Embedding,
    Similarity,
    Projection,
    Clustering,
    Assembly,
    Export,
}

impl PipelineStep {
    /// Name used for the `stage` log span
    pub fn name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Embedding => "embedding",
            Self::Similarity => "similarity",
            Self::Projection => "projection",
            Self::Clustering => "clustering",
            Self::Assembly => "assembly",
            Self::Export => "export",
        }
    }
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub records: usize,
    pub embedding_dim: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Cluster count, when clustering ran
    pub clusters: Option<usize>,
    pub output_path: PathBuf,
    pub output_format: OutputFormat,
}

/// Build the embedding provider named by the configuration, wrapped in the
/// persistent cache when `embedding_cache_path` is set
pub fn build_provider(config: &PipelineConfig) -> Result<Box<dyn EmbeddingProvider>> {
    let cache = config.embedding_cache_path.clone();

    let provider: Box<dyn EmbeddingProvider> = match (config.embedding_provider, cache) {
        (EmbeddingProviderKind::Ollama, None) => Box::new(OllamaEmbedder::new(
            config.ollama_base_url.clone(),
            config.embedding_model.clone(),
        )?),
        (EmbeddingProviderKind::Ollama, Some(path)) => Box::new(CachedEmbedder::new(
            OllamaEmbedder::new(
                config.ollama_base_url.clone(),
                config.embedding_model.clone(),
            )?,
            path,
        )),
        (EmbeddingProviderKind::Hashing, None) => {
            Box::new(HashingEmbedder::new(config.hashing_dims))
        }
        (EmbeddingProviderKind::Hashing, Some(path)) => Box::new(CachedEmbedder::new(
            HashingEmbedder::new(config.hashing_dims),
            path,
        )),
    };

    info!("Embedding provider: {}", provider.model_name());
    Ok(provider)
}

/// Load and validate the record collection without embedding anything
pub fn check_records(path: &Path) -> Result<Vec<Record>> {
    let records = load_records(path)?;
    let missing_thumbnails = records.iter().filter(|r| r.thumbnail.is_none()).count();
    if missing_thumbnails > 0 {
        warn!("{} records have no thumbnail", missing_thumbnails);
    }
    Ok(records)
}

/// Run one full pass: load, embed, link, project, cluster, assemble, export.
///
/// Each stage runs inside its own `stage` span. The output file is written
/// only after every stage has succeeded.
pub async fn run_pipeline(
    config: &PipelineConfig,
    provider: &dyn EmbeddingProvider,
) -> Result<PipelineSummary> {
    config.validate()?;

    // Step 1: Load records
    let records = {
        let _stage = stage_span(PipelineStep::Load.name()).entered();
        info!("Loading records from {}", config.input_path.display());
        let records = load_records(&config.input_path)?;
        if records.is_empty() {
            return Err(CreatorGraphError::load(format!(
                "No records in {}",
                config.input_path.display()
            )));
        }
        records
    };

    // Step 2: Embed
    let texts: Vec<String> = records
        .iter()
        .map(|r| {
            compose_embedding_text(
                &r.title,
                &r.description,
                r.rich_text.as_deref(),
                config.max_description_chars,
            )
        })
        .collect();

    let embedding_span = stage_span(PipelineStep::Embedding.name());
    embedding_span.in_scope(|| {
        info!(
            "Embedding {} records with {}",
            records.len(),
            provider.model_name()
        )
    });
    let vectors = provider
        .embed_batch(&texts)
        .instrument(embedding_span)
        .await?;
    if vectors.len() != records.len() {
        return Err(CreatorGraphError::embedding(format!(
            "Provider returned {} embeddings for {} records",
            vectors.len(),
            records.len()
        )));
    }
    let matrix = EmbeddingMatrix::from_rows(&vectors)?;

    // Step 3: Similarity edges
    let edges: Vec<SimilarityEdge> = {
        let _stage = stage_span(PipelineStep::Similarity.name()).entered();
        info!(
            "Linking records with similarity > {}",
            config.similarity_threshold
        );
        ExhaustiveEdgeFinder
            .find_edges(&matrix, config.similarity_threshold)?
            .into_iter()
            .map(|e| {
                SimilarityEdge::new(
                    records[e.source].id.clone(),
                    records[e.target].id.clone(),
                    e.weight,
                )
            })
            .collect()
    };

    // Step 4: Projection
    let coordinates: HashMap<String, Coordinate> = {
        let _stage = stage_span(PipelineStep::Projection.name()).entered();
        let projector = Projector::new(ProjectionOptions::from_config(config));
        records
            .iter()
            .map(|r| r.id.clone())
            .zip(projector.project(&matrix)?)
            .collect()
    };

    // Step 5: Clustering (optional)
    let labels: Option<HashMap<String, usize>> = match config.cluster_count {
        Some(k) => {
            let _stage = stage_span(PipelineStep::Clustering.name()).entered();
            let assignment = KMeans::new(k, config.seed).fit(matrix.as_array())?;
            info!(
                "Cluster sizes: {:?} (inertia {:.4})",
                assignment.sizes(),
                assignment.inertia
            );
            Some(
                records
                    .iter()
                    .map(|r| r.id.clone())
                    .zip(assignment.labels)
                    .collect(),
            )
        }
        None => None,
    };

    // Step 6: Assembly
    let record_count = records.len();
    let graph = {
        let _stage = stage_span(PipelineStep::Assembly.name()).entered();
        GraphAssembler::new(config.strictness).assemble(
            records,
            &coordinates,
            labels.as_ref(),
            edges,
        )?
    };

    // Step 7: Export
    {
        let _stage = stage_span(PipelineStep::Export.name()).entered();
        info!(
            "Writing {:?} output to {}",
            config.output_format,
            config.output_path.display()
        );
        export(&config.output_path, config.output_format, &graph)?;
    }

    Ok(PipelineSummary {
        records: record_count,
        embedding_dim: matrix.dim(),
        nodes: graph.nodes.len(),
        edges: graph.edges.len(),
        clusters: config.cluster_count,
        output_path: config.output_path.clone(),
        output_format: config.output_format,
    })
}
