use async_trait::async_trait;
use creatorgraph::{run_pipeline, PipelineSummary};
use creatorgraph_common::{
    AssemblyStrictness, CreatorGraphError, EmbeddingProviderKind, OutputFormat, PipelineConfig,
    ProjectionMethod, Result,
};
use creatorgraph_embed::{EmbeddingProvider, HashingEmbedder};
use creatorgraph_graph::read_graph_json;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

const CREATORS: &str = r#"[
    {"id": "UC01", "title": "Kitchen Nights", "description": "home cooking recipes and baking bread",
     "thumbnail": "http://img/01", "youtube_url": "https://youtube.com/@kitchen", "subscribers": "1,500,000"},
    {"id": "UC02", "title": "Bread Lab", "description": "baking bread and sourdough recipes at home",
     "thumbnail": "http://img/02", "subscribers": 820000},
    {"id": "UC03", "title": "Street Eats", "description": "street food recipes and cooking tours",
     "subscribers": "N/A"},
    {"id": "UC04", "title": "Frame Perfect", "description": "speedrun gaming world records and glitches",
     "thumbnail": "http://img/04", "subscribers": 45000},
    {"id": "UC05", "title": "Retro Runs", "description": "retro gaming speedrun routes and world records",
     "thumbnail": "http://img/05"},
    {"id": "UC06", "title": "Boss Rush", "description": "gaming challenge runs and boss glitches",
     "thumbnail": "http://img/06", "subscribers": "12000"}
]"#;

fn config_in(dir: &Path, output: &str) -> PipelineConfig {
    let input = dir.join("youtubers_data.json");
    fs::write(&input, CREATORS).unwrap();

    PipelineConfig {
        input_path: input,
        output_path: dir.join("out").join(output),
        similarity_threshold: 0.3,
        embedding_provider: EmbeddingProviderKind::Hashing,
        hashing_dims: 256,
        log_dir: dir.join("log"),
        ..PipelineConfig::default()
    }
}

/// Returns one vector fewer than requested
struct ShortProvider;

#[async_trait]
impl EmbeddingProvider for ShortProvider {
    fn model_name(&self) -> &str {
        "short"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Ok(vec![1.0, 0.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![vec![1.0, 0.0]; texts.len().saturating_sub(1)])
    }
}

struct DownProvider;

#[async_trait]
impl EmbeddingProvider for DownProvider {
    fn model_name(&self) -> &str {
        "down"
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(CreatorGraphError::embedding("connection refused"))
    }
}

#[tokio::test]
async fn test_build_graph_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        cluster_count: Some(2),
        ..config_in(dir.path(), "graph_data.json")
    };
    let provider = HashingEmbedder::new(config.hashing_dims);

    let summary: PipelineSummary = run_pipeline(&config, &provider).await.unwrap();
    assert_eq!(summary.records, 6);
    assert_eq!(summary.nodes, 6);
    assert_eq!(summary.embedding_dim, 256);
    assert_eq!(summary.clusters, Some(2));

    let graph = read_graph_json(&config.output_path).unwrap();
    assert_eq!(graph.nodes.len(), 6);
    assert_eq!(graph.edges.len(), summary.edges);

    let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut pairs = HashSet::new();
    for edge in &graph.edges {
        assert!(ids.contains(edge.source.as_str()));
        assert!(ids.contains(edge.target.as_str()));
        assert!(edge.source < edge.target);
        assert!(edge.weight > config.similarity_threshold);
        assert!(pairs.insert((edge.source.clone(), edge.target.clone())));
    }

    for node in &graph.nodes {
        assert!(node.x.is_finite() && node.y.is_finite());
        assert!(node.z.is_none());
        assert!(matches!(node.cluster, Some(0) | Some(1)));
        assert_eq!(node.shape, "circularImage");
    }
}

#[tokio::test]
async fn test_build_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let first = config_in(dir.path(), "first.json");
    let second = PipelineConfig {
        output_path: dir.path().join("out").join("second.json"),
        ..first.clone()
    };
    let provider = HashingEmbedder::new(first.hashing_dims);

    run_pipeline(&first, &provider).await.unwrap();
    run_pipeline(&second, &provider).await.unwrap();

    assert_eq!(
        fs::read_to_string(&first.output_path).unwrap(),
        fs::read_to_string(&second.output_path).unwrap()
    );
}

#[tokio::test]
async fn test_build_csv_3d_mds() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        output_format: OutputFormat::Csv,
        projection_method: ProjectionMethod::Mds,
        projection_dims: 3,
        cluster_count: Some(3),
        strictness: AssemblyStrictness::Lenient,
        ..config_in(dir.path(), "starmap.csv")
    };
    let provider = HashingEmbedder::new(config.hashing_dims);

    let summary = run_pipeline(&config, &provider).await.unwrap();
    assert_eq!(summary.output_format, OutputFormat::Csv);

    let data = fs::read_to_string(&config.output_path).unwrap();
    let mut lines = data.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,title,description,thumbnail,youtube_url,cluster_id,x,y,z"
    );
    assert_eq!(lines.count(), 6);
}

#[tokio::test]
async fn test_too_many_clusters_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig {
        cluster_count: Some(7),
        ..config_in(dir.path(), "graph_data.json")
    };
    let provider = HashingEmbedder::new(config.hashing_dims);

    let err = run_pipeline(&config, &provider).await.unwrap_err();
    assert!(matches!(err, CreatorGraphError::Clustering(_)));
    assert!(err.to_string().contains("7 clusters from 6 records"));
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_embedding_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "graph_data.json");

    let err = run_pipeline(&config, &ShortProvider).await.unwrap_err();
    assert_eq!(err.stage(), "embedding");
    assert!(err.to_string().contains("5 embeddings for 6 records"));
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_provider_failure_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path(), "graph_data.json");

    let err = run_pipeline(&config, &DownProvider).await.unwrap_err();
    assert!(matches!(err, CreatorGraphError::Embedding(_)));
    assert!(!config.output_path.exists());
}

#[tokio::test]
async fn test_single_record_fails_projection() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("one.json");
    fs::write(
        &input,
        r#"[{"id": "UC01", "title": "Solo", "description": "just one channel"}]"#,
    )
    .unwrap();
    let config = PipelineConfig {
        input_path: input,
        ..config_in(dir.path(), "graph_data.json")
    };
    let provider = HashingEmbedder::new(config.hashing_dims);

    let err = run_pipeline(&config, &provider).await.unwrap_err();
    assert!(matches!(err, CreatorGraphError::Projection(_)));
    assert!(err.to_string().contains("got 1"));
}
