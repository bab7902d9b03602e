use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use creatorgraph::{build_provider, check_records, run_pipeline};
use creatorgraph_common::{config::ENV_PREFIX, logger, EmbeddingProviderKind, PipelineConfig};
use creatorgraph_embed::OllamaEmbedder;
use std::path::PathBuf;
use tracing::Instrument;

/// Find project root by looking for .git directory
fn find_project_root() -> Option<PathBuf> {
    let mut current_dir = std::env::current_dir().ok()?;

    loop {
        if current_dir.join(".git").exists() {
            return Some(current_dir);
        }

        if !current_dir.pop() {
            break;
        }
    }

    None
}

/// Load .env file from project root
fn load_dotenv_from_project_root() {
    if let Some(root) = find_project_root() {
        let env_path = root.join(".env");
        if env_path.exists() {
            dotenv::from_path(&env_path).ok();
        }
    } else {
        dotenv::dotenv().ok();
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MethodArg {
    Tsne,
    Mds,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ProviderArg {
    Ollama,
    Hashing,
}

#[derive(Parser)]
#[command(name = "creatorgraph")]
#[command(about = "creatorgraph - creator similarity graph and layout builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed records and export the similarity graph
    Build {
        /// Configuration file (TOML or JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Record collection (.json or .csv)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Output artifact path
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Similarity threshold for edges
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Number of k-means clusters
        #[arg(long)]
        clusters: Option<usize>,

        /// Layout dimensionality (2 or 3)
        #[arg(long)]
        dims: Option<usize>,

        /// Projection method
        #[arg(long, value_enum)]
        method: Option<MethodArg>,

        /// Embedding provider
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
    },

    /// Load and validate records only
    Check {
        /// Record collection (.json or .csv)
        #[arg(long)]
        input: Option<PathBuf>,
    },
}

/// Override one configuration key through its environment variable
fn set_override(key: &str, value: impl ToString) {
    std::env::set_var(format!("{}_{}", ENV_PREFIX, key), value.to_string());
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load environment variables from .env at project root
    load_dotenv_from_project_root();

    match cli.command {
        Some(Commands::Build {
            config,
            input,
            output,
            format,
            threshold,
            clusters,
            dims,
            method,
            provider,
        }) => {
            // Override with CLI arguments
            if let Some(input) = &input {
                set_override("INPUT_PATH", input.display());
            }
            if let Some(output) = &output {
                set_override("OUTPUT_PATH", output.display());
            }
            if let Some(format) = format {
                set_override(
                    "OUTPUT_FORMAT",
                    match format {
                        FormatArg::Json => "json",
                        FormatArg::Csv => "csv",
                    },
                );
            }
            if let Some(threshold) = threshold {
                set_override("SIMILARITY_THRESHOLD", threshold);
            }
            if let Some(clusters) = clusters {
                set_override("CLUSTER_COUNT", clusters);
            }
            if let Some(dims) = dims {
                set_override("PROJECTION_DIMS", dims);
            }
            if let Some(method) = method {
                set_override(
                    "PROJECTION_METHOD",
                    match method {
                        MethodArg::Tsne => "tsne",
                        MethodArg::Mds => "mds",
                    },
                );
            }
            if let Some(provider) = provider {
                set_override(
                    "EMBEDDING_PROVIDER",
                    match provider {
                        ProviderArg::Ollama => "ollama",
                        ProviderArg::Hashing => "hashing",
                    },
                );
            }

            build(PipelineConfig::load(config.as_deref())?).await?;
        }
        Some(Commands::Check { input }) => {
            let config = PipelineConfig::load(None)?;
            logger::setup_console_logging(&config.log_level)?;

            let path = input.unwrap_or(config.input_path);
            let records = check_records(&path)?;
            println!("{}: {} valid records", path.display(), records.len());
        }
        None => {
            // Default: build with configuration only
            build(PipelineConfig::load(None)?).await?;
        }
    }

    Ok(())
}

async fn build(config: PipelineConfig) -> Result<()> {
    logger::setup_logging(&config.log_dir, &config.log_level)?;

    tracing::info!("creatorgraph starting...");
    tracing::info!("Configuration loaded:");
    tracing::info!("  Input: {}", config.input_path.display());
    tracing::info!("  Output: {} ({:?})", config.output_path.display(), config.output_format);
    tracing::info!("  Threshold: {}", config.similarity_threshold);
    tracing::info!(
        "  Projection: {:?} {}D, clusters: {:?}",
        config.projection_method,
        config.projection_dims,
        config.cluster_count
    );

    if config.embedding_provider == EmbeddingProviderKind::Ollama {
        let ollama = OllamaEmbedder::new(
            config.ollama_base_url.clone(),
            config.embedding_model.clone(),
        )?;
        match ollama.test_connection().await {
            Ok(true) => tracing::info!("Ollama reachable at {}", config.ollama_base_url),
            Ok(false) => tracing::warn!("Ollama at {} answered with an error", config.ollama_base_url),
            Err(e) => tracing::warn!("{}", e),
        }
    }

    let provider = build_provider(&config)?;

    let run_id = logger::new_run_id(config.seed);
    let run = logger::run_span(&run_id, &config.input_path);

    match run_pipeline(&config, provider.as_ref()).instrument(run).await {
        Ok(summary) => {
            tracing::info!(
                "Run {} done: {} nodes, {} edges ({}D embeddings) -> {}",
                run_id,
                summary.nodes,
                summary.edges,
                summary.embedding_dim,
                summary.output_path.display()
            );
            Ok(())
        }
        Err(err) => {
            tracing::error!(
                "Run {} failed at {} stage: {}",
                run_id,
                err.stage(),
                err
            );
            Err(err.into())
        }
    }
}
