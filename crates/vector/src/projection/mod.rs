//! Layout of embeddings in 2D or 3D.

mod mds;
mod tsne;

use creatorgraph_common::{CreatorGraphError, PipelineConfig, ProjectionMethod, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::matrix::EmbeddingMatrix;

pub use tsne::{TSNE_EARLY_EXAGGERATION, TSNE_ITERATIONS};

/// Projected position of one record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Coordinate {
    pub fn dims(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    pub fn distance(&self, other: &Coordinate) -> f64 {
        let dz = self.z.unwrap_or(0.0) - other.z.unwrap_or(0.0);
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + dz * dz).sqrt()
    }
}

/// Perplexity actually used for `n` records: `clamp(requested, 1, n - 1)`
pub fn effective_perplexity(requested: f64, n: usize) -> Result<f64> {
    if !requested.is_finite() || requested <= 0.0 {
        return Err(CreatorGraphError::projection(format!(
            "Perplexity must be positive, got {}",
            requested
        )));
    }
    if n < 2 {
        return Err(CreatorGraphError::projection(format!(
            "Need at least 2 records to project, got {}",
            n
        )));
    }
    Ok(requested.clamp(1.0, (n - 1) as f64))
}

/// Projection settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionOptions {
    pub method: ProjectionMethod,
    pub dims: usize,
    pub perplexity: f64,
    /// Uniform multiplier for display spread
    pub scale: f64,
    pub seed: u64,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            method: ProjectionMethod::Tsne,
            dims: 2,
            perplexity: 30.0,
            scale: 20.0,
            seed: 42,
        }
    }
}

impl ProjectionOptions {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            method: config.projection_method,
            dims: config.projection_dims,
            perplexity: config.perplexity,
            scale: config.coordinate_scale,
            seed: config.seed,
        }
    }
}

/// Reduces an embedding matrix to one coordinate per row
#[derive(Debug, Clone)]
pub struct Projector {
    options: ProjectionOptions,
}

impl Projector {
    pub fn new(options: ProjectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Project every embedding. Identical input and seed give identical output.
    pub fn project(&self, embeddings: &EmbeddingMatrix) -> Result<Vec<Coordinate>> {
        let n = embeddings.len();
        let opts = &self.options;

        if n < 2 {
            return Err(CreatorGraphError::projection(format!(
                "Need at least 2 records to project, got {}",
                n
            )));
        }
        if !matches!(opts.dims, 2 | 3) {
            return Err(CreatorGraphError::projection(format!(
                "Projection dims must be 2 or 3, got {} ({} records)",
                opts.dims, n
            )));
        }
        if !opts.scale.is_finite() || opts.scale <= 0.0 {
            return Err(CreatorGraphError::projection(format!(
                "Coordinate scale must be positive, got {}",
                opts.scale
            )));
        }

        let mut rng = StdRng::seed_from_u64(opts.seed);

        let layout = match opts.method {
            ProjectionMethod::Tsne => {
                let perplexity = effective_perplexity(opts.perplexity, n)?;
                info!(
                    "Projecting {} records to {}D using t-SNE (perplexity={})",
                    n, opts.dims, perplexity
                );
                tsne::embed(embeddings, opts.dims, perplexity, &mut rng)
            }
            ProjectionMethod::Mds => {
                info!("Projecting {} records to {}D using classical MDS", n, opts.dims);
                mds::embed(embeddings, opts.dims, &mut rng)
            }
        };

        to_coordinates(&layout, opts.scale, n)
    }
}

fn to_coordinates(layout: &Array2<f64>, scale: f64, n: usize) -> Result<Vec<Coordinate>> {
    if layout.iter().any(|v| !v.is_finite()) {
        return Err(CreatorGraphError::projection(format!(
            "Projection produced non-finite coordinates ({} records)",
            n
        )));
    }

    Ok(layout
        .rows()
        .into_iter()
        .map(|row| Coordinate {
            x: row[0] * scale,
            y: row[1] * scale,
            z: row.get(2).map(|z| z * scale),
        })
        .collect())
}
