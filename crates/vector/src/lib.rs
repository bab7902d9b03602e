//! creatorgraph numerical core
//!
//! Cosine similarity edges, 2D/3D projection and k-means cluster labels
//! over an in-memory embedding matrix. Everything here is a pure function
//! of its inputs and the configured seed.

mod cluster;
mod eigen;
mod matrix;
mod projection;
mod similarity;

pub use cluster::{ClusterAssignment, KMeans};
pub use eigen::{top_eigenpairs, EigenPair};
pub use matrix::EmbeddingMatrix;
pub use projection::{
    effective_perplexity, Coordinate, ProjectionOptions, Projector, TSNE_EARLY_EXAGGERATION,
    TSNE_ITERATIONS,
};
pub use similarity::{
    cosine_similarity, similarity_matrix, EdgeFinder, ExhaustiveEdgeFinder, IndexEdge,
};
