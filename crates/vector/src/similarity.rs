use creatorgraph_common::{CreatorGraphError, Result};
use ndarray::Array2;
use tracing::{debug, info};

use crate::matrix::EmbeddingMatrix;

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Full N x N cosine similarity matrix.
///
/// The upper triangle is computed once and mirrored, so `sim[i][j]` and
/// `sim[j][i]` are bit-identical. The diagonal is 1.0, or 0.0 for a
/// zero-norm row. O(N^2 D) time and O(N^2) memory.
pub fn similarity_matrix(embeddings: &EmbeddingMatrix) -> Array2<f64> {
    let n = embeddings.len();
    let unit = embeddings.normalized();
    let gram = unit.dot(&unit.t());
    let norms = embeddings.norms();

    let mut sim = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        sim[[i, i]] = if norms[i] > 0.0 { 1.0 } else { 0.0 };
        for j in (i + 1)..n {
            let value = gram[[i, j]].clamp(-1.0, 1.0);
            sim[[i, j]] = value;
            sim[[j, i]] = value;
        }
    }
    sim
}

/// Undirected edge between two rows of the embedding matrix, `source < target`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexEdge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
}

/// Strategy for turning embeddings into thresholded similarity edges.
///
/// Implementations must emit each unordered pair at most once, never a
/// self-loop, and only pairs whose cosine similarity is strictly greater
/// than `threshold`. An approximate nearest-neighbour index can replace the
/// exhaustive finder once record counts outgrow the quadratic scan.
pub trait EdgeFinder {
    fn find_edges(&self, embeddings: &EmbeddingMatrix, threshold: f64) -> Result<Vec<IndexEdge>>;
}

/// Scans every pair. Quadratic in the record count: fine for a few hundred
/// records, the scaling limit beyond a few thousand.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExhaustiveEdgeFinder;

impl EdgeFinder for ExhaustiveEdgeFinder {
    fn find_edges(&self, embeddings: &EmbeddingMatrix, threshold: f64) -> Result<Vec<IndexEdge>> {
        if !threshold.is_finite() || !(-1.0..=1.0).contains(&threshold) {
            return Err(CreatorGraphError::config(format!(
                "Similarity threshold must be within [-1, 1], got {}",
                threshold
            )));
        }

        let n = embeddings.len();
        debug!(
            "Computing similarity matrix - N: {}, D: {}, pairs: {}",
            n,
            embeddings.dim(),
            n * n.saturating_sub(1) / 2
        );

        let sim = similarity_matrix(embeddings);
        let mut edges = Vec::new();

        for i in 0..n {
            for j in (i + 1)..n {
                let weight = sim[[i, j]];
                if weight > threshold {
                    edges.push(IndexEdge {
                        source: i,
                        target: j,
                        weight,
                    });
                }
            }
        }

        info!(
            "Similarity edges: {} of {} pairs above threshold {}",
            edges.len(),
            n * n.saturating_sub(1) / 2,
            threshold
        );
        Ok(edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[f32]]) -> EmbeddingMatrix {
        let rows: Vec<Vec<f32>> = rows.iter().map(|r| r.to_vec()).collect();
        EmbeddingMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_matrix_symmetric() {
        let m = matrix(&[&[0.3, 0.1, 0.7], &[0.9, -0.2, 0.4], &[-0.5, 0.5, 0.1], &[0.2, 0.2, 0.2]]);
        let sim = similarity_matrix(&m);
        for i in 0..4 {
            for j in 0..4 {
                assert_eq!(sim[[i, j]], sim[[j, i]]);
                assert!((-1.0..=1.0).contains(&sim[[i, j]]));
            }
        }
    }

    #[test]
    fn test_matrix_matches_pairwise_cosine() {
        let m = matrix(&[&[0.3, 0.1, 0.7], &[0.9, -0.2, 0.4]]);
        let sim = similarity_matrix(&m);
        let a: Vec<f64> = m.row(0).to_vec();
        let b: Vec<f64> = m.row(1).to_vec();
        assert!((sim[[0, 1]] - cosine_similarity(&a, &b)).abs() < 1e-12);
    }

    #[test]
    fn test_diagonal() {
        let m = matrix(&[&[2.0, 0.0], &[0.0, 0.0]]);
        let sim = similarity_matrix(&m);
        assert_eq!(sim[[0, 0]], 1.0);
        assert_eq!(sim[[1, 1]], 0.0);
        assert_eq!(sim[[0, 1]], 0.0);
    }

    #[test]
    fn test_single_edge_example() {
        let m = matrix(&[&[1.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]]);
        let edges = ExhaustiveEdgeFinder.find_edges(&m, 0.9).unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, 0);
        assert_eq!(edges[0].target, 1);
        assert_eq!(edges[0].weight, 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let m = matrix(&[&[1.0, 0.0], &[1.0, 0.0]]);
        assert!(ExhaustiveEdgeFinder.find_edges(&m, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_norm_rows_never_connect() {
        let m = matrix(&[&[0.0, 0.0], &[0.0, 0.0], &[1.0, 1.0]]);
        let edges = ExhaustiveEdgeFinder.find_edges(&m, -0.5).unwrap();
        // zero-norm pairs have similarity 0.0, which is above -0.5
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|e| e.weight == 0.0));

        let edges = ExhaustiveEdgeFinder.find_edges(&m, 0.0).unwrap();
        assert!(edges.is_empty());
    }

    #[test]
    fn test_invalid_threshold() {
        let m = matrix(&[&[1.0, 0.0]]);
        assert!(ExhaustiveEdgeFinder.find_edges(&m, f64::NAN).is_err());
        assert!(ExhaustiveEdgeFinder.find_edges(&m, 1.5).is_err());
    }

    #[test]
    fn test_empty_input() {
        let m = EmbeddingMatrix::from_rows(&[]).unwrap();
        assert!(ExhaustiveEdgeFinder.find_edges(&m, 0.5).unwrap().is_empty());
    }
}
