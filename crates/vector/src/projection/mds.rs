//! Classical (Torgerson) MDS on cosine distances.

use ndarray::Array2;
use rand::rngs::StdRng;

use crate::eigen::top_eigenpairs;
use crate::matrix::EmbeddingMatrix;
use crate::similarity::similarity_matrix;

pub(crate) fn embed(embeddings: &EmbeddingMatrix, dims: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = embeddings.len();
    let similarity = similarity_matrix(embeddings);

    // squared cosine distances
    let mut squared = similarity.mapv(|s| (1.0 - s).max(0.0).powi(2));
    for i in 0..n {
        squared[[i, i]] = 0.0;
    }

    let b = double_center(&squared);

    let mut coords = Array2::<f64>::zeros((n, dims));
    for (k, pair) in top_eigenpairs(&b, dims, rng).iter().enumerate() {
        // non-positive eigenvalues carry no Euclidean extent
        let scale = pair.value.max(0.0).sqrt();
        for i in 0..n {
            coords[[i, k]] = pair.vector[i] * scale;
        }
    }
    coords
}

/// `B = -1/2 * J D2 J` with the centering matrix `J`
fn double_center(squared: &Array2<f64>) -> Array2<f64> {
    let n = squared.nrows();
    let row_means: Vec<f64> = squared.rows().into_iter().map(|r| r.sum() / n as f64).collect();
    let grand_mean = row_means.iter().sum::<f64>() / n as f64;

    let mut b = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            // D2 is symmetric, so column means equal row means
            b[[i, j]] = -0.5 * (squared[[i, j]] - row_means[i] - row_means[j] + grand_mean);
        }
    }
    b
}
