//! Exact t-SNE (van der Maaten & Hinton, 2008).
//!
//! Uses the optimisation schedule of the common reference implementation:
//! PCA initialisation, early exaggeration, momentum switch and per-element
//! gains. Exact gradients are O(N^2) per iteration.

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

use crate::eigen::top_eigenpairs;
use crate::matrix::EmbeddingMatrix;

/// Gradient descent iterations
pub const TSNE_ITERATIONS: usize = 1000;

/// P multiplier during the first `EXAGGERATION_ITERATIONS`
pub const TSNE_EARLY_EXAGGERATION: f64 = 12.0;

const EXAGGERATION_ITERATIONS: usize = 250;
const MIN_GAIN: f64 = 0.01;
const MIN_PROBABILITY: f64 = 1e-12;
const PERPLEXITY_TOLERANCE: f64 = 1e-5;
const PERPLEXITY_STEPS: usize = 100;
const INIT_STD: f64 = 1e-4;

pub(crate) fn embed(
    embeddings: &EmbeddingMatrix,
    dims: usize,
    perplexity: f64,
    rng: &mut StdRng,
) -> Array2<f64> {
    let n = embeddings.len();
    let distances = embeddings.squared_distances();
    let p = joint_probabilities(&distances, perplexity);
    let mut y = pca_init(embeddings, dims, rng);

    let learning_rate = (n as f64 / TSNE_EARLY_EXAGGERATION / 4.0).max(50.0);
    let mut update = Array2::<f64>::zeros((n, dims));
    let mut gains = Array2::<f64>::ones((n, dims));

    for iteration in 0..TSNE_ITERATIONS {
        let (exaggeration, momentum) = if iteration < EXAGGERATION_ITERATIONS {
            (TSNE_EARLY_EXAGGERATION, 0.5)
        } else {
            (1.0, 0.8)
        };

        let grad = gradient(&p, &y, exaggeration);

        for ((g, u), gain) in grad.iter().zip(update.iter_mut()).zip(gains.iter_mut()) {
            *gain = if *u * *g < 0.0 {
                *gain + 0.2
            } else {
                (*gain * 0.8).max(MIN_GAIN)
            };
            *u = momentum * *u - learning_rate * *gain * *g;
        }
        y += &update;

        if iteration % 250 == 249 {
            debug!("t-SNE iteration {}/{}", iteration + 1, TSNE_ITERATIONS);
        }
    }

    // center for display
    if let Some(mean) = y.mean_axis(Axis(0)) {
        y -= &mean;
    }
    y
}

/// Symmetrised joint probabilities P from squared distances
fn joint_probabilities(distances: &Array2<f64>, perplexity: f64) -> Array2<f64> {
    let n = distances.nrows();
    let target_entropy = perplexity.ln();
    let mut conditional = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        let row: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, distances[[i, j]]))
            .collect();
        let min = row.iter().map(|(_, d)| *d).fold(f64::INFINITY, f64::min);
        let shifted: Vec<f64> = row.iter().map(|(_, d)| d - min).collect();

        let probabilities = search_precision(&shifted, target_entropy);
        for ((j, _), prob) in row.iter().zip(probabilities) {
            conditional[[i, *j]] = prob;
        }
    }

    let total = n as f64 * 2.0;
    let mut joint = &conditional + &conditional.t();
    joint.mapv_inplace(|v| (v / total).max(MIN_PROBABILITY));
    for i in 0..n {
        joint[[i, i]] = 0.0;
    }
    joint
}

/// Binary search for the Gaussian precision whose conditional
/// distribution has the target entropy (natural log of the perplexity)
fn search_precision(distances: &[f64], target_entropy: f64) -> Vec<f64> {
    let mut beta = 1.0;
    let mut beta_min = f64::NEG_INFINITY;
    let mut beta_max = f64::INFINITY;
    let mut probabilities = vec![0.0; distances.len()];

    for _ in 0..PERPLEXITY_STEPS {
        let mut sum = 0.0;
        for (p, d) in probabilities.iter_mut().zip(distances) {
            *p = (-d * beta).exp();
            sum += *p;
        }
        let sum = sum.max(MIN_PROBABILITY);

        let weighted: f64 = probabilities
            .iter()
            .zip(distances)
            .map(|(p, d)| p * d)
            .sum();
        let entropy = sum.ln() + beta * weighted / sum;
        let diff = entropy - target_entropy;

        if diff.abs() < PERPLEXITY_TOLERANCE {
            break;
        }

        if diff > 0.0 {
            beta_min = beta;
            beta = if beta_max.is_infinite() {
                beta * 2.0
            } else {
                (beta + beta_max) / 2.0
            };
        } else {
            beta_max = beta;
            beta = if beta_min.is_infinite() {
                beta / 2.0
            } else {
                (beta + beta_min) / 2.0
            };
        }
    }

    let sum: f64 = probabilities.iter().sum::<f64>().max(MIN_PROBABILITY);
    probabilities.iter().map(|p| p / sum).collect()
}

/// KL(P || Q) gradient with Student-t kernel
fn gradient(p: &Array2<f64>, y: &Array2<f64>, exaggeration: f64) -> Array2<f64> {
    let n = y.nrows();
    let dims = y.ncols();

    let mut kernel = Array2::<f64>::zeros((n, n));
    let mut kernel_sum = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let diff = &y.row(i) - &y.row(j);
            let value = 1.0 / (1.0 + diff.dot(&diff));
            kernel[[i, j]] = value;
            kernel[[j, i]] = value;
            kernel_sum += 2.0 * value;
        }
    }
    let kernel_sum = kernel_sum.max(MIN_PROBABILITY);

    let mut grad = Array2::<f64>::zeros((n, dims));
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let q = (kernel[[i, j]] / kernel_sum).max(MIN_PROBABILITY);
            let coeff = 4.0 * (exaggeration * p[[i, j]] - q) * kernel[[i, j]];
            for k in 0..dims {
                grad[[i, k]] += coeff * (y[[i, k]] - y[[j, k]]);
            }
        }
    }
    grad
}

/// Principal components of the centered embeddings, rescaled so the first
/// axis has standard deviation `INIT_STD`, plus a tiny seeded jitter so
/// rank-deficient axes can still move
fn pca_init(embeddings: &EmbeddingMatrix, dims: usize, rng: &mut StdRng) -> Array2<f64> {
    let n = embeddings.len();
    let data = embeddings.as_array();
    let centered = match data.mean_axis(Axis(0)) {
        Some(mean) => data - &mean,
        None => data.clone(),
    };
    let gram = centered.dot(&centered.t());

    let mut y = Array2::<f64>::zeros((n, dims));
    for (k, pair) in top_eigenpairs(&gram, dims, rng).iter().enumerate() {
        let scale = pair.value.max(0.0).sqrt();
        for i in 0..n {
            y[[i, k]] = pair.vector[i] * scale;
        }
    }

    let first = y.column(0);
    let mean = first.sum() / n as f64;
    let std = (first.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64).sqrt();
    if std > 0.0 {
        y.mapv_inplace(|v| v / std * INIT_STD);
    }

    for v in y.iter_mut() {
        *v += rng.gen_range(-1.0..1.0) * INIT_STD * 1e-2;
    }
    y
}
