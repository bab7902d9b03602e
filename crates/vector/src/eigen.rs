use ndarray::{Array1, Array2};
use rand::Rng;

const MAX_ITERATIONS: usize = 1000;
const TOLERANCE: f64 = 1e-10;

/// Eigenvalue with its unit eigenvector
#[derive(Debug, Clone)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Array1<f64>,
}

/// Largest `k` eigenpairs (by algebraic value) of a symmetric matrix.
///
/// Power iteration with deflation on `A + cI`, where `c` is the largest
/// absolute row sum. The shift makes every eigenvalue non-negative so the
/// iteration converges to the algebraically largest one even when `A` has
/// large negative eigenvalues. Eigenvector signs are fixed so the largest
/// component is positive. Start vectors are drawn from `rng`.
pub fn top_eigenpairs<R: Rng>(matrix: &Array2<f64>, k: usize, rng: &mut R) -> Vec<EigenPair> {
    let n = matrix.nrows();
    if n == 0 || k == 0 {
        return Vec::new();
    }

    let shift = matrix
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0.0, f64::max);

    let mut work = matrix.clone();
    for i in 0..n {
        work[[i, i]] += shift;
    }

    let mut pairs = Vec::with_capacity(k.min(n));
    for _ in 0..k.min(n) {
        let mut v = Array1::from_iter((0..n).map(|_| rng.gen_range(-1.0..1.0)));
        normalize(&mut v);

        for _ in 0..MAX_ITERATIONS {
            let mut next = work.dot(&v);
            if normalize(&mut next) == 0.0 {
                v = next;
                break;
            }
            let delta = (&next - &v).mapv(|x| x * x).sum().sqrt();
            v = next;
            if delta < TOLERANCE {
                break;
            }
        }

        fix_sign(&mut v);
        let shifted = v.dot(&work.dot(&v));

        // deflate
        for i in 0..n {
            for j in 0..n {
                work[[i, j]] -= shifted * v[i] * v[j];
            }
        }

        pairs.push(EigenPair {
            value: shifted - shift,
            vector: v,
        });
    }

    pairs
}

fn normalize(v: &mut Array1<f64>) -> f64 {
    let norm = v.dot(v).sqrt();
    if norm > 0.0 {
        v.mapv_inplace(|x| x / norm);
    }
    norm
}

fn fix_sign(v: &mut Array1<f64>) {
    let pivot = v
        .iter()
        .copied()
        .fold(0.0f64, |best, x| if x.abs() > best.abs() { x } else { best });
    if pivot < 0.0 {
        v.mapv_inplace(|x| -x);
    }
}
