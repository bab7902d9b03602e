use creatorgraph_common::{CreatorGraphError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Result of a k-means run
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterAssignment {
    /// Label in `[0, k)` per input row
    pub labels: Vec<usize>,
    /// k x D centroids
    pub centroids: Array2<f64>,
    /// Sum of squared distances to the assigned centroid
    pub inertia: f64,
    /// Lloyd iterations run
    pub iterations: usize,
}

impl ClusterAssignment {
    /// Members per cluster label
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.centroids.nrows()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

/// Euclidean k-means with k-means++ seeding
#[derive(Debug, Clone)]
pub struct KMeans {
    k: usize,
    seed: u64,
    max_iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            k,
            seed,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Partition the rows of `data` into `k` groups.
    ///
    /// Fails when `k` is 0 or exceeds the number of rows.
    pub fn fit(&self, data: &Array2<f64>) -> Result<ClusterAssignment> {
        let n = data.nrows();
        let k = self.k;

        if k == 0 {
            return Err(CreatorGraphError::clustering("Cluster count must be at least 1"));
        }
        if k > n {
            return Err(CreatorGraphError::clustering(format!(
                "Cannot form {} clusters from {} records",
                k, n
            )));
        }

        info!("Clustering {} records into {} clusters", n, k);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = self.seed_centroids(data, &mut rng);
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;

        loop {
            iterations += 1;

            // Assignment step; on a tie a point keeps its current cluster
            let mut changed = false;
            for (i, label) in labels.iter_mut().enumerate() {
                let (nearest, best) = nearest_centroid(data.row(i), &centroids);
                let current = if *label < k {
                    squared_distance(data.row(i), centroids.row(*label))
                } else {
                    f64::INFINITY
                };
                if nearest != *label && best < current {
                    *label = nearest;
                    changed = true;
                }
            }

            if !changed || iterations >= self.max_iterations {
                debug!(
                    "k-means stopped after {} iterations (changed={})",
                    iterations, changed
                );
                break;
            }

            // Update step
            centroids = recompute_centroids(data, &labels, k);
            fill_empty_clusters(data, &mut labels, &mut centroids);
        }

        // the last assignment may have emptied a cluster when the cap was hit
        fill_empty_clusters(data, &mut labels, &mut centroids);

        let inertia = labels
            .iter()
            .enumerate()
            .map(|(i, &label)| squared_distance(data.row(i), centroids.row(label)))
            .sum();

        Ok(ClusterAssignment {
            labels,
            centroids,
            inertia,
            iterations,
        })
    }

    /// k-means++: first centroid uniform, the rest drawn with probability
    /// proportional to the squared distance to the nearest chosen centroid
    fn seed_centroids(&self, data: &Array2<f64>, rng: &mut StdRng) -> Array2<f64> {
        let n = data.nrows();
        let mut chosen: Vec<usize> = vec![rng.gen_range(0..n)];
        let mut closest: Vec<f64> = (0..n)
            .map(|i| squared_distance(data.row(i), data.row(chosen[0])))
            .collect();

        while chosen.len() < self.k {
            let total: f64 = closest.iter().sum();
            let next = if total > 0.0 {
                let mut target = rng.gen::<f64>() * total;
                let mut pick = n - 1;
                for (i, d) in closest.iter().enumerate() {
                    if *d <= 0.0 {
                        continue;
                    }
                    if target < *d {
                        pick = i;
                        break;
                    }
                    target -= d;
                }
                if chosen.contains(&pick) {
                    first_unchosen(n, &chosen)
                } else {
                    pick
                }
            } else {
                // every remaining point coincides with a centroid
                first_unchosen(n, &chosen)
            };

            chosen.push(next);
            for (i, d) in closest.iter_mut().enumerate() {
                *d = d.min(squared_distance(data.row(i), data.row(next)));
            }
        }

        let mut centroids = Array2::<f64>::zeros((self.k, data.ncols()));
        for (c, &i) in chosen.iter().enumerate() {
            centroids.row_mut(c).assign(&data.row(i));
        }
        centroids
    }
}

fn first_unchosen(n: usize, chosen: &[usize]) -> usize {
    (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index and squared distance of the nearest centroid; ties go to the lowest index
fn nearest_centroid(point: ArrayView1<'_, f64>, centroids: &Array2<f64>) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (c, centroid) in centroids.rows().into_iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

fn recompute_centroids(data: &Array2<f64>, labels: &[usize], k: usize) -> Array2<f64> {
    let mut sums = Array2::<f64>::zeros((k, data.ncols()));
    let mut counts = vec![0usize; k];
    for (i, &label) in labels.iter().enumerate() {
        let mut row = sums.row_mut(label);
        row += &data.row(i);
        counts[label] += 1;
    }
    for (c, count) in counts.iter().enumerate() {
        if *count > 0 {
            sums.row_mut(c).mapv_inplace(|v| v / *count as f64);
        }
    }
    sums
}

/// Move the point farthest from its centroid into each empty cluster
fn fill_empty_clusters(data: &Array2<f64>, labels: &mut [usize], centroids: &mut Array2<f64>) {
    let k = centroids.nrows();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for c in 0..k {
        if counts[c] > 0 {
            continue;
        }

        let farthest = labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| counts[label] > 1)
            .map(|(i, &label)| (i, squared_distance(data.row(i), centroids.row(label))))
            .fold(None, |best: Option<(usize, f64)>, (i, d)| match best {
                Some((_, bd)) if bd >= d => best,
                _ => Some((i, d)),
            });

        if let Some((i, _)) = farthest {
            debug!("Re-seeding empty cluster {} with record {}", c, i);
            counts[labels[i]] -= 1;
            labels[i] = c;
            counts[c] = 1;
            let point: Array1<f64> = data.row(i).to_owned();
            centroids.row_mut(c).assign(&point);
        }
    }
}
