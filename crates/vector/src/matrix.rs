use creatorgraph_common::{CreatorGraphError, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// N x D embedding matrix, one row per record in load order
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    data: Array2<f64>,
}

impl EmbeddingMatrix {
    /// Build from provider output; every row must have the same non-zero length
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let n = rows.len();
        let d = rows.first().map(|r| r.len()).unwrap_or(0);

        if n > 0 && d == 0 {
            return Err(CreatorGraphError::embedding("Embedding dimension is 0"));
        }

        for (i, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(CreatorGraphError::embedding(format!(
                    "Embedding {} has dimension {}, expected {}",
                    i,
                    row.len(),
                    d
                )));
            }
            if row.iter().any(|x| !x.is_finite()) {
                return Err(CreatorGraphError::embedding(format!(
                    "Embedding {} contains a non-finite value",
                    i
                )));
            }
        }

        let flat: Vec<f64> = rows.iter().flatten().map(|&x| x as f64).collect();
        let data = Array2::from_shape_vec((n, d), flat)
            .map_err(|e| CreatorGraphError::embedding(format!("Invalid embedding shape: {}", e)))?;
        Ok(Self { data })
    }

    /// Wrap an existing matrix
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Number of embeddings (N)
    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Embedding dimension (D)
    pub fn dim(&self) -> usize {
        self.data.ncols()
    }

    pub fn row(&self, i: usize) -> ArrayView1<'_, f64> {
        self.data.row(i)
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// L2 norm of every row
    pub fn norms(&self) -> Vec<f64> {
        self.data
            .axis_iter(Axis(0))
            .map(|row| row.dot(&row).sqrt())
            .collect()
    }

    /// Copy with every non-zero row scaled to unit length; zero rows stay zero
    pub fn normalized(&self) -> Array2<f64> {
        let mut out = self.data.clone();
        for mut row in out.axis_iter_mut(Axis(0)) {
            let norm = row.dot(&row).sqrt();
            if norm > 0.0 {
                row.mapv_inplace(|x| x / norm);
            }
        }
        out
    }

    /// Squared euclidean distance between every pair of rows
    pub fn squared_distances(&self) -> Array2<f64> {
        let n = self.len();
        let mut out = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in (i + 1)..n {
                let diff = &self.data.row(i) - &self.data.row(j);
                let d = diff.dot(&diff);
                out[[i, j]] = d;
                out[[j, i]] = d;
            }
        }
        out
    }
}
