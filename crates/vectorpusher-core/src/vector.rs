//! Dense vector arithmetic and the read-only embedding table.
//!
//! All arithmetic is explicit: no broadcasting, every operation returns a
//! fresh [`Vector`]. Dot products and norms accumulate in `f64` so that
//! large vocabularies with wide embeddings stay reproducible.

use crate::error::{SculptError, SculptResult};

/// Guard added to norms before dividing and used as a floor before logs.
pub const EPSILON: f32 = 1e-8;

/// A dense embedding vector.
pub type Vector = Vec<f32>;

/// Dot product of two equally sized slices.
#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| *x as f64 * *y as f64)
        .sum::<f64>() as f32
}

/// Euclidean (L2) norm.
#[inline]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| *x as f64 * *x as f64).sum::<f64>().sqrt() as f32
}

/// Unit-normalize with the default [`EPSILON`] guard.
///
/// `normalize(v) = v / (||v|| + ε)`. A zero vector maps to a zero vector.
///
/// # Example
///
/// ```
/// use vectorpusher_core::vector::{l2_norm, normalize};
///
/// let n = normalize(&[3.0, 4.0]);
/// assert!((l2_norm(&n) - 1.0).abs() < 1e-6);
/// ```
pub fn normalize(v: &[f32]) -> Vector {
    normalize_with_epsilon(v, EPSILON)
}

/// Unit-normalize with an explicit epsilon guard.
pub fn normalize_with_epsilon(v: &[f32], epsilon: f32) -> Vector {
    let denom = l2_norm(v) + epsilon;
    v.iter().map(|x| x / denom).collect()
}

/// Rescale `v` so its norm equals `magnitude`.
///
/// The factor `magnitude / ‖v‖` is formed in f64, so tiny-norm inputs keep
/// their magnitude exactly. A zero or non-finite norm returns `v` unchanged.
pub fn with_magnitude(v: &[f32], magnitude: f32) -> Vector {
    let norm = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    if norm > 0.0 && norm.is_finite() {
        let factor = magnitude as f64 / norm;
        v.iter().map(|&x| (x as f64 * factor) as f32).collect()
    } else {
        v.to_vec()
    }
}

/// `a + b`
pub fn add(a: &[f32], b: &[f32]) -> Vector {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// `a - b`
pub fn sub(a: &[f32], b: &[f32]) -> Vector {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x - y).collect()
}

/// `s * v`
pub fn scale(v: &[f32], s: f32) -> Vector {
    v.iter().map(|x| x * s).collect()
}

/// `a + s * b`
pub fn add_scaled(a: &[f32], b: &[f32], s: f32) -> Vector {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b.iter()).map(|(x, y)| x + s * y).collect()
}

/// Angle between the directions of `a` and `b`, in degrees.
///
/// Both inputs are normalized first; the cosine is clamped to `[-1, 1]`
/// before `acos` so rounding can never produce NaN.
pub fn angle_between_deg(a: &[f32], b: &[f32]) -> f32 {
    let cos = dot(&normalize(a), &normalize(b)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Largest absolute elementwise difference.
pub fn max_abs_diff(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0f32, |acc, d| if d.is_nan() || d > acc { d } else { acc })
}

/// Immutable `N x D` embedding table with a cached row-normalized copy.
///
/// Rows are addressed by token id. The table is shared read-only for the
/// duration of a sculpting run; wrap it in an `Arc` to hand it to worker
/// threads.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    rows: usize,
    dim: usize,
    raw: Vec<f32>,
    normalized: Vec<f32>,
}

impl EmbeddingTable {
    /// Build a table from row vectors.
    ///
    /// # Errors
    ///
    /// - `SculptError::EmptyInput` if there are no rows or rows are empty.
    /// - `SculptError::RaggedTable` if rows differ in length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> SculptResult<Self> {
        let dim = rows.first().map(Vec::len).ok_or(SculptError::EmptyInput)?;
        if dim == 0 {
            return Err(SculptError::EmptyInput);
        }
        let mut raw = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(SculptError::RaggedTable {
                    row: i,
                    expected: dim,
                    actual: row.len(),
                });
            }
            raw.extend_from_slice(row);
        }
        Self::from_flat(raw, dim)
    }

    /// Build a table from a row-major flat buffer.
    ///
    /// # Errors
    ///
    /// - `SculptError::EmptyInput` if `dim` is zero or the buffer is empty.
    /// - `SculptError::DimensionMismatch` if the buffer is not a multiple of `dim`.
    pub fn from_flat(raw: Vec<f32>, dim: usize) -> SculptResult<Self> {
        if dim == 0 || raw.is_empty() {
            return Err(SculptError::EmptyInput);
        }
        if raw.len() % dim != 0 {
            return Err(SculptError::DimensionMismatch {
                expected: dim,
                actual: raw.len() % dim,
            });
        }
        let rows = raw.len() / dim;
        let mut normalized = Vec::with_capacity(raw.len());
        for row in raw.chunks_exact(dim) {
            normalized.extend(normalize(row));
        }
        Ok(Self {
            rows,
            dim,
            raw,
            normalized,
        })
    }

    /// Number of rows (vocabulary size).
    pub fn len(&self) -> usize {
        self.rows
    }

    /// Whether the table has no rows. Always false for a constructed table.
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Original row `index`, if present.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        (index < self.rows).then(|| &self.raw[index * self.dim..(index + 1) * self.dim])
    }

    /// Unit-normalized row `index`, if present.
    pub fn normalized_row(&self, index: usize) -> Option<&[f32]> {
        (index < self.rows).then(|| &self.normalized[index * self.dim..(index + 1) * self.dim])
    }

    /// Iterator over all normalized rows in index order.
    pub fn normalized_rows(&self) -> impl Iterator<Item = &[f32]> {
        self.normalized.chunks_exact(self.dim)
    }

    /// Look up the original row for a token id.
    ///
    /// # Errors
    ///
    /// Returns `SculptError::TokenOutOfRange` if the id has no row.
    pub fn token_row(&self, token: u32) -> SculptResult<&[f32]> {
        self.row(token as usize).ok_or(SculptError::TokenOutOfRange {
            token,
            rows: self.rows,
        })
    }

    /// Check that a query vector matches the table dimension.
    ///
    /// # Errors
    ///
    /// Returns `SculptError::DimensionMismatch` on mismatch.
    pub fn check_dim(&self, query: &[f32]) -> SculptResult<()> {
        if query.len() != self.dim {
            return Err(SculptError::DimensionMismatch {
                expected: self.dim,
                actual: query.len(),
            });
        }
        Ok(())
    }
}
