//! Dense matrix container with value/cache duality
//!
//! Provides the 2D `f64` container shared by all solver engines. Every matrix
//! carries two same-shaped grids: the live values the algorithms mutate, and a
//! cached snapshot of the original input. Elimination-style algorithms restore
//! the live grid from the cache before each benchmarked iteration so repeated
//! runs always start from the same system.
//!
//! # Storage Layout
//!
//! Data is stored in row-major format (C-style), where consecutive elements
//! in memory belong to the same row. For a 2x3 matrix:
//! ```text
//! [[a, b, c],
//!  [d, e, f]]
//! ```
//! Data is stored as: [a, b, c, d, e, f]
//!
//! # Example
//!
//! ```
//! use centella::Matrix;
//!
//! let mut m = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! m.set(0, 0, 9.0);
//! m.restore_from_cache();
//! assert_eq!(m.at(0, 0), 1.0);
//! ```

use rand::Rng;

use crate::error::{CentellaError, Result};

/// Default tolerance for element-wise matrix comparison
pub const PRECISION: f64 = 1e-7;

/// A 2D matrix with row-major storage and a cached snapshot of its input
///
/// The cache is an independent copy of the values, captured when the matrix is
/// built from caller data (or explicitly via [`Matrix::snapshot_cache`]) and
/// written back by [`Matrix::restore_from_cache`].
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
    cached: Vec<f64>,
}

impl Matrix {
    /// Creates a zero-filled matrix with a zero-filled cache
    ///
    /// # Errors
    ///
    /// Returns [`CentellaError::InvalidMatrixSizes`] if either dimension is
    /// zero.
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(CentellaError::InvalidMatrixSizes {
                rows,
                columns: cols,
            });
        }
        Ok(Matrix {
            rows,
            cols,
            values: vec![0.0; rows * cols],
            cached: vec![0.0; rows * cols],
        })
    }

    /// Creates a matrix from row-major data, snapshotting it into the cache
    ///
    /// # Errors
    ///
    /// Returns [`CentellaError::InvalidMatrixSizes`] for a zero dimension and
    /// [`CentellaError::MatrixInputFailure`] if `data.len() != rows * cols`.
    ///
    /// # Example
    ///
    /// ```
    /// use centella::Matrix;
    ///
    /// let m = Matrix::from_vec(2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    /// assert_eq!(m.at(1, 0), 3.0);
    /// ```
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(CentellaError::InvalidMatrixSizes {
                rows,
                columns: cols,
            });
        }
        if data.len() != rows * cols {
            return Err(CentellaError::MatrixInputFailure(format!(
                "expected {} elements for {}x{}, got {}",
                rows * cols,
                rows,
                cols,
                data.len()
            )));
        }
        let cached = data.clone();
        Ok(Matrix {
            rows,
            cols,
            values: data,
            cached,
        })
    }

    /// Creates a matrix from nested row vectors, snapshotting into the cache
    ///
    /// # Errors
    ///
    /// Returns [`CentellaError::InvalidMatrixSizes`] for empty input and
    /// [`CentellaError::MatrixInputFailure`] for ragged rows.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let row_count = rows.len();
        let col_count = rows.first().map_or(0, Vec::len);
        if row_count == 0 || col_count == 0 {
            return Err(CentellaError::InvalidMatrixSizes {
                rows: row_count,
                columns: col_count,
            });
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != col_count) {
            return Err(CentellaError::MatrixInputFailure(format!(
                "ragged row: expected {} columns, got {}",
                col_count,
                bad.len()
            )));
        }
        let data: Vec<f64> = rows.into_iter().flatten().collect();
        Self::from_vec(row_count, col_count, data)
    }

    /// Discards prior contents and reallocates both grids zero-filled
    ///
    /// # Errors
    ///
    /// Returns [`CentellaError::InvalidMatrixSizes`] if either dimension is
    /// zero; the matrix is left untouched in that case.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<()> {
        if rows == 0 || cols == 0 {
            return Err(CentellaError::InvalidMatrixSizes {
                rows,
                columns: cols,
            });
        }
        self.rows = rows;
        self.cols = cols;
        self.values.clear();
        self.values.resize(rows * cols, 0.0);
        self.cached.clear();
        self.cached.resize(rows * cols, 0.0);
        Ok(())
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// (rows, cols) pair
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Reads element `(i, j)`
    ///
    /// Caller contract: indices must be in range. Out-of-range access panics.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.cols + j]
    }

    /// Mutable access to element `(i, j)`; same caller contract as [`Matrix::at`]
    #[inline]
    pub fn at_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        &mut self.values[i * self.cols + j]
    }

    /// Writes element `(i, j)`; same caller contract as [`Matrix::at`]
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.cols + j] = value;
    }

    /// Row `i` as a slice
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.cols..(i + 1) * self.cols]
    }

    /// Row `i` as a mutable slice
    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.values[i * self.cols..(i + 1) * self.cols]
    }

    /// Live values as a flat row-major slice
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Live values as a flat mutable row-major slice
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Naive triple-loop multiplication
    ///
    /// Used as the correctness baseline for Winograd's result; not intended
    /// to be fast.
    ///
    /// # Errors
    ///
    /// Returns [`CentellaError::InvalidMatrixInput`] when
    /// `self.cols() != other.rows()`.
    pub fn multiply(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(CentellaError::InvalidMatrixInput(format!(
                "inner dimensions {} vs {}",
                self.cols, other.rows
            )));
        }
        let mut result = Matrix::new(self.rows, other.cols)?;
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut acc = 0.0;
                for k in 0..self.cols {
                    acc += self.at(i, k) * other.at(k, j);
                }
                result.set(i, j, acc);
            }
        }
        Ok(result)
    }

    /// Element-wise equality within `epsilon`; shapes must match exactly
    pub fn approx_eq(&self, other: &Matrix, epsilon: f64) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .all(|(a, b)| (a - b).abs() <= epsilon)
    }

    /// Fills the live grid with uniform integer values in `0..=100` and
    /// snapshots them into the cache
    ///
    /// A zero entry doubles as "no edge" for graph inputs, matching the cost
    /// convention of the ant engine.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for value in &mut self.values {
            *value = f64::from(rng.gen_range(0..=100u8));
        }
        self.snapshot_cache();
    }

    /// Copies the live values into the cache grid
    pub fn snapshot_cache(&mut self) {
        self.cached.copy_from_slice(&self.values);
    }

    /// Copies the cache grid back into the live values
    pub fn restore_from_cache(&mut self) {
        self.values.copy_from_slice(&self.cached);
    }
}
