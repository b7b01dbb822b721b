//! Winograd's matrix-multiplication algorithm
//!
//! Trades multiplications for additions: per-row and per-column factor
//! vectors are precomputed from pairwise products of adjacent entries, then
//! every result cell needs only half the multiplications of the naive triple
//! loop, plus one correction term when the shared dimension is odd.
//!
//! Three strategies produce identical results:
//!
//! - **Sequential**: both factor vectors, then a row-major fill.
//! - **Parallel**: the two factor vectors are computed concurrently, then the
//!   result rows are split into `thread_count` contiguous bands, one scoped
//!   thread per band. Bands are disjoint, so no lock guards the result.
//! - **Conveyor**: a fixed 2-stage pipeline. Stage 1 computes the row factor
//!   and then the column factor as strictly sequential spawn/join hand-offs;
//!   stage 2 processes exactly two row bands the same way. This models a
//!   producer/consumer hand-off rather than streaming overlap, and its
//!   measured cost is dominated by the hand-offs themselves.
//!
//! # Example
//!
//! ```
//! use centella::{Matrix, WinogradMultiplier};
//!
//! let a = Matrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! let b = Matrix::from_rows(vec![vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
//! let baseline = a.multiply(&b).unwrap();
//!
//! let stats = WinogradMultiplier::new(a, b).solve_sequential(1).unwrap();
//! assert!(stats.solution().approx_eq(&baseline, 1e-7));
//! ```

use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::{CentellaError, Result};
use crate::matrix::Matrix;
use crate::timing::{run_timed, RunStatistics};

/// Default band count for the parallel strategy
const DEFAULT_THREAD_COUNT: usize = 2;

/// Multiplies two matrices with the Winograd identity
#[derive(Debug, Clone)]
pub struct WinogradMultiplier {
    a: Matrix,
    b: Matrix,
    threads: usize,
}

impl WinogradMultiplier {
    /// Takes ownership of both operands
    pub fn new(a: Matrix, b: Matrix) -> Self {
        WinogradMultiplier {
            a,
            b,
            threads: DEFAULT_THREAD_COUNT,
        }
    }

    /// Sets the band count used by the parallel strategy
    ///
    /// Values below 1 are clamped to 1.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Runs `iterations` sequential multiplications, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::InvalidMatrixInput`] when the inner dimensions
    /// disagree or any dimension is below 2.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(shape = ?self.a.shape())))]
    pub fn solve_sequential(&self, iterations: usize) -> Result<RunStatistics<Matrix>> {
        self.check()?;
        let (m, p) = (self.a.rows(), self.b.cols());
        let mut result = Matrix::new(m, p)?;
        let log = run_timed(iterations, || {
            result.resize(m, p)?;
            let mut row_factor = vec![0.0; m];
            let mut col_factor = vec![0.0; p];
            self.row_factors_into(&mut row_factor);
            self.column_factors_into(&mut col_factor);
            self.fill_band(0, result.as_mut_slice(), &row_factor, &col_factor);
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, result))
    }

    /// Runs `iterations` banded parallel multiplications, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::InvalidMatrixInput`] when the inner dimensions
    /// disagree or any dimension is below 2.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(shape = ?self.a.shape(), threads = self.threads)))]
    pub fn solve_parallel(&self, iterations: usize) -> Result<RunStatistics<Matrix>> {
        self.check()?;
        let (m, p) = (self.a.rows(), self.b.cols());
        let mut result = Matrix::new(m, p)?;
        let log = run_timed(iterations, || {
            result.resize(m, p)?;
            let mut row_factor = vec![0.0; m];
            let mut col_factor = vec![0.0; p];
            // Both factor vectors in flight at once, joined before any cell
            // is computed.
            thread::scope(|s| {
                s.spawn(|| self.row_factors_into(&mut row_factor));
                s.spawn(|| self.column_factors_into(&mut col_factor));
            });
            self.fill_bands(&mut result, &row_factor, &col_factor, self.threads);
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, result))
    }

    /// Runs `iterations` 2-stage conveyor multiplications, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::InvalidMatrixInput`] when the inner dimensions
    /// disagree or any dimension is below 2.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(shape = ?self.a.shape())))]
    pub fn solve_conveyor(&self, iterations: usize) -> Result<RunStatistics<Matrix>> {
        self.check()?;
        let (m, p) = (self.a.rows(), self.b.cols());
        let mut result = Matrix::new(m, p)?;
        let log = run_timed(iterations, || {
            result.resize(m, p)?;
            let mut row_factor = vec![0.0; m];
            let mut col_factor = vec![0.0; p];

            // Stage 1: factor vectors, each hand-off awaited before the next
            // begins.
            thread::scope(|s| {
                s.spawn(|| self.row_factors_into(&mut row_factor));
            });
            thread::scope(|s| {
                s.spawn(|| self.column_factors_into(&mut col_factor));
            });

            // Stage 2: exactly two row bands, handed off and awaited in turn.
            let mid = m / 2;
            let (top, bottom) = result.as_mut_slice().split_at_mut(mid * p);
            thread::scope(|s| {
                s.spawn(|| self.fill_band(0, top, &row_factor, &col_factor));
            });
            thread::scope(|s| {
                s.spawn(|| self.fill_band(mid, bottom, &row_factor, &col_factor));
            });
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, result))
    }

    /// Inner dimensions must match and every dimension must be at least 2
    fn check(&self) -> Result<()> {
        if self.a.cols() != self.b.rows() {
            return Err(CentellaError::InvalidMatrixInput(format!(
                "inner dimensions {} vs {}",
                self.a.cols(),
                self.b.rows()
            )));
        }
        if self.a.rows() < 2 || self.a.cols() < 2 || self.b.rows() < 2 || self.b.cols() < 2 {
            return Err(CentellaError::InvalidMatrixInput(format!(
                "every dimension must be at least 2, got {}x{} and {}x{}",
                self.a.rows(),
                self.a.cols(),
                self.b.rows(),
                self.b.cols()
            )));
        }
        Ok(())
    }

    /// `out[i] = sum of a[i,2j] * a[i,2j+1]` over adjacent column pairs
    fn row_factors_into(&self, out: &mut [f64]) {
        let half = self.a.cols() / 2;
        for (i, factor) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for j in 0..half {
                acc += self.a.at(i, 2 * j) * self.a.at(i, 2 * j + 1);
            }
            *factor = acc;
        }
    }

    /// `out[j] = sum of b[2k,j] * b[2k+1,j]` over adjacent row pairs
    fn column_factors_into(&self, out: &mut [f64]) {
        let half = self.a.cols() / 2;
        for (j, factor) in out.iter_mut().enumerate() {
            let mut acc = 0.0;
            for k in 0..half {
                acc += self.b.at(2 * k, j) * self.b.at(2 * k + 1, j);
            }
            *factor = acc;
        }
    }

    /// Fills a contiguous band of result rows starting at `first_row`
    fn fill_band(&self, first_row: usize, band: &mut [f64], row_factor: &[f64], col_factor: &[f64]) {
        let n = self.a.cols();
        let p = self.b.cols();
        let half = n / 2;
        for (offset, out_row) in band.chunks_mut(p).enumerate() {
            let i = first_row + offset;
            for (j, out) in out_row.iter_mut().enumerate() {
                let mut acc = -row_factor[i] - col_factor[j];
                for k in 0..half {
                    acc += (self.a.at(i, 2 * k) + self.b.at(2 * k + 1, j))
                        * (self.a.at(i, 2 * k + 1) + self.b.at(2 * k, j));
                }
                if n % 2 != 0 {
                    acc += self.a.at(i, n - 1) * self.b.at(n - 1, j);
                }
                *out = acc;
            }
        }
    }

    /// Splits result rows into `bands` contiguous near-equal bands, one
    /// scoped thread per band
    ///
    /// Band boundaries are `rows * t / bands`, so non-divisible row counts
    /// spread the remainder across bands instead of truncating.
    fn fill_bands(&self, result: &mut Matrix, row_factor: &[f64], col_factor: &[f64], bands: usize) {
        let m = self.a.rows();
        let p = self.b.cols();
        let mut rest = result.as_mut_slice();
        let mut start = 0;
        thread::scope(|s| {
            for t in 1..=bands {
                let end = (m * t) / bands;
                let (band, tail) = std::mem::take(&mut rest).split_at_mut((end - start) * p);
                rest = tail;
                if !band.is_empty() {
                    let first_row = start;
                    s.spawn(move || self.fill_band(first_row, band, row_factor, col_factor));
                }
                start = end;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn random_pair(m: usize, n: usize, p: usize, seed: u64) -> (Matrix, Matrix) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut a = Matrix::new(m, n).unwrap();
        let mut b = Matrix::new(n, p).unwrap();
        a.randomize(&mut rng);
        b.randomize(&mut rng);
        (a, b)
    }

    #[test]
    fn test_sequential_matches_naive_even_inner() {
        let (a, b) = random_pair(4, 6, 5, 11);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b).solve_sequential(1).unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_sequential_matches_naive_odd_inner() {
        // Odd shared dimension exercises the correction term.
        let (a, b) = random_pair(5, 7, 4, 12);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b).solve_sequential(1).unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_parallel_matches_naive() {
        let (a, b) = random_pair(7, 5, 9, 13);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b).solve_parallel(1).unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_parallel_uneven_band_split() {
        // 7 rows across 3 bands: boundaries 2/4/7.
        let (a, b) = random_pair(7, 4, 3, 14);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b)
            .with_threads(3)
            .solve_parallel(1)
            .unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_more_bands_than_rows() {
        let (a, b) = random_pair(2, 3, 2, 15);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b)
            .with_threads(8)
            .solve_parallel(1)
            .unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_conveyor_matches_naive() {
        let (a, b) = random_pair(6, 6, 6, 16);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b).solve_conveyor(1).unwrap();
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }

    #[test]
    fn test_inner_dimension_mismatch_rejected() {
        let (a, _) = random_pair(3, 4, 2, 17);
        let (_, b) = random_pair(2, 5, 3, 18);
        let result = WinogradMultiplier::new(a, b).solve_sequential(1);
        assert!(matches!(
            result,
            Err(CentellaError::InvalidMatrixInput(_))
        ));
    }

    #[test]
    fn test_minimum_dimension_rejected() {
        let a = Matrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        let b = Matrix::from_rows(vec![vec![3.0], vec![4.0]]).unwrap();
        let result = WinogradMultiplier::new(a, b).solve_sequential(1);
        assert!(matches!(
            result,
            Err(CentellaError::InvalidMatrixInput(_))
        ));
    }

    #[test]
    fn test_iterations_recorded_and_result_stable() {
        let (a, b) = random_pair(4, 4, 4, 19);
        let baseline = a.multiply(&b).unwrap();
        let stats = WinogradMultiplier::new(a, b).solve_sequential(4).unwrap();
        assert_eq!(stats.iteration_samples().len(), 4);
        assert!(stats.solution().approx_eq(&baseline, 1e-7));
    }
}
