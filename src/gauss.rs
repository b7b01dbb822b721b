//! Gaussian elimination for augmented linear systems
//!
//! Solves `A·x = b` presented as one augmented `rows x (rows + 1)` matrix via
//! row reduction: a forward pass eliminates below the diagonal, a backward
//! pass eliminates above it, and the solution is read off the last column.
//!
//! Two strategies share the same elimination steps:
//!
//! - **Sequential**: one pivot row at a time, top-down then bottom-up.
//! - **Parallel**: per pivot step, the remaining rows are split into
//!   contiguous near-equal bands eliminated on scoped threads that join
//!   before the next pivot advances. Band ownership is disjoint, so no lock
//!   guards the matrix.
//!
//! A pivot of exactly zero skips normalization and elimination proceeds; only
//! the sequential forward pass attempts a partial-pivot swap, and only for
//! row 0. The parallel paths always keep skip-only semantics.
//!
//! # Example
//!
//! ```
//! use centella::{GaussSolver, Matrix};
//!
//! let system = Matrix::from_rows(vec![
//!     vec![2.0, 1.0, -1.0, 8.0],
//!     vec![-3.0, -1.0, 2.0, -11.0],
//!     vec![-2.0, 1.0, 2.0, -3.0],
//! ])
//! .unwrap();
//! let stats = GaussSolver::new(system).solve_sequential(1).unwrap();
//! let x = stats.solution();
//! assert!((x[0] - 2.0).abs() < 1e-7);
//! assert!((x[1] - 3.0).abs() < 1e-7);
//! assert!((x[2] + 1.0).abs() < 1e-7);
//! ```

use std::thread;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::{CentellaError, Result};
use crate::matrix::Matrix;
use crate::timing::{run_timed, RunStatistics};

/// Default number of elimination bands per pivot step
const DEFAULT_FAN_OUT: usize = 2;

/// Row-reduction solver for one augmented system
///
/// The solver snapshots the matrix at construction and restores it from that
/// snapshot before every benchmarked iteration, so mutation in one iteration
/// never contaminates the next.
#[derive(Debug, Clone)]
pub struct GaussSolver {
    matrix: Matrix,
    fan_out: usize,
}

impl GaussSolver {
    /// Takes ownership of the augmented system and snapshots it
    pub fn new(mut matrix: Matrix) -> Self {
        matrix.snapshot_cache();
        GaussSolver {
            matrix,
            fan_out: DEFAULT_FAN_OUT,
        }
    }

    /// Sets the number of elimination bands used by the parallel strategy
    ///
    /// Values below 1 are clamped to 1, which degrades the parallel strategy
    /// to banded-sequential execution.
    pub fn with_fan_out(mut self, fan_out: usize) -> Self {
        self.fan_out = fan_out.max(1);
        self
    }

    /// Runs `iterations` sequential solves, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::InvalidGaussMatrix`] when the matrix is not an
    /// augmented square system or no nonzero pivot exists for row 0.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(rows = self.matrix.rows())))]
    pub fn solve_sequential(&mut self, iterations: usize) -> Result<RunStatistics<Vec<f64>>> {
        self.validate()?;
        let log = run_timed(iterations, || {
            self.matrix.restore_from_cache();
            self.forward()?;
            self.backward();
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, self.solution()))
    }

    /// Runs `iterations` two-band fork-join parallel solves, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::InvalidGaussMatrix`] when the matrix is not an
    /// augmented square system.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(rows = self.matrix.rows())))]
    pub fn solve_parallel(&mut self, iterations: usize) -> Result<RunStatistics<Vec<f64>>> {
        self.validate()?;
        let log = run_timed(iterations, || {
            self.matrix.restore_from_cache();
            self.parallel_forward();
            self.parallel_backward();
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, self.solution()))
    }

    /// The reduced system's last column
    fn solution(&self) -> Vec<f64> {
        let last = self.matrix.cols() - 1;
        (0..self.matrix.rows())
            .map(|i| self.matrix.at(i, last))
            .collect()
    }

    /// An augmented square system has exactly one more column than rows
    fn validate(&self) -> Result<()> {
        if self.matrix.cols() != self.matrix.rows() + 1 {
            return Err(CentellaError::InvalidGaussMatrix(format!(
                "{} rows, {} columns",
                self.matrix.rows(),
                self.matrix.cols()
            )));
        }
        Ok(())
    }

    fn forward(&mut self) -> Result<()> {
        self.process_first_row()?;
        let rows = self.matrix.rows();
        for pivot in 0..rows - 1 {
            self.divide_row(pivot);
            for target in pivot + 1..rows {
                self.eliminate(pivot, target);
            }
        }
        let divisor = self.matrix.at(rows - 1, self.matrix.cols() - 2);
        self.divide_each(rows - 1, divisor);
        Ok(())
    }

    fn backward(&mut self) {
        let rows = self.matrix.rows();
        for pivot in (1..rows).rev() {
            self.divide_row(pivot);
            for target in (0..pivot).rev() {
                self.eliminate(pivot, target);
            }
        }
        let divisor = self.matrix.at(0, 0);
        self.divide_each(0, divisor);
    }

    fn parallel_forward(&mut self) {
        let rows = self.matrix.rows();
        let cols = self.matrix.cols();
        for pivot in 0..rows {
            self.divide_row(pivot);
            let first_target = pivot + 1;
            if first_target >= rows {
                continue;
            }
            let pivot_row = self.matrix.row(pivot).to_vec();
            let (_, below) = self.matrix.as_mut_slice().split_at_mut(first_target * cols);
            eliminate_bands(below, cols, pivot, &pivot_row, self.fan_out);
        }
    }

    fn parallel_backward(&mut self) {
        let cols = self.matrix.cols();
        for pivot in (0..self.matrix.rows()).rev() {
            self.divide_row(pivot);
            if pivot == 0 {
                continue;
            }
            let pivot_row = self.matrix.row(pivot).to_vec();
            let (above, _) = self.matrix.as_mut_slice().split_at_mut(pivot * cols);
            eliminate_bands(above, cols, pivot, &pivot_row, self.fan_out);
        }
    }

    /// Subtracts a multiple of the pivot row so `target`'s entry in the
    /// pivot column becomes zero
    fn eliminate(&mut self, pivot: usize, target: usize) {
        if pivot == target {
            return;
        }
        let multiplier = -self.matrix.at(target, pivot);
        for k in 0..self.matrix.cols() {
            let value = self.matrix.at(target, k) + self.matrix.at(pivot, k) * multiplier;
            self.matrix.set(target, k, value);
        }
    }

    /// Normalizes a row by its diagonal element; a zero diagonal is skipped
    fn divide_row(&mut self, row: usize) {
        let divisor = self.matrix.at(row, row);
        self.divide_each(row, divisor);
    }

    fn divide_each(&mut self, row: usize, divisor: f64) {
        if divisor == 0.0 {
            return;
        }
        for value in self.matrix.row_mut(row) {
            *value /= divisor;
        }
    }

    fn swap_rows(&mut self, first: usize, second: usize) {
        if first == second {
            return;
        }
        for k in 0..self.matrix.cols() {
            let tmp = self.matrix.at(first, k);
            let other = self.matrix.at(second, k);
            self.matrix.set(first, k, other);
            self.matrix.set(second, k, tmp);
        }
    }

    /// First row at or below `start` with a nonzero entry in column 0
    fn find_row_to_swap(&self, start: usize) -> Option<usize> {
        (start..self.matrix.rows()).find(|&i| self.matrix.at(i, 0) != 0.0)
    }

    /// Partial-pivot swap for row 0 only; the other rows keep skip-on-zero
    /// semantics
    fn process_first_row(&mut self) -> Result<()> {
        if self.matrix.at(0, 0) != 0.0 {
            return Ok(());
        }
        match self.find_row_to_swap(1) {
            Some(row) => {
                self.swap_rows(0, row);
                Ok(())
            }
            None => Err(CentellaError::InvalidGaussMatrix(
                "no nonzero pivot in column 0".to_string(),
            )),
        }
    }
}

/// Eliminates every row of `region` against a pivot-row snapshot, splitting
/// the region into `fan_out` contiguous bands on scoped threads
///
/// `region` must start at a row boundary; each band is owned exclusively by
/// one thread for the duration of the step.
fn eliminate_bands(
    region: &mut [f64],
    cols: usize,
    pivot_col: usize,
    pivot_row: &[f64],
    fan_out: usize,
) {
    let row_count = region.len() / cols;
    let band_rows = (row_count + fan_out - 1) / fan_out;
    thread::scope(|s| {
        for band in region.chunks_mut(band_rows * cols) {
            s.spawn(move || {
                for row in band.chunks_mut(cols) {
                    let multiplier = -row[pivot_col];
                    for (value, pivot_value) in row.iter_mut().zip(pivot_row) {
                        *value += pivot_value * multiplier;
                    }
                }
            });
        }
    });
}
