//! Centella: Multi-Strategy Numerical Solver Benchmarks
//!
//! **Centella** (Spanish: "lightning flash") implements three independent
//! numerical algorithms, each in several execution strategies, and measures
//! their wall-clock performance over repeated runs:
//!
//! 1. **Gaussian elimination** for augmented linear systems — sequential and
//!    two-band fork-join parallel
//! 2. **Winograd matrix multiplication** — sequential, N-band parallel, and a
//!    fixed 2-stage conveyor
//! 3. **Ant-colony TSP heuristic** — sequential and batched parallel
//!
//! # Design Principles
//!
//! - **Same algorithm, several strategies**: every strategy of an engine
//!   produces the same solution; only the decomposition differs
//! - **Fork-join threads only**: parallel regions spawn scoped threads and
//!   join them before proceeding — no thread pool, no async, no cancellation
//! - **Partitioned ownership over locking**: concurrent writers own disjoint
//!   row bands; the one mutex in the crate guards the ant engine's shared
//!   accumulator, held only for the brief update step
//! - **Reproducible runs**: inputs carry a cached snapshot restored before
//!   every benchmarked iteration, so iterations never contaminate each other
//!
//! # Quick Start
//!
//! ```rust
//! use centella::{GaussSolver, Matrix};
//!
//! let system = Matrix::from_rows(vec![
//!     vec![2.0, 1.0, -1.0, 8.0],
//!     vec![-3.0, -1.0, 2.0, -11.0],
//!     vec![-2.0, 1.0, 2.0, -3.0],
//! ])?;
//!
//! let stats = GaussSolver::new(system).solve_sequential(10)?;
//! assert_eq!(stats.iteration_samples().len(), 10);
//! assert!((stats.solution()[0] - 2.0).abs() < 1e-7);
//! # Ok::<(), centella::CentellaError>(())
//! ```

pub mod ant;
pub mod error;
pub mod gauss;
pub mod matrix;
pub mod timing;
pub mod winograd;

pub use ant::{AntColonySolver, TourResult};
pub use error::{CentellaError, Result};
pub use gauss::GaussSolver;
pub use matrix::{Matrix, PRECISION};
pub use timing::{DurationSample, RunStatistics, Stopwatch};
pub use winograd::WinogradMultiplier;
