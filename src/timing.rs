//! Wall-clock measurement and per-run aggregation
//!
//! The benchmarking harness used identically by all three solver engines:
//! [`run_timed`] wraps a "do one solve" operation, timing each iteration and
//! the whole run, and the engine attaches its final solution to the resulting
//! [`RunStatistics`].
//!
//! # Example
//!
//! ```
//! use centella::timing::{run_timed, RunStatistics};
//!
//! let log = run_timed(3, || Ok(())).unwrap();
//! let stats = RunStatistics::from_parts(log, 42u32);
//! assert_eq!(stats.iteration_samples().len(), 3);
//! assert_eq!(*stats.solution(), 42);
//! ```

use std::time::{Duration, Instant};

use crate::error::Result;

/// An immutable measured span with per-unit projections
///
/// The seconds/milliseconds/microseconds views are all derived from the one
/// source duration at construction and never recomputed from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DurationSample {
    duration: Duration,
    seconds: u64,
    milliseconds: u128,
    microseconds: u128,
}

impl DurationSample {
    /// Captures all unit projections of `duration`
    pub fn from_duration(duration: Duration) -> Self {
        DurationSample {
            duration,
            seconds: duration.as_secs(),
            milliseconds: duration.as_millis(),
            microseconds: duration.as_micros(),
        }
    }

    /// Builds a sample from already-projected unit values
    ///
    /// Used by [`RunStatistics::mean_duration`], where each unit is averaged
    /// independently and the projections deliberately stop being consistent
    /// with one another.
    fn from_units(seconds: u64, milliseconds: u128, microseconds: u128) -> Self {
        DurationSample {
            duration: Duration::from_micros(microseconds as u64),
            seconds,
            milliseconds,
            microseconds,
        }
    }

    /// The source duration
    #[inline]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Whole seconds
    #[inline]
    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Whole milliseconds
    #[inline]
    pub fn milliseconds(&self) -> u128 {
        self.milliseconds
    }

    /// Whole microseconds
    #[inline]
    pub fn microseconds(&self) -> u128 {
        self.microseconds
    }
}

/// Captures elapsed wall-clock time between a start mark and a sample point
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    begin: Instant,
}

impl Stopwatch {
    /// Starts a new stopwatch at the current instant
    pub fn start() -> Self {
        Stopwatch {
            begin: Instant::now(),
        }
    }

    /// Moves the start mark to the current instant
    pub fn restart(&mut self) {
        self.begin = Instant::now();
    }

    /// Samples the elapsed span without stopping the watch
    pub fn sample(&self) -> DurationSample {
        DurationSample::from_duration(self.begin.elapsed())
    }
}

/// Raw timing output of one benchmarked run
#[derive(Debug, Clone, Default)]
pub struct TimingLog {
    /// One sample per iteration, in iteration order
    pub iteration_samples: Vec<DurationSample>,
    /// One sample spanning the whole run
    pub total: DurationSample,
}

/// Per-strategy aggregate of timing samples and the final solution
#[derive(Debug, Clone)]
pub struct RunStatistics<S> {
    iteration_samples: Vec<DurationSample>,
    total: DurationSample,
    solution: S,
}

impl<S> RunStatistics<S> {
    /// Combines a harness log with the run's final solution
    pub fn from_parts(log: TimingLog, solution: S) -> Self {
        RunStatistics {
            iteration_samples: log.iteration_samples,
            total: log.total,
            solution,
        }
    }

    /// Per-iteration samples in iteration order
    pub fn iteration_samples(&self) -> &[DurationSample] {
        &self.iteration_samples
    }

    /// Total elapsed duration of the run
    pub fn total_duration(&self) -> DurationSample {
        self.total
    }

    /// The strategy's final solution
    pub fn solution(&self) -> &S {
        &self.solution
    }

    /// Consumes the statistics, yielding the solution
    pub fn into_solution(self) -> S {
        self.solution
    }

    /// Arithmetic mean of the per-iteration samples, or `None` when no
    /// iteration was recorded
    ///
    /// Each unit is averaged independently with integer division, so the
    /// mean's projections are truncated views rather than re-derivations of
    /// one another.
    pub fn mean_duration(&self) -> Option<DurationSample> {
        let count = self.iteration_samples.len();
        if count == 0 {
            return None;
        }
        let mut seconds = 0u64;
        let mut milliseconds = 0u128;
        let mut microseconds = 0u128;
        for sample in &self.iteration_samples {
            seconds += sample.seconds();
            milliseconds += sample.milliseconds();
            microseconds += sample.microseconds();
        }
        Some(DurationSample::from_units(
            seconds / count as u64,
            milliseconds / count as u128,
            microseconds / count as u128,
        ))
    }
}

/// Runs `op` `iterations` times, timing each call and the whole run
///
/// Any error raised by `op` propagates unmodified and no partial log is
/// returned. Zero iterations yield an empty sample list; averaging it is the
/// caller's concern (see [`RunStatistics::mean_duration`]).
///
/// # Errors
///
/// Whatever `op` returns.
pub fn run_timed<F>(iterations: usize, mut op: F) -> Result<TimingLog>
where
    F: FnMut() -> Result<()>,
{
    let total = Stopwatch::start();
    let mut iteration_samples = Vec::with_capacity(iterations);
    for _ in 0..iterations {
        let lap = Stopwatch::start();
        op()?;
        iteration_samples.push(lap.sample());
    }
    Ok(TimingLog {
        iteration_samples,
        total: total.sample(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CentellaError;

    #[test]
    fn test_duration_sample_projections() {
        let sample = DurationSample::from_duration(Duration::from_micros(2_500_000));
        assert_eq!(sample.seconds(), 2);
        assert_eq!(sample.milliseconds(), 2_500);
        assert_eq!(sample.microseconds(), 2_500_000);
    }

    #[test]
    fn test_stopwatch_monotonic() {
        let watch = Stopwatch::start();
        let first = watch.sample();
        let second = watch.sample();
        assert!(second.duration() >= first.duration());
    }

    #[test]
    fn test_run_timed_sample_count() {
        let mut calls = 0;
        let log = run_timed(5, || {
            calls += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(calls, 5);
        assert_eq!(log.iteration_samples.len(), 5);
        assert!(log.total.duration() >= Duration::ZERO);
    }

    #[test]
    fn test_run_timed_zero_iterations() {
        let log = run_timed(0, || Ok(())).unwrap();
        assert!(log.iteration_samples.is_empty());
        let stats = RunStatistics::from_parts(log, ());
        assert!(stats.mean_duration().is_none());
    }

    #[test]
    fn test_run_timed_error_aborts_without_partial_log() {
        let mut calls = 0;
        let result = run_timed(10, || {
            calls += 1;
            if calls == 3 {
                Err(CentellaError::InvalidIterationsQuantity)
            } else {
                Ok(())
            }
        });
        assert_eq!(calls, 3);
        assert!(matches!(
            result,
            Err(CentellaError::InvalidIterationsQuantity)
        ));
    }

    #[test]
    fn test_mean_duration_truncates_per_unit() {
        let log = TimingLog {
            iteration_samples: vec![
                DurationSample::from_duration(Duration::from_micros(1_500_000)),
                DurationSample::from_duration(Duration::from_micros(2_500_001)),
            ],
            total: DurationSample::from_duration(Duration::from_micros(4_000_001)),
        };
        let stats = RunStatistics::from_parts(log, ());
        let mean = stats.mean_duration().unwrap();
        // Units average independently: (1 + 2) / 2 secs, (1500 + 2500) / 2 ms.
        assert_eq!(mean.seconds(), 1);
        assert_eq!(mean.milliseconds(), 2_000);
        assert_eq!(mean.microseconds(), 2_000_000);
    }

    #[test]
    fn test_statistics_accessors() {
        let log = run_timed(2, || Ok(())).unwrap();
        let stats = RunStatistics::from_parts(log, vec![1.0, 2.0]);
        assert_eq!(stats.iteration_samples().len(), 2);
        assert_eq!(stats.solution().len(), 2);
        assert_eq!(stats.into_solution(), vec![1.0, 2.0]);
    }
}
