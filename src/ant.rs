//! Ant-colony heuristic for the traveling-salesman problem
//!
//! Repeated randomized tours ("passages") over a weighted adjacency matrix
//! deposit pheromone along their edges; later passages prefer edges with
//! stronger trails, biasing the colony toward short tours. A zero entry in
//! the adjacency matrix means "no edge".
//!
//! Per benchmarked iteration the engine restores the graph from its cached
//! input, rejects disconnected graphs before any pheromone setup, resets the
//! pheromone field to its defaults, and runs a fixed number of passages
//! (24 000 by default — independent of the caller's benchmark iteration
//! count, which controls how many full runs are timed).
//!
//! Two strategies:
//!
//! - **Sequential**: one passage after another, folding the accumulated
//!   pheromone delta into the live field after each pass.
//! - **Parallel**: a batch of passages (8 by default) on scoped threads per
//!   outer pass; the delta is folded once after the batch joins. The round
//!   loop subtracts the batch size per round with no partial final round, so
//!   a remainder smaller than the batch is not separately handled.
//!
//! The pheromone delta and the best-tour record are the only cross-thread
//! mutable state; one mutex guards both, held only during the brief
//! accumulate/compare step, never during the walk itself.

use std::sync::Mutex;
use std::thread;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::error::{CentellaError, Result};
use crate::matrix::Matrix;
use crate::timing::{run_timed, RunStatistics};

/// Ant passages per benchmarked iteration, unless overridden
pub const DEFAULT_PASSAGE_COUNT: usize = 24_000;

/// Passages launched per parallel outer pass, unless overridden
pub const DEFAULT_BATCH_SIZE: usize = 8;

const DEFAULT_PHEROMONE_LEVEL: f64 = 1.0;
const NO_EDGE: f64 = 0.0;

/// A completed tour and its total edge cost
///
/// `vertices` lists the visit order starting at vertex 0; the first vertex
/// appears again at the end when a return edge exists. `distance` starts at
/// `+inf` so any completed tour improves on it.
#[derive(Debug, Clone, PartialEq)]
pub struct TourResult {
    /// Visit order, vertex indices into the adjacency matrix
    pub vertices: Vec<usize>,
    /// Sum of traversed edge costs
    pub distance: f64,
}

impl Default for TourResult {
    fn default() -> Self {
        TourResult {
            vertices: Vec::new(),
            distance: f64::INFINITY,
        }
    }
}

/// Pheromone-trail TSP solver over one adjacency matrix
pub struct AntColonySolver {
    graph: Matrix,
    pheromones: Matrix,
    deltas: Matrix,
    best: TourResult,
    passage_count: usize,
    batch_size: usize,
    rng: SmallRng,
}

impl AntColonySolver {
    /// Takes ownership of the adjacency matrix and snapshots it
    ///
    /// The engine's random generator is seeded from system entropy once,
    /// here; every passage reuses it (or a generator derived from it).
    pub fn new(graph: Matrix) -> Self {
        Self::with_rng(graph, SmallRng::from_entropy())
    }

    /// Like [`AntColonySolver::new`] but with a fixed seed, for reproducible
    /// runs
    pub fn with_seed(graph: Matrix, seed: u64) -> Self {
        Self::with_rng(graph, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(mut graph: Matrix, rng: SmallRng) -> Self {
        graph.snapshot_cache();
        // Same-shape scratch matrices; setup() resets them every iteration.
        let pheromones = graph.clone();
        let deltas = graph.clone();
        AntColonySolver {
            graph,
            pheromones,
            deltas,
            best: TourResult::default(),
            passage_count: DEFAULT_PASSAGE_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            rng,
        }
    }

    /// Sets how many passages one benchmarked iteration runs
    pub fn with_passage_count(mut self, passages: usize) -> Self {
        self.passage_count = passages;
        self
    }

    /// Sets how many passages fly concurrently per parallel outer pass
    ///
    /// Values below 1 are clamped to 1.
    pub fn with_batch_size(mut self, batch: usize) -> Self {
        self.batch_size = batch.max(1);
        self
    }

    /// Runs `iterations` full sequential colony runs, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::DisconnectedGraph`] when any vertex has no incident
    /// edge besides a self-loop.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(vertices = self.graph.rows())))]
    pub fn solve_sequential(&mut self, iterations: usize) -> Result<RunStatistics<TourResult>> {
        self.best = TourResult::default();
        let log = run_timed(iterations, || {
            self.setup()?;
            self.run_sequential();
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, self.best.clone()))
    }

    /// Runs `iterations` full batched-parallel colony runs, timing each
    ///
    /// # Errors
    ///
    /// [`CentellaError::DisconnectedGraph`] when any vertex has no incident
    /// edge besides a self-loop.
    #[cfg_attr(feature = "tracing", instrument(skip(self), fields(vertices = self.graph.rows())))]
    pub fn solve_parallel(&mut self, iterations: usize) -> Result<RunStatistics<TourResult>> {
        self.best = TourResult::default();
        let log = run_timed(iterations, || {
            self.setup()?;
            self.run_parallel();
            Ok(())
        })?;
        Ok(RunStatistics::from_parts(log, self.best.clone()))
    }

    /// Restores the graph, rejects isolated vertices, resets pheromones
    ///
    /// The connectivity check runs before any pheromone state is touched.
    fn setup(&mut self) -> Result<()> {
        self.graph.restore_from_cache();
        if let Some(vertex) = self.find_isolated_vertex() {
            return Err(CentellaError::DisconnectedGraph(vertex));
        }
        let (rows, cols) = self.graph.shape();
        self.pheromones.resize(rows, cols)?;
        self.deltas.resize(rows, cols)?;
        for level in self.pheromones.as_mut_slice() {
            *level = DEFAULT_PHEROMONE_LEVEL;
        }
        Ok(())
    }

    fn run_sequential(&mut self) {
        for _ in 0..self.passage_count {
            let (tour, distance) = ant_passage(&self.graph, &self.pheromones, &mut self.rng);
            let tay = trail_reinforcement(&self.graph, distance);
            record_passage(&mut self.deltas, &mut self.best, tour, distance, tay);
            fold_deltas(&mut self.pheromones, &mut self.deltas);
        }
    }

    fn run_parallel(&mut self) {
        let batch = self.batch_size;
        let mut remaining = self.passage_count as i64;
        while remaining > 0 {
            let seeds: Vec<u64> = (0..batch).map(|_| self.rng.gen()).collect();
            let graph = &self.graph;
            let pheromones = &self.pheromones;
            let shared = Mutex::new((&mut self.deltas, &mut self.best));
            thread::scope(|s| {
                for seed in seeds {
                    let shared = &shared;
                    s.spawn(move || {
                        let mut rng = SmallRng::seed_from_u64(seed);
                        let (tour, distance) = ant_passage(graph, pheromones, &mut rng);
                        let tay = trail_reinforcement(graph, distance);
                        let mut guard = shared.lock().expect("pheromone lock poisoned");
                        let (deltas, best) = &mut *guard;
                        record_passage(deltas, best, tour, distance, tay);
                    });
                }
            });
            drop(shared);
            fold_deltas(&mut self.pheromones, &mut self.deltas);
            remaining -= batch as i64;
        }
    }

    /// First vertex with no incident edge in either direction, if any
    fn find_isolated_vertex(&self) -> Option<usize> {
        let n = self.graph.rows();
        (0..n).find(|&v| {
            let outgoing = (0..n).any(|u| u != v && self.graph.at(v, u) != NO_EDGE);
            let incoming = (0..n).any(|u| u != v && self.graph.at(u, v) != NO_EDGE);
            !outgoing && !incoming
        })
    }
}

/// One full tour starting at vertex 0
///
/// The walk repeatedly draws a next vertex; a degenerate draw (no candidate's
/// cumulative interval contains it) comes back as vertex 0 and keeps the walk
/// on its previous pick until a fresh draw succeeds. When every vertex has
/// been visited, the closing edge back to vertex 0 is taken if it exists.
fn ant_passage(graph: &Matrix, pheromones: &Matrix, rng: &mut SmallRng) -> (Vec<usize>, f64) {
    let n = graph.rows();
    let mut visited = Vec::with_capacity(n + 1);
    visited.push(0usize);
    let mut distance = 0.0;
    let mut current = 0usize;
    let mut next = next_vertex(graph, pheromones, current, &visited, rng);

    while visited.len() != n {
        if !visited.contains(&next) {
            visited.push(next);
            distance += graph.at(current, next);
        }
        let fallback = next;
        current = next;
        next = next_vertex(graph, pheromones, current, &visited, rng);
        if next == 0 {
            next = fallback;
        }
    }

    if graph.at(current, 0) != NO_EDGE {
        visited.push(0);
        distance += graph.at(current, 0);
    }

    (visited, distance)
}

/// Roulette-wheel pick over unvisited, edge-present candidates
///
/// Selection weight is `(1 / edge cost) * pheromone level`, normalized over
/// all feasible candidates. Returns 0 when no cumulative interval contains
/// the draw (including when there is no candidate at all).
fn next_vertex(
    graph: &Matrix,
    pheromones: &Matrix,
    current: usize,
    visited: &[usize],
    rng: &mut SmallRng,
) -> usize {
    let mut denominator = 0.0;
    for i in 0..graph.rows() {
        if graph.at(current, i) != NO_EDGE && !visited.contains(&i) {
            denominator += (1.0 / graph.at(current, i)) * pheromones.at(current, i);
        }
    }

    let draw: f64 = rng.gen();
    let mut cumulative = 0.0;
    let mut next = 0usize;
    for i in 0..graph.rows() {
        if graph.at(current, i) != NO_EDGE && !visited.contains(&i) {
            let previous = cumulative;
            cumulative += (1.0 / graph.at(current, i)) * pheromones.at(current, i) / denominator;
            if draw > previous && draw <= cumulative {
                next = i;
            }
        }
    }
    next
}

/// Trail deposit for one tour: mean edge cost over the whole matrix divided
/// by the tour's distance
fn trail_reinforcement(graph: &Matrix, distance: f64) -> f64 {
    let total: f64 = graph.as_slice().iter().sum();
    let mean = total / (graph.rows() * graph.cols()) as f64;
    mean / distance
}

/// Accumulates the tour's deposit symmetrically into the delta matrix and
/// keeps the best tour if this one improves on it
fn record_passage(
    deltas: &mut Matrix,
    best: &mut TourResult,
    tour: Vec<usize>,
    distance: f64,
    tay: f64,
) {
    for pair in tour.windows(2) {
        *deltas.at_mut(pair[0], pair[1]) += tay;
        *deltas.at_mut(pair[1], pair[0]) += tay;
    }
    if distance < best.distance {
        best.distance = distance;
        best.vertices = tour;
    }
}

/// Folds the accumulated delta into the live pheromone field and clears it
fn fold_deltas(pheromones: &mut Matrix, deltas: &mut Matrix) {
    for (level, delta) in pheromones
        .as_mut_slice()
        .iter_mut()
        .zip(deltas.as_mut_slice())
    {
        *level += *delta;
        *delta = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Complete 4-vertex graph with costs
    /// (0,1)=1 (0,2)=2 (0,3)=3 (1,2)=1 (1,3)=2 (2,3)=1
    fn small_complete_graph() -> Matrix {
        Matrix::from_rows(vec![
            vec![0.0, 1.0, 2.0, 3.0],
            vec![1.0, 0.0, 1.0, 2.0],
            vec![2.0, 1.0, 0.0, 1.0],
            vec![3.0, 2.0, 1.0, 0.0],
        ])
        .unwrap()
    }

    /// Cheapest Hamiltonian cycle cost on the graph above, by enumeration
    fn brute_force_optimum(graph: &Matrix) -> f64 {
        let n = graph.rows();
        assert_eq!(n, 4);
        let mut best = f64::INFINITY;
        let orders = [[1, 2, 3], [1, 3, 2], [2, 1, 3], [2, 3, 1], [3, 1, 2], [3, 2, 1]];
        for order in orders {
            let mut cost = graph.at(0, order[0]);
            cost += graph.at(order[0], order[1]);
            cost += graph.at(order[1], order[2]);
            cost += graph.at(order[2], 0);
            best = best.min(cost);
        }
        best
    }

    fn assert_valid_tour(tour: &TourResult, n: usize) {
        assert!(tour.distance.is_finite());
        assert!(tour.distance >= 0.0);
        // Each vertex exactly once before the optional closing vertex.
        let body = if tour.vertices.len() == n + 1 {
            assert_eq!(tour.vertices[0], *tour.vertices.last().unwrap());
            &tour.vertices[..n]
        } else {
            assert_eq!(tour.vertices.len(), n);
            &tour.vertices[..]
        };
        let mut seen = vec![false; n];
        for &v in body {
            assert!(!seen[v], "vertex {v} visited twice");
            seen[v] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_sequential_finds_known_optimum() {
        let graph = small_complete_graph();
        let optimum = brute_force_optimum(&graph);
        let stats = AntColonySolver::with_seed(graph, 21)
            .with_passage_count(500)
            .solve_sequential(1)
            .unwrap();
        let tour = stats.solution();
        assert_valid_tour(tour, 4);
        assert_eq!(tour.distance, optimum);
    }

    #[test]
    fn test_parallel_finds_known_optimum() {
        let graph = small_complete_graph();
        let optimum = brute_force_optimum(&graph);
        let stats = AntColonySolver::with_seed(graph, 22)
            .with_passage_count(500)
            .solve_parallel(1)
            .unwrap();
        let tour = stats.solution();
        assert_valid_tour(tour, 4);
        assert_eq!(tour.distance, optimum);
    }

    #[test]
    fn test_disconnected_graph_rejected() {
        let graph = Matrix::from_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ])
        .unwrap();
        let result = AntColonySolver::with_seed(graph, 3)
            .with_passage_count(10)
            .solve_sequential(1);
        assert!(matches!(result, Err(CentellaError::DisconnectedGraph(2))));
    }

    #[test]
    fn test_self_loop_does_not_connect() {
        let graph = Matrix::from_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 5.0],
        ])
        .unwrap();
        let result = AntColonySolver::with_seed(graph, 4)
            .with_passage_count(10)
            .solve_sequential(1);
        assert!(matches!(result, Err(CentellaError::DisconnectedGraph(2))));
    }

    #[test]
    fn test_iteration_samples_match_iteration_count() {
        let stats = AntColonySolver::with_seed(small_complete_graph(), 5)
            .with_passage_count(50)
            .solve_sequential(3)
            .unwrap();
        assert_eq!(stats.iteration_samples().len(), 3);
    }

    #[test]
    fn test_parallel_batch_remainder_terminates() {
        // 10 passages with a batch of 8: two full rounds, no partial round.
        let stats = AntColonySolver::with_seed(small_complete_graph(), 6)
            .with_passage_count(10)
            .with_batch_size(8)
            .solve_parallel(1)
            .unwrap();
        assert_valid_tour(stats.solution(), 4);
    }

    #[test]
    fn test_batch_size_one_degrades_gracefully() {
        let stats = AntColonySolver::with_seed(small_complete_graph(), 7)
            .with_passage_count(50)
            .with_batch_size(1)
            .solve_parallel(1)
            .unwrap();
        assert_valid_tour(stats.solution(), 4);
    }

    #[test]
    fn test_missing_closing_edge_leaves_tour_open() {
        // Path graph 0-1-2: tours ending away from 0 cannot close.
        let graph = Matrix::from_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 1.0],
            vec![0.0, 1.0, 0.0],
        ])
        .unwrap();
        let stats = AntColonySolver::with_seed(graph, 8)
            .with_passage_count(20)
            .solve_sequential(1)
            .unwrap();
        let tour = stats.solution();
        // 0 -> 1 -> 2 is the only possible visit order; no edge 2 -> 0.
        assert_eq!(tour.vertices, vec![0, 1, 2]);
        assert_eq!(tour.distance, 2.0);
    }

    #[test]
    fn test_trail_reinforcement_is_mean_cost_over_distance() {
        let graph = small_complete_graph();
        // Sum of all entries is 20 over 16 cells; mean 1.25.
        let tay = trail_reinforcement(&graph, 5.0);
        assert!((tay - 0.25).abs() < 1e-12);
    }
}
