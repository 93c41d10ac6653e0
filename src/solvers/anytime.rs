//! Anytime partition branch-and-bound (coarse bounds).
//!
//! The search space is restructured by task-size partition: an integer
//! partition of N into M nonnegative parts fixes how many agents each
//! coalition receives, and permuting which part goes to which task is the
//! remaining dimension. Partitions are bounded with size-keyed cardinal
//! bounds, ordered by descending upper bound, and expanded permutation by
//! permutation; each admissible permutation is searched by depth-first
//! agent placement with running upper bounds. The deadline is polled at
//! node-expansion granularity once an incumbent exists, so interrupting
//! the search always yields the best solution found so far; with no
//! deadline the search is exhaustive up to the optimality tolerance.

use serde::{Deserialize, Serialize};

use crate::core::bits::full_mask;
use crate::core::partitions::{integer_partitions, next_permutation, PartSizes};
use crate::core::{Deadline, Value, MAX_TABLE_AGENTS};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::bounds::CardinalBounds;
use super::greedy::{AgentGreedyConfig, AgentGreedySolver};
use super::Solver;

pub(crate) const OPTIMALITY_TOLERANCE: Value = 0.001;
pub(crate) const LOWEST_BOUND_TOLERANCE: Value = 0.001;

/// Anytime branch-and-bound configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnytimeConfig {
    /// Seconds; negative searches exhaustively.
    pub time_limit: f64,
    /// Seed the incumbent with bounded agent-greedy solutions.
    pub greedy_seed: bool,
    /// Permutations batched between bound re-sorts.
    pub permutations_per_block: usize,
}

impl Default for AnytimeConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            greedy_seed: false,
            permutations_per_block: 100_000,
        }
    }
}

impl AnytimeConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_greedy_seed(mut self, enabled: bool) -> Self {
        self.greedy_seed = enabled;
        self
    }
}

/// Coarse-bound anytime branch-and-bound solver.
#[derive(Clone, Debug, Default)]
pub struct AnytimeSolver {
    pub config: AnytimeConfig,
}

impl AnytimeSolver {
    #[must_use]
    pub fn new(config: AnytimeConfig) -> Self {
        Self { config }
    }

    /// Solve starting from an existing incumbent.
    pub fn solve_from(
        &mut self,
        oracle: &dyn ValueOracle,
        initial: Option<&Solution>,
    ) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        assert!(
            n <= MAX_TABLE_AGENTS,
            "partition search requires at most {MAX_TABLE_AGENTS} agents"
        );

        // Degenerate instances short-circuit the machinery.
        if m == 1 {
            let mut solution = Solution::new();
            solution.reset(1, n);
            solution.set_coalition_mask(0, full_mask(n));
            solution.recalculate_value(oracle);
            return solution;
        }
        if n == 1 {
            let best_task = (0..m)
                .max_by(|&a, &b| {
                    let delta_a = oracle.mask_value(1, a) - oracle.mask_value(0, a);
                    let delta_b = oracle.mask_value(1, b) - oracle.mask_value(0, b);
                    delta_a.partial_cmp(&delta_b).unwrap_or(std::cmp::Ordering::Equal)
                })
                .unwrap_or(0);
            let mut solution = Solution::new();
            solution.reset(m, n);
            solution.add_agent(0, best_task);
            solution.recalculate_value(oracle);
            return solution;
        }

        let table = oracle
            .table()
            .expect("partition search requires a materialized value table");

        let mut searcher = AnytimeSearcher {
            oracle,
            n_agents: n,
            n_tasks: m,
            deadline: Deadline::start(self.config.time_limit),
            greedy_seed: self.config.greedy_seed,
            permutations_per_block: self.config.permutations_per_block.max(1),
            bounds: CardinalBounds::compute(table, n, m, false),
            max_lower_bound: Value::MIN,
            has_solution: false,
            best_value: Value::MIN,
            best: Solution::new(),
            current: Solution::new(),
            part_to_task: Vec::new(),
            open_parts: Vec::new(),
            original_parts: Vec::new(),
        };
        searcher.run(initial)
    }
}

impl Solver for AnytimeSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let initial = if self.config.greedy_seed {
            Some(AgentGreedySolver::new(AgentGreedyConfig::default()).solve(oracle))
        } else {
            None
        };
        self.solve_from(oracle, initial.as_ref())
    }
}

struct Candidate {
    parts_by_task: Vec<u32>,
    lower: Value,
    upper: Value,
}

struct AnytimeSearcher<'a> {
    oracle: &'a dyn ValueOracle,
    n_agents: u32,
    n_tasks: u32,
    deadline: Deadline,
    greedy_seed: bool,
    permutations_per_block: usize,

    bounds: CardinalBounds,
    max_lower_bound: Value,

    has_solution: bool,
    best_value: Value,
    best: Solution,
    current: Solution,

    // Scratch for the permutation under search.
    part_to_task: Vec<u32>,
    open_parts: Vec<u32>,
    original_parts: Vec<u32>,
}

impl<'a> AnytimeSearcher<'a> {
    /// The deadline only applies once some solution exists to return.
    fn time_elapsed(&self) -> bool {
        self.has_solution && self.deadline.reached()
    }

    fn is_better(&self, value: Value) -> bool {
        if !self.has_solution {
            return true;
        }
        if value - OPTIMALITY_TOLERANCE < self.best_value {
            return false;
        }
        if value - LOWEST_BOUND_TOLERANCE < self.max_lower_bound {
            return false;
        }
        true
    }

    fn accept(&mut self, solution: Solution) {
        log::debug!("anytime: new incumbent {}", solution.value);
        self.best_value = solution.value;
        self.max_lower_bound = self.max_lower_bound.max(solution.value);
        self.best = solution;
        self.has_solution = true;
    }

    fn run(&mut self, initial: Option<&Solution>) -> Solution {
        if let Some(initial) = initial {
            self.has_solution = true;
            self.best_value = initial.value;
            self.best = initial.clone();
        }

        // Partition the search space and bound each subspace.
        let partitions = integer_partitions(self.n_agents, self.n_tasks);
        let mut partition_lower = vec![0.0; partitions.len()];
        let mut partition_upper = vec![0.0; partitions.len()];
        for (index, partition) in partitions.iter().enumerate() {
            let (lower, upper) = self.bounds.partition_bounds(partition);
            partition_lower[index] = lower;
            partition_upper[index] = upper;
            if lower > self.max_lower_bound {
                self.max_lower_bound = lower;
            }
        }

        // Optionally tighten the incumbent with bounded greedy solutions.
        if self.greedy_seed {
            for (index, partition) in partitions.iter().enumerate() {
                if !self.is_better(partition_upper[index]) {
                    continue;
                }
                let seeded = AgentGreedySolver::new(AgentGreedyConfig::default())
                    .solve_bounded(self.oracle, Some(partition.as_slice()));
                if self.is_better(seeded.value) {
                    self.accept(seeded);
                }
            }
        }

        // Expansion order: admissible partitions, best upper bound first.
        let mut expansion_order: Vec<usize> = (0..partitions.len())
            .filter(|&index| self.is_better(partition_upper[index]))
            .collect();
        expansion_order.sort_by(|&a, &b| {
            if (partition_upper[a] - partition_upper[b]).abs() < OPTIMALITY_TOLERANCE {
                partition_lower[b]
                    .partial_cmp(&partition_lower[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            } else {
                partition_upper[b]
                    .partial_cmp(&partition_upper[a])
                    .unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.current.reset(self.n_tasks, self.n_agents);

        let mut batch: Vec<Candidate> = Vec::new();
        for &index in &expansion_order {
            if self.time_elapsed() {
                break;
            }
            if !self.is_better(partition_upper[index]) {
                break;
            }

            // Ascending order so next_permutation covers every distinct
            // arrangement of the part sizes over tasks.
            let mut parts: PartSizes = partitions[index].clone();
            parts.sort_unstable();

            loop {
                let (lower, upper) = self.bounds.permutation_bounds(&parts);
                if lower > self.max_lower_bound {
                    self.max_lower_bound = lower;
                }

                if self.is_better(upper) {
                    if self.greedy_seed {
                        let seeded = AgentGreedySolver::new(AgentGreedyConfig::default())
                            .solve_bounded(self.oracle, Some(parts.as_slice()));
                        if self.is_better(seeded.value) {
                            self.accept(seeded);
                        }
                    }

                    batch.push(Candidate {
                        parts_by_task: parts.to_vec(),
                        lower,
                        upper,
                    });
                    if batch.len() >= self.permutations_per_block {
                        self.search_batch(std::mem::take(&mut batch));
                    }
                }

                if !next_permutation(&mut parts) || self.time_elapsed() {
                    break;
                }
            }
        }

        if !batch.is_empty() && !self.time_elapsed() {
            self.search_batch(batch);
        }

        assert!(self.has_solution, "partition search ended without a solution");
        let mut result = self.best.clone();
        result.value = self.best_value;
        result
    }

    fn search_batch(&mut self, mut batch: Vec<Candidate>) {
        batch.sort_by(|a, b| {
            if (a.upper - b.upper).abs() < OPTIMALITY_TOLERANCE {
                b.lower.partial_cmp(&a.lower).unwrap_or(std::cmp::Ordering::Equal)
            } else {
                b.upper.partial_cmp(&a.upper).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        for candidate in &batch {
            if self.time_elapsed() {
                return;
            }
            if self.is_better(candidate.upper) {
                self.search_permutation(&candidate.parts_by_task);
            } else {
                // The batch is sorted on upper bound; the rest is dominated.
                break;
            }
        }
    }

    fn search_permutation(&mut self, parts_by_task: &[u32]) {
        self.original_parts.clear();
        self.original_parts.extend_from_slice(parts_by_task);
        self.part_to_task.clear();
        self.open_parts.clear();

        // Zero-size tasks contribute their empty-coalition value up front;
        // only the populated parts enter the depth-first placement.
        let mut start_value = 0.0;
        let mut upper_bound = 0.0;
        for (task, &size) in parts_by_task.iter().enumerate() {
            if size != 0 {
                upper_bound += self.bounds.task_upper[task][size as usize];
                self.part_to_task.push(task as u32);
                self.open_parts.push(size);
            } else {
                start_value += self.oracle.mask_value(0, task as u32);
            }
        }

        if !self.is_better(upper_bound + start_value) {
            return;
        }
        self.place_agent(upper_bound, start_value, 0);
    }

    fn place_agent(&mut self, upper_remaining: Value, current_value: Value, agent: u32) {
        if agent == self.n_agents {
            if self.is_better(current_value) {
                let mut solution = self.current.clone();
                solution.value = current_value;
                self.accept(solution);
            }
            return;
        }

        for slot in 0..self.open_parts.len() {
            if self.time_elapsed() {
                return;
            }
            if self.open_parts[slot] == 0 {
                continue;
            }

            let task = self.part_to_task[slot];
            self.open_parts[slot] -= 1;
            self.current.add_agent(agent, task);

            let mut value = current_value;
            let mut new_upper = upper_remaining;
            if self.open_parts[slot] == 0 {
                // Coalition filled: realize its value, release its bound.
                value += self
                    .oracle
                    .mask_value(self.current.coalition_mask(task), task);
                let original = self.original_parts[task as usize];
                new_upper -= self.bounds.task_upper[task as usize][original as usize];
            }

            if self.is_better(new_upper + value) {
                self.place_agent(new_upper, value, agent + 1);
            }

            self.current.remove_agent(agent, task);
            self.open_parts[slot] += 1;
        }
    }
}
