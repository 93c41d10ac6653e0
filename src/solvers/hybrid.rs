//! Anytime partition branch-and-bound with memoization (hybrid variant).
//!
//! Same partition/permutation restructuring as the coarse solver, but each
//! permutation is searched task-by-task over coalition masks of the
//! prescribed size, with a memo table keyed by `(unassigned_mask, task)`
//! caching the best achievable completion value. Branch-and-bound pruning
//! plus memoization turns the per-permutation search into DP-with-pruning,
//! trading memory for far fewer node expansions. Memo entries are stored
//! only for completed subtrees, so pruned branches cannot poison the
//! table.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::bits::full_mask;
use crate::core::partitions::{integer_partitions, next_permutation, PartSizes};
use crate::core::{Deadline, Value, MAX_TABLE_AGENTS};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::anytime::{LOWEST_BOUND_TOLERANCE, OPTIMALITY_TOLERANCE};
use super::bounds::CardinalBounds;
use super::brute_force::BruteForceSolver;
use super::greedy::{AgentGreedyConfig, AgentGreedySolver};
use super::Solver;

/// Sentinel for pruned subtrees; scaled down so additions cannot overflow.
const PRUNED: Value = f32::MIN * 0.01;

/// Hybrid branch-and-bound configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HybridConfig {
    /// Seconds; negative searches exhaustively.
    pub time_limit: f64,
    /// Seed the incumbent with agent-greedy solutions (global and per
    /// partition).
    pub greedy_seed: bool,
    /// Permutations batched between bound re-sorts.
    pub permutations_per_block: usize,
}

impl Default for HybridConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            greedy_seed: true,
            permutations_per_block: 100_000,
        }
    }
}

impl HybridConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_greedy_seed(mut self, enabled: bool) -> Self {
        self.greedy_seed = enabled;
        self
    }
}

/// Memoized partition branch-and-bound solver.
#[derive(Clone, Debug, Default)]
pub struct HybridSolver {
    pub config: HybridConfig,
}

impl HybridSolver {
    #[must_use]
    pub fn new(config: HybridConfig) -> Self {
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

        if n <= 1 || m <= 1 {
            return BruteForceSolver.solve(oracle);
        }

        let table = oracle
            .table()
            .expect("partition search requires a materialized value table");

        let mut searcher = HybridSearcher {
            oracle,
            n_agents: n,
            n_tasks: m,
            deadline: Deadline::start(self.config.time_limit),
            greedy_seed: self.config.greedy_seed,
            permutations_per_block: self.config.permutations_per_block.max(1),
            bounds: CardinalBounds::compute(table, n, m, true),
            max_lower_bound: Value::MIN,
            has_solution: false,
            best_value: Value::MIN,
            best: Solution::new(),
            memo: FxHashMap::default(),
            parts_by_task: Vec::new(),
            found_complete: false,
        };
        searcher.run(initial)
    }
}

impl Solver for HybridSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        self.solve_from(oracle, None)
    }
}

struct MemoEntry {
    value: Value,
    best_mask: u32,
}

struct Candidate {
    parts_by_task: Vec<u32>,
    lower: Value,
    upper: Value,
}

struct HybridSearcher<'a> {
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

    /// Best completion per `(unassigned_mask, task)` for the permutation
    /// under search.
    memo: FxHashMap<u64, MemoEntry>,
    parts_by_task: Vec<u32>,
    found_complete: bool,
}

fn memo_key(unassigned_mask: u32, task: u32) -> u64 {
    u64::from(unassigned_mask) | (u64::from(task) << 32)
}

impl<'a> HybridSearcher<'a> {
    fn time_elapsed(&self) -> bool {
        self.has_solution && self.deadline.reached()
    }

    fn is_better(&self, value: Value, check_max_lower_bound: bool) -> bool {
        if !self.has_solution {
            return true;
        }
        if value - OPTIMALITY_TOLERANCE < self.best_value {
            return false;
        }
        if check_max_lower_bound && value - LOWEST_BOUND_TOLERANCE < self.max_lower_bound {
            return false;
        }
        true
    }

    fn accept(&mut self, solution: Solution) {
        log::debug!("hybrid: new incumbent {}", solution.value);
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

        if self.greedy_seed {
            let mut greedy = AgentGreedySolver::new(
                AgentGreedyConfig::default().with_hill_climb(true),
            );

            let global = greedy.solve(self.oracle);
            if self.is_better(global.value, false) {
                self.accept(global);
            }

            for (index, partition) in partitions.iter().enumerate() {
                if !self.is_better(partition_upper[index], true) {
                    continue;
                }
                let seeded = greedy.solve_bounded(self.oracle, Some(partition.as_slice()));
                if self.is_better(seeded.value, false) {
                    self.accept(seeded);
                }
            }
        }

        let mut expansion_order: Vec<usize> = (0..partitions.len())
            .filter(|&index| self.is_better(partition_upper[index], true))
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

        let mut batch: Vec<Candidate> = Vec::new();
        for &index in &expansion_order {
            if self.time_elapsed() {
                break;
            }
            if !self.is_better(partition_upper[index], true) {
                break;
            }

            let mut parts: PartSizes = partitions[index].clone();
            parts.sort_unstable();

            loop {
                let (lower, upper) = self.bounds.permutation_bounds(&parts);
                if lower > self.max_lower_bound {
                    self.max_lower_bound = lower;
                }

                if self.is_better(upper, true) {
                    if self.greedy_seed {
                        let seeded = AgentGreedySolver::new(
                            AgentGreedyConfig::default().with_hill_climb(true),
                        )
                        .solve_bounded(self.oracle, Some(parts.as_slice()));
                        if self.is_better(seeded.value, false) {
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
            if self.is_better(candidate.upper, true) {
                self.search_permutation(&candidate.parts_by_task, candidate.upper);
            } else {
                break;
            }
        }
    }

    fn search_permutation(&mut self, parts_by_task: &[u32], upper: Value) {
        self.parts_by_task.clear();
        self.parts_by_task.extend_from_slice(parts_by_task);
        self.memo.clear();
        self.found_complete = false;

        let all_agents = full_mask(self.n_agents);
        let worth = self.complete_tasks(upper, 0.0, all_agents, self.n_tasks - 1);

        if self.found_complete && self.is_better(worth, false) {
            self.best_value = worth;
            self.max_lower_bound = self.max_lower_bound.max(worth);

            // Rebuild the assignment from the memoized choices.
            let mut solution = Solution::new();
            solution.reset(self.n_tasks, self.n_agents);
            let mut unassigned = all_agents;
            for task in (1..self.n_tasks).rev() {
                if let Some(entry) = self.memo.get(&memo_key(unassigned, task)) {
                    solution.set_coalition_mask(task, entry.best_mask);
                    unassigned &= !entry.best_mask;
                }
                // No entry: the task received zero agents.
            }
            solution.set_coalition_mask(0, unassigned);
            solution.value = worth;
            self.best = solution;
            self.has_solution = true;
            log::debug!("hybrid: new incumbent {worth}");
        }
    }

    /// Best value achievable distributing `unassigned_mask` over tasks
    /// `0..=task` under the active permutation, or [`PRUNED`].
    fn complete_tasks(
        &mut self,
        upper_remaining: Value,
        current_value: Value,
        unassigned_mask: u32,
        task: u32,
    ) -> Value {
        if task == 0 {
            // The first task absorbs whatever remains.
            self.found_complete = true;
            let value = self.oracle.mask_value(unassigned_mask, 0);
            if value + current_value > self.max_lower_bound {
                self.max_lower_bound = value + current_value;
            }
            return value;
        }

        if !self.is_better(current_value + upper_remaining, true) {
            return PRUNED;
        }

        let key = memo_key(unassigned_mask, task);
        if let Some(entry) = self.memo.get(&key) {
            return entry.value;
        }

        let size = self.parts_by_task[task as usize] as usize;
        let mut best_value = PRUNED;
        let mut best_mask = 0u32;

        for index in 0..self.bounds.coalitions_of_size[size].len() {
            if self.time_elapsed() {
                return PRUNED;
            }

            let coalition_mask = self.bounds.coalitions_of_size[size][index];
            if coalition_mask & unassigned_mask != coalition_mask {
                continue;
            }

            let value = current_value + self.oracle.mask_value(coalition_mask, task);
            let new_upper = upper_remaining - self.bounds.task_upper[task as usize][size];

            let worth =
                self.complete_tasks(new_upper, value, unassigned_mask & !coalition_mask, task - 1);
            if worth > PRUNED {
                let total = worth + self.oracle.mask_value(coalition_mask, task);
                if total > best_value {
                    best_value = total;
                    best_mask = coalition_mask;
                }
            }
        }

        if best_value > PRUNED {
            self.memo.insert(
                key,
                MemoEntry {
                    value: best_value,
                    best_mask,
                },
            );
            if current_value + best_value > self.max_lower_bound {
                self.max_lower_bound = current_value + best_value;
            }
        }

        best_value
    }
}
