//! Agent-order greedy construction with optional hill-climb refinement.
//!
//! Each agent is placed into the task with the highest marginal value,
//! optionally respecting per-task size bounds (used by the partition
//! branch-and-bound solvers to seed incumbents). With a time budget the
//! construction repeats with shuffled agent orders, keeping the best
//! result. The hill-climb sweep is shared with the other local-search
//! solvers as a polish step.

use serde::{Deserialize, Serialize};

use crate::core::{Deadline, SolverRng, Value};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::Solver;

/// Agent-greedy configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentGreedyConfig {
    /// Seconds; negative runs a single deterministic pass.
    pub time_limit: f64,
    /// RNG seed; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Polish each constructed solution with a hill climb.
    pub hill_climb: bool,
    /// Restart with shuffled agent orders until the deadline.
    pub shuffled_restarts: bool,
}

impl Default for AgentGreedyConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            hill_climb: false,
            shuffled_restarts: true,
        }
    }
}

impl AgentGreedyConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_hill_climb(mut self, enabled: bool) -> Self {
        self.hill_climb = enabled;
        self
    }
}

/// Greedy constructor over agents.
#[derive(Clone, Debug, Default)]
pub struct AgentGreedySolver {
    pub config: AgentGreedyConfig,
}

impl AgentGreedySolver {
    #[must_use]
    pub fn new(config: AgentGreedyConfig) -> Self {
        Self { config }
    }

    /// Solve with optional per-task coalition size bounds.
    pub fn solve_bounded(
        &mut self,
        oracle: &dyn ValueOracle,
        size_bounds: Option<&[u32]>,
    ) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);

        let mut order: Vec<u32> = (0..n).collect();
        let mut best = Solution::new();
        best.reset(m, n);

        if self.config.time_limit < 0.0 || !self.config.shuffled_restarts {
            self.construct(oracle, &mut best, &mut order, size_bounds, &mut rng);
            return best;
        }

        let deadline = Deadline::start(self.config.time_limit);
        let mut temp = Solution::new();
        let mut best_set = false;
        let mut restarts = 0u64;
        loop {
            restarts += 1;
            temp.reset(m, n);
            self.construct(oracle, &mut temp, &mut order, size_bounds, &mut rng);

            if !best_set || temp.value > best.value {
                best = temp.clone();
                best_set = true;
            }
            if deadline.reached() {
                break;
            }
            rng.shuffle(&mut order);
        }
        log::debug!("agent greedy: {restarts} shuffled restarts");
        best
    }

    /// Greedily complete a partial assignment, restarting with shuffled
    /// orders of the unassigned agents while time remains.
    pub fn complete(&mut self, oracle: &dyn ValueOracle, partial: &Solution) -> Solution {
        let mut rng = SolverRng::seeded(self.config.seed);
        let mut unassigned = partial.unassigned_agents(oracle.n_agents());

        let deadline = Deadline::start(self.config.time_limit);
        let mut best = Solution::new();
        let mut best_set = false;
        loop {
            let mut temp = partial.clone();
            self.construct(oracle, &mut temp, &mut unassigned, None, &mut rng);
            if !best_set || temp.value > best.value {
                best = temp;
                best_set = true;
            }
            if self.config.time_limit < 0.0
                || !self.config.shuffled_restarts
                || deadline.reached()
            {
                break;
            }
            rng.shuffle(&mut unassigned);
        }
        best
    }

    fn construct(
        &self,
        oracle: &dyn ValueOracle,
        solution: &mut Solution,
        order: &mut Vec<u32>,
        size_bounds: Option<&[u32]>,
        rng: &mut SolverRng,
    ) {
        let m = oracle.n_tasks();

        for index in 0..order.len() {
            let agent = order[index];
            let mut best_task = 0;
            let mut best_delta = Value::MIN;
            for task in 0..m {
                if let Some(bounds) = size_bounds {
                    if solution.n_agents_in(task) >= bounds[task as usize] {
                        continue;
                    }
                }

                let before = solution.coalition_value(oracle, task);
                solution.add_agent(agent, task);
                let after = solution.coalition_value(oracle, task);
                solution.remove_agent(agent, task);

                if after - before > best_delta {
                    best_delta = after - before;
                    best_task = task;
                }
            }
            solution.add_agent(agent, best_task);
        }

        solution.recalculate_value(oracle);

        if self.config.hill_climb {
            hill_climb(solution, oracle, order, rng, false, 1000);
        }
    }
}

impl Solver for AgentGreedySolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        self.solve_bounded(oracle, None)
    }
}

/// Repeated best-move local search over single-agent reassignments.
///
/// Each sweep evaluates moving every agent to every other task and commits
/// the single best strictly improving move, updating the cached value
/// incrementally. Stops when no sweep finds an improvement or after
/// `max_moves` commits (`negative` = unlimited).
pub fn hill_climb(
    solution: &mut Solution,
    oracle: &dyn ValueOracle,
    order: &mut [u32],
    rng: &mut SolverRng,
    shuffle_each_sweep: bool,
    max_moves: i64,
) {
    let m = oracle.n_tasks();
    let mut moves = 0i64;

    loop {
        if shuffle_each_sweep {
            rng.shuffle(order);
        }

        let mut best_delta: Value = 0.0;
        let mut best_move: Option<(u32, u32, u32)> = None;

        for &agent in order.iter() {
            let from = match solution.coalition_index_of(agent) {
                Some(task) => task,
                None => continue,
            };

            let with_agent = solution.coalition_value(oracle, from);
            solution.remove_agent(agent, from);
            let without_agent = solution.coalition_value(oracle, from);
            let source_delta = without_agent - with_agent;

            for to in 0..m {
                if to == from {
                    continue;
                }
                let before = solution.coalition_value(oracle, to);
                solution.add_agent(agent, to);
                let after = solution.coalition_value(oracle, to);
                solution.remove_agent(agent, to);

                let delta = (after - before) + source_delta;
                if delta > best_delta {
                    best_delta = delta;
                    best_move = Some((agent, from, to));
                }
            }

            solution.add_agent(agent, from);
        }

        match best_move {
            Some((agent, from, to)) => {
                solution.remove_agent(agent, from);
                solution.add_agent(agent, to);
                solution.value += best_delta;
                moves += 1;
                if max_moves >= 0 && moves >= max_moves {
                    return;
                }
            }
            None => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{TableOracle, UniformOracle};

    fn two_agent_oracle() -> TableOracle {
        let mut oracle = TableOracle::new(2, 2);
        oracle.set_mask_value(0b01, 0, 1.0);
        oracle.set_mask_value(0b10, 0, 1.0);
        oracle.set_mask_value(0b11, 0, 3.0);
        oracle.set_mask_value(0b01, 1, 2.0);
        oracle.set_mask_value(0b11, 1, 1.0);

        oracle
    }

    #[test]
    fn test_greedy_produces_valid_solution() {
        let mut oracle = UniformOracle::default();
        oracle.generate(8, 3, 5).unwrap();

        let mut solver = AgentGreedySolver::new(AgentGreedyConfig::default().with_seed(1));
        let solution = solver.solve(&oracle);
        solution.validate(&oracle).unwrap();
    }

    #[test]
    fn test_hill_climb_reaches_optimum_on_tiny_instance() {
        let oracle = two_agent_oracle();

        // Start from the worst assignment: A on task 1? no - both on task 1.
        let mut solution = Solution::new();
        solution.reset(2, 2);
        solution.add_agent(0, 1);
        solution.add_agent(1, 1);
        solution.recalculate_value(&oracle);

        let mut order = vec![0, 1];
        let mut rng = SolverRng::new(3);
        hill_climb(&mut solution, &oracle, &mut order, &mut rng, false, -1);

        assert!((solution.value - 3.0).abs() < 1e-5);
        solution.validate(&oracle).unwrap();
    }

    #[test]
    fn test_size_bounds_are_respected() {
        let mut oracle = UniformOracle::default();
        oracle.generate(6, 3, 11).unwrap();

        let bounds = [2u32, 2, 2];
        let mut solver = AgentGreedySolver::new(AgentGreedyConfig::default().with_seed(1));
        let solution = solver.solve_bounded(&oracle, Some(&bounds));

        for task in 0..3 {
            assert!(solution.n_agents_in(task) <= 2);
        }
        solution.validate(&oracle).unwrap();
    }

    #[test]
    fn test_complete_keeps_fixed_assignments() {
        let mut oracle = UniformOracle::default();
        oracle.generate(5, 2, 23).unwrap();

        let mut partial = Solution::new();
        partial.reset(2, 5);
        partial.add_agent(0, 1);
        partial.add_agent(3, 0);

        let mut solver = AgentGreedySolver::new(AgentGreedyConfig::default().with_seed(2));
        let completed = solver.complete(&oracle, &partial);

        assert!(completed.contains(0, 1));
        assert!(completed.contains(3, 0));
        completed.validate(&oracle).unwrap();
    }

    #[test]
    fn test_seeded_run_is_reproducible() {
        let mut oracle = UniformOracle::default();
        oracle.generate(7, 3, 77).unwrap();

        let config = AgentGreedyConfig::default().with_seed(9);
        let a = AgentGreedySolver::new(config.clone()).solve(&oracle);
        let b = AgentGreedySolver::new(config).solve(&oracle);
        assert_eq!(a.value, b.value);
        for task in 0..3 {
            assert_eq!(a.coalition_mask(task), b.coalition_mask(task));
        }
    }
}
