//! Random-search baselines.
//!
//! Pure random search draws an entirely fresh assignment per trial
//! (optionally polished with a hill climb); swap random search performs a
//! random walk of single-agent reassignments with incremental value
//! maintenance. Both keep an explicit incumbent.

use serde::{Deserialize, Serialize};

use crate::core::{Deadline, SolverRng};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::greedy::hill_climb;
use super::Solver;

/// Shared configuration for the random-search solvers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RandomSearchConfig {
    /// Seconds; negative runs a single trial (pure) or the full iteration
    /// cap (swap).
    pub time_limit: f64,
    pub seed: Option<u64>,
    pub max_iterations: u64,
    /// Polish each trial with a hill climb (pure random search only).
    pub hill_climb: bool,
    /// Attempts per iteration to draw a task differing from the current
    /// one (swap random search only).
    pub max_swap_tries: u32,
}

impl Default for RandomSearchConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            max_iterations: 118_200_000_000,
            hill_climb: false,
            max_swap_tries: 3,
        }
    }
}

impl RandomSearchConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_iterations(mut self, cap: u64) -> Self {
        self.max_iterations = cap;
        self
    }

    pub fn with_hill_climb(mut self, enabled: bool) -> Self {
        self.hill_climb = enabled;
        self
    }
}

/// Fresh random assignment per trial.
#[derive(Clone, Debug, Default)]
pub struct PureRandomSolver {
    pub config: RandomSearchConfig,
}

impl PureRandomSolver {
    #[must_use]
    pub fn new(config: RandomSearchConfig) -> Self {
        Self { config }
    }
}

impl Solver for PureRandomSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);
        let deadline = Deadline::start(self.config.time_limit);

        let mut order: Vec<u32> = (0..n).collect();
        let mut best: Option<Solution> = None;
        let mut current = Solution::new();

        for _ in 0..self.config.max_iterations.max(1) {
            current.reset(m, n);
            for agent in 0..n {
                current.add_agent(agent, rng.gen_below(m));
            }
            current.recalculate_value(oracle);

            if self.config.hill_climb {
                hill_climb(&mut current, oracle, &mut order, &mut rng, false, -1);
            }

            if best.as_ref().map_or(true, |b| current.value > b.value) {
                best = Some(current.clone());
            }

            if self.config.time_limit < 0.0 || deadline.reached() {
                break;
            }
        }

        best.unwrap_or(current)
    }
}

/// Random walk of single-agent reassignments.
#[derive(Clone, Debug, Default)]
pub struct SwapRandomSolver {
    pub config: RandomSearchConfig,
}

impl SwapRandomSolver {
    #[must_use]
    pub fn new(config: RandomSearchConfig) -> Self {
        Self { config }
    }
}

impl Solver for SwapRandomSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);
        let deadline = Deadline::start(self.config.time_limit);

        let mut current = Solution::new();
        current.reset(m, n);
        let mut assignments = vec![0u32; n as usize];
        for agent in 0..n {
            let task = rng.gen_below(m);
            current.add_agent(agent, task);
            assignments[agent as usize] = task;
        }
        current.recalculate_value(oracle);
        let mut best = current.clone();

        for _ in 0..self.config.max_iterations.max(1) {
            let agent = rng.gen_below(n);
            for _ in 0..self.config.max_swap_tries {
                let new_task = rng.gen_below(m);
                let old_task = assignments[agent as usize];
                if new_task == old_task {
                    continue;
                }

                current.value -= current.coalition_value(oracle, old_task);
                current.value -= current.coalition_value(oracle, new_task);
                current.remove_agent(agent, old_task);
                current.add_agent(agent, new_task);
                current.value += current.coalition_value(oracle, old_task);
                current.value += current.coalition_value(oracle, new_task);
                assignments[agent as usize] = new_task;

                if current.value > best.value {
                    best = current.clone();
                }
                break;
            }

            if deadline.is_bounded() && deadline.reached() {
                break;
            }
        }

        best
    }
}
