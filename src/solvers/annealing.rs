//! Simulated annealing over single-agent reassignments.
//!
//! The walk always accepts improving moves; a worsening move survives with
//! probability `exp(delta / (T * best_value))`, where the temperature
//! decays with the remaining-time fraction (or the remaining-iteration
//! fraction when unbounded). The incumbent is tracked separately from the
//! possibly-worse current state.

use serde::{Deserialize, Serialize};

use crate::core::{Deadline, SolverRng};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::greedy::hill_climb;
use super::Solver;

/// Simulated-annealing configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnealingConfig {
    /// Seconds; negative leaves only the iteration cap.
    pub time_limit: f64,
    pub seed: Option<u64>,
    /// Iteration cap; also sets the cooling schedule when unbounded.
    pub max_iterations: u64,
    /// Polish each new incumbent with a hill climb.
    pub hill_climb: bool,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            max_iterations: 118_200_000_000,
            hill_climb: false,
        }
    }
}

impl AnnealingConfig {
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
}

/// Simulated-annealing solver.
#[derive(Clone, Debug, Default)]
pub struct AnnealingSolver {
    pub config: AnnealingConfig,
}

impl AnnealingSolver {
    #[must_use]
    pub fn new(config: AnnealingConfig) -> Self {
        Self { config }
    }
}

impl Solver for AnnealingSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);
        let max_iterations = self.config.max_iterations.max(1);
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

        let mut order: Vec<u32> = (0..n).collect();
        let mut best = current.clone();

        let mut evaluated = 0u64;
        let mut improved = 0u64;
        let mut reverts = 0u64;

        let mut temperature: f32 = 10_000_000.0;

        for iteration in 0..max_iterations {
            let prev_value = current.value;

            let agent = rng.gen_below(n);
            let new_task = rng.gen_below(m);
            let old_task = assignments[agent as usize];
            if new_task != old_task {
                let old_sum = current.coalition_value(oracle, old_task)
                    + current.coalition_value(oracle, new_task);
                current.value -= old_sum;
                current.remove_agent(agent, old_task);
                current.add_agent(agent, new_task);
                let new_sum = current.coalition_value(oracle, old_task)
                    + current.coalition_value(oracle, new_task);
                current.value += new_sum;
                assignments[agent as usize] = new_task;
                evaluated += 1;

                if current.value > best.value {
                    best = current.clone();
                    if self.config.hill_climb {
                        hill_climb(&mut best, oracle, &mut order, &mut rng, true, -1);
                    }
                    improved += 1;
                } else if current.value < prev_value {
                    // Kirkpatrick-style acceptance of a worsening move.
                    let acceptance =
                        ((current.value - prev_value) / (temperature * best.value)).exp();
                    if acceptance < rng.gen_f32() {
                        // Revert.
                        current.value -= new_sum;
                        current.add_agent(agent, old_task);
                        current.remove_agent(agent, new_task);
                        current.value += old_sum;
                        assignments[agent as usize] = old_task;
                        reverts += 1;
                    }
                }
            }

            if deadline.is_bounded() {
                if deadline.reached() {
                    break;
                }
                temperature =
                    (self.config.time_limit / deadline.elapsed_secs().max(1e-9)) as f32 - 1.0;
            } else {
                temperature = max_iterations as f32 / (iteration + 1) as f32 - 1.0;
            }
        }

        log::debug!(
            "annealing: {evaluated} evaluated, {improved} new incumbents, {reverts} reverts"
        );

        best.recalculate_value(oracle);
        best
    }
}
