//! Exhaustive enumeration over all `M^N` assignments.
//!
//! Reference optimum for small instances and the exact finisher other
//! solvers delegate degenerate cases to.

use crate::core::Value;
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::Solver;

/// Brute-force solver.
#[derive(Clone, Debug, Default)]
pub struct BruteForceSolver;

impl BruteForceSolver {
    fn recurse(
        oracle: &dyn ValueOracle,
        agent: u32,
        current: &mut Solution,
        best: &mut Solution,
    ) {
        if agent == oracle.n_agents() {
            current.recalculate_value(oracle);
            if current.value > best.value {
                *best = current.clone();
            }
            return;
        }

        for task in 0..oracle.n_tasks() {
            current.add_agent(agent, task);
            Self::recurse(oracle, agent + 1, current, best);
            current.remove_agent(agent, task);
        }
    }
}

impl Solver for BruteForceSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let mut best = Solution::new();
        best.reset(oracle.n_tasks(), oracle.n_agents());
        best.value = Value::MIN;

        let mut current = Solution::new();
        current.reset(oracle.n_tasks(), oracle.n_agents());

        Self::recurse(oracle, 0, &mut current, &mut best);
        best
    }
}
