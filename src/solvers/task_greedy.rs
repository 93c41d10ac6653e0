//! Task-oriented greedy construction.
//!
//! Instead of placing one agent at a time, each round picks the
//! (task, coalition-of-remaining-agents) pair with the highest marginal
//! value, removes the matched agents and task, and repeats. The last
//! remaining task absorbs all leftover agents. Enumerates submasks of the
//! unassigned set per round, so it requires a word-sized universe.

use crate::core::bits::{full_mask, submasks};
use crate::core::{Value, MAX_TABLE_AGENTS};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::Solver;

/// Task-greedy solver.
#[derive(Clone, Debug, Default)]
pub struct TaskGreedySolver;

impl TaskGreedySolver {
    /// Solve with optional per-task coalition size bounds; a bound makes a
    /// round consider only coalitions of exactly that size for the task.
    pub fn solve_bounded(
        &mut self,
        oracle: &dyn ValueOracle,
        size_bounds: Option<&[u32]>,
    ) -> Solution {
        let n = oracle.n_agents();
        assert!(n <= MAX_TABLE_AGENTS);

        let mut solution = Solution::new();
        solution.reset(oracle.n_tasks(), n);
        solution.recalculate_value(oracle);

        let mut unassigned_mask = full_mask(n);
        let mut open_tasks: Vec<u32> = (0..oracle.n_tasks()).collect();

        while unassigned_mask != 0 && !open_tasks.is_empty() {
            if open_tasks.len() == 1 {
                let task = open_tasks[0];
                solution.value -= oracle.mask_value(0, task);
                solution.value += oracle.mask_value(unassigned_mask, task);
                solution.set_coalition_mask(task, unassigned_mask);
                return solution;
            }

            let mut best_mask = 0u32;
            let mut best_task = open_tasks[0];
            let mut best_task_slot = 0usize;
            let mut best_delta = Value::MIN;

            for coalition_mask in submasks(unassigned_mask) {
                let size = coalition_mask.count_ones();
                for (slot, &task) in open_tasks.iter().enumerate() {
                    if let Some(bounds) = size_bounds {
                        if bounds[task as usize] != size {
                            continue;
                        }
                    }

                    let delta =
                        oracle.mask_value(coalition_mask, task) - oracle.mask_value(0, task);
                    if delta > best_delta {
                        best_delta = delta;
                        best_mask = coalition_mask;
                        best_task = task;
                        best_task_slot = slot;
                    }
                }
            }

            unassigned_mask &= !best_mask;

            solution.value -= oracle.mask_value(0, best_task);
            solution.value += oracle.mask_value(best_mask, best_task);
            solution.set_coalition_mask(best_task, best_mask);

            open_tasks.swap_remove(best_task_slot);
        }

        solution
    }
}

impl Solver for TaskGreedySolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        self.solve_bounded(oracle, None)
    }
}
