//! Exact dynamic programming over agent subsets.
//!
//! `best[task][mask]` is the highest value achievable by distributing the
//! agents in `mask` over tasks `0..=task`, together with the coalition
//! chosen for `task` in that optimum. Task 0 must absorb whatever remains;
//! the transition maximizes `value(S, t) + best[t-1][mask \ S]` over all
//! submasks `S` of `mask`, enumerated directly through a parallel-bits
//! deposit. O(3^N) time over the full table, O(2^N * M) memory.

use crate::core::bits::{full_mask, submasks};
use crate::core::{Value, MAX_TABLE_AGENTS};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::Solver;

/// Exact subset-DP solver. Requires a word-sized universe and a
/// materialized value table.
#[derive(Clone, Debug, Default)]
pub struct DpSolver;

#[derive(Clone, Copy)]
struct Entry {
    value: Value,
    best: u32,
}

impl Solver for DpSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        assert!(
            n <= MAX_TABLE_AGENTS,
            "subset DP requires at most {MAX_TABLE_AGENTS} agents"
        );

        let mut solution = Solution::new();
        solution.reset(m, n);

        if m == 1 {
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
            solution.add_agent(0, best_task);
            solution.recalculate_value(oracle);
            return solution;
        }

        let n_coalitions = 1usize << n;
        let mut table = vec![
            vec![
                Entry {
                    value: Value::MIN,
                    best: 0,
                };
                n_coalitions
            ];
            m as usize
        ];

        // Task 0 takes every remaining agent.
        for mask in 0..n_coalitions {
            table[0][mask] = Entry {
                value: oracle.mask_value(mask as u32, 0),
                best: mask as u32,
            };
        }

        for task in 1..m as usize {
            for mask in 0..n_coalitions as u32 {
                let mut entry = Entry {
                    value: Value::MIN,
                    best: 0,
                };
                for sub in submasks(mask) {
                    let rest = mask & !sub;
                    let value =
                        oracle.mask_value(sub, task as u32) + table[task - 1][rest as usize].value;
                    if value > entry.value {
                        entry = Entry { value, best: sub };
                    }
                }
                table[task][mask as usize] = entry;
            }
        }

        // Walk the stored choices backwards from the last task.
        let mut unassigned = full_mask(n);
        for task in (0..m as usize).rev() {
            let chosen = table[task][unassigned as usize].best;
            solution.set_coalition_mask(task as u32, chosen);
            unassigned &= !chosen;
        }
        solution.recalculate_value(oracle);
        solution
    }
}
