//! Ordered coalition structures and their cached values.
//!
//! A [`Solution`] is a sequence of exactly `n_tasks` coalitions whose union
//! partitions the agent universe, plus a cached total value. Solvers
//! maintain the value incrementally while mutating a working solution in
//! place; [`Solution::recalculate_value`] recomputes it from the oracle,
//! and the two must agree within [`VALUE_TOLERANCE`] for any valid
//! solution — divergence is a solver bug, surfaced by [`Solution::validate`]
//! rather than silently corrected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Coalition, Value, MAX_TABLE_AGENTS};
use crate::oracle::{TableOracle, ValueOracle};

/// Tolerance for cached-vs-recomputed value agreement.
pub const VALUE_TOLERANCE: f32 = 1e-4;

/// Consistency failures detected on a solution.
///
/// Any of these indicates a bug in the solver that produced the solution.
#[derive(Error, Debug)]
pub enum SolutionError {
    #[error("expected {expected} coalitions, found {found}")]
    WrongLength { expected: u32, found: u32 },

    #[error("agent {agent} is not assigned to any coalition")]
    Unassigned { agent: u32 },

    #[error("agent {agent} is assigned to {count} coalitions")]
    MultiplyAssigned { agent: u32, count: u32 },

    #[error("cached value {cached} diverges from recomputed value {recomputed}")]
    ValueDrift { cached: Value, recomputed: Value },
}

/// An ordered coalition structure with its cached total value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Solution {
    pub coalitions: Vec<Coalition>,
    pub value: Value,
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl Solution {
    #[must_use]
    pub fn new() -> Self {
        Self {
            coalitions: Vec::new(),
            value: 0.0,
        }
    }

    /// Empty all coalitions and resize to `n_tasks` over `n_agents`.
    pub fn reset(&mut self, n_tasks: u32, n_agents: u32) {
        self.coalitions.clear();
        self.coalitions
            .resize_with(n_tasks as usize, || Coalition::new(n_agents));
        self.value = Value::MIN;
    }

    #[must_use]
    pub fn n_tasks(&self) -> u32 {
        self.coalitions.len() as u32
    }

    #[inline]
    pub fn add_agent(&mut self, agent: u32, task: u32) {
        self.coalitions[task as usize].add(agent);
    }

    #[inline]
    pub fn remove_agent(&mut self, agent: u32, task: u32) {
        self.coalitions[task as usize].remove(agent);
    }

    #[inline]
    #[must_use]
    pub fn coalition(&self, task: u32) -> &Coalition {
        &self.coalitions[task as usize]
    }

    #[must_use]
    pub fn contains(&self, agent: u32, task: u32) -> bool {
        self.coalitions[task as usize].contains(agent)
    }

    #[must_use]
    pub fn n_agents_in(&self, task: u32) -> u32 {
        self.coalitions[task as usize].len()
    }

    /// Membership word of one coalition. Requires a word-sized universe.
    #[must_use]
    pub fn coalition_mask(&self, task: u32) -> u32 {
        self.coalitions[task as usize].mask()
    }

    /// Overwrite one coalition from a membership word.
    pub fn set_coalition_mask(&mut self, task: u32, mask: u32) {
        self.coalitions[task as usize].set_mask(mask);
    }

    /// The task an agent is assigned to, if any.
    #[must_use]
    pub fn coalition_index_of(&self, agent: u32) -> Option<u32> {
        (0..self.n_tasks()).find(|&task| self.contains(agent, task))
    }

    /// Assignment index per agent (`None` = unassigned).
    #[must_use]
    pub fn assignment_indices(&self, n_agents: u32) -> Vec<Option<u32>> {
        (0..n_agents).map(|a| self.coalition_index_of(a)).collect()
    }

    /// Agents not assigned to any coalition, ascending.
    #[must_use]
    pub fn unassigned_agents(&self, n_agents: u32) -> Vec<u32> {
        (0..n_agents)
            .filter(|&a| self.coalition_index_of(a).is_none())
            .collect()
    }

    /// Value of a single coalition under the oracle.
    #[must_use]
    pub fn coalition_value(&self, oracle: &dyn ValueOracle, task: u32) -> Value {
        oracle.value(&self.coalitions[task as usize], task)
    }

    /// Recompute and overwrite the cached value from scratch.
    pub fn recalculate_value(&mut self, oracle: &dyn ValueOracle) -> Value {
        self.value = (0..self.n_tasks())
            .map(|task| self.coalition_value(oracle, task))
            .sum();
        self.value
    }

    /// Check the partition invariant and cached-value consistency.
    pub fn validate(&self, oracle: &dyn ValueOracle) -> Result<(), SolutionError> {
        if self.n_tasks() != oracle.n_tasks() {
            return Err(SolutionError::WrongLength {
                expected: oracle.n_tasks(),
                found: self.n_tasks(),
            });
        }

        for agent in 0..oracle.n_agents() {
            let count = (0..self.n_tasks())
                .filter(|&task| self.contains(agent, task))
                .count() as u32;
            match count {
                0 => return Err(SolutionError::Unassigned { agent }),
                1 => {}
                _ => return Err(SolutionError::MultiplyAssigned { agent, count }),
            }
        }

        let recomputed: Value = (0..self.n_tasks())
            .map(|task| self.coalition_value(oracle, task))
            .sum();
        if (recomputed - self.value).abs() > VALUE_TOLERANCE {
            return Err(SolutionError::ValueDrift {
                cached: self.value,
                recomputed,
            });
        }

        Ok(())
    }

    /// Build a reduced oracle over only the agents this partial solution
    /// leaves unassigned.
    ///
    /// For each task `t` and each subset `S` of the unassigned agents
    /// (indexed densely, so reduced agent `i` is the i-th unassigned
    /// agent), the reduced value is `oracle.value(coalition[t] ∪ S, t)`.
    /// Any solver can then complete the partial assignment unmodified.
    /// Requires at most [`MAX_TABLE_AGENTS`] unassigned agents.
    #[must_use]
    pub fn derive_partial_problem(&self, oracle: &dyn ValueOracle) -> TableOracle {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();

        let unassigned = self.unassigned_agents(n);
        let reduced_n = unassigned.len() as u32;
        assert!(reduced_n <= MAX_TABLE_AGENTS);

        let mut reduced = TableOracle::new(reduced_n, m);
        for task in 0..m {
            for submask in 0..(1u64 << reduced_n) {
                let mut combined = self.coalitions[task as usize].clone();
                for (bit, &agent) in unassigned.iter().enumerate() {
                    if submask & (1 << bit) != 0 {
                        combined.add(agent);
                    }
                }
                reduced.set_mask_value(submask as u32, task, oracle.value(&combined, task));
            }
        }
        reduced
    }
}
