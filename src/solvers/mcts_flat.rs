//! Flat (single-level) MCTS.
//!
//! Collapses the tree search to one bandit per agent decision: every
//! simulation picks an arm for the current agent, completes the episode
//! with a uniformly random rollout, and records the full-episode value on
//! that arm. No tree is ever expanded. Passes repeat until the deadline,
//! keeping the best completed solution.

use serde::{Deserialize, Serialize};

use crate::core::{Deadline, SolverRng, Value};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::policy::{FlatPolicy, SelectionPolicy, SpUctPolicy};
use super::Solver;

/// Which bandit scores the arms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlatPolicyKind {
    /// Round-robin sampling, total-reward commit.
    Naive,
    /// SP-UCT scoring with a fixed reward normalizer.
    SpUct,
}

/// Flat-MCTS configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FlatMctsConfig {
    /// Seconds; negative runs a single pass.
    pub time_limit: f64,
    pub seed: Option<u64>,
    pub policy: FlatPolicyKind,

    pub exploration_weight: f32,
    pub variance_weight: f32,
    pub estimation_weight: f32,

    /// Simulations per arm in the single unbounded pass.
    pub simulations_per_action: u32,
    /// Simulations per arm within each time-limited pass.
    pub simulations_per_action_bounded: u32,
}

impl Default for FlatMctsConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            policy: FlatPolicyKind::SpUct,
            exploration_weight: -0.18,
            variance_weight: 0.33,
            estimation_weight: 1.0,
            simulations_per_action: 2250,
            simulations_per_action_bounded: 20,
        }
    }
}

impl FlatMctsConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_policy(mut self, policy: FlatPolicyKind) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_simulations_per_action(mut self, simulations: u32) -> Self {
        self.simulations_per_action = simulations;
        self
    }
}

/// Flat-MCTS solver.
#[derive(Clone, Debug, Default)]
pub struct FlatMctsSolver {
    pub config: FlatMctsConfig,
}

impl FlatMctsSolver {
    #[must_use]
    pub fn new(config: FlatMctsConfig) -> Self {
        Self { config }
    }

    fn rollout(
        oracle: &dyn ValueOracle,
        solution: &mut Solution,
        agent: u32,
        rng: &mut SolverRng,
    ) -> Value {
        if agent >= oracle.n_agents() {
            return solution.recalculate_value(oracle);
        }
        let task = rng.gen_below(oracle.n_tasks());
        solution.add_agent(agent, task);
        let value = Self::rollout(oracle, solution, agent + 1, rng);
        solution.remove_agent(agent, task);
        value
    }

    fn one_pass(
        &self,
        oracle: &dyn ValueOracle,
        policy: &mut dyn SelectionPolicy,
        simulations_per_level: u32,
        rng: &mut SolverRng,
    ) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();

        let mut solution = Solution::new();
        solution.reset(m, n);

        for agent in 0..n {
            policy.reset(m);
            for _ in 0..simulations_per_level {
                let arm = policy.next_action(std::f32::consts::SQRT_2);
                solution.add_agent(agent, arm);
                let reward = Self::rollout(oracle, &mut solution, agent + 1, rng);
                policy.record(arm, reward);
                solution.remove_agent(agent, arm);
            }
            solution.add_agent(agent, policy.best_action());
        }

        solution.recalculate_value(oracle);
        solution
    }
}

impl Solver for FlatMctsSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let m = oracle.n_tasks();
        let mut rng = SolverRng::seeded(self.config.seed);

        let mut policy: Box<dyn SelectionPolicy> = match self.config.policy {
            FlatPolicyKind::Naive => Box::new(FlatPolicy::new(m)),
            FlatPolicyKind::SpUct => Box::new(SpUctPolicy::new(
                m,
                self.config.exploration_weight,
                self.config.variance_weight,
                self.config.estimation_weight,
            )),
        };

        if self.config.time_limit < 0.0 {
            return self.one_pass(
                oracle,
                policy.as_mut(),
                self.config.simulations_per_action,
                &mut rng,
            );
        }

        let deadline = Deadline::start(self.config.time_limit);
        let per_pass = m * self.config.simulations_per_action_bounded;
        let mut best = self.one_pass(oracle, policy.as_mut(), per_pass, &mut rng);
        let mut passes = 1u64;
        while !deadline.reached() {
            let current = self.one_pass(oracle, policy.as_mut(), per_pass, &mut rng);
            if current.value > best.value {
                best = current;
            }
            passes += 1;
        }
        log::debug!("flat mcts: {passes} passes");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{TableOracle, UniformOracle};

    #[test]
    fn test_valid_solution_both_policies() {
        let mut oracle = UniformOracle::default();
        oracle.generate(6, 3, 2).unwrap();

        for kind in [FlatPolicyKind::Naive, FlatPolicyKind::SpUct] {
            let config = FlatMctsConfig::default()
                .with_seed(3)
                .with_policy(kind)
                .with_simulations_per_action(100);
            let solution = FlatMctsSolver::new(config).solve(&oracle);
            solution.validate(&oracle).unwrap();
        }
    }

    #[test]
    fn test_commits_clearly_best_arm() {
        // Agent 0 alone; task 1 dominates every completion.
        let mut oracle = TableOracle::new(1, 2);
        oracle.set_mask_value(1, 0, 0.0);
        oracle.set_mask_value(1, 1, 10.0);

        let config = FlatMctsConfig::default()
            .with_seed(5)
            .with_simulations_per_action(50);
        let solution = FlatMctsSolver::new(config).solve(&oracle);
        assert!(solution.contains(0, 1));
        assert!((solution.value - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_seeded_pass_reproduces() {
        let mut oracle = UniformOracle::default();
        oracle.generate(5, 2, 33).unwrap();

        let config = FlatMctsConfig::default()
            .with_seed(8)
            .with_simulations_per_action(80);
        let a = FlatMctsSolver::new(config.clone()).solve(&oracle);
        let b = FlatMctsSolver::new(config).solve(&oracle);
        assert_eq!(a.value, b.value);
    }
}
