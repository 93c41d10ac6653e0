//! The solver portfolio.
//!
//! Every solver consumes a populated [`ValueOracle`](crate::oracle::ValueOracle)
//! and produces a [`Solution`](crate::solution::Solution) satisfying the
//! partition invariant. Exact solvers (brute force, DP, and the two
//! partition branch-and-bound variants with unbounded time) return the
//! optimum; the rest trade optimality for speed under a wall-clock budget.
//!
//! Solvers are single-threaded and own all working state per `solve` call;
//! the oracle is only read.

pub mod annealing;
pub mod anytime;
mod bounds;
pub mod brute_force;
pub mod dp;
pub mod genetic;
pub mod greedy;
pub mod hybrid;
pub mod mcts;
pub mod mcts_flat;
pub mod policy;
pub mod random_search;
pub mod task_greedy;

pub use annealing::{AnnealingConfig, AnnealingSolver};
pub use anytime::{AnytimeConfig, AnytimeSolver};
pub use brute_force::BruteForceSolver;
pub use dp::DpSolver;
pub use genetic::{GeneticConfig, GeneticSolver};
pub use greedy::{hill_climb, AgentGreedyConfig, AgentGreedySolver};
pub use hybrid::{HybridConfig, HybridSolver};
pub use mcts::{MctsConfig, MctsSolver, RolloutKind};
pub use mcts_flat::{FlatMctsConfig, FlatMctsSolver, FlatPolicyKind};
pub use policy::{FlatPolicy, SelectionPolicy, SpUctPolicy};
pub use random_search::{PureRandomSolver, RandomSearchConfig, SwapRandomSolver};
pub use task_greedy::TaskGreedySolver;

use serde::{Deserialize, Serialize};

use crate::oracle::ValueOracle;
use crate::solution::Solution;

/// A coalition structure solver.
pub trait Solver {
    /// Solve one instance. The returned solution assigns every agent to
    /// exactly one coalition.
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution;
}

/// Portfolio members, for harness configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverKind {
    BruteForce,
    Dp,
    /// Coarse partition branch-and-bound.
    Anytime,
    /// Coarse partition branch-and-bound seeded by the agent-greedy solver.
    AnytimeGreedySeeded,
    /// Memoized partition branch-and-bound.
    Hybrid,
    AgentGreedy,
    TaskGreedy,
    PureRandom,
    SwapRandom,
    Annealing,
    Genetic,
    FlatMcts,
    SpMcts,
}

impl SolverKind {
    /// Short name used in benchmark reports.
    #[must_use]
    pub fn abbrev(self) -> &'static str {
        match self {
            SolverKind::BruteForce => "BF",
            SolverKind::Dp => "DP",
            SolverKind::Anytime => "MP",
            SolverKind::AnytimeGreedySeeded => "MP+AG",
            SolverKind::Hybrid => "MPH",
            SolverKind::AgentGreedy => "AG",
            SolverKind::TaskGreedy => "TG",
            SolverKind::PureRandom => "PRS",
            SolverKind::SwapRandom => "SRS",
            SolverKind::Annealing => "SA",
            SolverKind::Genetic => "GA",
            SolverKind::FlatMcts => "MCTS-F",
            SolverKind::SpMcts => "SPMCTS",
        }
    }

    /// Build the solver with default configuration.
    #[must_use]
    pub fn build(self) -> Box<dyn Solver> {
        match self {
            SolverKind::BruteForce => Box::new(BruteForceSolver::default()),
            SolverKind::Dp => Box::new(DpSolver::default()),
            SolverKind::Anytime => Box::new(AnytimeSolver::default()),
            SolverKind::AnytimeGreedySeeded => {
                Box::new(AnytimeSolver::new(AnytimeConfig::default().with_greedy_seed(true)))
            }
            SolverKind::Hybrid => Box::new(HybridSolver::default()),
            SolverKind::AgentGreedy => Box::new(AgentGreedySolver::default()),
            SolverKind::TaskGreedy => Box::new(TaskGreedySolver::default()),
            SolverKind::PureRandom => Box::new(PureRandomSolver::default()),
            SolverKind::SwapRandom => Box::new(SwapRandomSolver::default()),
            SolverKind::Annealing => Box::new(AnnealingSolver::default()),
            SolverKind::Genetic => Box::new(GeneticSolver::default()),
            SolverKind::FlatMcts => Box::new(FlatMctsSolver::default()),
            SolverKind::SpMcts => Box::new(MctsSolver::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviations_are_unique() {
        let kinds = [
            SolverKind::BruteForce,
            SolverKind::Dp,
            SolverKind::Anytime,
            SolverKind::AnytimeGreedySeeded,
            SolverKind::Hybrid,
            SolverKind::AgentGreedy,
            SolverKind::TaskGreedy,
            SolverKind::PureRandom,
            SolverKind::SwapRandom,
            SolverKind::Annealing,
            SolverKind::Genetic,
            SolverKind::FlatMcts,
            SolverKind::SpMcts,
        ];
        let mut names: Vec<_> = kinds.iter().map(|k| k.abbrev()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), kinds.len());
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&SolverKind::SpMcts).unwrap();
        let back: SolverKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SolverKind::SpMcts);
    }
}
