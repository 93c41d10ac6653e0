//! # scsga
//!
//! Simultaneous coalition structure generation and assignment: partition N
//! agents into M task-labeled coalitions maximizing the sum of per-task
//! coalition values, where values come from a pluggable oracle.
//!
//! ## Design Principles
//!
//! 1. **One representation, one contract**: every solver is written
//!    against [`Coalition`], [`Solution`] and the [`ValueOracle`] trait.
//!
//! 2. **Word-mask fast path**: universes of at most 32 agents fit a
//!    machine word, index a dense value table, and unlock the exact
//!    solvers; larger universes fall back to a multi-word bitset and a
//!    memoizing oracle behind the same interface.
//!
//! 3. **Anytime by deadline**: no solver spawns threads. Time budgets are
//!    wall-clock deadlines polled cooperatively; interrupting an anytime
//!    search returns the best incumbent found so far.
//!
//! 4. **Explicit randomness**: every solve call owns a seedable RNG.
//!    Unseeded runs draw from OS entropy and are non-reproducible by
//!    design.
//!
//! ## Modules
//!
//! - `core`: coalitions, bit tricks, integer partitions, RNG, deadlines
//! - `oracle`: the value-oracle contract, distribution models, problem
//!   factory
//! - `solution`: ordered coalition structures, validation, partial-problem
//!   reduction
//! - `solvers`: brute force, subset DP, partition branch-and-bound (coarse
//!   and memoized), SP-MCTS and flat MCTS, greedy/annealing/genetic/random
//!   search
//! - `partial`: evaluating completions of partially fixed assignments

pub mod core;
pub mod oracle;
pub mod partial;
pub mod solution;
pub mod solvers;

// Re-export commonly used types
pub use crate::core::{Coalition, Deadline, SolverRng, SolverRngState, Value, MAX_TABLE_AGENTS};

pub use crate::oracle::{
    Distribution, FileOracle, NdcsOracle, NormalOracle, OracleError, Problem, ProblemSpec,
    RelationOracle, SkillOracle, SkillRelationOracle, TableOracle, TrapOracle, UniformOracle,
    ValueModel, ValueOracle, REUSE_SEED,
};

pub use crate::solution::{Solution, SolutionError, VALUE_TOLERANCE};

pub use crate::solvers::{
    AgentGreedyConfig, AgentGreedySolver, AnnealingConfig, AnnealingSolver, AnytimeConfig,
    AnytimeSolver, BruteForceSolver, DpSolver, FlatMctsConfig, FlatMctsSolver, FlatPolicy,
    FlatPolicyKind, GeneticConfig, GeneticSolver, HybridConfig, HybridSolver, MctsConfig,
    MctsSolver,
    PureRandomSolver, RandomSearchConfig, RolloutKind, SelectionPolicy, Solver, SolverKind,
    SpUctPolicy, SwapRandomSolver, TaskGreedySolver,
};
