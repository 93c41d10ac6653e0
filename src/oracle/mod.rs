//! Value oracles: the pluggable source of coalition-to-task values.
//!
//! An oracle is created once per problem instance, populated once via
//! [`ValueOracle::generate`], and then queried read-only by every solver
//! run against that instance. Universes of at most [`MAX_TABLE_AGENTS`]
//! agents are materialized as a dense `n_tasks x 2^n` table indexed by
//! coalition mask; larger universes memoize samples lazily per
//! `(coalition, task)` key.
//!
//! Concrete oracles are built by [`Problem::new`] from a [`ProblemSpec`]
//! through a closed match over [`Distribution`].

pub mod file;
pub mod random;
pub mod structured;
pub mod table;
pub mod trap;

pub use file::FileOracle;
pub use random::{NdcsModel, NdcsOracle, NormalModel, NormalOracle, UniformModel, UniformOracle};
pub use structured::{
    RelationModel, RelationOracle, SkillModel, SkillOracle, SkillRelationModel,
    SkillRelationOracle,
};
pub use table::TableOracle;
pub use trap::{TrapModel, TrapOracle};

use std::cell::RefCell;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{Coalition, Value, MAX_TABLE_AGENTS};

/// Seed sentinel: reuse the previous generation.
pub const REUSE_SEED: i64 = -1;

/// Errors from oracle construction and generation.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("failed to read value table: {0}")]
    Io(#[from] std::io::Error),

    #[error("value table header must be two integers `n_agents n_tasks`")]
    MalformedHeader,

    #[error("value table declares {n_agents} agents; dense tables support at most {MAX_TABLE_AGENTS}")]
    TableTooWide { n_agents: u32 },

    #[error("value table truncated: expected {expected} values, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("invalid value token `{token}`")]
    BadToken { token: String },

    #[error("oracle is fixed at {n_agents} agents and {n_tasks} tasks")]
    FixedSize { n_agents: u32, n_tasks: u32 },

    #[error("distribution `{0:?}` requires a distribution file")]
    MissingFile(Distribution),
}

/// The value-oracle contract shared by every solver.
///
/// `value` must be pure with respect to a fixed generation: repeated calls
/// with the same arguments return the same value. Oracles are not designed
/// for regeneration mid-solve.
pub trait ValueOracle {
    /// (Re-)populate the oracle for an instance size and seed.
    ///
    /// Passing [`REUSE_SEED`] keeps the previous generation when the size
    /// is unchanged; with a changed size it regenerates under the stored
    /// seed. Any other seed regenerates deterministically.
    fn generate(&mut self, n_agents: u32, n_tasks: u32, seed: i64) -> Result<(), OracleError>;

    /// Value of assigning `coalition` to `task`.
    fn value(&self, coalition: &Coalition, task: u32) -> Value;

    /// Dense-table query by coalition mask. Requires `n_agents <= 32`.
    fn mask_value(&self, mask: u32, task: u32) -> Value;

    fn n_agents(&self) -> u32;

    fn n_tasks(&self) -> u32;

    /// Number of possible coalitions (`2^n_agents`). Requires a word-sized
    /// universe.
    fn n_coalitions(&self) -> u64 {
        assert!(self.n_agents() <= MAX_TABLE_AGENTS);
        1u64 << self.n_agents()
    }

    /// The dense value table (task-major), when materialized.
    fn table(&self) -> Option<&[Vec<Value>]>;
}

// =============================================================================
// Sampled oracles
// =============================================================================

/// A value-distribution model: the sampling procedure behind a generated
/// oracle.
///
/// `reset` re-derives model parameters for a new instance; a negative seed
/// keeps the current RNG stream so that replayed generations continue
/// deterministically.
pub trait ValueModel {
    fn reset(&mut self, n_agents: u32, n_tasks: u32, seed: i64);

    fn sample(&mut self, coalition: &Coalition, task: u32) -> Value;
}

/// Oracle backed by a [`ValueModel`].
///
/// Small universes are materialized into the dense table at generation
/// time (mask-minor, task-major order, so a fixed seed always yields the
/// same table). Larger universes sample lazily and memoize; the interior
/// mutability is sound because the crate is single-threaded by design.
pub struct SampledOracle<M: ValueModel> {
    n_agents: u32,
    n_tasks: u32,
    seed: i64,
    generated: bool,
    table: Vec<Vec<Value>>,
    memo: RefCell<FxHashMap<(Coalition, u32), Value>>,
    model: RefCell<M>,
}

impl<M: ValueModel + Default> Default for SampledOracle<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

impl<M: ValueModel> SampledOracle<M> {
    #[must_use]
    pub fn new(model: M) -> Self {
        Self {
            n_agents: 0,
            n_tasks: 0,
            seed: 0,
            generated: false,
            table: Vec::new(),
            memo: RefCell::new(FxHashMap::default()),
            model: RefCell::new(model),
        }
    }

    /// Number of lazily memoized samples (large universes only).
    #[must_use]
    pub fn n_memoized(&self) -> usize {
        self.memo.borrow().len()
    }
}

impl<M: ValueModel> ValueOracle for SampledOracle<M> {
    fn generate(&mut self, n_agents: u32, n_tasks: u32, seed: i64) -> Result<(), OracleError> {
        let same_size =
            self.generated && n_agents == self.n_agents && n_tasks == self.n_tasks;
        if seed == REUSE_SEED && same_size {
            return Ok(());
        }
        let seed = if seed == REUSE_SEED { self.seed } else { seed };

        self.n_agents = n_agents;
        self.n_tasks = n_tasks;
        self.seed = seed;
        self.memo.get_mut().clear();
        self.table.clear();

        let model = self.model.get_mut();
        model.reset(n_agents, n_tasks, seed);

        if n_agents <= MAX_TABLE_AGENTS {
            let n_coalitions = 1u64 << n_agents;
            let mut coalition = Coalition::new(n_agents);
            self.table = vec![vec![0.0; n_coalitions as usize]; n_tasks as usize];
            for task in 0..n_tasks {
                for mask in 0..n_coalitions {
                    coalition.set_mask(mask as u32);
                    self.table[task as usize][mask as usize] =
                        model.sample(&coalition, task);
                }
            }
        }

        self.generated = true;
        Ok(())
    }

    fn value(&self, coalition: &Coalition, task: u32) -> Value {
        if self.n_agents <= MAX_TABLE_AGENTS {
            return self.table[task as usize][coalition.mask() as usize];
        }

        let key = (coalition.clone(), task);
        if let Some(&value) = self.memo.borrow().get(&key) {
            return value;
        }
        let value = self.model.borrow_mut().sample(coalition, task);
        self.memo.borrow_mut().insert(key, value);
        value
    }

    fn mask_value(&self, mask: u32, task: u32) -> Value {
        assert!(self.n_agents <= MAX_TABLE_AGENTS);
        self.table[task as usize][mask as usize]
    }

    fn n_agents(&self) -> u32 {
        self.n_agents
    }

    fn n_tasks(&self) -> u32 {
        self.n_tasks
    }

    fn table(&self) -> Option<&[Vec<Value>]> {
        if self.table.is_empty() {
            None
        } else {
            Some(&self.table)
        }
    }
}

// =============================================================================
// Problem specification and factory
// =============================================================================

/// The value-distribution families shipped with the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Distribution {
    /// Uniform [0, 1) per (coalition, task).
    Upd,
    /// Normal(1.0, 0.1) per (coalition, task).
    Npd,
    /// Normal(|C|, sqrt(|C|)) keyed by coalition size.
    Ndcs,
    /// Sum of per-(agent, task) skills, skills ~ Normal(0, 0.1).
    Nsd,
    /// Sum of per-(agent-pair, task) relations, relations ~ Normal(0, 0.1).
    Nrd,
    /// Mean skill plus mean pairwise relation, both ~ Normal(1.0, 0.1).
    Nsrd,
    /// Per-size quadratic trap curve with additive noise.
    Trap,
    /// Dense value table loaded from a text file.
    File,
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Distribution::Upd => "UPD",
            Distribution::Npd => "NPD",
            Distribution::Ndcs => "NDCS",
            Distribution::Nsd => "NSD",
            Distribution::Nrd => "NRD",
            Distribution::Nsrd => "NSRD",
            Distribution::Trap => "trap",
            Distribution::File => "file",
        };
        write!(f, "{name}")
    }
}

/// Everything needed to build and populate an oracle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProblemSpec {
    pub n_agents: u32,
    pub n_tasks: u32,
    /// [`REUSE_SEED`] reuses the previous generation.
    pub seed: i64,
    pub distribution: Distribution,
    /// Backing file for [`Distribution::File`].
    pub distribution_file: Option<PathBuf>,
}

/// A problem instance owning its oracle.
pub struct Problem {
    spec: ProblemSpec,
    oracle: Box<dyn ValueOracle>,
}

impl std::fmt::Debug for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Problem")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

impl Problem {
    /// Build the oracle named by the spec's distribution.
    pub fn new(spec: ProblemSpec) -> Result<Self, OracleError> {
        let oracle: Box<dyn ValueOracle> = match spec.distribution {
            Distribution::Upd => Box::new(UniformOracle::default()),
            Distribution::Npd => Box::new(NormalOracle::default()),
            Distribution::Ndcs => Box::new(NdcsOracle::default()),
            Distribution::Nsd => Box::new(SkillOracle::default()),
            Distribution::Nrd => Box::new(RelationOracle::default()),
            Distribution::Nsrd => Box::new(SkillRelationOracle::default()),
            Distribution::Trap => Box::new(TrapOracle::default()),
            Distribution::File => {
                let path = spec
                    .distribution_file
                    .as_ref()
                    .ok_or(OracleError::MissingFile(Distribution::File))?;
                Box::new(FileOracle::load(path)?)
            }
        };
        Ok(Self { spec, oracle })
    }

    /// Run generation for the spec's size and seed.
    pub fn allocate(&mut self) -> Result<(), OracleError> {
        self.oracle
            .generate(self.spec.n_agents, self.spec.n_tasks, self.spec.seed)
    }

    #[must_use]
    pub fn spec(&self) -> &ProblemSpec {
        &self.spec
    }

    #[must_use]
    pub fn oracle(&self) -> &dyn ValueOracle {
        self.oracle.as_ref()
    }

    pub fn oracle_mut(&mut self) -> &mut dyn ValueOracle {
        self.oracle.as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(distribution: Distribution) -> ProblemSpec {
        ProblemSpec {
            n_agents: 4,
            n_tasks: 3,
            seed: 7,
            distribution,
            distribution_file: None,
        }
    }

    #[test]
    fn test_factory_builds_and_allocates() {
        for distribution in [
            Distribution::Upd,
            Distribution::Npd,
            Distribution::Ndcs,
            Distribution::Nsd,
            Distribution::Nrd,
            Distribution::Nsrd,
            Distribution::Trap,
        ] {
            let mut problem = Problem::new(spec(distribution)).unwrap();
            problem.allocate().unwrap();
            assert_eq!(problem.oracle().n_agents(), 4);
            assert_eq!(problem.oracle().n_tasks(), 3);
            assert_eq!(problem.oracle().n_coalitions(), 16);
            assert!(problem.oracle().table().is_some());
        }
    }

    #[test]
    fn test_file_distribution_requires_path() {
        let err = Problem::new(spec(Distribution::File)).unwrap_err();
        assert!(matches!(err, OracleError::MissingFile(_)));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mut a = UniformOracle::default();
        let mut b = UniformOracle::default();
        a.generate(5, 2, 99).unwrap();
        b.generate(5, 2, 99).unwrap();
        assert_eq!(a.table().unwrap(), b.table().unwrap());
    }

    #[test]
    fn test_reuse_seed_keeps_generation() {
        let mut oracle = UniformOracle::default();
        oracle.generate(4, 2, 3).unwrap();
        let before = oracle.table().unwrap().to_vec();

        oracle.generate(4, 2, REUSE_SEED).unwrap();
        assert_eq!(oracle.table().unwrap(), &before[..]);
    }

    #[test]
    fn test_reseed_regenerates() {
        let mut oracle = UniformOracle::default();
        oracle.generate(4, 2, 3).unwrap();
        let before = oracle.table().unwrap().to_vec();

        oracle.generate(4, 2, 4).unwrap();
        assert_ne!(oracle.table().unwrap(), &before[..]);
    }

    #[test]
    fn test_value_matches_mask_value() {
        let mut oracle = NormalOracle::default();
        oracle.generate(5, 3, 11).unwrap();

        let coalition = Coalition::from_mask(0b10110, 5);
        for task in 0..3 {
            assert_eq!(
                oracle.value(&coalition, task),
                oracle.mask_value(0b10110, task)
            );
        }
    }

    #[test]
    fn test_large_universe_memoizes() {
        let mut oracle = UniformOracle::default();
        oracle.generate(40, 2, 5).unwrap();
        assert!(oracle.table().is_none());

        let mut coalition = Coalition::new(40);
        coalition.add(3);
        coalition.add(35);

        let first = oracle.value(&coalition, 1);
        let second = oracle.value(&coalition, 1);
        assert_eq!(first, second);
        assert_eq!(oracle.n_memoized(), 1);
    }

    #[test]
    fn test_spec_serde_round_trip() {
        let spec = spec(Distribution::Ndcs);
        let json = serde_json::to_string(&spec).unwrap();
        let back: ProblemSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back.n_agents, 4);
        assert_eq!(back.distribution, Distribution::Ndcs);
    }
}
