//! Core types: coalitions, bit tricks, integer partitions, RNG, deadlines.
//!
//! Everything here is problem-agnostic; the oracle and solver layers build
//! on these primitives.

pub mod bits;
pub mod coalition;
pub mod partitions;
pub mod rng;
pub mod timer;

pub use coalition::{Coalition, Value, MAX_TABLE_AGENTS};
pub use partitions::PartSizes;
pub use rng::{SolverRng, SolverRngState};
pub use timer::Deadline;
