//! Unstructured random value distributions.
//!
//! These draw each (coalition, task) value independently: uniform (UPD),
//! normal (NPD), and the size-dependent normal family (NDCS) whose spread
//! grows with coalition cardinality.

use crate::core::{Coalition, SolverRng, Value};

use super::{SampledOracle, ValueModel};

/// Uniform [0, 1) per (coalition, task).
pub struct UniformModel {
    rng: SolverRng,
}

impl Default for UniformModel {
    fn default() -> Self {
        Self {
            rng: SolverRng::new(0),
        }
    }
}

impl ValueModel for UniformModel {
    fn reset(&mut self, _n_agents: u32, _n_tasks: u32, seed: i64) {
        if seed >= 0 {
            self.rng = SolverRng::new(seed as u64);
        }
    }

    fn sample(&mut self, _coalition: &Coalition, _task: u32) -> Value {
        self.rng.gen_f32()
    }
}

/// Oracle over [`UniformModel`].
pub type UniformOracle = SampledOracle<UniformModel>;

/// Normal(1.0, 0.1) per (coalition, task).
pub struct NormalModel {
    rng: SolverRng,
}

impl Default for NormalModel {
    fn default() -> Self {
        Self {
            rng: SolverRng::new(0),
        }
    }
}

impl ValueModel for NormalModel {
    fn reset(&mut self, _n_agents: u32, _n_tasks: u32, seed: i64) {
        if seed >= 0 {
            self.rng = SolverRng::new(seed as u64);
        }
    }

    fn sample(&mut self, _coalition: &Coalition, _task: u32) -> Value {
        self.rng.gen_normal(1.0, 0.1)
    }
}

/// Oracle over [`NormalModel`].
pub type NormalOracle = SampledOracle<NormalModel>;

/// Normal(|C|, sqrt(|C|)) keyed by coalition size.
///
/// The empty coalition collapses to a near-degenerate distribution so its
/// value stays close to zero.
pub struct NdcsModel {
    rng: SolverRng,
}

impl Default for NdcsModel {
    fn default() -> Self {
        Self {
            rng: SolverRng::new(0),
        }
    }
}

impl ValueModel for NdcsModel {
    fn reset(&mut self, _n_agents: u32, _n_tasks: u32, seed: i64) {
        if seed >= 0 {
            self.rng = SolverRng::new(seed as u64);
        }
    }

    fn sample(&mut self, coalition: &Coalition, _task: u32) -> Value {
        let size = coalition.len() as f32;
        let std_dev = if size == 0.0 { 1e-9 } else { size.sqrt() };
        self.rng.gen_normal(size, std_dev)
    }
}

/// Oracle over [`NdcsModel`].
pub type NdcsOracle = SampledOracle<NdcsModel>;
