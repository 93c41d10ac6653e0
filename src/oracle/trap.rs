//! Trap-shaped value distribution.
//!
//! Values follow a per-size quadratic `f(k) = a + b*k + c*k^2` fitted so
//! that f(0) = L, f(N/2) = 0 and f(N) = H, with additive noise. Singleton
//! and empty coalitions stay pinned at the low plateau, so greedy
//! construction is drawn toward many small coalitions while the optimum
//! hides behind the valley at k = N/2.

use crate::core::{Coalition, SolverRng, Value};

use super::{SampledOracle, ValueModel};

const LOW: f32 = 0.01;
const HIGH: f32 = 10.0;

/// Per-size trap curve with Normal(f(k), 0.1) noise.
pub struct TrapModel {
    rng: SolverRng,
    /// Curve mean per coalition size.
    curve: Vec<Value>,
}

impl Default for TrapModel {
    fn default() -> Self {
        Self {
            rng: SolverRng::new(0),
            curve: Vec::new(),
        }
    }
}

impl ValueModel for TrapModel {
    fn reset(&mut self, n_agents: u32, _n_tasks: u32, seed: i64) {
        if seed >= 0 {
            self.rng = SolverRng::new(seed as u64);
        }

        let n = n_agents as f32;
        let a = LOW;
        let b = (-2.0 * LOW / n) - (HIGH + LOW) / n;
        let c = 2.0 * (HIGH + LOW) / (n * n);

        self.curve = (0..=n_agents)
            .map(|size| {
                if size <= 1 {
                    LOW
                } else {
                    let k = size as f32;
                    a + b * k + c * k * k
                }
            })
            .collect();
    }

    fn sample(&mut self, coalition: &Coalition, _task: u32) -> Value {
        let mean = self.curve[coalition.len() as usize];
        self.rng.gen_normal(mean, 0.1)
    }
}

/// Oracle over [`TrapModel`].
pub type TrapOracle = SampledOracle<TrapModel>;
