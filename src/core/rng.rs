//! Deterministic random number generation for solvers and value oracles.
//!
//! ## Key Features
//!
//! - **Deterministic**: the same seed produces an identical sequence
//! - **Explicit**: every solve call owns its own instance; there is no
//!   process-global generator
//! - **Restorable**: O(1) state capture and restore, so a memoizing oracle
//!   that replays logged samples continues its stream exactly where a
//!   previous run left off
//!
//! Unseeded construction draws the seed from OS entropy and is therefore
//! not reproducible; reproducibility requires the caller to pass a seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deterministic solver RNG.
///
/// Uses ChaCha8 for speed while keeping a counter-based state that can be
/// captured and restored in O(1).
#[derive(Clone, Debug)]
pub struct SolverRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SolverRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Create from an optional seed, falling back to OS entropy.
    #[must_use]
    pub fn seeded(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(rand::random))
    }

    /// The seed this generator was constructed with.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform u32 in `[0, n)`.
    #[inline]
    pub fn gen_below(&mut self, n: u32) -> u32 {
        self.inner.gen_range(0..n)
    }

    /// Uniform usize in `[0, n)`.
    #[inline]
    pub fn gen_index(&mut self, n: usize) -> usize {
        self.inner.gen_range(0..n)
    }

    /// Uniform f32 in `[0, 1)`.
    #[inline]
    pub fn gen_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Normal sample via Box-Muller.
    pub fn gen_normal(&mut self, mean: f32, std_dev: f32) -> f32 {
        let u1: f32 = self.inner.gen_range(f32::EPSILON..1.0);
        let u2: f32 = self.inner.gen::<f32>();
        let radius = (-2.0 * u1.ln()).sqrt();
        mean + std_dev * radius * (std::f32::consts::TAU * u2).cos()
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Capture the current state.
    #[must_use]
    pub fn state(&self) -> SolverRngState {
        SolverRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
        }
    }

    /// Restore from a captured state.
    #[must_use]
    pub fn from_state(state: &SolverRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
        }
    }
}

/// Captured RNG state.
///
/// The ChaCha8 word position makes the capture O(1) regardless of how many
/// values have been drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverRngState {
    pub seed: u64,
    pub word_pos: u128,
}
