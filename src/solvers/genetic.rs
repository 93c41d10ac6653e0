//! Genetic recombination over coalition masks.
//!
//! A pool of random solutions is evolved by repeatedly breeding children
//! from the top-valued parents: each child inherits every task's coalition
//! mask from a random parent (masked against the agents still unclaimed),
//! then tops up any agent left over from the remaining parents' coalitions
//! for that task. Children replace random pool members. Mask-based
//! crossover requires a word-sized universe.

use serde::{Deserialize, Serialize};

use crate::core::bits::full_mask;
use crate::core::{Deadline, SolverRng, Value, MAX_TABLE_AGENTS};
use crate::oracle::ValueOracle;
use crate::solution::Solution;

use super::Solver;

/// Genetic-algorithm configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Seconds; negative leaves only the round cap.
    pub time_limit: f64,
    pub seed: Option<u64>,
    /// Solutions kept in the pool at all times.
    pub population: u32,
    /// Children bred per round.
    pub children_per_round: u32,
    /// Parents drawn from when breeding one child.
    pub parents_per_child: u32,
    /// Round cap.
    pub max_rounds: u64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            time_limit: -1.0,
            seed: None,
            population: 500,
            children_per_round: 100,
            parents_per_child: 3,
            max_rounds: 118_200_000_000,
        }
    }
}

impl GeneticConfig {
    pub fn with_time_limit(mut self, seconds: f64) -> Self {
        self.time_limit = seconds;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_rounds(mut self, cap: u64) -> Self {
        self.max_rounds = cap;
        self
    }

    pub fn with_population(mut self, size: u32) -> Self {
        self.population = size;
        self
    }
}

/// Genetic solver.
#[derive(Clone, Debug, Default)]
pub struct GeneticSolver {
    pub config: GeneticConfig,
}

impl GeneticSolver {
    #[must_use]
    pub fn new(config: GeneticConfig) -> Self {
        Self { config }
    }

    fn breed(
        &self,
        oracle: &dyn ValueOracle,
        pool: &[Solution],
        parent_indices: &mut Vec<usize>,
        task_order: &mut Vec<u32>,
        rng: &mut SolverRng,
    ) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        let parents = self.config.parents_per_child as usize;

        let mut child = Solution::new();
        child.reset(m, n);
        let mut unclaimed = full_mask(n);

        // Inherit each task's coalition from a random top parent,
        // filtering out agents already claimed.
        rng.shuffle(task_order);
        for &task in task_order.iter() {
            let parent = parent_indices[rng.gen_index(parents)];
            let parent_mask = pool[parent].coalition_mask(task);
            child.set_coalition_mask(task, parent_mask & unclaimed);
            unclaimed &= !parent_mask;
        }

        // Top up leftover agents from the remaining parents' placements.
        rng.shuffle(task_order);
        for &task in task_order.iter() {
            if unclaimed == 0 {
                break;
            }
            rng.shuffle(parent_indices);
            let mut child_mask = child.coalition_mask(task);
            for &parent in parent_indices.iter() {
                let claim = pool[parent].coalition_mask(task) & unclaimed;
                child_mask |= claim;
                unclaimed &= !claim;
            }
            child.set_coalition_mask(task, child_mask);
        }

        child.recalculate_value(oracle);
        child
    }
}

impl Solver for GeneticSolver {
    fn solve(&mut self, oracle: &dyn ValueOracle) -> Solution {
        let n = oracle.n_agents();
        let m = oracle.n_tasks();
        assert!(n <= MAX_TABLE_AGENTS, "mask crossover requires a word-sized universe");

        let mut rng = SolverRng::seeded(self.config.seed);
        let deadline = Deadline::start(self.config.time_limit);
        let population = self.config.population.max(1) as usize;

        // Random initial pool.
        let mut best = Solution::new();
        best.reset(m, n);
        best.value = Value::MIN;

        let mut pool: Vec<Solution> = Vec::with_capacity(population);
        for _ in 0..population {
            let mut member = Solution::new();
            member.reset(m, n);
            for agent in 0..n {
                member.add_agent(agent, rng.gen_below(m));
            }
            member.recalculate_value(oracle);
            if member.value > best.value {
                best = member.clone();
            }
            pool.push(member);
        }

        let mut task_order: Vec<u32> = (0..m).collect();
        let mut parent_indices: Vec<usize> = Vec::new();

        let mut rounds = 0u64;
        for _ in 0..self.config.max_rounds.max(1) {
            rounds += 1;

            // Select the top-valued parents.
            pool.sort_by(|a, b| {
                b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal)
            });
            parent_indices.clear();
            parent_indices.extend(0..self.config.parents_per_child as usize);

            for _ in 0..self.config.children_per_round {
                let child =
                    self.breed(oracle, &pool, &mut parent_indices, &mut task_order, &mut rng);
                if child.value > best.value {
                    best = child.clone();
                }
                let replace = rng.gen_index(population);
                pool[replace] = child;
            }

            if deadline.is_bounded() && deadline.reached() {
                break;
            }
        }

        log::debug!("genetic: {rounds} breeding rounds");
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{TableOracle, UniformOracle};

    fn small_config() -> GeneticConfig {
        GeneticConfig {
            population: 30,
            children_per_round: 10,
            max_rounds: 50,
            ..GeneticConfig::default()
        }
        .with_seed(17)
    }

    #[test]
    fn test_children_satisfy_partition_invariant() {
        let mut oracle = UniformOracle::default();
        oracle.generate(8, 3, 61).unwrap();

        let solution = GeneticSolver::new(small_config()).solve(&oracle);
        solution.validate(&oracle).unwrap();
    }

    #[test]
    fn test_converges_toward_superadditive_optimum() {
        // Task 1 rewards concentration quadratically; the optimum packs
        // all four agents there for a value of 16.
        let mut oracle = TableOracle::new(4, 2);
        for mask in 0u32..16 {
            let k = mask.count_ones() as f32;
            oracle.set_mask_value(mask, 0, k);
            oracle.set_mask_value(mask, 1, k * k);
        }

        let solution = GeneticSolver::new(small_config()).solve(&oracle);
        solution.validate(&oracle).unwrap();
        assert!(solution.value >= 10.0);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let mut oracle = UniformOracle::default();
        oracle.generate(6, 2, 5).unwrap();

        let a = GeneticSolver::new(small_config()).solve(&oracle);
        let b = GeneticSolver::new(small_config()).solve(&oracle);
        assert_eq!(a.value, b.value);
    }
}
