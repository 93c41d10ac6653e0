//! Cardinal value bounds for the partition branch-and-bound solvers.
//!
//! For every coalition size k the dense table yields an upper bound (the
//! maximum value over all size-k coalitions, across any task) and a lower
//! bound (the mean). The task-conditioned variants bound per (task, size)
//! and are strictly tighter. A partition's bound is the sum of per-part
//! bounds; admissibility follows because every coalition of size k scores
//! at most the size-k maximum for its task.

use crate::core::Value;

/// Precomputed per-size and per-(task, size) bounds.
pub(crate) struct CardinalBounds {
    /// Max value over all coalitions of each size, any task.
    pub cardinal_upper: Vec<Value>,
    /// Mean value over all coalitions of each size, any task.
    pub cardinal_lower: Vec<Value>,
    /// Max value per (task, size).
    pub task_upper: Vec<Vec<Value>>,
    /// Mean value per (task, size).
    pub task_lower: Vec<Vec<Value>>,
    /// Coalition masks grouped by size; populated on demand.
    pub coalitions_of_size: Vec<Vec<u32>>,
}

impl CardinalBounds {
    pub fn compute(
        table: &[Vec<Value>],
        n_agents: u32,
        n_tasks: u32,
        collect_masks: bool,
    ) -> Self {
        let sizes = n_agents as usize + 1;
        let m = n_tasks as usize;
        let n_coalitions = 1u64 << n_agents;

        let mut cardinal_upper = vec![Value::MIN; sizes];
        let mut cardinal_sum = vec![0.0f64; sizes];
        let mut cardinal_count = vec![0u64; sizes];
        let mut task_upper = vec![vec![Value::MIN; sizes]; m];
        let mut task_sum = vec![vec![0.0f64; sizes]; m];
        let mut task_count = vec![vec![0u64; sizes]; m];
        let mut coalitions_of_size = vec![Vec::new(); if collect_masks { sizes } else { 0 }];

        for mask in 0..n_coalitions {
            let mask = mask as u32;
            let size = mask.count_ones() as usize;

            if collect_masks {
                coalitions_of_size[size].push(mask);
            }

            for task in 0..m {
                let value = table[task][mask as usize];

                if value > cardinal_upper[size] {
                    cardinal_upper[size] = value;
                }
                cardinal_sum[size] += value as f64;
                cardinal_count[size] += 1;

                if value > task_upper[task][size] {
                    task_upper[task][size] = value;
                }
                task_sum[task][size] += value as f64;
                task_count[task][size] += 1;
            }
        }

        let cardinal_lower = cardinal_sum
            .iter()
            .zip(&cardinal_count)
            .map(|(&sum, &count)| if count == 0 { 0.0 } else { (sum / count as f64) as Value })
            .collect();
        let task_lower = task_sum
            .iter()
            .zip(&task_count)
            .map(|(sums, counts)| {
                sums.iter()
                    .zip(counts)
                    .map(|(&sum, &count)| {
                        if count == 0 {
                            0.0
                        } else {
                            (sum / count as f64) as Value
                        }
                    })
                    .collect()
            })
            .collect();

        Self {
            cardinal_upper,
            cardinal_lower,
            task_upper,
            task_lower,
            coalitions_of_size,
        }
    }

    /// Size-keyed (coarse) bounds of a partition: `(lower, upper)`.
    pub fn partition_bounds(&self, part_sizes: &[u32]) -> (Value, Value) {
        let mut lower = 0.0;
        let mut upper = 0.0;
        for &size in part_sizes {
            lower += self.cardinal_lower[size as usize];
            upper += self.cardinal_upper[size as usize];
        }
        (lower, upper)
    }

    /// Task-conditioned (tight) bounds of a permutation, where
    /// `parts_by_task[t]` is the size assigned to task `t`.
    pub fn permutation_bounds(&self, parts_by_task: &[u32]) -> (Value, Value) {
        let mut lower = 0.0;
        let mut upper = 0.0;
        for (task, &size) in parts_by_task.iter().enumerate() {
            lower += self.task_lower[task][size as usize];
            upper += self.task_upper[task][size as usize];
        }
        (lower, upper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{UniformOracle, ValueOracle};

    fn bounds(collect_masks: bool) -> (UniformOracle, CardinalBounds) {
        let mut oracle = UniformOracle::default();
        oracle.generate(5, 3, 77).unwrap();
        let bounds =
            CardinalBounds::compute(oracle.table().unwrap(), 5, 3, collect_masks);
        (oracle, bounds)
    }

    #[test]
    fn test_upper_dominates_every_entry() {
        let (oracle, bounds) = bounds(false);
        let table = oracle.table().unwrap();

        for mask in 0u32..32 {
            let size = mask.count_ones() as usize;
            for task in 0..3usize {
                let value = table[task][mask as usize];
                assert!(value <= bounds.cardinal_upper[size]);
                assert!(value <= bounds.task_upper[task][size]);
            }
        }
    }

    #[test]
    fn test_task_bounds_tighter_than_cardinal() {
        let (_, bounds) = bounds(false);
        for size in 0..=5usize {
            for task in 0..3usize {
                assert!(bounds.task_upper[task][size] <= bounds.cardinal_upper[size]);
            }
        }
    }

    #[test]
    fn test_lower_is_mean() {
        let (oracle, bounds) = bounds(false);
        let table = oracle.table().unwrap();

        // Size-0: single mask, mean over tasks.
        let empty_mean: f32 =
            (0..3).map(|task| table[task][0]).sum::<f32>() / 3.0;
        assert!((bounds.cardinal_lower[0] - empty_mean).abs() < 1e-5);
    }

    #[test]
    fn test_masks_grouped_by_size() {
        let (_, bounds) = bounds(true);
        for (size, masks) in bounds.coalitions_of_size.iter().enumerate() {
            for &mask in masks {
                assert_eq!(mask.count_ones() as usize, size);
            }
        }
        let total: usize = bounds.coalitions_of_size.iter().map(Vec::len).sum();
        assert_eq!(total, 32);
    }
}
