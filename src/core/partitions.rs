//! Integer partitions of the agent count into task-sized parts.
//!
//! The partition-based branch-and-bound solvers restructure the search
//! space by how many agents each task receives: an integer partition of N
//! into at most M positive parts, padded with zeros to length M. Which part
//! goes to which task is then a permutation of the padded partition.

use smallvec::SmallVec;

/// One way of splitting N agents into M nonnegative part sizes.
pub type PartSizes = SmallVec<[u32; 8]>;

/// Generate all integer partitions of `n` into at most `n_parts` positive
/// addends, each padded with zeros to exactly `n_parts` entries.
///
/// Parts are produced in non-increasing order within each partition.
#[must_use]
pub fn integer_partitions(n: u32, n_parts: u32) -> Vec<PartSizes> {
    let mut results = Vec::new();
    let mut current = PartSizes::new();
    partitions_rec(n, n, n_parts, &mut results, &mut current);
    for partition in &mut results {
        while partition.len() < n_parts as usize {
            partition.push(0);
        }
    }
    results
}

fn partitions_rec(
    remaining: u32,
    max_part: u32,
    n_parts: u32,
    results: &mut Vec<PartSizes>,
    current: &mut PartSizes,
) {
    if current.len() > n_parts as usize {
        return;
    }
    if remaining == 0 {
        results.push(current.clone());
        return;
    }
    for part in (1..=remaining.min(max_part)).rev() {
        current.push(part);
        partitions_rec(remaining - part, part, n_parts, results, current);
        current.pop();
    }
}

/// Rearrange `xs` into the lexicographically next permutation.
///
/// Returns `false` (leaving `xs` sorted ascending) once the last
/// permutation has been passed, so starting from a sorted slice the loop
/// `while next_permutation(..)` visits every distinct arrangement once.
pub fn next_permutation(xs: &mut [u32]) -> bool {
    if xs.len() < 2 {
        return false;
    }
    let mut i = xs.len() - 1;
    while i > 0 && xs[i - 1] >= xs[i] {
        i -= 1;
    }
    if i == 0 {
        xs.reverse();
        return false;
    }
    let mut j = xs.len() - 1;
    while xs[j] <= xs[i - 1] {
        j -= 1;
    }
    xs.swap(i - 1, j);
    xs[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partitions_of_four_into_three() {
        let parts = integer_partitions(4, 3);
        let as_vecs: Vec<Vec<u32>> = parts.iter().map(|p| p.to_vec()).collect();

        assert!(as_vecs.contains(&vec![4, 0, 0]));
        assert!(as_vecs.contains(&vec![3, 1, 0]));
        assert!(as_vecs.contains(&vec![2, 2, 0]));
        assert!(as_vecs.contains(&vec![2, 1, 1]));
        assert_eq!(as_vecs.len(), 4);
    }

    #[test]
    fn test_partitions_all_sum_to_n() {
        for (n, m) in [(7, 3), (6, 6), (5, 2)] {
            for partition in integer_partitions(n, m) {
                assert_eq!(partition.len(), m as usize);
                assert_eq!(partition.iter().sum::<u32>(), n);
            }
        }
    }

    #[test]
    fn test_partitions_more_parts_than_units() {
        let parts = integer_partitions(2, 4);
        let as_vecs: Vec<Vec<u32>> = parts.iter().map(|p| p.to_vec()).collect();
        assert!(as_vecs.contains(&vec![2, 0, 0, 0]));
        assert!(as_vecs.contains(&vec![1, 1, 0, 0]));
        assert_eq!(as_vecs.len(), 2);
    }

    #[test]
    fn test_next_permutation_visits_all() {
        let mut xs = [0u32, 1, 2];
        let mut seen = vec![xs.to_vec()];
        while next_permutation(&mut xs) {
            seen.push(xs.to_vec());
        }
        assert_eq!(seen.len(), 6);
        // Wrapped back to sorted order.
        assert_eq!(xs, [0, 1, 2]);
    }

    #[test]
    fn test_next_permutation_with_duplicates() {
        let mut xs = [0u32, 0, 2];
        let mut count = 1;
        while next_permutation(&mut xs) {
            count += 1;
        }
        // Distinct arrangements only: 3!/2! = 3.
        assert_eq!(count, 3);
    }
}
