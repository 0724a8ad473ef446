//! Per-partition context (`spec.md` §4.8, §9). Each partition owns a
//! contiguous node range, its own RNG, and value-typed rate-cache scratch —
//! the inner SSA loop indexes directly into these slices rather than
//! indirecting through a shared structure, the way the teacher keeps a
//! partition's scratch buffers (`Rk4Scratch`) owned per call rather than
//! behind a pointer.

use crate::events::e1::E1Queue;
use crate::rng::PartitionRng;

pub struct PartitionContext {
    pub index: usize,
    pub node_start: usize,
    pub node_count: usize,
    pub rng: PartitionRng,
    /// Flat, row-major `local_node * Nt + transition`.
    pub t_rate: Vec<f64>,
    pub sum_t_rate: Vec<f64>,
    pub t_time: Vec<f64>,
    pub e1_queue: E1Queue,
}

impl PartitionContext {
    pub fn new(index: usize, node_start: usize, node_count: usize, nt: usize, seed: u64, e1_queue: E1Queue) -> Self {
        Self {
            index,
            node_start,
            node_count,
            rng: PartitionRng::from_seed(seed),
            t_rate: vec![0.0; node_count * nt],
            sum_t_rate: vec![0.0; node_count],
            t_time: vec![0.0; node_count],
            e1_queue,
        }
    }

    #[inline]
    pub fn node_range(&self) -> std::ops::Range<usize> {
        self.node_start..self.node_start + self.node_count
    }
}

/// Node range `[start, end)` partition `i` of `nthread` owns out of `nn`
/// total nodes, with the remainder folded into the last partition
/// (`spec.md` §4.8).
pub fn node_range_for_partition(i: usize, nn: usize, nthread: usize) -> (usize, usize) {
    let chunk = nn / nthread;
    let start = i * chunk;
    let end = if i + 1 == nthread { nn } else { start + chunk };
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remainder_folds_into_last_partition() {
        assert_eq!(node_range_for_partition(0, 10, 3), (0, 3));
        assert_eq!(node_range_for_partition(1, 10, 3), (3, 6));
        assert_eq!(node_range_for_partition(2, 10, 3), (6, 10));
    }

    #[test]
    fn nthread_greater_than_nn_leaves_earlier_partitions_empty() {
        assert_eq!(node_range_for_partition(0, 2, 5), (0, 0));
        assert_eq!(node_range_for_partition(4, 2, 5), (0, 2));
    }
}
