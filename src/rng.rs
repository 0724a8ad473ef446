//! Per-partition RNG streams. One independent reproducible stream per
//! partition, all derived from a single master seed so a run is reproducible
//! given `(seed, Nthread, Nn)` but not across different thread counts
//! (`spec.md` §4.1, §9).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Hypergeometric};

/// Reproducible, seedable, non-cryptographic stream standing in for the
/// "Mersenne-Twister-class" requirement of `spec.md` §4.1 (see DESIGN.md).
pub struct PartitionRng {
    inner: ChaCha8Rng,
}

impl PartitionRng {
    pub fn from_seed(seed: u64) -> Self {
        Self { inner: ChaCha8Rng::seed_from_u64(seed) }
    }

    /// Uniform draw on the open interval `(0, 1)`. `rand`'s `random::<f64>()`
    /// draws on `[0, 1)`; we nudge away from exact zero so `-ln(u)` in the
    /// SSA waiting-time draw never produces `+inf`.
    #[inline]
    pub fn uniform01(&mut self) -> f64 {
        loop {
            let u: f64 = self.inner.random();
            if u > 0.0 {
                return u;
            }
        }
    }

    /// Uniform draw on `[0, hi)`.
    #[inline]
    pub fn uniform(&mut self, hi: f64) -> f64 {
        self.inner.random::<f64>() * hi
    }

    /// Hypergeometric draw: count of "successes" (individuals from the first
    /// urn) when drawing `sample_size` without replacement from two urns of
    /// sizes `urn1` and `urn2`.
    pub fn hypergeometric(&mut self, urn1: u64, urn2: u64, sample_size: u64) -> u64 {
        if sample_size == 0 || urn1 + urn2 == 0 {
            return 0;
        }
        if urn1 == 0 {
            return 0;
        }
        if urn2 == 0 {
            return sample_size.min(urn1);
        }
        // rand_distr::Hypergeometric panics on sample_size > total; callers
        // guarantee n <= N_ind before reaching here.
        let dist = Hypergeometric::new(urn1 + urn2, urn1, sample_size)
            .expect("hypergeometric parameters validated by caller");
        dist.sample(&mut self.inner)
    }
}

/// Derives one seed per partition from a user-supplied master seed. The
/// master stream is reseeded from a mix of `master_seed` and `n_partitions`
/// so that re-running with a different thread count draws from an
/// independent seed space (reproducibility holds for fixed `(seed, Nthread,
/// Nn)`, not across thread counts, per `spec.md` §4.1/§9), while repeated
/// runs at the same thread count are bit-identical.
pub fn derive_partition_seeds(master_seed: u64, n_partitions: usize) -> Vec<u64> {
    let mixed = master_seed ^ (n_partitions as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let mut master = ChaCha8Rng::seed_from_u64(mixed);
    (0..n_partitions).map(|_| master.random()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reproducible_for_fixed_seed_and_partition_count() {
        let a = derive_partition_seeds(42, 4);
        let b = derive_partition_seeds(42, 4);
        assert_eq!(a, b);
    }

    #[test]
    fn differs_across_partition_counts() {
        let a = derive_partition_seeds(42, 4);
        let b = derive_partition_seeds(42, 8);
        assert_ne!(a[0..4], b[0..4]);
    }

    #[test]
    fn hypergeometric_one_zero_urn() {
        let mut rng = PartitionRng::from_seed(1);
        assert_eq!(rng.hypergeometric(5, 0, 3), 3);
        assert_eq!(rng.hypergeometric(0, 5, 3), 0);
    }
}
