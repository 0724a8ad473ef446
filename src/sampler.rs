//! C1 — Sampler. Draws a multiset of individuals from a node's compartments
//! under a selector column of `E` (`spec.md` §4.2).

use crate::error::{SimError, SimResult};
use crate::rng::PartitionRng;
use crate::sparse::CscMatrix;

/// `sample_select(node, select, n, proportion) -> individuals[Nc]`.
///
/// `u_node` is the full compartment row for the node (length `Nc`); the
/// returned vector has the same length, non-listed compartments zero.
pub fn sample_select(
    u_node: &[i64],
    e: &CscMatrix<i64>,
    select: usize,
    n_in: i64,
    proportion: f64,
    rng: &mut PartitionRng,
) -> SimResult<Vec<i64>> {
    let nc = u_node.len();
    let (k, _) = e.column(select);

    let n_ind: i64 = k.iter().map(|&c| u_node[c]).sum();
    let n_kinds = k.iter().filter(|&&c| u_node[c] > 0).count();

    let n = if n_in == 0 {
        (proportion * n_ind as f64).round() as i64
    } else {
        n_in
    };

    if k.is_empty() {
        return Err(SimError::SampleSelect { reason: "selector column is empty".into() });
    }
    if n < 0 {
        return Err(SimError::SampleSelect { reason: format!("n is negative: {n}") });
    }
    if n > n_ind {
        return Err(SimError::SampleSelect {
            reason: format!("requested {n} individuals but only {n_ind} available"),
        });
    }

    let mut result = vec![0i64; nc];

    // Fast paths (no RNG draw).
    if n == 0 {
        return Ok(result);
    }
    if n == n_ind {
        for &c in k {
            result[c] = u_node[c];
        }
        return Ok(result);
    }
    if k.len() == 1 {
        result[k[0]] = n;
        return Ok(result);
    }
    if n_kinds == 1 {
        let c = *k.iter().find(|&&c| u_node[c] > 0).expect("n_kinds==1 implies one match");
        result[c] = n;
        return Ok(result);
    }

    // Two-state path: single hypergeometric draw.
    if k.len() == 2 {
        let k0 = k[0];
        let k1 = k[1];
        let first = rng.hypergeometric(u_node[k0] as u64, u_node[k1] as u64, n as u64) as i64;
        result[k0] = first;
        result[k1] = n - first;
        return Ok(result);
    }

    // General path: sampling without replacement by sequential categorical draws.
    let mut remaining: Vec<i64> = k.iter().map(|&c| u_node[c]).collect();
    let mut pool = n_ind;
    for _ in 0..n {
        let r = rng.uniform(pool as f64);
        let mut cumulative = 0.0f64;
        let mut chosen = remaining.len() - 1;
        for (idx, &count) in remaining.iter().enumerate() {
            cumulative += count as f64;
            if cumulative > r {
                chosen = idx;
                break;
            }
        }
        remaining[chosen] -= 1;
        result[k[chosen]] += 1;
        pool -= 1;
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::CscBuilder;

    fn select_all(nc: usize) -> CscMatrix<i64> {
        let b = CscBuilder::<i64>::new(nc);
        let b = b.push_column(&(0..nc).map(|c| (c, 0i64)).collect::<Vec<_>>());
        b.finish()
    }

    #[test]
    fn n_equals_total_is_deterministic() {
        let u = vec![7i64, 3, 0];
        let e = select_all(3);
        let mut rng = PartitionRng::from_seed(1);
        let out = sample_select(&u, &e, 0, 10, 0.0, &mut rng).unwrap();
        assert_eq!(out, vec![7, 3, 0]);
    }

    #[test]
    fn n_zero_is_zero_vector() {
        let u = vec![7i64, 3, 0];
        let e = select_all(3);
        let mut rng = PartitionRng::from_seed(1);
        let out = sample_select(&u, &e, 0, 0, 0.0, &mut rng).unwrap();
        assert_eq!(out, vec![0, 0, 0]);
    }

    #[test]
    fn proportion_used_when_n_is_zero() {
        let u = vec![10i64, 0];
        let e = select_all(2);
        let mut rng = PartitionRng::from_seed(1);
        let out = sample_select(&u, &e, 0, 0, 0.5, &mut rng).unwrap();
        assert_eq!(out.iter().sum::<i64>(), 5);
    }

    #[test]
    fn single_nonempty_kind_takes_all() {
        let u = vec![0i64, 9, 0];
        let e = select_all(3);
        let mut rng = PartitionRng::from_seed(1);
        let out = sample_select(&u, &e, 0, 4, 0.0, &mut rng).unwrap();
        assert_eq!(out, vec![0, 4, 0]);
    }

    #[test]
    fn oversampling_fails() {
        let u = vec![1i64, 2];
        let e = select_all(2);
        let mut rng = PartitionRng::from_seed(1);
        let err = sample_select(&u, &e, 0, 5, 0.0, &mut rng).unwrap_err();
        assert_eq!(err.as_code(), SimError::SampleSelect { reason: String::new() }.as_code());
    }

    #[test]
    fn empty_selector_fails() {
        let u = vec![1i64, 2];
        let e = CscMatrix::<i64>::empty(2, 1);
        let mut rng = PartitionRng::from_seed(1);
        assert!(sample_select(&u, &e, 0, 1, 0.0, &mut rng).is_err());
    }

    #[test]
    fn general_path_sums_to_n() {
        let u = vec![3i64, 5, 2, 1];
        let e = select_all(4);
        let mut rng = PartitionRng::from_seed(7);
        let out = sample_select(&u, &e, 0, 6, 0.0, &mut rng).unwrap();
        assert_eq!(out.iter().sum::<i64>(), 6);
        for (got, cap) in out.iter().zip(u.iter()) {
            assert!(got <= cap);
        }
    }
}
