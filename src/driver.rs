/// ==============================================================================================
/// ================================ Day Loop & Driver (C7/C8) ===================================
/// ==============================================================================================
///
/// Advances global time one day at a time; invokes the post-step hook; writes
/// dense or sparse snapshots (`spec.md` §4.7, §4.8).

use rayon::prelude::*;

use crate::error::{SimError, SimResult};
use crate::events::e1::{process_e1, E1Queue};
use crate::events::e2::process_e2;
use crate::events::splitter::split_events;
use crate::model::ModelInput;
use crate::output::{FieldOutput, FieldOutputOwned, OutputSpec, Trajectory};
use crate::partition::{node_range_for_partition, PartitionContext};
use crate::progress::ProgressReporter;
use crate::rng::derive_partition_seeds;
use crate::ssa::{advance_node_to_day, recompute_all_rates};

/// Splits a contiguous flat buffer into per-partition mutable chunks,
/// matching `node_range_for_partition`'s boundaries, `width` scalars per
/// node. Each chunk is disjoint, so partitions may be processed concurrently
/// without synchronization (`spec.md` §5).
fn split_partitions_mut<T>(full: &mut [T], nn: usize, nthread: usize, width: usize) -> Vec<&mut [T]> {
    let mut rest = full;
    let mut chunks = Vec::with_capacity(nthread);
    for i in 0..nthread {
        let (start, end) = node_range_for_partition(i, nn, nthread);
        let len = (end - start) * width;
        let (chunk, remainder) = rest.split_at_mut(len);
        chunks.push(chunk);
        rest = remainder;
    }
    chunks
}

/// Runs a model to completion, returning its trajectory. Allocates thread
/// contexts, seeds RNGs, splits events, and drives the day loop to
/// `U_it >= tlen` (`spec.md` §4.8).
pub fn run(model: &ModelInput) -> SimResult<Trajectory> {
    model.validate()?;
    let d = model.dims;
    let (nn, nc, nt, nd, nld) = (d.nn, d.nc, d.nt, d.nd, d.nld);
    let nthread = model.nthread;

    let (e1_queues, mut e2_queue) = split_events(&model.events, nn, nthread)?;

    let seeds = derive_partition_seeds(model.seed, nthread);
    let mut partitions: Vec<PartitionContext> = e1_queues
        .into_iter()
        .enumerate()
        .map(|(i, queue): (usize, E1Queue)| {
            let (start, end) = node_range_for_partition(i, nn, nthread);
            PartitionContext::new(i, start, end - start, nt, seeds[i], queue)
        })
        .collect();

    let mut u: Vec<i64> = model.u0.clone();
    let mut v: Vec<f64> = model.v0.clone();
    let mut v_new: Vec<f64> = vec![0.0; nn * nd];
    let mut update_node: Vec<bool> = vec![false; nn];

    let t0 = model.tspan[0];

    // C8: initialize every node's rates once before the main loop.
    for p in partitions.iter_mut() {
        for local in 0..p.node_count {
            let node = p.node_start + local;
            let u_row = &u[node * nc..node * nc + nc];
            let v_row = &v[node * nd..node * nd + nd];
            let ldata_row = &model.ldata[node * nld..node * nld + nld];
            let t_rate_row = &mut p.t_rate[local * nt..local * nt + nt];
            recompute_all_rates(u_row, v_row, ldata_row, &model.gdata, t0, &model.propensities, t_rate_row, &mut p.sum_t_rate[local], node)?;
        }
    }

    let tlen = model.tspan.len();
    let mut u_out: FieldOutput<i64> = match &model.output {
        OutputSpec::Dense => FieldOutput::dense(tlen, nn * nc),
        OutputSpec::Sparse { u_skeleton, .. } => match u_skeleton {
            Some(sk) => FieldOutput::sparse(sk.clone()),
            None => FieldOutput::None,
        },
    };
    let mut v_out: FieldOutput<f64> = match &model.output {
        OutputSpec::Dense => FieldOutput::dense(tlen, nn * nd),
        OutputSpec::Sparse { v_skeleton, .. } => match v_skeleton {
            Some(sk) => FieldOutput::sparse(sk.clone()),
            None => FieldOutput::None,
        },
    };

    let mut tt = t0;
    let mut u_it = 0usize;

    // Initial-condition pass: any tspan entry at or before t0 is satisfied
    // by u0/v0 directly, before any dynamics run (spec.md §8 round-trip
    // property: tspan = {t0} yields U[:,0] == u0, V[:,0] == v0).
    while u_it < tlen && model.tspan[u_it] <= tt {
        u_out.write_snapshot(u_it, nn * nc, &u);
        v_out.write_snapshot(u_it, nn * nd, &v);
        u_it += 1;
    }

    let progress = ProgressReporter::new(model.verbosity, &model.tspan);
    let mut next_day = tt.floor() + 1.0;

    while u_it < tlen {
        let day_marker = tt.floor() as i64;

        // 1. SSA phase: parallel, node-disjoint.
        {
            let mut u_chunks = split_partitions_mut(&mut u, nn, nthread, nc);
            partitions
                .par_iter_mut()
                .zip(u_chunks.par_iter_mut())
                .try_for_each(|(p, u_chunk): (&mut PartitionContext, &mut &mut [i64])| -> SimResult<()> {
                    for local in 0..p.node_count {
                        let node = p.node_start + local;
                        let u_row = &mut u_chunk[local * nc..local * nc + nc];
                        let v_row = &v[node * nd..node * nd + nd];
                        let ldata_row = &model.ldata[node * nld..node * nld + nld];
                        let t_rate_row = &mut p.t_rate[local * nt..local * nt + nt];
                        advance_node_to_day(
                            node,
                            u_row,
                            v_row,
                            ldata_row,
                            &model.gdata,
                            t_rate_row,
                            &mut p.sum_t_rate[local],
                            &mut p.t_time[local],
                            next_day,
                            &model.s,
                            &model.g,
                            &model.propensities,
                            &mut p.rng,
                        )?;
                    }
                    Ok(())
                })?;
        }

        // 2. E1 phase: parallel, node-disjoint. 3. Barrier (rayon join above/below).
        {
            let mut u_chunks = split_partitions_mut(&mut u, nn, nthread, nc);
            let mut update_chunks = split_partitions_mut(&mut update_node, nn, nthread, 1);
            partitions
                .par_iter_mut()
                .zip(u_chunks.par_iter_mut())
                .zip(update_chunks.par_iter_mut())
                .try_for_each(|((p, u_chunk), update_chunk): ((&mut PartitionContext, &mut &mut [i64]), &mut &mut [bool])| -> SimResult<()> {
                    // Rebase update_node writes to this partition's local slice.
                    let mut local_update = vec![false; p.node_count];
                    process_e1(&mut p.e1_queue, day_marker, u_chunk, nc, p.node_start, &model.e, &model.shift, &mut local_update, &mut p.rng)?;
                    update_chunk.copy_from_slice(&local_update);
                    Ok(())
                })?;
        }

        // 4. E2 phase: single writer. 5. Barrier.
        process_e2(&mut e2_queue, day_marker, &mut u, nc, &model.e, &model.shift, &mut update_node, &mut partitions[0].rng)?;

        // 6. Post-step phase: parallel, node-disjoint.
        {
            let u_chunks = split_partitions_mut(&mut u, nn, nthread, nc);
            let mut v_new_chunks = split_partitions_mut(&mut v_new, nn, nthread, nd);
            let mut update_chunks = split_partitions_mut(&mut update_node, nn, nthread, 1);
            let u_chunks_ref: Vec<&[i64]> = u_chunks.iter().map(|c| &**c).collect();
            partitions
                .par_iter_mut()
                .zip(u_chunks_ref.par_iter())
                .zip(v_new_chunks.par_iter_mut())
                .zip(update_chunks.par_iter_mut())
                .try_for_each(
                    |(((p, u_chunk), v_new_chunk), update_chunk): (
                        ((&mut PartitionContext, &&[i64]), &mut &mut [f64]),
                        &mut &mut [bool],
                    )| -> SimResult<()> {
                        for local in 0..p.node_count {
                            let node = p.node_start + local;
                            let u_row = &u_chunk[local * nc..local * nc + nc];
                            let v_row = &v[node * nd..node * nd + nd];
                            let v_new_row = &mut v_new_chunk[local * nd..local * nd + nd];
                            let ldata_row = &model.ldata[node * nld..node * nld + nld];

                            let hook_result = model.post_step.call(v_new_row, u_row, v_row, ldata_row, &model.gdata, node, next_day);
                            if hook_result < 0 {
                                return Err(SimError::InvalidRate { node, transition: usize::MAX, value: hook_result as f64 });
                            }

                            if hook_result > 0 || update_chunk[local] {
                                let t_rate_row = &mut p.t_rate[local * nt..local * nt + nt];
                                recompute_all_rates(u_row, v_new_row, ldata_row, &model.gdata, next_day, &model.propensities, t_rate_row, &mut p.sum_t_rate[local], node)?;
                                update_chunk[local] = false;
                            }
                        }
                        Ok(())
                    },
                )?;
        }

        // 7. Advance.
        tt = next_day;
        next_day += 1.0;
        progress.report(tt);

        // 8. Snapshot.
        while u_it < tlen && model.tspan[u_it] < tt {
            u_out.write_snapshot(u_it, nn * nc, &u);
            v_out.write_snapshot(u_it, nn * nd, &v_new);
            u_it += 1;
        }

        // 9. Swap continuous buffers.
        std::mem::swap(&mut v, &mut v_new);

        // 10. Termination checked by the while condition.
    }

    progress.finish();

    Ok(Trajectory { tspan: model.tspan.clone(), u: FieldOutputOwned::from(u_out), v: FieldOutputOwned::from(v_out) })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::callbacks::Propensity;
    use crate::model::{ModelDims, ModelInputBuilder};
    use crate::sparse::CscBuilder;

    #[test]
    fn empty_ssa_holds_population_steady() {
        let dims = ModelDims { nn: 1, nc: 2, nt: 0, nd: 0, nld: 0 };
        let s = CscBuilder::<i64>::new(2).finish();
        let g = CscBuilder::<i64>::new(0).finish();
        let model = ModelInputBuilder::new(dims, vec![10, 0], s, g, vec![])
            .tspan(vec![0.0, 5.0])
            .build();

        let traj = run(&model).unwrap();
        if let FieldOutputOwned::Dense(buf) = traj.u {
            assert_eq!(buf, vec![10, 0, 10, 0]);
        } else {
            panic!("expected dense output");
        }
    }

    #[test]
    fn single_point_tspan_round_trips_initial_condition() {
        let dims = ModelDims { nn: 1, nc: 2, nt: 0, nd: 1, nld: 0 };
        let s = CscBuilder::<i64>::new(2).finish();
        let g = CscBuilder::<i64>::new(0).finish();
        let mut model = ModelInputBuilder::new(dims, vec![4, 6], s, g, vec![])
            .tspan(vec![0.0])
            .build();
        model.v0 = vec![3.5];

        let traj = run(&model).unwrap();
        match (traj.u, traj.v) {
            (FieldOutputOwned::Dense(u), FieldOutputOwned::Dense(v)) => {
                assert_eq!(u, vec![4, 6]);
                assert_eq!(v, vec![3.5]);
            }
            _ => panic!("expected dense output"),
        }
    }

    struct Decay(f64);
    impl Propensity for Decay {
        fn rate(&self, u: &[i64], _v: &[f64], _l: &[f64], _g: &[f64], _t: f64) -> f64 {
            self.0 * u[0] as f64
        }
    }

    #[test]
    fn single_transition_ssa_decays_on_average() {
        let dims = ModelDims { nn: 1, nc: 2, nt: 1, nd: 0, nld: 0 };
        let props: Vec<Arc<dyn Propensity>> = vec![Arc::new(Decay(0.1))];

        let mut total = 0i64;
        let seeds = 200;
        for seed in 0..seeds {
            let s = CscBuilder::<i64>::new(2).push_column(&[(0, -1), (1, 1)]).finish();
            let g = CscBuilder::<i64>::new(1).push_column(&[(0, 1)]).finish();
            let model = ModelInputBuilder::new(dims, vec![100, 0], s, g, props.clone())
                .tspan(vec![0.0, 50.0])
                .seed(seed)
                .build();
            let traj = run(&model).unwrap();
            if let FieldOutputOwned::Dense(buf) = traj.u {
                // second snapshot column: indices [2,3] = (u[node0,comp0], u[node0,comp1])
                total += buf[3];
            }
        }
        let mean_decayed = total as f64 / seeds as f64;
        assert!(
            (99.0..100.0).contains(&mean_decayed),
            "mean decayed-compartment count {mean_decayed} outside [99.0,100.0) after 5 half-lives"
        );
    }
}
