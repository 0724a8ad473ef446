//! C5 — E2 processor. Applies inter-node EXTERNAL_TRANSFER events to the
//! full state under a single writer (`spec.md` §4.5).

use crate::error::{SimError, SimResult};
use crate::rng::PartitionRng;
use crate::sampler::sample_select;
use crate::sparse::CscMatrix;

/// One inter-node event, rebased to zero-based `node`/`dest`/`select`, with
/// `shift < 0` meaning "no shift".
#[derive(Debug, Clone, Copy)]
pub struct E2Event {
    pub time: i64,
    pub node: usize,
    pub dest: usize,
    pub n: i64,
    pub proportion: f64,
    pub select: usize,
    pub shift: i64,
}

pub struct E2Queue {
    events: Vec<E2Event>,
    cursor: usize,
}

impl E2Queue {
    pub fn from_sorted(events: Vec<E2Event>) -> Self {
        Self { events, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn is_drained(&self) -> bool {
        self.cursor >= self.events.len()
    }
}

/// Drains all events from `queue` with `time <= day_marker`, moving
/// individuals from `source` to `dest` across the full `u` slab (row-major
/// `node * nc + compartment`, length `Nn * nc`). Runs single-writer
/// (partition 0 only); the caller is responsible for that scheduling
/// guarantee.
pub fn process_e2(
    queue: &mut E2Queue,
    day_marker: i64,
    u: &mut [i64],
    nc: usize,
    e: &CscMatrix<i64>,
    shift_matrix: &CscMatrix<i64>,
    update_node: &mut [bool],
    rng: &mut PartitionRng,
) -> SimResult<()> {
    while !queue.is_drained() && queue.events[queue.cursor].time <= day_marker {
        let ev = queue.events[queue.cursor];
        queue.cursor += 1;

        let src_start = ev.node * nc;
        let sampled = sample_select(&u[src_start..src_start + nc], e, ev.select, ev.n, ev.proportion, rng)?;

        for (c, &moved) in sampled.iter().enumerate() {
            if moved == 0 {
                continue;
            }
            let offset = if ev.shift < 0 { 0 } else { shift_matrix.get(c, ev.shift as usize).unwrap_or(0) };
            let dest_c = (c as i64 + offset) as usize;

            let new_src = u[src_start + c] - moved;
            if new_src < 0 {
                return Err(SimError::NegativeState { node: ev.node, compartment: c });
            }
            u[src_start + c] = new_src;

            let dest_idx = ev.dest * nc + dest_c;
            let new_dst = u[dest_idx] + moved;
            if new_dst < 0 {
                return Err(SimError::NegativeState { node: ev.dest, compartment: dest_c });
            }
            u[dest_idx] = new_dst;
        }

        update_node[ev.node] = true;
        update_node[ev.dest] = true;
    }
    Ok(())
}
