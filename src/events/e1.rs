//! C4 — E1 processor. Applies intra-node scheduled events (EXIT, ENTER,
//! INTERNAL_TRANSFER) to one partition's state (`spec.md` §4.4).

use crate::error::{SimError, SimResult};
use crate::events::store::EventKind;
use crate::rng::PartitionRng;
use crate::sampler::sample_select;
use crate::sparse::CscMatrix;

/// One intra-node event, already rebased to zero-based `node`/`select`, with
/// `shift < 0` meaning "no shift".
#[derive(Debug, Clone, Copy)]
pub struct E1Event {
    pub kind: EventKind,
    pub time: i64,
    pub node: usize,
    pub n: i64,
    pub proportion: f64,
    pub select: usize,
    pub shift: i64,
}

/// A partition's E1 queue: time-sorted events plus a drain cursor so each
/// day's call to `process_e1` resumes where the previous day left off.
pub struct E1Queue {
    events: Vec<E1Event>,
    cursor: usize,
}

impl E1Queue {
    pub fn from_sorted(events: Vec<E1Event>) -> Self {
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

/// Drains all events from `queue` with `time <= day_marker`, applying each
/// to `u` (row-major `node * nc + compartment`, sliced to this partition's
/// owned rows: `u[local_node * nc .. local_node*nc+nc]` where
/// `local_node = event.node - partition_start`). Marks every touched node in
/// `update_node` (indexed by global node id).
pub fn process_e1(
    queue: &mut E1Queue,
    day_marker: i64,
    u: &mut [i64],
    nc: usize,
    partition_start: usize,
    e: &CscMatrix<i64>,
    shift_matrix: &CscMatrix<i64>,
    update_node: &mut [bool],
    rng: &mut PartitionRng,
) -> SimResult<()> {
    while !queue.is_drained() && queue.events[queue.cursor].time <= day_marker {
        let ev = queue.events[queue.cursor];
        queue.cursor += 1;

        let local = ev.node - partition_start;
        let row_start = local * nc;
        let row = &mut u[row_start..row_start + nc];

        match ev.kind {
            EventKind::Enter => {
                let (cols, _) = e.column(ev.select);
                if let Some(&first) = cols.first() {
                    let new_val = row[first] + ev.n;
                    if new_val < 0 {
                        return Err(SimError::NegativeState { node: ev.node, compartment: first });
                    }
                    row[first] = new_val;
                }
                // Empty selector column: no-op (spec.md §8 boundary case).
            }
            EventKind::Exit => {
                let sampled = sample_select(row, e, ev.select, ev.n, ev.proportion, rng)?;
                for (c, &taken) in sampled.iter().enumerate() {
                    if taken == 0 {
                        continue;
                    }
                    let new_val = row[c] - taken;
                    if new_val < 0 {
                        return Err(SimError::NegativeState { node: ev.node, compartment: c });
                    }
                    row[c] = new_val;
                }
            }
            EventKind::InternalTransfer => {
                let sampled = sample_select(row, e, ev.select, ev.n, ev.proportion, rng)?;
                for (c, &moved) in sampled.iter().enumerate() {
                    if moved == 0 {
                        continue;
                    }
                    let offset = if ev.shift < 0 { 0 } else { shift_matrix.get(c, ev.shift as usize).unwrap_or(0) };
                    let dest_c = (c as i64 + offset) as usize;

                    let new_src = row[c] - moved;
                    if new_src < 0 {
                        return Err(SimError::NegativeState { node: ev.node, compartment: c });
                    }
                    row[c] = new_src;

                    let new_dst = row[dest_c] + moved;
                    if new_dst < 0 {
                        return Err(SimError::NegativeState { node: ev.node, compartment: dest_c });
                    }
                    row[dest_c] = new_dst;
                }
            }
            EventKind::ExternalTransfer => unreachable!("external transfer never enters an E1 queue"),
        }

        update_node[ev.node] = true;
    }
    Ok(())
}
