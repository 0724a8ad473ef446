//! C3 — Event splitter. Partitions the global event stream into per-thread
//! E1 queues and a single E2 queue (`spec.md` §4.3).

use crate::error::SimResult;
use crate::events::e1::{E1Event, E1Queue};
use crate::events::e2::{E2Event, E2Queue};
use crate::events::store::{EventColumns, EventKind};

/// Node `v` (zero-based) -> partition index, matching the driver's node
/// range assignment (`spec.md` §4.3, §4.8): partition `i` owns
/// `[i*chunk, (i+1)*chunk)` except the last partition, which also absorbs
/// the remainder. When `Nthread > Nn`, `chunk == 0` and every node falls
/// into the last partition's (only nonempty) range.
pub fn partition_of(node_zero_based: usize, nn: usize, nthread: usize) -> usize {
    let chunk = nn / nthread.max(1);
    if chunk == 0 {
        return nthread - 1;
    }
    (node_zero_based / chunk).min(nthread - 1)
}

/// Splits `events` into `nthread` E1 queues and one E2 queue. Rebases
/// `node`/`dest`/`select`/`shift` to zero-based (`shift` may become `-1`,
/// meaning "no shift"). Each queue is stable-sorted by `time` so that events
/// sharing a `time` retain their input relative order within the queue
/// (`spec.md` §3 invariant 4).
pub fn split_events(events: &EventColumns, nn: usize, nthread: usize) -> SimResult<(Vec<E1Queue>, E2Queue)> {
    let mut e1: Vec<Vec<E1Event>> = (0..nthread).map(|_| Vec::new()).collect();
    let mut e2: Vec<E2Event> = Vec::new();

    for record in events.iter() {
        let record = record?;
        let node0 = record.node - 1;
        let select0 = record.select - 1;
        let shift0 = record.shift - 1;

        match record.kind {
            EventKind::Exit | EventKind::Enter | EventKind::InternalTransfer => {
                let p = partition_of(node0, nn, nthread);
                e1[p].push(E1Event {
                    kind: record.kind,
                    time: record.time,
                    node: node0,
                    n: record.n,
                    proportion: record.proportion,
                    select: select0,
                    shift: shift0,
                });
            }
            EventKind::ExternalTransfer => {
                let dest0 = record.dest - 1;
                e2.push(E2Event {
                    time: record.time,
                    node: node0,
                    dest: dest0,
                    n: record.n,
                    proportion: record.proportion,
                    select: select0,
                    shift: shift0,
                });
            }
        }
    }

    for queue in e1.iter_mut() {
        queue.sort_by_key(|e| e.time);
    }
    e2.sort_by_key(|e| e.time);

    let queues = e1.into_iter().map(E1Queue::from_sorted).collect();
    Ok((queues, E2Queue::from_sorted(e2)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_exit(ev: &mut EventColumns, time: i64, node: usize) {
        ev.push(0, time, node, 0, 1, 0.0, 1, 0);
    }

    #[test]
    fn splitting_preserves_event_multiset() {
        let mut ev = EventColumns::new();
        push_exit(&mut ev, 1, 1);
        push_exit(&mut ev, 1, 5);
        ev.push(3, 2, 1, 2, 1, 0.0, 1, 0); // external transfer
        push_exit(&mut ev, 3, 3);

        let (queues, e2) = split_events(&ev, 6, 2).unwrap();
        let total_e1: usize = queues.iter().map(|q| q.len()).sum();
        assert_eq!(total_e1, 3);
        assert_eq!(e2.len(), 1);
    }

    #[test]
    fn nthread_greater_than_nn_uses_last_partition() {
        assert_eq!(partition_of(0, 2, 8), 7);
        assert_eq!(partition_of(1, 2, 8), 7);
    }

    #[test]
    fn ties_preserve_input_order() {
        let mut ev = EventColumns::new();
        push_exit(&mut ev, 5, 1);
        push_exit(&mut ev, 5, 1);
        push_exit(&mut ev, 5, 1);
        let (queues, _) = split_events(&ev, 4, 1).unwrap();
        let q = &queues[0];
        assert_eq!(q.len(), 3);
    }
}
