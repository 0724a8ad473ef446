//! C2 — Event store. A columnar buffer of scheduled events, shaped exactly
//! as received from the wire: one-based `node`/`dest`/`select`/`shift`
//! (`spec.md` §3, §4.3).

use crate::error::{SimError, SimResult};

/// Wire-stable event type codes (`spec.md` §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventKind {
    Exit = 0,
    Enter = 1,
    InternalTransfer = 2,
    ExternalTransfer = 3,
}

impl EventKind {
    pub fn from_code(code: u8, index: usize) -> SimResult<Self> {
        match code {
            0 => Ok(EventKind::Exit),
            1 => Ok(EventKind::Enter),
            2 => Ok(EventKind::InternalTransfer),
            3 => Ok(EventKind::ExternalTransfer),
            _ => Err(SimError::UndefinedEvent { index }),
        }
    }
}

/// One event as read out of the columnar store, still one-based on `node`,
/// `dest`, `select`, `shift` per the wire contract.
#[derive(Debug, Clone, Copy)]
pub struct EventRecord {
    pub kind: EventKind,
    pub time: i64,
    pub node: usize,
    pub dest: usize,
    pub n: i64,
    pub proportion: f64,
    pub select: usize,
    pub shift: i64,
}

/// Columnar event buffer, length `len`. Mirrors the eight wire columns of
/// `spec.md` §3 directly; no rebasing happens here (`split_events` does it).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EventColumns {
    pub event: Vec<u8>,
    pub time: Vec<i64>,
    pub node: Vec<usize>,
    pub dest: Vec<usize>,
    pub n: Vec<i64>,
    pub proportion: Vec<f64>,
    pub select: Vec<usize>,
    pub shift: Vec<i64>,
}

impl EventColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.event.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event.is_empty()
    }

    /// Append one event, one-based `node`/`dest`/`select`/`shift` as received
    /// from the wire (`shift == 0` means "no shift").
    #[allow(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        event: u8,
        time: i64,
        node: usize,
        dest: usize,
        n: i64,
        proportion: f64,
        select: usize,
        shift: i64,
    ) {
        self.event.push(event);
        self.time.push(time);
        self.node.push(node);
        self.dest.push(dest);
        self.n.push(n);
        self.proportion.push(proportion);
        self.select.push(select);
        self.shift.push(shift);
    }

    pub fn get(&self, i: usize) -> SimResult<EventRecord> {
        Ok(EventRecord {
            kind: EventKind::from_code(self.event[i], i)?,
            time: self.time[i],
            node: self.node[i],
            dest: self.dest[i],
            n: self.n[i],
            proportion: self.proportion[i],
            select: self.select[i],
            shift: self.shift[i],
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SimResult<EventRecord>> + '_ {
        (0..self.len()).map(move |i| self.get(i))
    }
}
