//! Event store, splitter, and the two classes of scheduled-event processor
//! (`spec.md` §4.3–§4.5).

pub mod e1;
pub mod e2;
pub mod splitter;
pub mod store;

pub use e1::{process_e1, E1Queue};
pub use e2::{process_e2, E2Queue};
pub use splitter::split_events;
pub use store::{EventColumns, EventKind};
