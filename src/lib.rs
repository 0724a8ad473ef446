//! Parallel, node-partitioned stochastic simulation engine for metapopulation
//! compartmental models: a Gillespie direct-method SSA per node plus two
//! classes of scheduled event (intra-node, inter-node), synchronized once per
//! simulated day (`spec.md` §4).
//!
//! The typical entry point is [`driver::run`], given a fully assembled
//! [`model::ModelInput`]. Concrete disease models live under [`tasks`]; the
//! engine itself (`sampler`, `events`, `ssa`, `driver`) knows nothing about
//! any specific compartment layout.

pub mod callbacks;
pub mod driver;
pub mod error;
pub mod events;
pub mod examples;
pub mod logging;
pub mod model;
pub mod output;
pub mod partition;
pub mod progress;
pub mod rng;
pub mod sampler;
pub mod sparse;
pub mod ssa;
pub mod tasks;

pub use driver::run;
pub use error::{SimError, SimResult};
pub use model::{ModelDims, ModelInput, ModelInputBuilder};
pub use output::Trajectory;
