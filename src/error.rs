//! Stable error taxonomy for the engine, matching the wire-stable integer
//! codes a binding layer needs to map back to a caller-facing message.

use thiserror::Error;

/// Fatal errors raised by the engine. Every variant is terminal: the run
/// stops at the first error seen in a phase (see `driver`).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("compartment count went negative: node {node}, compartment {compartment}")]
    NegativeState { node: usize, compartment: usize },

    #[error("failed to allocate or validate a simulation buffer: {reason}")]
    AllocMemoryBuffer { reason: String },

    #[error("requested parallelization is unsupported: {reason}")]
    UnsupportedParallelization { reason: String },

    #[error("sample_select failed: {reason}")]
    SampleSelect { reason: String },

    #[error("transition rate became non-finite or negative: node {node}, transition {transition}, value {value}")]
    InvalidRate { node: usize, transition: usize, value: f64 },

    #[error("undefined event kind encountered at event index {index}")]
    UndefinedEvent { index: usize },
}

impl SimError {
    /// Stable integer code matching `spec.md` §6's taxonomy. `OK = 0` has no
    /// variant here: it is the absence of an error (`Ok(())`).
    pub fn as_code(&self) -> i32 {
        match self {
            SimError::NegativeState { .. } => 1,
            SimError::AllocMemoryBuffer { .. } => 2,
            SimError::UnsupportedParallelization { .. } => 3,
            SimError::SampleSelect { .. } => 4,
            SimError::InvalidRate { .. } => 5,
            SimError::UndefinedEvent { .. } => 6,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
