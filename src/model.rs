//! Model assembly: the flat-array input contract of `spec.md` §6, gathered
//! into one validated struct before the driver allocates partition contexts.

use std::sync::Arc;

use serde::Deserialize;

use crate::callbacks::{NoopPostStepHook, PostStepHook, Propensity};
use crate::error::{SimError, SimResult};
use crate::events::store::EventColumns;
use crate::output::OutputSpec;
use crate::sparse::CscMatrix;

/// Index/size block of `spec.md` §3.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ModelDims {
    pub nn: usize,
    pub nc: usize,
    pub nt: usize,
    pub nd: usize,
    pub nld: usize,
}

/// The full set of flat arrays + callbacks the driver needs to run a
/// simulation, assembled by the host-language binding layer (out of scope
/// for this crate — see `spec.md` §1).
pub struct ModelInput {
    pub dims: ModelDims,
    pub u0: Vec<i64>,
    pub v0: Vec<f64>,
    pub ldata: Vec<f64>,
    pub gdata: Vec<f64>,
    pub s: CscMatrix<i64>,
    pub g: CscMatrix<i64>,
    pub e: CscMatrix<i64>,
    pub shift: CscMatrix<i64>,
    pub tspan: Vec<f64>,
    pub events: EventColumns,
    pub propensities: Vec<Arc<dyn Propensity>>,
    pub post_step: Arc<dyn PostStepHook>,
    pub nthread: usize,
    pub seed: u64,
    pub verbosity: u8,
    pub output: OutputSpec,
}

impl ModelInput {
    pub fn validate(&self) -> SimResult<()> {
        let d = self.dims;
        if self.u0.len() != d.nn * d.nc {
            return Err(SimError::AllocMemoryBuffer {
                reason: format!("u0 has {} entries, expected Nn*Nc = {}", self.u0.len(), d.nn * d.nc),
            });
        }
        if self.v0.len() != d.nn * d.nd {
            return Err(SimError::AllocMemoryBuffer {
                reason: format!("v0 has {} entries, expected Nn*Nd = {}", self.v0.len(), d.nn * d.nd),
            });
        }
        if self.ldata.len() != d.nn * d.nld {
            return Err(SimError::AllocMemoryBuffer {
                reason: format!("ldata has {} entries, expected Nn*Nld = {}", self.ldata.len(), d.nn * d.nld),
            });
        }
        if self.s.ncols != d.nt || self.g.ncols != d.nt {
            return Err(SimError::AllocMemoryBuffer {
                reason: "S and G must each have Nt columns".into(),
            });
        }
        if self.propensities.len() != d.nt {
            return Err(SimError::AllocMemoryBuffer {
                reason: format!("{} propensity functions supplied, expected Nt = {}", self.propensities.len(), d.nt),
            });
        }
        if self.tspan.is_empty() {
            return Err(SimError::AllocMemoryBuffer { reason: "tspan must have at least one point".into() });
        }
        if !self.tspan.windows(2).all(|w| w[1] > w[0]) {
            return Err(SimError::AllocMemoryBuffer { reason: "tspan must be strictly increasing".into() });
        }
        if self.nthread == 0 {
            return Err(SimError::UnsupportedParallelization { reason: "Nthread must be >= 1".into() });
        }
        if self.verbosity > 2 {
            return Err(SimError::AllocMemoryBuffer {
                reason: format!("verbosity must be in {{0,1,2}}, got {}", self.verbosity),
            });
        }
        let len = self.events.len();
        if ![self.events.time.len(), self.events.node.len(), self.events.dest.len(), self.events.n.len(),
             self.events.proportion.len(), self.events.select.len(), self.events.shift.len()]
            .iter()
            .all(|&l| l == len)
        {
            return Err(SimError::AllocMemoryBuffer { reason: "event columns have mismatched lengths".into() });
        }
        // `select`/`shift` are wire one-based (`spec.md` §3); `select` always
        // names a real column, `shift == 0` means "no shift" and is exempt.
        if let Some(&max_select) = self.events.select.iter().max() {
            if max_select == 0 || max_select - 1 >= self.e.ncols {
                return Err(SimError::AllocMemoryBuffer {
                    reason: format!("event select column {max_select} out of range for E (Ncols = {})", self.e.ncols),
                });
            }
        }
        if let Some(&max_shift) = self.events.shift.iter().max() {
            if max_shift != 0 && (max_shift - 1) as usize >= self.shift.ncols {
                return Err(SimError::AllocMemoryBuffer {
                    reason: format!("event shift column {max_shift} out of range for N (Ncols = {})", self.shift.ncols),
                });
            }
        }
        Ok(())
    }
}

/// Convenience builder for models with no continuous state and a no-op
/// post-step hook — the common case for a pure-SSA toy model in tests.
pub struct ModelInputBuilder {
    inner: ModelInput,
}

impl ModelInputBuilder {
    pub fn new(dims: ModelDims, u0: Vec<i64>, s: CscMatrix<i64>, g: CscMatrix<i64>, propensities: Vec<Arc<dyn Propensity>>) -> Self {
        let nn = dims.nn;
        let nd = dims.nd;
        let nld = dims.nld;
        Self {
            inner: ModelInput {
                dims,
                u0,
                v0: vec![0.0; nn * nd],
                ldata: vec![0.0; nn * nld],
                gdata: Vec::new(),
                s,
                g,
                e: CscMatrix::empty(dims.nc, 0),
                shift: CscMatrix::empty(dims.nc, 0),
                tspan: vec![0.0],
                events: EventColumns::new(),
                propensities,
                post_step: Arc::new(NoopPostStepHook),
                nthread: 1,
                seed: 0,
                verbosity: 0,
                output: OutputSpec::dense(),
            },
        }
    }

    pub fn tspan(mut self, tspan: Vec<f64>) -> Self {
        self.inner.tspan = tspan;
        self
    }

    pub fn events(mut self, events: EventColumns) -> Self {
        self.inner.events = events;
        self
    }

    pub fn selector(mut self, e: CscMatrix<i64>) -> Self {
        self.inner.e = e;
        self
    }

    pub fn shift(mut self, shift: CscMatrix<i64>) -> Self {
        self.inner.shift = shift;
        self
    }

    pub fn nthread(mut self, nthread: usize) -> Self {
        self.inner.nthread = nthread;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.inner.seed = seed;
        self
    }

    pub fn verbosity(mut self, verbosity: u8) -> Self {
        self.inner.verbosity = verbosity;
        self
    }

    pub fn build(self) -> ModelInput {
        self.inner
    }
}

/// The `serde::Deserialize`-able subset of `ModelInput`: every flat array and
/// scalar, everything that is data rather than code. Propensities and the
/// post-step hook are Rust trait objects and cannot come from JSON, so a
/// `ModelConfig` is always paired with code-supplied callbacks via
/// [`ModelConfig::into_model`] (`spec.md` §6, `SPEC_FULL.md` §6/A2).
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub dims: ModelDims,
    pub u0: Vec<i64>,
    #[serde(default)]
    pub v0: Vec<f64>,
    #[serde(default)]
    pub ldata: Vec<f64>,
    #[serde(default)]
    pub gdata: Vec<f64>,
    pub s: CscMatrix<i64>,
    pub g: CscMatrix<i64>,
    #[serde(default)]
    pub e: CscMatrix<i64>,
    #[serde(default)]
    pub shift: CscMatrix<i64>,
    pub tspan: Vec<f64>,
    #[serde(default)]
    pub events: EventColumns,
    #[serde(default = "ModelConfig::default_nthread")]
    pub nthread: usize,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub verbosity: u8,
}

impl ModelConfig {
    fn default_nthread() -> usize {
        1
    }

    /// Pairs this configuration with the propensities and post-step hook a
    /// binding layer compiles in code, producing a runnable `ModelInput`.
    pub fn into_model(self, propensities: Vec<Arc<dyn Propensity>>, post_step: Arc<dyn PostStepHook>) -> ModelInput {
        ModelInput {
            dims: self.dims,
            u0: self.u0,
            v0: self.v0,
            ldata: self.ldata,
            gdata: self.gdata,
            s: self.s,
            g: self.g,
            e: self.e,
            shift: self.shift,
            tspan: self.tspan,
            events: self.events,
            propensities,
            post_step,
            nthread: self.nthread,
            seed: self.seed,
            verbosity: self.verbosity,
            output: OutputSpec::dense(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NoopPostStepHook;

    #[test]
    fn config_deserializes_from_json_and_fills_in_defaults() {
        let json = r#"{
            "dims": {"nn": 1, "nc": 2, "nt": 1, "nd": 0, "nld": 0},
            "u0": [10, 0],
            "s": {"nrows": 2, "ncols": 1, "ir": [0, 1], "jc": [0, 2], "pr": [-1, 1]},
            "g": {"nrows": 1, "ncols": 1, "ir": [0], "jc": [0, 1], "pr": [1]},
            "tspan": [0.0, 10.0]
        }"#;
        let config: ModelConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.nthread, 1);
        assert_eq!(config.seed, 0);
        assert!(config.events.is_empty());

        let model = config.into_model(vec![], Arc::new(NoopPostStepHook));
        assert!(model.validate().is_err(), "0 propensities but Nt=1 should fail validation");
    }
}
