//! Progress reporting (`spec.md` §6): percent-complete per day at
//! verbosity >= 1, silent at verbosity 0. Verbosity 2 additionally drives an
//! interactive `indicatif` bar, matching the teacher's per-epoch
//! `ProgressBar` usage in `tasks::replicator_demographic::run`.

use indicatif::{ProgressBar, ProgressStyle};

pub struct ProgressReporter {
    verbosity: u8,
    t0: f64,
    t_end: f64,
    bar: Option<ProgressBar>,
}

impl ProgressReporter {
    pub fn new(verbosity: u8, tspan: &[f64]) -> Self {
        let t0 = tspan.first().copied().unwrap_or(0.0);
        let t_end = tspan.last().copied().unwrap_or(0.0);
        let bar = if verbosity >= 2 && t_end > t0 {
            let pb = ProgressBar::new(100);
            pb.set_style(
                ProgressStyle::with_template("{msg} [{bar:40.cyan/blue}] {pos}%")
                    .unwrap()
                    .progress_chars("=>-"),
            );
            pb.set_message("simulating");
            Some(pb)
        } else {
            None
        };
        Self { verbosity, t0, t_end, bar }
    }

    /// Reports progress after global time has advanced to `tt`.
    pub fn report(&self, tt: f64) {
        if self.verbosity == 0 {
            return;
        }
        let span = self.t_end - self.t0;
        let pct = if span > 0.0 { ((tt - self.t0) / span * 100.0).clamp(0.0, 100.0) } else { 100.0 };
        if let Some(bar) = &self.bar {
            bar.set_position(pct as u64);
        }
        if self.verbosity >= 1 {
            tracing::info!(percent = pct, t = tt, "simulation progress");
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("done");
        }
    }
}
