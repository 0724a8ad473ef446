//! One-time `tracing` subscriber setup, shared by every demo binary and task
//! runner so a run can be repeated without double-initializing the global
//! subscriber.

use once_cell::sync::OnceCell;

static INIT: OnceCell<()> = OnceCell::new();

/// Installs a `tracing_subscriber` fmt layer honoring `RUST_LOG`, defaulting
/// to `info`. Safe to call more than once; only the first call takes effect.
pub fn init() {
    INIT.get_or_init(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}
