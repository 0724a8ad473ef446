//! External collaborator contracts (`spec.md` §4.1). The engine is generic
//! over these; the concrete propensity functions and post-time-step hooks
//! for a specific disease model are deliberately out of this crate's scope.

/// One propensity function per transition. Given the node's local state,
/// must return a finite, non-negative rate; the engine treats anything else
/// as `SimError::InvalidRate`.
pub trait Propensity: Send + Sync {
    fn rate(&self, u_node: &[i64], v_node: &[f64], ldata_node: &[f64], gdata: &[f64], t: f64) -> f64;
}

/// Blanket impl so a plain closure can be used directly as a `Propensity`.
impl<F> Propensity for F
where
    F: Fn(&[i64], &[f64], &[f64], &[f64], f64) -> f64 + Send + Sync,
{
    fn rate(&self, u_node: &[i64], v_node: &[f64], ldata_node: &[f64], gdata: &[f64], t: f64) -> f64 {
        self(u_node, v_node, ldata_node, gdata, t)
    }
}

/// Post-time-step hook: updates `v_new_node` in place; the return value is
/// `< 0` to fail the run, `> 0` to force a rate refresh for that node even if
/// no event touched it, `= 0` for no-op.
pub trait PostStepHook: Send + Sync {
    fn call(
        &self,
        v_new_node: &mut [f64],
        u_node: &[i64],
        v_node: &[f64],
        ldata_node: &[f64],
        gdata: &[f64],
        node_global_index: usize,
        t: f64,
    ) -> i32;
}

impl<F> PostStepHook for F
where
    F: Fn(&mut [f64], &[i64], &[f64], &[f64], &[f64], usize, f64) -> i32 + Send + Sync,
{
    fn call(
        &self,
        v_new_node: &mut [f64],
        u_node: &[i64],
        v_node: &[f64],
        ldata_node: &[f64],
        gdata: &[f64],
        node_global_index: usize,
        t: f64,
    ) -> i32 {
        self(v_new_node, u_node, v_node, ldata_node, gdata, node_global_index, t)
    }
}

/// A hook that never touches `v_new` and never forces a refresh; the
/// default when a model has no continuous state.
pub struct NoopPostStepHook;

impl PostStepHook for NoopPostStepHook {
    fn call(&self, _: &mut [f64], _: &[i64], _: &[f64], _: &[f64], _: &[f64], _: usize, _: f64) -> i32 {
        0
    }
}
