//! Dense/sparse trajectory output (`spec.md` §3, §4.7, §6). One snapshot per
//! `tspan` entry once that time has been strictly passed.

/// A sparse output skeleton: per-time-point column pointers and row indices
/// into the flattened `node * width + field` space, supplied by the
/// collaborator binding ahead of the run.
#[derive(Debug, Clone)]
pub struct SparseSkeleton {
    pub ir: Vec<usize>,
    pub jc: Vec<usize>,
}

impl SparseSkeleton {
    pub fn nnz(&self) -> usize {
        self.ir.len()
    }
}

/// Per-field output mode: dense, sparse (skeleton supplied by the caller),
/// or absent (the caller did not ask for this field at all).
pub enum FieldOutput<T> {
    Dense(Vec<T>),
    Sparse { skeleton: SparseSkeleton, pr: Vec<T> },
    None,
}

impl<T: Copy + Default> FieldOutput<T> {
    pub fn dense(tlen: usize, width: usize) -> Self {
        FieldOutput::Dense(vec![T::default(); tlen * width])
    }

    pub fn sparse(skeleton: SparseSkeleton) -> Self {
        let nnz = skeleton.nnz();
        FieldOutput::Sparse { skeleton, pr: vec![T::default(); nnz] }
    }

    /// Writes time-point `k`'s snapshot of a flattened `width`-wide field.
    pub fn write_snapshot(&mut self, k: usize, width: usize, values: &[T]) {
        match self {
            FieldOutput::Dense(buf) => {
                buf[k * width..(k + 1) * width].copy_from_slice(values);
            }
            FieldOutput::Sparse { skeleton, pr } => {
                let start = skeleton.jc[k];
                let end = skeleton.jc[k + 1];
                for idx in start..end {
                    let row = skeleton.ir[idx];
                    pr[idx] = values[row];
                }
            }
            FieldOutput::None => {}
        }
    }
}

/// What the caller wants written for `u` (integer compartments) and `v`
/// (continuous state), decided before the run starts.
pub enum OutputSpec {
    Dense,
    Sparse { u_skeleton: Option<SparseSkeleton>, v_skeleton: Option<SparseSkeleton> },
}

impl OutputSpec {
    pub fn dense() -> Self {
        OutputSpec::Dense
    }
}

/// The materialized trajectory once a run completes.
#[derive(Debug)]
pub struct Trajectory {
    pub tspan: Vec<f64>,
    pub u: FieldOutputOwned<i64>,
    pub v: FieldOutputOwned<f64>,
}

/// A `Serialize`-free snapshot of `FieldOutput`'s payload, used only so
/// `Trajectory` can derive `Serialize` for its scalar fields while the
/// possibly-large buffers are serialized explicitly by callers that want
/// them (`Trajectory::to_json_value`).
#[derive(Debug)]
pub enum FieldOutputOwned<T> {
    Dense(Vec<T>),
    Sparse { ir: Vec<usize>, jc: Vec<usize>, pr: Vec<T> },
    None,
}

impl<T> From<FieldOutput<T>> for FieldOutputOwned<T> {
    fn from(f: FieldOutput<T>) -> Self {
        match f {
            FieldOutput::Dense(v) => FieldOutputOwned::Dense(v),
            FieldOutput::Sparse { skeleton, pr } => FieldOutputOwned::Sparse { ir: skeleton.ir, jc: skeleton.jc, pr },
            FieldOutput::None => FieldOutputOwned::None,
        }
    }
}

impl Trajectory {
    /// Serializes the full trajectory (scalars + buffers) to a JSON value,
    /// in the spirit of the teacher's `SystemStateTimeSeries::save`.
    pub fn to_json_value(&self) -> serde_json::Value {
        let u = match &self.u {
            FieldOutputOwned::Dense(v) => serde_json::json!({ "dense": v }),
            FieldOutputOwned::Sparse { ir, jc, pr } => serde_json::json!({ "ir": ir, "jc": jc, "pr": pr }),
            FieldOutputOwned::None => serde_json::Value::Null,
        };
        let v = match &self.v {
            FieldOutputOwned::Dense(vv) => serde_json::json!({ "dense": vv }),
            FieldOutputOwned::Sparse { ir, jc, pr } => serde_json::json!({ "ir": ir, "jc": jc, "pr": pr }),
            FieldOutputOwned::None => serde_json::Value::Null,
        };
        serde_json::json!({ "tspan": self.tspan, "u": u, "v": v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_write_snapshot_places_block() {
        let mut out = FieldOutput::<i64>::dense(3, 2);
        out.write_snapshot(1, 2, &[7, 8]);
        if let FieldOutput::Dense(buf) = out {
            assert_eq!(buf, vec![0, 0, 7, 8, 0, 0]);
        } else {
            panic!("expected dense");
        }
    }

    #[test]
    fn sparse_write_snapshot_scatters_selected_rows() {
        let skeleton = SparseSkeleton { ir: vec![0, 3], jc: vec![0, 1, 2] };
        let mut out = FieldOutput::<i64>::sparse(skeleton);
        out.write_snapshot(0, 4, &[10, 20, 30, 40]);
        out.write_snapshot(1, 4, &[1, 2, 3, 4]);
        if let FieldOutput::Sparse { pr, .. } = out {
            assert_eq!(pr, vec![10, 4]);
        } else {
            panic!("expected sparse");
        }
    }
}
