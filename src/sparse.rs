//! Compressed-column sparse matrix, the one representation shared by the
//! state-change matrix `S`, the dependency graph `G`, the event selector
//! matrix `E`, the shift matrix `N`, and the optional sparse output
//! skeletons `U_sparse` / `V_sparse`.

/// Column `j` lists `(ir[jc[j]..jc[j+1]], pr[jc[j]..jc[j+1]])` as its
/// (row, value) pairs. `jc` always has `ncols + 1` entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CscMatrix<T> {
    pub nrows: usize,
    pub ncols: usize,
    pub ir: Vec<usize>,
    pub jc: Vec<usize>,
    pub pr: Vec<T>,
}

impl<T> Default for CscMatrix<T> {
    /// A `0x0` matrix with one (empty) column pointer, the natural default
    /// for config fields a caller may omit (`model::ModelConfig`).
    fn default() -> Self {
        Self { nrows: 0, ncols: 0, ir: Vec::new(), jc: vec![0], pr: Vec::new() }
    }
}

impl<T: Copy> CscMatrix<T> {
    /// Build from already-assembled columnar data. No validation beyond
    /// shape: callers (model assembly) are responsible for well-formedness.
    pub fn new(nrows: usize, ncols: usize, ir: Vec<usize>, jc: Vec<usize>, pr: Vec<T>) -> Self {
        debug_assert_eq!(jc.len(), ncols + 1, "jc must have ncols+1 entries");
        debug_assert_eq!(ir.len(), pr.len(), "ir and pr must have equal length");
        Self { nrows, ncols, ir, jc, pr }
    }

    /// An empty matrix with `ncols` columns, all empty.
    pub fn empty(nrows: usize, ncols: usize) -> Self {
        Self { nrows, ncols, ir: Vec::new(), jc: vec![0; ncols + 1], pr: Vec::new() }
    }

    /// Row indices and values of column `j`.
    #[inline]
    pub fn column(&self, j: usize) -> (&[usize], &[T]) {
        let start = self.jc[j];
        let end = self.jc[j + 1];
        (&self.ir[start..end], &self.pr[start..end])
    }

    #[inline]
    pub fn column_len(&self, j: usize) -> usize {
        self.jc[j + 1] - self.jc[j]
    }

    /// Value stored at `(row, col)`, or `None` if that entry is an implicit
    /// structural zero. Linear scan over the column's (typically short)
    /// entry list.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        let (rows, vals) = self.column(col);
        rows.iter().position(|&r| r == row).map(|i| vals[i])
    }
}

/// Column-major builder: push one column's (row, value) pairs at a time in
/// row order, then `finish()`. Used by model assembly and tests so callers
/// never have to hand-compute `jc` offsets.
pub struct CscBuilder<T> {
    nrows: usize,
    ir: Vec<usize>,
    jc: Vec<usize>,
    pr: Vec<T>,
}

impl<T: Copy> CscBuilder<T> {
    pub fn new(nrows: usize) -> Self {
        Self { nrows, ir: Vec::new(), jc: vec![0], pr: Vec::new() }
    }

    pub fn push_column(mut self, entries: &[(usize, T)]) -> Self {
        for &(row, value) in entries {
            debug_assert!(row < self.nrows, "row index out of bounds");
            self.ir.push(row);
            self.pr.push(value);
        }
        self.jc.push(self.ir.len());
        self
    }

    pub fn finish(self) -> CscMatrix<T> {
        let ncols = self.jc.len() - 1;
        CscMatrix::new(self.nrows, ncols, self.ir, self.jc, self.pr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_round_trips_columns() {
        let b = CscBuilder::<i64>::new(3);
        let b = b.push_column(&[(0, 1), (2, -1)]);
        let b = b.push_column(&[]);
        let b = b.push_column(&[(1, 5)]);
        let m = b.finish();
        assert_eq!(m.ncols, 3);
        assert_eq!(m.column(0), (&[0usize, 2][..], &[1i64, -1][..]));
        assert_eq!(m.column(1), (&[][..], &[][..]));
        assert_eq!(m.column(2), (&[1usize][..], &[5i64][..]));
    }
}
