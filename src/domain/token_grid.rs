// ============================================================
// Layer 3 — Token Grids
// ============================================================
// A language-model batch is two integer grids of the same
// shape [batch, time]:
//
//   inputs  — the token ids fed to the network (input_w)
//   targets — the token that follows each input (target_y)
//
// Example, stream "<s> the cat sat </s>" as one row:
//   inputs:  <s>  the  cat  sat
//   targets: the  cat  sat  </s>
//
// Every row has the full time length; there is no padding.
// These types are plain data so the data layer can build them
// without touching the ML framework.

use anyhow::{ensure, Result};

/// Row-major [rows, cols] grid of token ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrid {
    rows: usize,
    cols: usize,
    ids:  Vec<u32>,
}

impl TokenGrid {
    pub fn new(rows: usize, cols: usize, ids: Vec<u32>) -> Result<Self> {
        ensure!(rows > 0 && cols > 0, "Token grid must be non-empty, got [{rows}, {cols}]");
        ensure!(
            ids.len() == rows * cols,
            "Token grid [{rows}, {cols}] needs {} ids, got {}",
            rows * cols,
            ids.len()
        );
        Ok(Self { rows, cols, ids })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn cols(&self) -> usize { self.cols }

    pub fn shape(&self) -> [usize; 2] { [self.rows, self.cols] }

    pub fn ids(&self) -> &[u32] { &self.ids }

    #[cfg(test)]
    pub fn row(&self, r: usize) -> &[u32] {
        &self.ids[r * self.cols..(r + 1) * self.cols]
    }
}

/// Input and target grids of one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LmBatch {
    pub inputs:  TokenGrid,
    pub targets: TokenGrid,
}

impl LmBatch {
    pub fn new(inputs: TokenGrid, targets: TokenGrid) -> Result<Self> {
        ensure!(
            inputs.shape() == targets.shape(),
            "Target grid {:?} must match input grid {:?}",
            targets.shape(),
            inputs.shape()
        );
        Ok(Self { inputs, targets })
    }

    pub fn batch_size(&self) -> usize { self.inputs.rows() }

    pub fn max_time(&self) -> usize { self.inputs.cols() }

    /// Number of predicted positions (batch × time).
    pub fn num_tokens(&self) -> usize { self.batch_size() * self.max_time() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_rows_are_row_major() {
        let g = TokenGrid::new(2, 3, vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(g.row(0), &[1, 2, 3]);
        assert_eq!(g.row(1), &[4, 5, 6]);
    }

    #[test]
    fn test_grid_rejects_wrong_length() {
        assert!(TokenGrid::new(2, 3, vec![1, 2, 3]).is_err());
    }

    #[test]
    fn test_grid_rejects_empty_shape() {
        assert!(TokenGrid::new(0, 3, Vec::new()).is_err());
    }

    #[test]
    fn test_batch_requires_matching_shapes() {
        let inputs  = TokenGrid::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        let targets = TokenGrid::new(1, 4, vec![2, 3, 4, 5]).unwrap();
        assert!(LmBatch::new(inputs, targets).is_err());
    }

    #[test]
    fn test_batch_counts_tokens() {
        let inputs  = TokenGrid::new(2, 2, vec![1, 2, 3, 4]).unwrap();
        let targets = TokenGrid::new(2, 2, vec![2, 3, 4, 5]).unwrap();
        let batch   = LmBatch::new(inputs, targets).unwrap();
        assert_eq!(batch.num_tokens(), 4);
        assert_eq!(batch.max_time(), 2);
    }
}
