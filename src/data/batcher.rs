// ============================================================
// Layer 4 — Language-Model Batcher
// ============================================================
// Turns one long stream of token ids into [batch, time] grids
// whose rows continue across consecutive batches, so the final
// LSTM state of batch k is a valid initial state for batch k+1.
//
// How the stream is cut:
//   1. Keep clip = ((len - 1) / batch) * batch ids so the
//      stream divides evenly into `batch` rows and every input
//      still has a next token.
//   2. inputs  = ids[0 .. clip]
//      targets = ids[1 .. clip + 1]
//   3. Reshape both row-major to [batch, clip / batch].
//   4. Yield consecutive column windows of width max_time; the
//      last window may be narrower.
//
// Example, ids 0..=10, batch = 2, max_time = 3:
//   inputs rows:  [0 1 2 3 4]   targets rows: [1 2 3 4 5]
//                 [5 6 7 8 9]                 [6 7 8 9 10]
//   batch 1: cols 0..3, batch 2: cols 3..5
//
// TensorBatch then moves a batch onto a Burn device.
//
// Reference: Burn Book §4 (Batcher)
//            Zaremba et al. (2014) PTB batching scheme

use burn::prelude::*;

use crate::domain::token_grid::{LmBatch, TokenGrid};

// ─── BatchGenerator ───────────────────────────────────────────────────────────
/// Iterator over the batches of one id stream.
pub struct BatchGenerator {
    inputs:   Vec<u32>,
    targets:  Vec<u32>,
    rows:     usize,
    row_len:  usize,
    max_time: usize,
    cursor:   usize,
}

impl BatchGenerator {
    /// Streams with fewer than `batch_size + 1` ids produce no batches.
    pub fn new(ids: &[u32], batch_size: usize, max_time: usize) -> Self {
        let batch_size = batch_size.max(1);
        let max_time   = max_time.max(1);
        let clip = (ids.len().saturating_sub(1) / batch_size) * batch_size;

        Self {
            inputs:   ids[..clip].to_vec(),
            targets:  ids.get(1..clip + 1).map(<[u32]>::to_vec).unwrap_or_default(),
            rows:     batch_size,
            row_len:  clip / batch_size,
            max_time,
            cursor:   0,
        }
    }

    /// Number of batches this generator yields in total.
    pub fn num_batches(&self) -> usize {
        (self.row_len + self.max_time - 1) / self.max_time
    }

    fn window(&self, flat: &[u32], start: usize, width: usize) -> Vec<u32> {
        (0..self.rows)
            .flat_map(|r| {
                let offset = r * self.row_len + start;
                flat[offset..offset + width].iter().copied()
            })
            .collect()
    }
}

impl Iterator for BatchGenerator {
    type Item = LmBatch;

    fn next(&mut self) -> Option<LmBatch> {
        if self.cursor >= self.row_len {
            return None;
        }
        let width = self.max_time.min(self.row_len - self.cursor);
        let start = self.cursor;
        self.cursor += width;

        // Shapes are consistent by construction
        let inputs  = TokenGrid::new(self.rows, width, self.window(&self.inputs, start, width)).ok()?;
        let targets = TokenGrid::new(self.rows, width, self.window(&self.targets, start, width)).ok()?;
        LmBatch::new(inputs, targets).ok()
    }
}

// ─── TensorBatch ──────────────────────────────────────────────────────────────
/// A batch on a device, ready for the forward pass.
#[derive(Debug, Clone)]
pub struct TensorBatch<B: Backend> {
    /// input_w — [batch, time]
    pub input_w:  Tensor<B, 2, Int>,
    /// target_y — [batch, time]
    pub target_y: Tensor<B, 2, Int>,
}

impl<B: Backend> TensorBatch<B> {
    pub fn from_batch(batch: &LmBatch, device: &B::Device) -> Self {
        Self {
            input_w:  grid_to_tensor(&batch.inputs, device),
            target_y: grid_to_tensor(&batch.targets, device),
        }
    }
}

/// Burn Int tensors are built from i32 data.
pub fn grid_to_tensor<B: Backend>(grid: &TokenGrid, device: &B::Device) -> Tensor<B, 2, Int> {
    let flat: Vec<i32> = grid.ids().iter().map(|&x| x as i32).collect();
    Tensor::<B, 1, Int>::from_ints(flat.as_slice(), device).reshape(grid.shape())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batches_follow_rows_across_windows() {
        let ids: Vec<u32> = (0..=10).collect();
        let batches: Vec<LmBatch> = BatchGenerator::new(&ids, 2, 3).collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].inputs.row(0), &[0, 1, 2]);
        assert_eq!(batches[0].inputs.row(1), &[5, 6, 7]);
        assert_eq!(batches[0].targets.row(1), &[6, 7, 8]);
        // Last window is narrower
        assert_eq!(batches[1].inputs.row(0), &[3, 4]);
        assert_eq!(batches[1].targets.row(1), &[9, 10]);
    }

    #[test]
    fn test_targets_are_inputs_shifted_by_one() {
        let ids: Vec<u32> = (0..40).collect();
        for batch in BatchGenerator::new(&ids, 3, 4) {
            for (i, t) in batch.inputs.ids().iter().zip(batch.targets.ids()) {
                assert_eq!(*t, i + 1);
            }
        }
    }

    #[test]
    fn test_num_batches_matches_iteration() {
        let ids: Vec<u32> = (0..101).collect();
        let gen = BatchGenerator::new(&ids, 4, 7);
        let expected = gen.num_batches();
        assert_eq!(gen.count(), expected);
    }

    #[test]
    fn test_short_stream_gives_no_batches() {
        assert_eq!(BatchGenerator::new(&[1, 2], 4, 5).count(), 0);
        assert_eq!(BatchGenerator::new(&[], 1, 5).count(), 0);
    }

    #[test]
    fn test_tensor_batch_shapes() {
        use burn::backend::NdArray;
        let ids: Vec<u32> = (0..13).collect();
        let batch = BatchGenerator::new(&ids, 2, 4).next().unwrap();
        let t = TensorBatch::<NdArray>::from_batch(&batch, &Default::default());
        assert_eq!(t.input_w.dims(), [2, 4]);
        assert_eq!(t.target_y.dims(), [2, 4]);
    }
}
