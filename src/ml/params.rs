// ============================================================
// Layer 5 — Model and Training Hyperparameters
// ============================================================
// Two groups of knobs:
//
//   ModelParams  — the structure of the network. Fixed once the
//                  core graph is built: changing V or H would
//                  change the shape of every parameter.
//
//   RuntimeFeed  — values supplied on every step: the learning
//                  rate and whether dropout is on. These can be
//                  changed between batches without rebuilding.
//
// The clipping threshold is a plain constant shared by the
// train graph and the tests.

use anyhow::{ensure, Result};
use burn::prelude::*;

/// Global L2 norm the gradient vector is clipped to before every update.
pub const MAX_GRAD_NORM: f64 = 5.0;

/// Keep-probability applied by the dropout wrapper when dropout is enabled.
pub const DROPOUT_KEEP_PROB: f64 = 0.5;

#[derive(Config, Debug)]
pub struct ModelParams {
    /// Vocabulary size V.
    pub vocab_size:  usize,
    /// Hidden state (and embedding) dimension H.
    pub hidden_size: usize,
    /// Negative classes drawn per batch by the sampled softmax.
    #[config(default = 200)]
    pub softmax_ns:  usize,
    #[config(default = 1)]
    pub num_layers:  usize,
}

impl ModelParams {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.vocab_size  > 0, "vocab_size must be positive");
        ensure!(self.hidden_size > 0, "hidden_size must be positive");
        ensure!(self.num_layers  > 0, "num_layers must be at least 1");
        ensure!(self.softmax_ns  > 0, "softmax_ns must be positive");
        Ok(())
    }
}

/// Per-step values fed alongside a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuntimeFeed {
    pub learning_rate: f64,
    pub use_dropout:   bool,
}

impl RuntimeFeed {
    /// Feed for training steps: dropout follows `use_dropout`.
    pub fn training(learning_rate: f64, use_dropout: bool) -> Self {
        Self { learning_rate, use_dropout }
    }

    /// Feed for evaluation and sampling: dropout always off.
    pub fn inference() -> Self {
        Self::default()
    }

    /// 0.5 when dropout is enabled, otherwise 1.0 (dropout is a no-op).
    pub fn dropout_keep_prob(&self) -> f64 {
        if self.use_dropout { DROPOUT_KEEP_PROB } else { 1.0 }
    }
}

impl Default for RuntimeFeed {
    fn default() -> Self {
        Self { learning_rate: 0.0, use_dropout: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_model() {
        let p = ModelParams::new(10_000, 200);
        assert_eq!(p.softmax_ns, 200);
        assert_eq!(p.num_layers, 1);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_keep_prob_defaults_to_one() {
        assert_eq!(RuntimeFeed::default().dropout_keep_prob(), 1.0);
        assert_eq!(RuntimeFeed::inference().dropout_keep_prob(), 1.0);
    }

    #[test]
    fn test_keep_prob_is_half_with_dropout() {
        let feed = RuntimeFeed::training(0.01, true);
        assert_eq!(feed.dropout_keep_prob(), 0.5);
        assert_eq!(RuntimeFeed::training(0.01, false).dropout_keep_prob(), 1.0);
    }

    #[test]
    fn test_validate_rejects_zero_sizes() {
        assert!(ModelParams::new(0, 4).validate().is_err());
        assert!(ModelParams::new(10, 0).validate().is_err());
        assert!(ModelParams::new(10, 4).with_num_layers(0).validate().is_err());
        assert!(ModelParams::new(10, 4).with_softmax_ns(0).validate().is_err());
    }
}
