// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Full-softmax loss of a core graph over a whole id stream.
//
// The stream is cut exactly as for training and the final state
// of each batch is the initial state of the next. Dropout is off.
// Batch losses are weighted by their token count because the last
// window can be narrower than the others:
//
//   loss       = Σ loss_k · tokens_k / Σ tokens_k
//   perplexity = exp(loss)

use burn::prelude::*;

use crate::data::batcher::{BatchGenerator, TensorBatch};
use crate::ml::model::CoreGraph;
use crate::ml::params::RuntimeFeed;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSummary {
    /// Token-weighted mean cross-entropy (nats); NaN when no tokens were scored
    pub loss:       f64,
    pub perplexity: f64,
    pub tokens:     usize,
}

impl EvalSummary {
    pub fn is_empty(&self) -> bool {
        self.tokens == 0
    }
}

pub fn evaluate<B: Backend>(
    core:       &CoreGraph<B>,
    ids:        &[u32],
    batch_size: usize,
    max_time:   usize,
) -> EvalSummary {
    let batch_size = batch_size.max(1);
    let device = core.w_out.val().device();
    let feed   = RuntimeFeed::inference();

    let mut state      = core.zero_state(batch_size);
    let mut weighted   = 0.0f64;
    let mut tokens     = 0usize;

    for batch in BatchGenerator::new(ids, batch_size, max_time) {
        let t   = TensorBatch::<B>::from_batch(&batch, &device);
        let out = core.forward(t.input_w, state, &feed);
        let loss: f64 = core.loss(out.logits, t.target_y).into_scalar().elem::<f64>();

        weighted += loss * batch.num_tokens() as f64;
        tokens   += batch.num_tokens();
        state     = out.final_h;
    }

    let loss = if tokens > 0 { weighted / tokens as f64 } else { f64::NAN };
    tracing::debug!("Evaluated {} tokens: loss={:.4}", tokens, loss);

    EvalSummary { loss, perplexity: loss.exp(), tokens }
}
