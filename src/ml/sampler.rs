// ============================================================
// Layer 5 — Sampler Graph
// ============================================================
// Draws one token per (batch, time) position from the
// categorical distribution softmax(logits). Burn has no
// multinomial op, so probabilities are pulled to the host and
// sampled there with rand's WeightedIndex.
//
// Autoregressive generation (feed a sample back as the next
// input) is built on top of sample_step in `generate`.

use anyhow::{Context, Result};
use burn::{prelude::*, tensor::activation::softmax};
use rand::{
    distributions::{Distribution as _, WeightedIndex},
    rngs::StdRng,
    Rng,
};

use crate::ml::cell::LstmState;
use crate::ml::context::{GraphContext, SAMPLER_STREAM};
use crate::ml::model::CoreGraph;
use crate::ml::params::RuntimeFeed;

impl<B: Backend> CoreGraph<B> {
    pub fn build_sampler_graph(self, ctx: &GraphContext<B>) -> SamplerGraph<B> {
        SamplerGraph { core: self, rng: ctx.rng(SAMPLER_STREAM) }
    }
}

pub struct SamplerGraph<B: Backend> {
    core: CoreGraph<B>,
    rng:  StdRng,
}

/// Sample one column index per row of a row-major [rows, cols] matrix
/// of non-negative weights.
pub fn multinomial<R: Rng>(probs: &[f32], cols: usize, rng: &mut R) -> Result<Vec<i32>> {
    probs
        .chunks(cols)
        .enumerate()
        .map(|(row, weights)| {
            let dist = WeightedIndex::new(weights)
                .with_context(|| format!("Invalid sampling distribution in row {row}"))?;
            Ok(dist.sample(rng) as i32)
        })
        .collect()
}

impl<B: Backend> SamplerGraph<B> {
    pub fn core(&self) -> &CoreGraph<B> {
        &self.core
    }

    /// pred_samples: [batch, time, V] logits → [batch, time, 1] token ids.
    pub fn pred_samples(&mut self, logits: Tensor<B, 3>) -> Result<Tensor<B, 3, Int>> {
        let [batch, time, v] = logits.dims();
        let device = logits.device();

        let probs: Vec<f32> = softmax(logits.reshape([batch * time, v]), 1)
            .into_data()
            .to_vec::<f32>()
            .map_err(|e| anyhow::anyhow!("Cannot read probabilities: {e:?}"))?;

        let samples = multinomial(&probs, v, &mut self.rng)?;
        Ok(Tensor::<B, 1, Int>::from_ints(samples.as_slice(), &device).reshape([batch, time, 1]))
    }

    /// Run the core graph on `input_w` from `initial_h` and sample every
    /// position. Returns the samples and the final state.
    pub fn sample_step(
        &mut self,
        input_w:   Tensor<B, 2, Int>,
        initial_h: LstmState<B>,
    ) -> Result<(Tensor<B, 3, Int>, LstmState<B>)> {
        let out = self.core.forward(input_w, initial_h, &RuntimeFeed::inference());
        let samples = self.pred_samples(out.logits)?;
        Ok((samples, out.final_h))
    }

    /// Feed `prefix`, then keep sampling one token at a time with the
    /// carried state until `stop` is produced or `max_len` tokens were
    /// generated. Returns only the generated ids (including `stop`).
    pub fn generate(&mut self, prefix: &[u32], max_len: usize, stop: Option<u32>) -> Result<Vec<u32>> {
        anyhow::ensure!(!prefix.is_empty(), "Generation needs at least one prefix token");
        let device = self.core.w_out.val().device();

        let mut state = self.core.zero_state(1);
        let mut input: Vec<i32> = prefix.iter().map(|&id| id as i32).collect();
        let mut generated = Vec::with_capacity(max_len);

        while generated.len() < max_len {
            let len = input.len();
            let input_w = Tensor::<B, 1, Int>::from_ints(input.as_slice(), &device).reshape([1, len]);
            let (samples, next_state) = self.sample_step(input_w, state)?;
            state = next_state;

            let samples: Vec<i32> = samples
                .into_data()
                .convert::<i32>()
                .to_vec::<i32>()
                .map_err(|e| anyhow::anyhow!("Cannot read samples: {e:?}"))?;
            let next = *samples.last().context("Sampler returned no tokens")?;

            generated.push(next as u32);
            if stop == Some(next as u32) {
                break;
            }
            input = vec![next];
        }

        tracing::debug!("Generated {} tokens", generated.len());
        Ok(generated)
    }
}
