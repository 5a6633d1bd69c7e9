// ============================================================
// Layer 5 — Train Graph
// ============================================================
// Wraps the core graph with everything a training step needs:
//
//   train_loss  — mean sampled-softmax loss over all b·t positions
//   train_step  — forward, backward, clip, Adam update
//
// Gradient clipping uses the GLOBAL norm: all gradients are
// treated as one long vector and rescaled together by
//
//   clip / max(global_norm, clip)
//
// so their direction is preserved and the combined L2 norm never
// exceeds the threshold. Recurrent networks need this because a
// single bad batch can otherwise produce an exploding update.
//
// Reference: Pascanu et al. (2013) On the difficulty of training RNNs
//            Kingma & Ba (2015) Adam

use burn::{
    module::AutodiffModule,
    optim::{AdamConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::rngs::StdRng;

use crate::data::batcher::TensorBatch;
use crate::domain::token_grid::LmBatch;
use crate::ml::cell::LstmState;
use crate::ml::context::{GraphContext, CANDIDATE_STREAM};
use crate::ml::model::{CoreGraph, ParamIds};
use crate::ml::params::{RuntimeFeed, MAX_GRAD_NORM};
use crate::ml::sampled_softmax::{sampled_softmax_loss, LogUniformSampler, SampledCandidates};
use crate::ml::sampler::SamplerGraph;

impl<B: AutodiffBackend> CoreGraph<B> {
    /// Build the train graph on top of this core graph. Takes ownership:
    /// from here on the parameters are updated through the train graph.
    pub fn build_train_graph(
        self,
        ctx:          &GraphContext<B>,
        optim_config: &AdamConfig,
    ) -> TrainGraph<B, impl Optimizer<CoreGraph<B>, B>> {
        let sampler = LogUniformSampler::new(self.vocab_size);
        tracing::debug!(
            "Train graph built: softmax_ns={} clip_norm={}",
            self.softmax_ns, MAX_GRAD_NORM
        );
        TrainGraph {
            core:      self,
            optim:     optim_config.init(),
            sampler,
            rng:       ctx.rng(CANDIDATE_STREAM),
            ctx:       ctx.clone(),
            clip_norm: MAX_GRAD_NORM,
        }
    }
}

pub struct TrainGraph<B: AutodiffBackend, O> {
    core:      CoreGraph<B>,
    optim:     O,
    sampler:   LogUniformSampler,
    rng:       StdRng,
    ctx:       GraphContext<B>,
    clip_norm: f64,
}

/// Result of one optimizer update.
#[derive(Debug, Clone)]
pub struct TrainStepOutput<B: Backend> {
    /// Mean sampled-softmax loss before the update
    pub train_loss: f64,
    /// Global gradient norm before clipping
    pub grad_norm:  f64,
    pub final_h:    LstmState<B>,
}

impl<B: AutodiffBackend, O: Optimizer<CoreGraph<B>, B>> TrainGraph<B, O> {
    pub fn core(&self) -> &CoreGraph<B> {
        &self.core
    }

    #[cfg(test)]
    pub fn clip_norm(&self) -> f64 {
        self.clip_norm
    }

    /// Mean sampled-softmax loss of `output_state` [b, t, H] against the
    /// row-major target ids.
    pub fn train_loss(
        &self,
        output_state: Tensor<B, 3>,
        targets:      &[u32],
        candidates:   &SampledCandidates,
    ) -> Tensor<B, 1> {
        let [batch, time, hidden] = output_state.dims();
        sampled_softmax_loss(
            self.core.w_out.val(),
            self.core.b_out.val(),
            output_state.reshape([batch * time, hidden]),
            targets,
            candidates,
            &self.sampler,
        )
        .mean()
    }

    /// One update: forward with the fed dropout setting, sampled-softmax
    /// loss, backward, global-norm clip, Adam step at the fed learning rate.
    pub fn train_step(
        &mut self,
        batch:     &LmBatch,
        initial_h: LstmState<B>,
        feed:      &RuntimeFeed,
    ) -> TrainStepOutput<B> {
        let tensors = TensorBatch::<B>::from_batch(batch, self.ctx.device());
        let out = self.core.forward(tensors.input_w, initial_h, feed);

        let candidates = self.sampler.sample_unique(self.core.softmax_ns, &mut self.rng);
        let loss = self.train_loss(out.output_state, batch.targets.ids(), &candidates);
        let train_loss: f64 = loss.clone().into_scalar().elem::<f64>();

        let grads = GradientsParams::from_grads(loss.backward(), &self.core);
        let (grads, grad_norm) = clip_by_global_norm::<B>(grads, &self.core.param_ids(), self.clip_norm);

        self.core = self.optim.step(feed.learning_rate, self.core.clone(), grads);

        TrainStepOutput { train_loss, grad_norm, final_h: out.final_h }
    }

    /// Snapshot of the current weights as a sampler on the inner backend.
    pub fn build_sampler_graph(&self) -> SamplerGraph<B::InnerBackend> {
        self.core
            .valid()
            .build_sampler_graph(&self.ctx.with_backend::<B::InnerBackend>())
    }
}

// ─── Global-norm Clipping ─────────────────────────────────────────────────────

fn squared_sum<B: Backend, const D: usize>(t: Tensor<B, D>) -> f64 {
    (t.clone() * t).sum().into_scalar().elem::<f64>()
}

/// L2 norm of all gradients in `grads` belonging to `ids`, taken together.
pub fn global_norm<B: AutodiffBackend>(grads: &GradientsParams, ids: &ParamIds) -> f64 {
    let mut total = 0.0;
    for id in &ids.matrices {
        if let Some(g) = grads.get::<B::InnerBackend, 2>(*id) {
            total += squared_sum(g);
        }
    }
    for id in &ids.vectors {
        if let Some(g) = grads.get::<B::InnerBackend, 1>(*id) {
            total += squared_sum(g);
        }
    }
    total.sqrt()
}

/// Rescale every gradient by `clip_norm / max(global_norm, clip_norm)`.
/// Returns the clipped gradients and the global norm before clipping.
pub fn clip_by_global_norm<B: AutodiffBackend>(
    mut grads: GradientsParams,
    ids:       &ParamIds,
    clip_norm: f64,
) -> (GradientsParams, f64) {
    let norm = global_norm::<B>(&grads, ids);
    if norm <= clip_norm || !norm.is_finite() {
        if !norm.is_finite() {
            tracing::warn!("Non-finite gradient norm; update left unclipped");
        }
        return (grads, norm);
    }

    let scale = clip_norm / norm;
    for id in &ids.matrices {
        if let Some(g) = grads.remove::<B::InnerBackend, 2>(*id) {
            grads.register::<B::InnerBackend, 2>(*id, g.mul_scalar(scale));
        }
    }
    for id in &ids.vectors {
        if let Some(g) = grads.remove::<B::InnerBackend, 1>(*id) {
            grads.register::<B::InnerBackend, 1>(*id, g.mul_scalar(scale));
        }
    }
    (grads, norm)
}
