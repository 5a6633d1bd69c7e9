// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds a trained core graph from the checkpoint directory:
//
//   train_config.json + vocabulary size → ModelParams
//   ModelParams → fresh CoreGraph on the inference backend
//   model_epoch_N.mpk.gz → weights loaded into it
//
// and exposes the two things a trained model is used for:
// scoring held-out text and sampling new text.

use anyhow::Result;
use burn::prelude::*;

use crate::application::train_use_case::TrainConfig;
use crate::domain::traits::Vocabulary;
use crate::infra::checkpoint::{CheckpointChoice, CheckpointManager};
use crate::ml::context::GraphContext;
use crate::ml::evaluator::{evaluate, EvalSummary};
use crate::ml::model::CoreGraph;
use crate::ml::sampler::SamplerGraph;

pub struct Inferencer<B: Backend> {
    core:   CoreGraph<B>,
    config: TrainConfig,
    ctx:    GraphContext<B>,
}

impl<B: Backend> Inferencer<B> {
    pub fn from_checkpoint<V: Vocabulary + ?Sized>(
        ckpt:   &CheckpointManager,
        vocab:  &V,
        choice: CheckpointChoice,
        device: B::Device,
    ) -> Result<Self> {
        let config = ckpt.load_config()?;
        let params = config.model_params(vocab.size());
        let ctx    = GraphContext::<B>::new(device).with_seed(config.seed);

        let core = params.build_core_graph(&ctx)?;
        let core = ckpt.load_model(core, choice, ctx.device())?;
        tracing::info!("Model loaded from checkpoint (V={}, H={})", core.vocab_size, core.hidden_size);

        Ok(Self { core, config, ctx })
    }

    pub fn core(&self) -> &CoreGraph<B> {
        &self.core
    }

    /// Score an id stream with the batch shape used in training.
    pub fn evaluate(&self, ids: &[u32]) -> EvalSummary {
        evaluate(&self.core, ids, self.config.batch_size, self.config.max_time)
    }

    /// Turn the loaded weights into a sampler seeded with `seed`.
    pub fn into_sampler(self, seed: u64) -> SamplerGraph<B> {
        let ctx = self.ctx.with_seed(seed);
        self.core.build_sampler_graph(&ctx)
    }
}
