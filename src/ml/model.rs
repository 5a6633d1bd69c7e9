// ============================================================
// Layer 5 — Core Graph (RNNLM)
// ============================================================
// The part of the model every use needs:
//
//   input_w [b, t]  ──embedding──▶  x [b, t, H]
//                   ──LSTM unroll─▶ output_state [b, t, H], final_h
//                   ──matmul3d + b_out──▶ logits [b, t, V]
//                   ──softmax CE vs target_y──▶ loss (mean over b·t)
//
// Parameters declared here (embedding, output weights, output
// bias) plus the LSTM weights are the single parameter set the
// train and sampler graphs reuse.
//
// Reference: Mikolov et al. (2010) Recurrent neural network based language model
//            Burn Book §3 (Building Blocks)

use anyhow::Result;
use burn::{
    module::{Param, ParamId},
    nn::{loss::CrossEntropyLossConfig, Embedding, EmbeddingConfig, Initializer},
    prelude::*,
};

use crate::ml::cell::{make_lstm_cell, LstmState, MultiLstmCell};
use crate::ml::context::GraphContext;
use crate::ml::params::{ModelParams, RuntimeFeed};

/// Embedding and output projection are drawn from U(-INIT_SCALE, INIT_SCALE).
pub const INIT_SCALE: f64 = 1.0;

/// Multiply a rank-3 tensor by a matrix along its last dimension.
///
/// X: [m, n, k], W: [k, l] → XW: [m, n, l]
pub fn matmul3d<B: Backend>(x: Tensor<B, 3>, w: Tensor<B, 2>) -> Tensor<B, 3> {
    let [m, n, k] = x.dims();
    let [_, l]    = w.dims();
    x.reshape([m * n, k]).matmul(w).reshape([m, n, l])
}

impl ModelParams {
    /// Build the core graph: declares the embedding table, the recurrent
    /// cell and the output projection on the context's device.
    pub fn build_core_graph<B: Backend>(&self, ctx: &GraphContext<B>) -> Result<CoreGraph<B>> {
        self.validate()?;
        let device = ctx.device();
        let (v, h) = (self.vocab_size, self.hidden_size);
        let uniform = Initializer::Uniform { min: -INIT_SCALE, max: INIT_SCALE };

        let embedding = EmbeddingConfig::new(v, h)
            .with_initializer(uniform.clone())
            .init(device);
        let cell  = make_lstm_cell(h, self.num_layers, device);
        let w_out = uniform.init([h, v], device);
        let b_out = Initializer::Zeros.init([v], device);

        tracing::debug!(
            "Core graph built: V={} H={} layers={}",
            v, h, self.num_layers
        );

        Ok(CoreGraph {
            embedding,
            cell,
            w_out,
            b_out,
            vocab_size:  v,
            hidden_size: h,
            softmax_ns:  self.softmax_ns,
        })
    }
}

#[derive(Module, Debug)]
pub struct CoreGraph<B: Backend> {
    /// W_in [V, H]
    pub embedding:   Embedding<B>,
    pub cell:        MultiLstmCell<B>,
    /// W_out [H, V]
    pub w_out:       Param<Tensor<B, 2>>,
    /// b_out [V]
    pub b_out:       Param<Tensor<B, 1>>,
    pub vocab_size:  usize,
    pub hidden_size: usize,
    pub softmax_ns:  usize,
}

/// Everything one forward pass of the core graph produces.
#[derive(Debug, Clone)]
pub struct CoreOutput<B: Backend> {
    /// Top-layer LSTM outputs [batch, time, H]
    pub output_state: Tensor<B, 3>,
    /// State after the last time step, to seed the next batch
    pub final_h:      LstmState<B>,
    /// Unnormalised scores [batch, time, V]
    pub logits:       Tensor<B, 3>,
}

/// Ids of every trainable parameter, grouped by rank.
#[derive(Debug, Clone, Default)]
pub struct ParamIds {
    pub matrices: Vec<ParamId>,
    pub vectors:  Vec<ParamId>,
}

impl<B: Backend> CoreGraph<B> {
    /// initial_h: the zero state for a batch of `batch_size` rows.
    pub fn zero_state(&self, batch_size: usize) -> LstmState<B> {
        self.cell.zero_state(batch_size, &self.w_out.val().device())
    }

    pub fn forward(
        &self,
        input_w:   Tensor<B, 2, Int>,
        initial_h: LstmState<B>,
        feed:      &RuntimeFeed,
    ) -> CoreOutput<B> {
        let x = self.embedding.forward(input_w);
        let (output_state, final_h) = self.cell.unroll(x, initial_h, feed.dropout_keep_prob());
        let logits = self.project(output_state.clone());
        CoreOutput { output_state, final_h, logits }
    }

    /// logits = matmul3d(output_state, W_out) + b_out
    pub fn project(&self, output_state: Tensor<B, 3>) -> Tensor<B, 3> {
        let v = self.vocab_size;
        matmul3d(output_state, self.w_out.val()) + self.b_out.val().reshape([1, 1, v])
    }

    /// Mean full-softmax cross-entropy over every (batch, time) position.
    pub fn loss(&self, logits: Tensor<B, 3>, target_y: Tensor<B, 2, Int>) -> Tensor<B, 1> {
        let [batch, time, v] = logits.dims();
        let device = logits.device();
        CrossEntropyLossConfig::new()
            .init(&device)
            .forward(logits.reshape([batch * time, v]), target_y.reshape([batch * time]))
    }

    pub fn param_ids(&self) -> ParamIds {
        let mut ids = ParamIds::default();
        ids.matrices.push(self.embedding.weight.id);
        for layer in &self.cell.layers {
            ids.matrices.push(layer.kernel.id);
            ids.vectors.push(layer.bias.id);
        }
        ids.matrices.push(self.w_out.id);
        ids.vectors.push(self.b_out.id);
        ids
    }
}
