// ============================================================
// Layer 5 — LSTM Cell
// ============================================================
// A basic LSTM cell with a dropout wrapper, stacked into a
// multi-layer cell and unrolled over the time dimension.
//
// One step of a layer, with [x, h] concatenated along the
// feature axis and projected to four gate blocks (i, j, f, o):
//
//   gates = [x, h_prev] · K + b          K: [in + H, 4H]
//   c     = c_prev * σ(f + forget_bias) + σ(i) * tanh(j)
//   h     = tanh(c) * σ(o)
//
// The forget bias is 0. Every layer is wrapped in dropout on
// both its input and its output, using the keep-probability
// fed for the current step; the recurrent state itself is
// never dropped.
//
// Reference: Hochreiter & Schmidhuber (1997) LSTM
//            Zaremba et al. (2014) Recurrent Neural Network Regularization

use burn::{
    module::Param,
    nn::{DropoutConfig, Initializer},
    prelude::*,
    tensor::activation::sigmoid,
};

/// Added to the forget gate pre-activation.
pub const FORGET_BIAS: f64 = 0.0;

// ─── Recurrent State ──────────────────────────────────────────────────────────
/// (cell, hidden) pair for one layer, each [batch, H].
#[derive(Clone, Debug)]
pub struct LayerState<B: Backend> {
    pub cell:   Tensor<B, 2>,
    pub hidden: Tensor<B, 2>,
}

/// Per-layer state tuple threaded from one batch to the next.
#[derive(Clone, Debug)]
pub struct LstmState<B: Backend> {
    pub layers: Vec<LayerState<B>>,
}

impl<B: Backend> LstmState<B> {
    #[cfg(test)]
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    #[cfg(test)]
    pub fn batch_size(&self) -> usize {
        self.layers.first().map(|l| l.hidden.dims()[0]).unwrap_or(0)
    }

    /// Cut the autodiff history so the next batch does not backpropagate
    /// into this one (truncated BPTT).
    pub fn detach(self) -> Self {
        let layers = self.layers
            .into_iter()
            .map(|l| LayerState { cell: l.cell.detach(), hidden: l.hidden.detach() })
            .collect();
        Self { layers }
    }
}

// ─── Single Layer ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    /// [input_size + H, 4H], gate blocks in (i, j, f, o) order
    pub kernel:      Param<Tensor<B, 2>>,
    /// [4H], zero-initialised
    pub bias:        Param<Tensor<B, 1>>,
    pub hidden_size: usize,
}

impl<B: Backend> LstmCell<B> {
    pub fn new(input_size: usize, hidden_size: usize, device: &B::Device) -> Self {
        let fan_in  = input_size + hidden_size;
        let fan_out = 4 * hidden_size;
        let kernel = Initializer::XavierUniform { gain: 1.0 }
            .init_with([fan_in, fan_out], Some(fan_in), Some(fan_out), device);
        let bias = Initializer::Zeros.init([fan_out], device);
        Self { kernel, bias, hidden_size }
    }

    pub fn step(&self, x: Tensor<B, 2>, state: LayerState<B>) -> LayerState<B> {
        let [batch, _] = x.dims();
        let h = self.hidden_size;

        let gates = Tensor::cat(vec![x, state.hidden], 1).matmul(self.kernel.val())
            + self.bias.val().reshape([1, 4 * h]);

        let i = gates.clone().slice([0..batch, 0..h]);
        let j = gates.clone().slice([0..batch, h..2 * h]);
        let f = gates.clone().slice([0..batch, 2 * h..3 * h]);
        let o = gates.slice([0..batch, 3 * h..4 * h]);

        let cell   = state.cell * sigmoid(f.add_scalar(FORGET_BIAS)) + sigmoid(i) * j.tanh();
        let hidden = cell.clone().tanh() * sigmoid(o);
        LayerState { cell, hidden }
    }
}

// ─── Stacked Cell ─────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct MultiLstmCell<B: Backend> {
    pub layers:      Vec<LstmCell<B>>,
    pub hidden_size: usize,
}

/// Build `num_layers` LSTM layers of width H. The first layer reads the
/// H-dimensional embeddings, so every layer has input size H.
pub fn make_lstm_cell<B: Backend>(
    hidden_size: usize,
    num_layers:  usize,
    device:      &B::Device,
) -> MultiLstmCell<B> {
    let layers = (0..num_layers)
        .map(|_| LstmCell::new(hidden_size, hidden_size, device))
        .collect();
    MultiLstmCell { layers, hidden_size }
}

impl<B: Backend> MultiLstmCell<B> {
    pub fn zero_state(&self, batch_size: usize, device: &B::Device) -> LstmState<B> {
        let layers = self.layers
            .iter()
            .map(|_| LayerState {
                cell:   Tensor::zeros([batch_size, self.hidden_size], device),
                hidden: Tensor::zeros([batch_size, self.hidden_size], device),
            })
            .collect();
        LstmState { layers }
    }

    /// One time step through every layer. Returns the top layer's
    /// (dropped-out) output and the new state.
    pub fn step(
        &self,
        x:         Tensor<B, 2>,
        state:     LstmState<B>,
        keep_prob: f64,
    ) -> (Tensor<B, 2>, LstmState<B>) {
        let mut input  = x;
        let mut layers = Vec::with_capacity(self.layers.len());

        for (layer, layer_state) in self.layers.iter().zip(state.layers) {
            let next = layer.step(dropout(input, keep_prob), layer_state);
            input = dropout(next.hidden.clone(), keep_prob);
            layers.push(next);
        }

        (input, LstmState { layers })
    }

    /// Unroll over the full time dimension of `x` [batch, time, H].
    /// Returns the per-step outputs [batch, time, H] and the final state.
    pub fn unroll(
        &self,
        x:         Tensor<B, 3>,
        initial:   LstmState<B>,
        keep_prob: f64,
    ) -> (Tensor<B, 3>, LstmState<B>) {
        let [batch, time, width] = x.dims();
        let mut state   = initial;
        let mut outputs = Vec::with_capacity(time);

        for t in 0..time {
            let x_t = x.clone()
                .slice([0..batch, t..t + 1, 0..width])
                .reshape([batch, width]);
            let (out, next) = self.step(x_t, state, keep_prob);
            outputs.push(out.reshape([batch, 1, self.hidden_size]));
            state = next;
        }

        (Tensor::cat(outputs, 1), state)
    }
}

/// Dropout with keep-probability semantics; a keep-probability of 1.0
/// returns the input untouched. Only active on autodiff backends.
fn dropout<B: Backend, const D: usize>(x: Tensor<B, D>, keep_prob: f64) -> Tensor<B, D> {
    if keep_prob >= 1.0 {
        return x;
    }
    DropoutConfig::new(1.0 - keep_prob).init().forward(x)
}
