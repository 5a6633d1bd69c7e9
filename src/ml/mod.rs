// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn-specific code lives in this layer.
//
// The language model is built in three stages, each taking an
// explicit GraphContext (device + seed):
//
//   ModelParams::build_core_graph   → CoreGraph
//       embedding, LSTM unroll, output projection, full loss
//
//   CoreGraph::build_train_graph    → TrainGraph
//       sampled-softmax loss, global-norm clipping, Adam
//
//   CoreGraph/TrainGraph::build_sampler_graph → SamplerGraph
//       multinomial sampling from the output distribution
//
// The stages share one parameter set; a later stage never
// declares new weights.
//
// Reference: Zaremba et al. (2014) Recurrent Neural Network Regularization
//            Burn Book §3 (Building Blocks), §5 (Training)

/// Structural hyperparameters and per-step feed values
pub mod params;

/// Device and seed handle passed to every build stage
pub mod context;

/// Backend choice for training and inference
pub mod backend;

/// LSTM cell, multi-layer stack, and state
pub mod cell;

/// Core graph: embedding → LSTM → logits → loss
pub mod model;

/// Log-uniform candidate sampler and sampled softmax loss
pub mod sampled_softmax;

/// Train graph: sampled loss, clipping, Adam step
pub mod train_graph;

/// Sampler graph: multinomial sampling and generation
pub mod sampler;

/// Token-weighted loss and perplexity over a stream
pub mod evaluator;

/// Epoch loop with dev evaluation and checkpointing
pub mod trainer;

/// Loads a trained model from a checkpoint directory
pub mod inferencer;
