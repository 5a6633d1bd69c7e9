// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop around the train graph.
//
// Per epoch:
//   1. Walk the training stream batch by batch, in order. The
//      final LSTM state of each batch (detached from the graph)
//      is the initial state of the next, so context flows
//      across batch boundaries without backpropagating through
//      the whole epoch.
//   2. Snapshot the weights on the inner backend (no autodiff)
//      and evaluate the dev stream with dropout off.
//   3. Log EpochMetrics, save a checkpoint, and update
//      best_epoch.json when the dev loss improved.
//
// Burn 0.20 notes:
//   - Training runs on Autodiff<B>; core.valid() gives the same
//     weights on B for evaluation and checkpointing.
//   - Adam keeps its moment estimates inside the optimizer owned
//     by the train graph.
//
// Reference: Burn Book §5, Kingma & Ba (2015) Adam

use anyhow::{ensure, Result};
use burn::{module::AutodiffModule, optim::AdamConfig, tensor::backend::AutodiffBackend};
use std::time::Instant;

use crate::application::train_use_case::TrainConfig;
use crate::data::batcher::BatchGenerator;
use crate::infra::checkpoint::{BestEpoch, CheckpointManager};
use crate::infra::metrics::{EpochMetrics, MetricsLogger};
use crate::ml::backend::{BackendKind, NdArrayTrainBackend, WgpuTrainBackend};
use crate::ml::context::GraphContext;
use crate::ml::evaluator::evaluate;
use crate::ml::params::{ModelParams, RuntimeFeed};

/// Id streams for one training run.
#[derive(Debug, Clone, Default)]
pub struct TrainingData {
    pub train_ids: Vec<u32>,
    pub dev_ids:   Vec<u32>,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs: Vec<EpochMetrics>,
    pub best:   Option<BestEpoch>,
}

pub fn run_training(
    cfg:     &TrainConfig,
    params:  &ModelParams,
    data:    &TrainingData,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
) -> Result<TrainingReport> {
    match cfg.backend {
        BackendKind::Wgpu => {
            let device = burn::backend::wgpu::WgpuDevice::default();
            tracing::info!("Using WGPU device: {:?}", device);
            train_loop::<WgpuTrainBackend>(cfg, params, data, ckpt, metrics, device)
        }
        BackendKind::Ndarray => {
            tracing::info!("Using NdArray CPU backend");
            train_loop::<NdArrayTrainBackend>(cfg, params, data, ckpt, metrics, Default::default())
        }
    }
}

pub fn train_loop<B: AutodiffBackend>(
    cfg:     &TrainConfig,
    params:  &ModelParams,
    data:    &TrainingData,
    ckpt:    &CheckpointManager,
    metrics: &MetricsLogger,
    device:  B::Device,
) -> Result<TrainingReport> {
    let num_batches = BatchGenerator::new(&data.train_ids, cfg.batch_size, cfg.max_time).num_batches();
    ensure!(
        num_batches > 0,
        "Training stream of {} ids is too short for batch_size={}",
        data.train_ids.len(),
        cfg.batch_size
    );

    // ── Build graphs ──────────────────────────────────────────────────────────
    let ctx   = GraphContext::<B>::new(device).with_seed(cfg.seed);
    let core  = params.build_core_graph(&ctx)?;
    let mut train = core.build_train_graph(&ctx, &AdamConfig::new());
    let feed  = RuntimeFeed::training(cfg.learning_rate, cfg.use_dropout);

    tracing::info!(
        "Model ready: V={} H={} layers={} softmax_ns={} | {} batches/epoch",
        params.vocab_size, params.hidden_size, params.num_layers, params.softmax_ns, num_batches
    );

    let mut report = TrainingReport { epochs: Vec::with_capacity(cfg.epochs), best: None };

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let started = Instant::now();
        let mut state    = train.core().zero_state(cfg.batch_size.max(1));
        let mut loss_sum = 0.0f64;
        let mut steps    = 0usize;

        for batch in BatchGenerator::new(&data.train_ids, cfg.batch_size, cfg.max_time) {
            let out = train.train_step(&batch, state, &feed);
            state = out.final_h.detach();

            if !out.train_loss.is_finite() {
                tracing::warn!("Non-finite training loss at epoch {} step {}", epoch, steps + 1);
            }
            loss_sum += out.train_loss;
            steps    += 1;

            if cfg.log_every > 0 && steps % cfg.log_every == 0 {
                tracing::info!(
                    "epoch {} step {}/{} | train_loss={:.4} grad_norm={:.3}",
                    epoch, steps, num_batches, loss_sum / steps as f64, out.grad_norm
                );
            }
        }
        let train_loss = loss_sum / steps.max(1) as f64;

        // ── Dev evaluation on the inner backend ──────────────────────────────
        let snapshot = train.core().valid();
        let dev = evaluate(&snapshot, &data.dev_ids, cfg.batch_size, cfg.max_time);
        if dev.is_empty() {
            tracing::warn!("Dev stream too short to evaluate; dev loss is NaN");
        }

        let m = EpochMetrics::new(epoch, train_loss, dev.loss, started.elapsed().as_secs_f64());
        metrics.log(&m)?;
        ckpt.save_model(&snapshot, epoch)?;

        let best_so_far = report.best.map_or(f64::INFINITY, |b| b.dev_loss);
        if m.is_improvement(best_so_far) {
            let best = BestEpoch { epoch, dev_loss: m.dev_loss };
            ckpt.save_best(&best)?;
            report.best = Some(best);
        }

        tracing::info!(
            "Epoch {:>3}/{} | train_loss={:.4} | dev_loss={:.4} | dev_ppl={:.2} | {:.1}s",
            epoch, cfg.epochs, m.train_loss, m.dev_loss, m.dev_perplexity, m.elapsed_secs
        );
        report.epochs.push(m);
    }

    tracing::info!("Training complete!");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tiny_config(dir: &str) -> TrainConfig {
        TrainConfig {
            checkpoint_dir: dir.to_string(),
            hidden_size:    8,
            softmax_ns:     6,
            batch_size:     2,
            max_time:       4,
            learning_rate:  0.05,
            epochs:         3,
            use_dropout:    false,
            backend:        BackendKind::Ndarray,
            ..TrainConfig::default()
        }
    }

    fn periodic_stream(len: usize) -> Vec<u32> {
        (0..len).map(|i| (i % 5) as u32).collect()
    }

    #[test]
    fn test_training_writes_checkpoints_and_tracks_best() {
        let dir = std::env::temp_dir().join(format!("rnnlm_train_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        let dir_s = dir.to_string_lossy().to_string();

        let cfg     = tiny_config(&dir_s);
        let params  = cfg.model_params(5);
        let data    = TrainingData { train_ids: periodic_stream(81), dev_ids: periodic_stream(41) };
        let ckpt    = CheckpointManager::new(dir_s.clone()).unwrap();
        let metrics = MetricsLogger::new(dir_s.clone()).unwrap();

        let report = train_loop::<NdArrayTrainBackend>(&cfg, &params, &data, &ckpt, &metrics, Default::default())
            .unwrap();

        assert_eq!(report.epochs.len(), 3);
        assert!(report.epochs.iter().all(|m| m.train_loss.is_finite() && m.dev_loss.is_finite()));
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);

        let best = report.best.unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), best);
        let min_dev = report.epochs.iter().map(|m| m.dev_loss).fold(f64::INFINITY, f64::min);
        assert_eq!(best.dev_loss, min_dev);

        // A periodic stream is easy to learn
        assert!(report.epochs[2].dev_loss < report.epochs[0].dev_loss);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_nan_dev_loss_still_loads_as_best() {
        use crate::infra::checkpoint::CheckpointChoice;
        use crate::ml::backend::NdArrayBackend;

        let dir = std::env::temp_dir().join(format!("rnnlm_train_nodev_{}", std::process::id()));
        fs::remove_dir_all(&dir).ok();
        let dir_s = dir.to_string_lossy().to_string();

        let cfg     = TrainConfig { batch_size: 4, epochs: 2, ..tiny_config(&dir_s) };
        let params  = cfg.model_params(5);
        let data    = TrainingData { train_ids: periodic_stream(41), dev_ids: vec![1, 2, 3] };
        let ckpt    = CheckpointManager::new(dir_s.clone()).unwrap();
        let metrics = MetricsLogger::new(dir_s).unwrap();

        let report = train_loop::<NdArrayTrainBackend>(&cfg, &params, &data, &ckpt, &metrics, Default::default())
            .unwrap();
        assert!(report.best.is_none());
        assert!(report.epochs.iter().all(|m| m.dev_loss.is_nan()));

        let ctx   = GraphContext::<NdArrayBackend>::new(Default::default());
        let fresh = params.build_core_graph(&ctx).unwrap();
        assert!(ckpt.load_model(fresh, CheckpointChoice::Best, &Default::default()).is_ok());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_short_stream_is_rejected() {
        let dir = std::env::temp_dir().join(format!("rnnlm_train_short_{}", std::process::id()));
        let dir_s = dir.to_string_lossy().to_string();
        let cfg   = tiny_config(&dir_s);
        let data  = TrainingData { train_ids: vec![1, 2], dev_ids: vec![] };
        let ckpt    = CheckpointManager::new(dir_s.clone()).unwrap();
        let metrics = MetricsLogger::new(dir_s).unwrap();

        let result = train_loop::<NdArrayTrainBackend>(
            &cfg, &cfg.model_params(5), &data, &ckpt, &metrics, Default::default(),
        );
        assert!(result.is_err());
        fs::remove_dir_all(&dir).ok();
    }
}
