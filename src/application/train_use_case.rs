// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load .txt files                (Layer 4 - data)
//   Step 2: Clean text into sentences      (Layer 4 - data)
//   Step 3: Split train/dev sentences      (Layer 4 - data)
//   Step 4: Build / load vocabulary        (Layer 6 - infra)
//   Step 5: Encode both id streams         (Layer 4 - data)
//   Step 6: Save config                    (Layer 6 - infra)
//   Step 7: Run training loop              (Layer 5 - ml)
//
// The vocabulary is built from the training side of the split
// only, so dev perplexity reflects unseen text (rare dev words
// become <unk>).
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::data::{
    dataset::encode_corpus,
    loader::TextLoader,
    preprocessor::Preprocessor,
    splitter::split_train_val,
};
use crate::domain::traits::{DocumentSource, Vocabulary};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::MetricsLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::backend::BackendKind;
use crate::ml::params::ModelParams;
use crate::ml::trainer::{run_training, TrainingData, TrainingReport};

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of a training run. Saved as train_config.json so
// evaluation and generation can rebuild the same architecture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainConfig {
    pub corpus_dir:     String,
    pub checkpoint_dir: String,
    /// Upper bound; the built vocabulary can be smaller
    pub vocab_size:     usize,
    pub hidden_size:    usize,
    pub num_layers:     usize,
    pub softmax_ns:     usize,
    pub batch_size:     usize,
    pub max_time:       usize,
    pub learning_rate:  f64,
    pub epochs:         usize,
    pub use_dropout:    bool,
    /// Fraction of sentences used for training; the rest is dev
    pub train_fraction: f64,
    pub seed:           u64,
    pub backend:        BackendKind,
    /// Log a progress line every N batches (0 disables)
    pub log_every:      usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            corpus_dir:     "data/corpus".to_string(),
            checkpoint_dir: "checkpoints".to_string(),
            vocab_size:     10_000,
            hidden_size:    100,
            num_layers:     1,
            softmax_ns:     200,
            batch_size:     50,
            max_time:       25,
            learning_rate:  0.01,
            epochs:         5,
            use_dropout:    true,
            train_fraction: 0.9,
            seed:           42,
            backend:        BackendKind::Wgpu,
            log_every:      100,
        }
    }
}

impl TrainConfig {
    /// Network structure for a vocabulary of `vocab_size` entries.
    pub fn model_params(&self, vocab_size: usize) -> ModelParams {
        ModelParams::new(vocab_size, self.hidden_size)
            .with_num_layers(self.num_layers)
            .with_softmax_ns(self.softmax_ns)
    }
}

/// Load every document under `corpus_dir` and split it into canonical sentences.
pub fn load_sentences(corpus_dir: &str) -> Result<Vec<Vec<String>>> {
    tracing::info!("Loading .txt files from '{}'", corpus_dir);
    let docs = TextLoader::new(corpus_dir).load_all()?;
    ensure!(!docs.is_empty(), "No .txt documents found in '{}'", corpus_dir);

    let preprocessor = Preprocessor::new();
    let sentences: Vec<Vec<String>> = docs
        .iter()
        .flat_map(|d| preprocessor.sentences(&d.text))
        .collect();
    tracing::info!("Extracted {} sentences from {} documents", sentences.len(), docs.len());
    Ok(sentences)
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<TrainingReport> {
        let cfg = &self.config;
        ensure!(
            (0.0..=1.0).contains(&cfg.train_fraction),
            "train_fraction must be in [0, 1], got {}",
            cfg.train_fraction
        );

        // ── Steps 1-3: Sentences, shuffled and split ─────────────────────────
        let sentences = load_sentences(&cfg.corpus_dir)?;
        let (train_sentences, dev_sentences) =
            split_train_val(sentences, cfg.train_fraction, cfg.seed);
        tracing::info!(
            "Split: {} train, {} dev sentences",
            train_sentences.len(),
            dev_sentences.len()
        );

        // ── Step 4: Vocabulary ────────────────────────────────────────────────
        let vocab = TokenizerStore::new(cfg.checkpoint_dir.clone())
            .load_or_build(&train_sentences, cfg.vocab_size)?;

        // ── Step 5: Id streams ────────────────────────────────────────────────
        let data = TrainingData {
            train_ids: encode_corpus(&vocab, &train_sentences)?,
            dev_ids:   encode_corpus(&vocab, &dev_sentences)?,
        };
        tracing::info!(
            "Encoded {} training and {} dev tokens (V={})",
            data.train_ids.len(),
            data.dev_ids.len(),
            vocab.size()
        );

        // ── Step 6: Config for evaluation and generation ─────────────────────
        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone())?;
        ckpt.save_config(cfg)?;
        let metrics = MetricsLogger::new(cfg.checkpoint_dir.clone())?;

        // ── Step 7: Training loop (Layer 5) ───────────────────────────────────
        run_training(cfg, &cfg.model_params(vocab.size()), &data, &ckpt, &metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_model_params_follow_config() {
        let cfg = TrainConfig { hidden_size: 32, num_layers: 2, softmax_ns: 50, ..TrainConfig::default() };
        let params = cfg.model_params(700);
        assert_eq!(params.vocab_size, 700);
        assert_eq!(params.hidden_size, 32);
        assert_eq!(params.num_layers, 2);
        assert_eq!(params.softmax_ns, 50);
    }

    #[test]
    fn test_config_json_roundtrip_keeps_backend() {
        let cfg  = TrainConfig { backend: BackendKind::Ndarray, ..TrainConfig::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"ndarray\""));
        let back: TrainConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backend, BackendKind::Ndarray);
        assert_eq!(back.batch_size, cfg.batch_size);
    }

    #[test]
    fn test_empty_corpus_is_an_error() {
        assert!(load_sentences("/no/such/corpus/dir").is_err());
    }

    #[test]
    fn test_end_to_end_training_on_cpu() {
        let root = std::env::temp_dir().join(format!("rnnlm_usecase_{}", std::process::id()));
        fs::remove_dir_all(&root).ok();
        let corpus = root.join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        let text = "the cat sat on the mat.\nthe dog sat on the log.\n".repeat(20);
        fs::write(corpus.join("pets.txt"), text).unwrap();

        let cfg = TrainConfig {
            corpus_dir:     corpus.to_string_lossy().to_string(),
            checkpoint_dir: root.join("ckpt").to_string_lossy().to_string(),
            vocab_size:     50,
            hidden_size:    8,
            softmax_ns:     5,
            batch_size:     4,
            max_time:       5,
            epochs:         1,
            train_fraction: 0.8,
            backend:        BackendKind::Ndarray,
            ..TrainConfig::default()
        };
        let report = TrainUseCase::new(cfg.clone()).execute().unwrap();
        assert_eq!(report.epochs.len(), 1);

        let ckpt = CheckpointManager::new(cfg.checkpoint_dir.clone()).unwrap();
        assert_eq!(ckpt.load_config().unwrap().hidden_size, 8);
        assert!(TokenizerStore::new(cfg.checkpoint_dir.clone()).path().exists());
        fs::remove_dir_all(&root).ok();
    }
}
