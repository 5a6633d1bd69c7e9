// ============================================================
// Layer 2 — EvalUseCase
// ============================================================
// Scores a directory of .txt files with a trained model:
//
//   Step 1: Load the saved vocabulary and config    (Layer 6)
//   Step 2: Sentences → <s> … </s> id stream        (Layer 4)
//   Step 3: Rebuild model, load weights, evaluate   (Layer 5)
//
// The text goes through the same cleaning as the training
// corpus, so the perplexities are comparable.

use anyhow::{ensure, Result};
use burn::prelude::*;

use crate::application::train_use_case::load_sentences;
use crate::data::dataset::encode_corpus;
use crate::infra::{
    checkpoint::{CheckpointChoice, CheckpointManager},
    tokenizer_store::{TokenizerStore, WordVocab},
};
use crate::ml::backend::{BackendKind, NdArrayBackend, WgpuBackend};
use crate::ml::evaluator::EvalSummary;
use crate::ml::inferencer::Inferencer;

pub struct EvalUseCase {
    checkpoint_dir: String,
    corpus_dir:     String,
    choice:         CheckpointChoice,
    backend:        Option<BackendKind>,
}

impl EvalUseCase {
    pub fn new(
        checkpoint_dir: String,
        corpus_dir:     String,
        choice:         CheckpointChoice,
        backend:        Option<BackendKind>,
    ) -> Self {
        Self { checkpoint_dir, corpus_dir, choice, backend }
    }

    pub fn execute(&self) -> Result<EvalSummary> {
        let ckpt  = CheckpointManager::new(self.checkpoint_dir.clone())?;
        let vocab = TokenizerStore::new(self.checkpoint_dir.clone()).load()?;
        let backend = match self.backend {
            Some(b) => b,
            None    => ckpt.load_config()?.backend,
        };

        let sentences = load_sentences(&self.corpus_dir)?;
        let ids = encode_corpus(&vocab, &sentences)?;

        let summary = match backend {
            BackendKind::Wgpu => self.evaluate_on::<WgpuBackend>(
                &ckpt, &vocab, &ids, burn::backend::wgpu::WgpuDevice::default(),
            )?,
            BackendKind::Ndarray => self.evaluate_on::<NdArrayBackend>(
                &ckpt, &vocab, &ids, Default::default(),
            )?,
        };

        ensure!(
            !summary.is_empty(),
            "Corpus in '{}' is too short to form a single batch",
            self.corpus_dir
        );
        tracing::info!(
            "Evaluated {} tokens: loss={:.4} perplexity={:.2}",
            summary.tokens, summary.loss, summary.perplexity
        );
        Ok(summary)
    }

    fn evaluate_on<B: Backend>(
        &self,
        ckpt:   &CheckpointManager,
        vocab:  &WordVocab,
        ids:    &[u32],
        device: B::Device,
    ) -> Result<EvalSummary> {
        let inferencer = Inferencer::<B>::from_checkpoint(ckpt, vocab, self.choice, device)?;
        Ok(inferencer.evaluate(ids))
    }
}
