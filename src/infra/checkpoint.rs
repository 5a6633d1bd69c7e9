// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores core-graph weights using Burn's
// NamedMpkGzFileRecorder (MessagePack + gzip) with full-precision
// settings: weights are stored as f32, so a reloaded model scores
// exactly what was logged during training.
//
// Directory layout:
//   checkpoints/
//     tokenizer.json          ← word vocabulary (TokenizerStore)
//     train_config.json       ← hyperparameters of the run
//     model_epoch_1.mpk.gz    ← weights after epoch 1
//     model_epoch_2.mpk.gz
//     ...
//     latest_epoch.json       ← number of the last saved epoch
//     best_epoch.json         ← epoch with the lowest dev loss
//     metrics.csv             ← one row per epoch (MetricsLogger)
//
// The recorder only stores weights, so loading first rebuilds a
// CoreGraph of the saved shape from train_config.json and the
// tokenizer, then fills it with load_record.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::application::train_use_case::TrainConfig;
use crate::ml::model::CoreGraph;

const CONFIG_FILE: &str = "train_config.json";
const LATEST_FILE: &str = "latest_epoch.json";
const BEST_FILE:   &str = "best_epoch.json";

type WeightsRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

/// Epoch with the lowest dev loss seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestEpoch {
    pub epoch:    usize,
    pub dev_loss: f64,
}

/// Which saved weights to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointChoice {
    Latest,
    Best,
    Epoch(usize),
}

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir })
    }

    #[cfg(test)]
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn model_path(&self, epoch: usize) -> PathBuf {
        // The recorder appends its own extension
        self.dir.join(format!("model_epoch_{epoch}"))
    }

    /// Save weights for `epoch` and mark it as the latest.
    pub fn save_model<B: Backend>(&self, core: &CoreGraph<B>, epoch: usize) -> Result<()> {
        let path = self.model_path(epoch);
        WeightsRecorder::new()
            .record(core.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Restore the chosen weights into `core`, which must have the
    /// architecture the checkpoint was saved with.
    pub fn load_model<B: Backend>(
        &self,
        core:   CoreGraph<B>,
        choice: CheckpointChoice,
        device: &B::Device,
    ) -> Result<CoreGraph<B>> {
        let epoch = match choice {
            CheckpointChoice::Latest   => self.latest_epoch()?,
            CheckpointChoice::Best     => self.best_or_latest_epoch()?,
            CheckpointChoice::Epoch(e) => e,
        };
        let path = self.model_path(epoch);
        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = WeightsRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!(
                "Cannot load checkpoint '{}'. Have you trained the model first?",
                path.display()
            ))?;
        Ok(core.load_record(record))
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)?;
        tracing::debug!("Saved training config to '{}'", self.dir.join(CONFIG_FILE).display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        self.read_json(CONFIG_FILE).context("Make sure you have run 'train' first")
    }

    pub fn save_best(&self, best: &BestEpoch) -> Result<()> {
        self.write_json(BEST_FILE, best)
    }

    pub fn best_epoch(&self) -> Result<BestEpoch> {
        self.read_json(BEST_FILE)
    }

    /// Best epoch, or the latest one when no epoch had a finite dev loss
    /// (best_epoch.json is then never written).
    fn best_or_latest_epoch(&self) -> Result<usize> {
        if self.dir.join(BEST_FILE).exists() {
            return Ok(self.best_epoch()?.epoch);
        }
        let latest = self.latest_epoch()?;
        tracing::warn!(
            "No best epoch recorded (dev loss was never finite); loading latest epoch {}",
            latest
        );
        Ok(latest)
    }

    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_FILE).context("Have you run 'train' first?")
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, serde_json::to_string_pretty(value)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::context::GraphContext;
    use crate::ml::params::ModelParams;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn scratch(name: &str) -> CheckpointManager {
        let dir = std::env::temp_dir().join(format!("rnnlm_ckpt_{}_{}", name, std::process::id()));
        fs::remove_dir_all(&dir).ok();
        CheckpointManager::new(dir.to_string_lossy()).unwrap()
    }

    fn weights(core: &CoreGraph<TestBackend>) -> Vec<f32> {
        core.w_out.val().into_data().to_vec::<f32>().unwrap()
    }

    #[test]
    fn test_save_and_load_restores_weights() {
        let ckpt   = scratch("roundtrip");
        let params = ModelParams::new(12, 4).with_num_layers(2);
        let saved  = params.build_core_graph(&GraphContext::<TestBackend>::new(Default::default()).with_seed(1)).unwrap();
        ckpt.save_model(&saved, 3).unwrap();
        assert_eq!(ckpt.latest_epoch().unwrap(), 3);

        let fresh = params.build_core_graph(&GraphContext::<TestBackend>::new(Default::default()).with_seed(2)).unwrap();
        assert_ne!(weights(&saved), weights(&fresh));

        let loaded = ckpt.load_model(fresh, CheckpointChoice::Latest, &Default::default()).unwrap();
        assert_eq!(weights(&saved), weights(&loaded));
        fs::remove_dir_all(ckpt.dir()).ok();
    }

    #[test]
    fn test_best_falls_back_to_latest_without_best_file() {
        let ckpt = scratch("fallback");
        let core = ModelParams::new(6, 3).build_core_graph(&GraphContext::<TestBackend>::new(Default::default())).unwrap();
        ckpt.save_model(&core, 1).unwrap();
        ckpt.save_model(&core, 2).unwrap();
        assert!(ckpt.best_epoch().is_err());

        let fresh = ModelParams::new(6, 3).build_core_graph(&GraphContext::<TestBackend>::new(Default::default())).unwrap();
        let loaded = ckpt.load_model(fresh, CheckpointChoice::Best, &Default::default()).unwrap();
        assert_eq!(weights(&core), weights(&loaded));
        fs::remove_dir_all(ckpt.dir()).ok();
    }

    #[test]
    fn test_best_epoch_roundtrip() {
        let ckpt = scratch("best");
        assert!(ckpt.best_epoch().is_err());
        let best = BestEpoch { epoch: 2, dev_loss: 4.5 };
        ckpt.save_best(&best).unwrap();
        assert_eq!(ckpt.best_epoch().unwrap(), best);
        fs::remove_dir_all(ckpt.dir()).ok();
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let ckpt  = scratch("missing");
        let core  = ModelParams::new(5, 2).build_core_graph(&GraphContext::<TestBackend>::new(Default::default())).unwrap();
        assert!(ckpt.load_model(core, CheckpointChoice::Epoch(9), &Default::default()).is_err());
        assert!(ckpt.latest_epoch().is_err());
        fs::remove_dir_all(ckpt.dir()).ok();
    }
}
