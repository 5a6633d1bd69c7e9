// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per epoch to checkpoints/metrics.csv:
//
//   epoch,train_loss,dev_loss,dev_perplexity,elapsed_secs
//   1,5.912300,5.401200,221.654000,38.200000
//   2,5.103400,5.055100,156.840000,37.900000
//
// train_loss is the mean sampled-softmax loss of the epoch's
// updates; dev_loss is the full-softmax loss on held-out text,
// so the two are not directly comparable. Track dev_perplexity.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};

const HEADER: &str = "epoch,train_loss,dev_loss,dev_perplexity,elapsed_secs";

/// One row of metrics for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// Starts at 1
    pub epoch:          usize,
    /// Mean sampled-softmax loss over the epoch's batches
    pub train_loss:     f64,
    /// Token-weighted full-softmax loss on the dev stream
    pub dev_loss:       f64,
    /// exp(dev_loss)
    pub dev_perplexity: f64,
    pub elapsed_secs:   f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, dev_loss: f64, elapsed_secs: f64) -> Self {
        Self {
            epoch,
            train_loss,
            dev_loss,
            dev_perplexity: dev_loss.exp(),
            elapsed_secs,
        }
    }

    /// True if this epoch's dev loss beats `best_dev_loss`.
    pub fn is_improvement(&self, best_dev_loss: f64) -> bool {
        self.dev_loss < best_dev_loss
    }
}

pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the header if the file does not exist yet, so reruns append.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)
                .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
            writeln!(f, "{HEADER}")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(
            f,
            "{},{:.6},{:.6},{:.6},{:.6}",
            m.epoch,
            m.train_loss,
            m.dev_loss,
            m.dev_perplexity,
            m.elapsed_secs,
        )?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, dev_loss={:.4}",
            m.epoch,
            m.train_loss,
            m.dev_loss,
        );
        Ok(())
    }

    #[cfg(test)]
    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
