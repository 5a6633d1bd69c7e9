// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `eval`, `generate`
// and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand, ValueEnum};

use crate::application::train_use_case::TrainConfig;
use crate::infra::checkpoint::CheckpointChoice;
use crate::ml::backend::BackendKind;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the language model on a directory of .txt files
    Train(TrainArgs),

    /// Report loss and perplexity of a trained model on a corpus
    Eval(EvalArgs),

    /// Sample sentences from a trained model
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing .txt files, one sentence per line
    #[arg(long, default_value = "data/corpus")]
    pub corpus_dir: String,

    /// Directory for the vocabulary, checkpoints, and metrics
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    /// Maximum vocabulary size, including <s>, </s>, <unk>
    #[arg(long, default_value_t = 10_000)]
    pub vocab_size: usize,

    /// Embedding and LSTM hidden dimension
    #[arg(long, default_value_t = 100)]
    pub hidden_size: usize,

    /// Number of stacked LSTM layers
    #[arg(long, default_value_t = 1)]
    pub num_layers: usize,

    /// Negative classes sampled per batch by the sampled softmax
    #[arg(long, default_value_t = 200)]
    pub softmax_ns: usize,

    /// Rows per batch; each row is a continuous slice of the corpus
    #[arg(long, default_value_t = 50)]
    pub batch_size: usize,

    /// Time steps per batch (truncated backpropagation length)
    #[arg(long, default_value_t = 25)]
    pub max_time: usize,

    /// Adam learning rate
    #[arg(long, default_value_t = 0.01)]
    pub lr: f64,

    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    /// Disable dropout (keep probability 1.0 instead of 0.5)
    #[arg(long)]
    pub no_dropout: bool,

    /// Fraction of sentences used for training; the rest is dev
    #[arg(long, default_value_t = 0.9)]
    pub train_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, value_enum, default_value_t = BackendKind::Wgpu)]
    pub backend: BackendKind,

    /// Log progress every N batches (0 disables)
    #[arg(long, default_value_t = 100)]
    pub log_every: usize,
}

/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            corpus_dir:     a.corpus_dir,
            checkpoint_dir: a.checkpoint_dir,
            vocab_size:     a.vocab_size,
            hidden_size:    a.hidden_size,
            num_layers:     a.num_layers,
            softmax_ns:     a.softmax_ns,
            batch_size:     a.batch_size,
            max_time:       a.max_time,
            learning_rate:  a.lr,
            epochs:         a.epochs,
            use_dropout:    !a.no_dropout,
            train_fraction: a.train_fraction,
            seed:           a.seed,
            backend:        a.backend,
            log_every:      a.log_every,
        }
    }
}

/// Which saved epoch to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EpochChoice {
    Best,
    Latest,
}

/// Flags shared by every command that loads a trained model.
#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Directory where checkpoints were saved during training
    #[arg(long, default_value = "checkpoints")]
    pub checkpoint_dir: String,

    #[arg(long, value_enum, default_value_t = EpochChoice::Best)]
    pub checkpoint: EpochChoice,

    /// Load this exact epoch instead of --checkpoint
    #[arg(long)]
    pub epoch: Option<usize>,

    /// Backend to run on; defaults to the one used for training
    #[arg(long, value_enum)]
    pub backend: Option<BackendKind>,
}

impl ModelArgs {
    pub fn choice(&self) -> CheckpointChoice {
        match (self.epoch, self.checkpoint) {
            (Some(e), _)                => CheckpointChoice::Epoch(e),
            (None, EpochChoice::Best)   => CheckpointChoice::Best,
            (None, EpochChoice::Latest) => CheckpointChoice::Latest,
        }
    }
}

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// Directory of .txt files to score
    #[arg(long)]
    pub corpus_dir: String,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Words to start every sample with, after <s>
    #[arg(long)]
    pub prompt: Option<String>,

    /// Maximum generated tokens per sample
    #[arg(long, default_value_t = 30)]
    pub max_len: usize,

    #[arg(long, default_value_t = 5)]
    pub num_samples: usize,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    #[command(flatten)]
    pub model: ModelArgs,
}
