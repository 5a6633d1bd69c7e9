// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses command line arguments with clap and routes each
// subcommand to its use case in Layer 2. Results are printed
// here and nowhere else.
//
//   1. `train`    — trains the model on a .txt corpus
//   2. `eval`     — perplexity of a checkpoint on a corpus
//   3. `generate` — samples sentences from a checkpoint
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvalArgs, GenerateArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rnnlm",
    version = "0.1.0",
    about = "Train an LSTM language model on text files, score text, and sample sentences."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Eval(args)     => run_eval(args),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.corpus_dir);
    let report = TrainUseCase::new(args.into()).execute()?;

    for m in &report.epochs {
        println!(
            "Epoch {:>3} | train_loss={:.4} | dev_loss={:.4} | dev_perplexity={:.2}",
            m.epoch, m.train_loss, m.dev_loss, m.dev_perplexity
        );
    }
    match report.best {
        Some(best) => println!(
            "Training complete. Best epoch {} (dev perplexity {:.2}).",
            best.epoch,
            best.dev_loss.exp()
        ),
        None => println!("Training complete. Checkpoints saved."),
    }
    Ok(())
}

fn run_eval(args: EvalArgs) -> Result<()> {
    use crate::application::eval_use_case::EvalUseCase;

    let choice = args.model.choice();
    let summary = EvalUseCase::new(
        args.model.checkpoint_dir,
        args.corpus_dir,
        choice,
        args.model.backend,
    )
    .execute()?;

    println!("Tokens:     {}", summary.tokens);
    println!("Loss:       {:.4}", summary.loss);
    println!("Perplexity: {:.2}", summary.perplexity);
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::application::generate_use_case::{GenerateRequest, GenerateUseCase};

    let request = GenerateRequest {
        prompt:      args.prompt,
        max_len:     args.max_len,
        num_samples: args.num_samples,
        seed:        args.seed,
    };
    let samples = GenerateUseCase::new(args.model.checkpoint_dir.clone(), args.model.choice(), args.model.backend)
        .execute(&request)?;

    for (i, sample) in samples.iter().enumerate() {
        println!("[{}] {}", i + 1, sample);
    }
    Ok(())
}
