// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the command line with clap and hands each command to
// its use case in Layer 2. Results are printed here and only
// here.
//
//   1. `train`    — trains a model, saves the best checkpoint
//   2. `evaluate` — test-split accuracy of a checkpoint
//   3. `infer`    — letter shown in one image
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::Path;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, InferArgs, TrainArgs};

use crate::application::config::RunConfig;

#[derive(Parser, Debug)]
#[command(
    name = "sign-language-mnist",
    version,
    about = "Train, evaluate and run CNN classifiers on Sign Language MNIST."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Evaluate(args) => run_evaluate(args),
            Commands::Infer(args)    => run_infer(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Training '{}' with config '{}'", args.model, args.config.display());
    let report = TrainUseCase::from_config_file(&args.config, args.model)?.execute()?;

    match report.best {
        Some(best) => {
            println!(
                "Training complete. Best epoch {} with validation accuracy {:.2}%.",
                best.epoch,
                best.val_accuracy * 100.0,
            );
            if let Some(path) = best.checkpoint {
                println!("Checkpoint: {}", path.with_extension("mpk.gz").display());
            }
        }
        None => println!("Training complete. No epoch was run."),
    }
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let config = load_config_or_default(&args.config)?;
    let report = EvaluateUseCase::new(args.checkpoint, config)
        .with_model(args.model)
        .with_test_set(args.test_set)
        .execute()?;

    println!(
        "{}: test accuracy {:.2}% ({} samples, mean loss {:.4})",
        report.model,
        report.accuracy * 100.0,
        report.samples,
        report.loss,
    );
    Ok(())
}

fn run_infer(args: InferArgs) -> Result<()> {
    use crate::application::infer_use_case::InferUseCase;

    let prediction = InferUseCase::new(args.checkpoint, args.image, args.model).execute()?;
    println!("{} ({:.2}%)", prediction.label, prediction.confidence * 100.0);
    Ok(())
}

/// The evaluate command only needs the test section, so a
/// missing config file falls back to the defaults.
fn load_config_or_default(path: &Path) -> Result<RunConfig> {
    if path.exists() {
        Ok(RunConfig::from_file(path)?)
    } else {
        tracing::warn!("Config '{}' not found, using defaults", path.display());
        Ok(RunConfig::default())
    }
}
