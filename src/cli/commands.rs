// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `train`, `evaluate` and
// `infer`, and their flags. Hyperparameters live in the JSON
// config file, not on the command line.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::ml::model::ModelKind;

/// The three top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train one architecture, keeping the best epoch's weights
    Train(TrainArgs),

    /// Report the accuracy of a checkpoint on the test split
    Evaluate(EvaluateArgs),

    /// Predict the letter shown in one image file
    Infer(InferArgs),
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Path to the JSON run configuration
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Architecture: cnn_model, simple_cnn, resnet or squeezenet
    #[arg(long)]
    pub model: ModelKind,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Checkpoint to evaluate (weights file, metadata file or stem)
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// Fail unless the checkpoint holds this architecture
    #[arg(long)]
    pub model: Option<ModelKind>,

    /// Path to the JSON run configuration
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Test CSV to use instead of the one named in the config
    #[arg(long)]
    pub test_set: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InferArgs {
    /// Checkpoint to load (weights file, metadata file or stem)
    #[arg(long)]
    pub checkpoint: PathBuf,

    /// Image file to classify
    #[arg(long)]
    pub image: PathBuf,

    /// Fail unless the checkpoint holds this architecture
    #[arg(long)]
    pub model: Option<ModelKind>,
}
