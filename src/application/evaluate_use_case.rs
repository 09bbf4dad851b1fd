// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved checkpoint on the held-out test CSV:
//
//   Step 1: Open checkpoint metadata   (Layer 6 - infra)
//   Step 2: Load the test CSV          (Layer 4 - data)
//   Step 3: Rebuild model, load, score (Layer 5 - ml)
//
// The architecture comes from the checkpoint itself; a model
// name given on the command line only has to agree with it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use burn::prelude::Backend;

use crate::application::config::RunConfig;
use crate::data::loader::CsvSampleLoader;
use crate::domain::sample::Label;
use crate::domain::traits::SampleSource;
use crate::infra::checkpoint::Checkpoint;
use crate::ml::backend::{default_device, InferBackend};
use crate::ml::evaluator::evaluate_checkpoint;
use crate::ml::model::ModelKind;

/// What the evaluate command reports.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub model:       ModelKind,
    pub samples:     usize,
    pub accuracy:    f64,
    pub loss:        f64,
    pub predictions: Vec<Label>,
}

pub struct EvaluateUseCase {
    checkpoint: PathBuf,
    model:      Option<ModelKind>,
    test_set:   Option<PathBuf>,
    config:     RunConfig,
}

impl EvaluateUseCase {
    pub fn new(checkpoint: impl Into<PathBuf>, config: RunConfig) -> Self {
        Self { checkpoint: checkpoint.into(), model: None, test_set: None, config }
    }

    /// Require the checkpoint to hold this architecture.
    pub fn with_model(mut self, model: Option<ModelKind>) -> Self {
        self.model = model;
        self
    }

    /// Evaluate on this CSV instead of the configured test set.
    pub fn with_test_set(mut self, path: Option<PathBuf>) -> Self {
        self.test_set = path;
        self
    }

    fn test_set_path(&self) -> &Path {
        self.test_set
            .as_deref()
            .unwrap_or_else(|| Path::new(&self.config.test.test_set.path))
    }

    pub fn execute(&self) -> Result<EvaluationReport> {
        let device = default_device();
        self.execute_on::<InferBackend>(&CsvSampleLoader::new(self.test_set_path()), &device)
    }

    pub fn execute_on<B: Backend>(
        &self,
        source: &dyn SampleSource,
        device: &B::Device,
    ) -> Result<EvaluationReport> {
        // ── Step 1: Checkpoint metadata ───────────────────────────────────────
        let checkpoint = Checkpoint::open(&self.checkpoint)
            .with_context(|| format!("Failed to open checkpoint '{}'", self.checkpoint.display()))?;
        let model = checkpoint.resolve_model(self.model)?;

        // ── Step 2: Test split ────────────────────────────────────────────────
        let samples = source.load_all().context("Failed to load test data")?;
        tracing::info!("Evaluating '{}' on {} samples", model, samples.len());

        // ── Step 3: Score ─────────────────────────────────────────────────────
        let eval = evaluate_checkpoint::<B>(
            &checkpoint,
            Some(model),
            &samples,
            self.config.test.batch_size,
            device,
        )?;

        Ok(EvaluationReport {
            model,
            samples:     samples.len(),
            accuracy:    eval.accuracy,
            loss:        eval.loss,
            predictions: eval.predictions,
        })
    }
}
