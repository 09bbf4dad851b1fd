// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load the training CSV        (Layer 4 - data)
//   Step 2: Split train/validation       (Layer 4 - data)
//   Step 3: Prepare checkpoint + metrics (Layer 6 - infra)
//   Step 4: Run training loop            (Layer 5 - ml)
//
// Reference: Burn Book §5 (Training)

use std::path::Path;

use anyhow::{Context, Result};
use burn::tensor::backend::AutodiffBackend;

use crate::application::config::RunConfig;
use crate::data::{loader::CsvSampleLoader, splitter::split_train_val};
use crate::domain::traits::{MetricsSink, SampleSource};
use crate::infra::{checkpoint::CheckpointManager, metrics::CsvMetricsSink};
use crate::ml::backend::{default_device, TrainBackend};
use crate::ml::model::ModelKind;
use crate::ml::trainer::{train_model, TrainReport};

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
// Owns the config and runs the full training pipeline.
pub struct TrainUseCase {
    config: RunConfig,
    model:  ModelKind,
}

impl TrainUseCase {
    pub fn new(config: RunConfig, model: ModelKind) -> Self {
        Self { config, model }
    }

    /// Read the run configuration from `path`.
    pub fn from_config_file(path: &Path, model: ModelKind) -> Result<Self> {
        let config = RunConfig::from_file(path)
            .with_context(|| format!("Failed to load config '{}'", path.display()))?;
        Ok(Self::new(config, model))
    }

    /// Train on the configured CSV, logging metrics to the configured directory.
    pub fn execute(&self) -> Result<TrainReport> {
        let source   = CsvSampleLoader::new(&self.config.train.train_set.path);
        let mut sink = CsvMetricsSink::new(&self.config.metrics_dir)
            .context("Failed to prepare metrics directory")?;
        tracing::info!("Metrics → '{}'", sink.csv_path().display());

        let device = default_device();
        tracing::info!("Using device: {:?}", device);
        self.execute_on::<TrainBackend>(&source, &mut sink, &device)
    }

    /// Train with an explicit sample source, sink and backend.
    pub fn execute_on<B: AutodiffBackend>(
        &self,
        source: &dyn SampleSource,
        sink:   &mut dyn MetricsSink,
        device: &B::Device,
    ) -> Result<TrainReport> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Load all training rows ────────────────────────────────────
        let samples = source.load_all().context("Failed to load training data")?;

        // ── Step 2: Train / validation split ──────────────────────────────────
        let set = &cfg.train.train_set;
        let (train, val) = split_train_val(samples, set.val_split, set.shuffle, cfg.seed);
        tracing::info!("Split: {} train, {} validation", train.len(), val.len());

        // ── Step 3: Checkpoint directory ──────────────────────────────────────
        let ckpt = CheckpointManager::new(&cfg.output_dir)
            .context("Failed to prepare checkpoint directory")?;
        tracing::info!("Checkpoints → '{}'", ckpt.dir().display());

        // ── Step 4: Run training loop (Layer 5) ───────────────────────────────
        let report = train_model::<B>(self.model, cfg, train, val, &ckpt, sink, device)
            .with_context(|| format!("Training '{}' failed", self.model))?;
        Ok(report)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::augment::AugmentationConfig;
    use crate::domain::error::{SignError, SignResult};
    use crate::domain::sample::{Image, Label, Sample};
    use crate::infra::metrics::MemoryMetricsSink;
    use burn::backend::{Autodiff, NdArray};

    struct FixedSource(Vec<Sample>);

    impl SampleSource for FixedSource {
        fn load_all(&self) -> SignResult<Vec<Sample>> {
            Ok(self.0.clone())
        }
    }

    struct FailingSource;

    impl SampleSource for FailingSource {
        fn load_all(&self) -> SignResult<Vec<Sample>> {
            Err(SignError::config("no data"))
        }
    }

    fn config(dir: &Path) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.output_dir       = dir.join("models").display().to_string();
        cfg.train.epochs     = 1;
        cfg.train.batch_size = 4;
        cfg.train.workers    = 0;
        cfg.augmentation     = AugmentationConfig::disabled();
        cfg
    }

    fn samples() -> Vec<Sample> {
        (0..8)
            .map(|i| Sample::new(Image::blank(), Label::from_dataset(i % 4).unwrap()))
            .collect()
    }

    #[test]
    fn test_training_writes_best_checkpoint() {
        let dir      = tempfile::tempdir().unwrap();
        let use_case = TrainUseCase::new(config(dir.path()), ModelKind::SimpleCnn);
        let mut sink = MemoryMetricsSink::default();

        let report = use_case
            .execute_on::<Autodiff<NdArray>>(&FixedSource(samples()), &mut sink, &Default::default())
            .unwrap();

        assert_eq!(report.history.len(), 1);
        assert!(dir.path().join("models/simple_cnn_best.mpk.gz").exists());
        assert!(dir.path().join("models/simple_cnn_best.json").exists());
    }

    #[test]
    fn test_invalid_config_fails_before_loading() {
        let dir     = tempfile::tempdir().unwrap();
        let mut cfg = config(dir.path());
        cfg.train.epochs = 0;
        let mut sink = MemoryMetricsSink::default();

        let err = TrainUseCase::new(cfg, ModelKind::SimpleCnn)
            .execute_on::<Autodiff<NdArray>>(&FailingSource, &mut sink, &Default::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<SignError>(), Some(SignError::Config(_))));
        assert!(!dir.path().join("models").exists());
    }
}
