// ============================================================
// Layer 2 — InferUseCase
// ============================================================
// Loads a checkpoint and one image file, returns the letter.
//
//   Step 1: Open checkpoint metadata    (Layer 6 - infra)
//   Step 2: Decode + eval transform     (Layer 4 - data)
//   Step 3: Rebuild model, predict      (Layer 5 - ml)

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::prelude::Backend;

use crate::data::augment::load_eval_image;
use crate::infra::checkpoint::Checkpoint;
use crate::ml::backend::{default_device, InferBackend};
use crate::ml::inferencer::{predict_checkpoint, Prediction};
use crate::ml::model::ModelKind;

pub struct InferUseCase {
    checkpoint: PathBuf,
    image:      PathBuf,
    model:      Option<ModelKind>,
}

impl InferUseCase {
    pub fn new(checkpoint: impl Into<PathBuf>, image: impl Into<PathBuf>, model: Option<ModelKind>) -> Self {
        Self { checkpoint: checkpoint.into(), image: image.into(), model }
    }

    pub fn execute(&self) -> Result<Prediction> {
        self.execute_on::<InferBackend>(&default_device())
    }

    pub fn execute_on<B: Backend>(&self, device: &B::Device) -> Result<Prediction> {
        // ── Step 1: Checkpoint metadata ───────────────────────────────────────
        let checkpoint = Checkpoint::open(&self.checkpoint)
            .with_context(|| format!("Failed to open checkpoint '{}'", self.checkpoint.display()))?;

        // ── Step 2: Image ─────────────────────────────────────────────────────
        let image = load_eval_image(&self.image)
            .with_context(|| format!("Failed to read image '{}'", self.image.display()))?;

        // ── Step 3: Predict ───────────────────────────────────────────────────
        let prediction = predict_checkpoint::<B>(&checkpoint, self.model, &image, device)?;
        tracing::info!(
            "'{}' → {} (confidence {:.4})",
            self.image.display(),
            prediction.label,
            prediction.confidence,
        );
        Ok(prediction)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::SignError;
    use crate::domain::sample::NUM_CLASSES;
    use crate::infra::checkpoint::{CheckpointManager, CheckpointMeta};
    use crate::ml::models::squeezenet::SqueezeNetConfig;
    use burn::backend::NdArray;

    fn saved_checkpoint(dir: &std::path::Path) -> PathBuf {
        let device  = Default::default();
        let manager = CheckpointManager::new(dir).unwrap();
        let model   = SqueezeNetConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let meta    = CheckpointMeta {
            model:        ModelKind::Squeezenet,
            epoch:        1,
            val_accuracy: 0.1,
            num_classes:  NUM_CLASSES,
        };
        manager.save_best(&model, &meta).unwrap()
    }

    #[test]
    fn test_larger_image_is_resized_and_classified() {
        let dir  = tempfile::tempdir().unwrap();
        let stem = saved_checkpoint(dir.path());
        let png  = dir.path().join("hand.png");
        image::GrayImage::from_fn(64, 48, |x, y| image::Luma([((x + y) % 256) as u8]))
            .save(&png)
            .unwrap();

        let prediction = InferUseCase::new(stem.with_extension("mpk.gz"), &png, None)
            .execute_on::<NdArray>(&Default::default())
            .unwrap();
        assert!(prediction.confidence > 0.0);
    }

    #[test]
    fn test_undecodable_image_is_data_format_error() {
        let dir  = tempfile::tempdir().unwrap();
        let stem = saved_checkpoint(dir.path());
        let bad  = dir.path().join("not_an_image.png");
        std::fs::write(&bad, b"definitely not a png").unwrap();

        let err = InferUseCase::new(stem, &bad, None)
            .execute_on::<NdArray>(&Default::default())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<SignError>(), Some(SignError::DataFormat { .. })));
    }
}
