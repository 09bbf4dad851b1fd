// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Persists the best model of a training run.
//
// What gets saved per model identifier:
//   1. <model>_best.mpk.gz — all learned parameters, including
//                            batch-norm running statistics
//   2. <model>_best.json   — which architecture, which epoch,
//                            and the validation accuracy at save
//
// A later, better epoch overwrites both files. Weights are
// stored at full precision so a reloaded model scores exactly
// what the trainer measured.
//
// File layout:
//   saved_models/
//     cnn_model_best.mpk.gz
//     cnn_model_best.json
//     resnet_best.mpk.gz
//     resnet_best.json
//
// Reference: Burn Book §5 (Records and Checkpointing)

use std::{fs, path::{Path, PathBuf}};

use burn::{
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkGzFileRecorder, Recorder},
};
use serde::{Deserialize, Serialize};

use crate::domain::error::{SignError, SignResult};
use crate::ml::model::ModelKind;

pub type CheckpointRecorder = NamedMpkGzFileRecorder<FullPrecisionSettings>;

const WEIGHTS_SUFFIXES: [&str; 3] = [".mpk.gz", ".mpk", ".json"];

/// Sidecar written next to the weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMeta {
    pub model:        ModelKind,
    pub epoch:        usize,
    pub val_accuracy: f64,
    pub num_classes:  usize,
}

// ─── Best-model policy ────────────────────────────────────────────────────────
/// Tracks the best validation accuracy seen so far.
/// An epoch counts as an improvement only if it is strictly
/// better; the first observation always counts.
#[derive(Debug, Clone, Default)]
pub struct BestTracker {
    best: Option<f64>,
}

impl BestTracker {
    /// Record `accuracy`; returns true if it is a new best.
    pub fn observe(&mut self, accuracy: f64) -> bool {
        match self.best {
            Some(best) if !(accuracy > best) => false,
            _ => {
                self.best = Some(accuracy);
                true
            }
        }
    }

    pub fn best(&self) -> Option<f64> {
        self.best
    }
}

// ─── Writer side ──────────────────────────────────────────────────────────────
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create the manager, creating the output directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> SignResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| SignError::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the best checkpoint for `kind`, without extension.
    pub fn best_stem(&self, kind: ModelKind) -> PathBuf {
        self.dir.join(format!("{kind}_best"))
    }

    /// Write weights and metadata, replacing any previous best.
    /// Returns the stem path of the written checkpoint.
    pub fn save_best<B: Backend, M: Module<B>>(
        &self,
        model: &M,
        meta:  &CheckpointMeta,
    ) -> SignResult<PathBuf> {
        let stem = self.best_stem(meta.model);

        CheckpointRecorder::new()
            .record(model.clone().into_record(), stem.clone())
            .map_err(|e| SignError::Io {
                path:   stem.display().to_string(),
                source: std::io::Error::other(e.to_string()),
            })?;

        let meta_path = meta_path(&stem);
        let json = serde_json::to_string_pretty(meta).map_err(|e| SignError::Io {
            path:   meta_path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        fs::write(&meta_path, json).map_err(|e| SignError::io(&meta_path, e))?;

        tracing::debug!("Saved checkpoint '{}' (epoch {})", stem.display(), meta.epoch);
        Ok(stem)
    }
}

// ─── Reader side ──────────────────────────────────────────────────────────────
/// A checkpoint on disk, opened through its metadata.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    stem: PathBuf,
    meta: CheckpointMeta,
}

impl Checkpoint {
    /// Open a checkpoint. `path` may name the weights file, the
    /// metadata file, or the shared stem.
    pub fn open(path: &Path) -> SignResult<Self> {
        let stem = checkpoint_stem(path);
        let meta_path = meta_path(&stem);

        let json = fs::read_to_string(&meta_path).map_err(|e| SignError::io(&meta_path, e))?;
        let meta: CheckpointMeta = serde_json::from_str(&json)
            .map_err(|e| SignError::data_format(&meta_path, e.to_string()))?;

        Ok(Self { stem, meta })
    }

    pub fn meta(&self) -> &CheckpointMeta {
        &self.meta
    }

    pub fn stem(&self) -> &Path {
        &self.stem
    }

    /// Resolve which architecture to build. A requested model that
    /// differs from the one recorded in the checkpoint is an error.
    pub fn resolve_model(&self, requested: Option<ModelKind>) -> SignResult<ModelKind> {
        match requested {
            Some(kind) if kind != self.meta.model => Err(self.mismatch(
                kind,
                format!("checkpoint was trained as '{}'", self.meta.model),
            )),
            _ => Ok(self.meta.model),
        }
    }

    /// Load the stored weights into `model`.
    pub fn load_into<B: Backend, M: Module<B>>(
        &self,
        kind:   ModelKind,
        model:  M,
        device: &B::Device,
    ) -> SignResult<M> {
        let kind = self.resolve_model(Some(kind))?;
        let expected_params = model.num_params();

        let weights = weights_path(&self.stem);
        if !weights.exists() {
            return Err(SignError::io(
                &weights,
                std::io::Error::new(std::io::ErrorKind::NotFound, "weights file not found"),
            ));
        }

        let record = CheckpointRecorder::new()
            .load(self.stem.clone(), device)
            .map_err(|e| self.mismatch(kind, e.to_string()))?;
        let model = model.load_record(record);

        if model.num_params() != expected_params {
            return Err(self.mismatch(
                kind,
                format!("expected {expected_params} parameters, found {}", model.num_params()),
            ));
        }

        tracing::info!(
            "Loaded '{}' ({}, epoch {}, val acc {:.4})",
            self.stem.display(),
            kind,
            self.meta.epoch,
            self.meta.val_accuracy,
        );
        Ok(model)
    }

    fn mismatch(&self, expected: ModelKind, reason: String) -> SignError {
        SignError::ShapeMismatch {
            path:     self.stem.display().to_string(),
            expected: expected.to_string(),
            reason,
        }
    }
}

/// Strip a known checkpoint suffix, leaving the shared stem.
pub fn checkpoint_stem(path: &Path) -> PathBuf {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stripped = WEIGHTS_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name);
    path.with_file_name(stripped)
}

fn meta_path(stem: &Path) -> PathBuf {
    stem.with_extension("json")
}

fn weights_path(stem: &Path) -> PathBuf {
    stem.with_extension("mpk.gz")
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::NUM_CLASSES;
    use crate::ml::model::with_model;
    use crate::ml::models::{resnet::ResNetConfig, simple_cnn::SimpleCnnConfig};
    use burn::backend::NdArray;

    fn meta(model: ModelKind, epoch: usize, val_accuracy: f64) -> CheckpointMeta {
        CheckpointMeta { model, epoch, val_accuracy, num_classes: NUM_CLASSES }
    }

    #[test]
    fn test_only_strict_improvements_are_saved() {
        let mut tracker = BestTracker::default();
        let saved: Vec<usize> = [0.70, 0.65, 0.80, 0.80, 0.75]
            .into_iter()
            .enumerate()
            .filter_map(|(i, acc)| tracker.observe(acc).then_some(i + 1))
            .collect();

        assert_eq!(saved, vec![1, 3]);
        assert_eq!(tracker.best(), Some(0.80));
    }

    #[test]
    fn test_first_epoch_always_counts() {
        let mut tracker = BestTracker::default();
        assert!(tracker.observe(0.0));
        assert!(!tracker.observe(0.0));
    }

    #[test]
    fn test_stem_accepts_any_checkpoint_file() {
        let expected = PathBuf::from("saved_models/resnet_best");
        assert_eq!(checkpoint_stem(Path::new("saved_models/resnet_best")), expected);
        assert_eq!(checkpoint_stem(Path::new("saved_models/resnet_best.mpk.gz")), expected);
        assert_eq!(checkpoint_stem(Path::new("saved_models/resnet_best.json")), expected);
    }

    #[test]
    fn test_save_and_reload_weights() {
        let dir     = tempfile::tempdir().unwrap();
        let device  = Default::default();
        let manager = CheckpointManager::new(dir.path()).unwrap();

        let model = SimpleCnnConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let stem  = manager.save_best(&model, &meta(ModelKind::SimpleCnn, 3, 0.5)).unwrap();
        assert!(stem.with_extension("mpk.gz").exists());

        let ckpt = Checkpoint::open(&stem).unwrap();
        assert_eq!(ckpt.meta(), &meta(ModelKind::SimpleCnn, 3, 0.5));

        let images = Tensor::<NdArray, 4>::ones([1, 1, 28, 28], &device);
        let fresh  = SimpleCnnConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let loaded = ckpt.load_into(ModelKind::SimpleCnn, fresh, &device).unwrap();

        use crate::ml::model::SignClassifier;
        let before: Vec<f32> = model.forward(images.clone()).into_data().to_vec().unwrap();
        let after:  Vec<f32> = loaded.forward(images).into_data().to_vec().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_better_epoch_overwrites_previous_best() {
        let dir     = tempfile::tempdir().unwrap();
        let device  = Default::default();
        let manager = CheckpointManager::new(dir.path()).unwrap();

        with_model!(ModelKind::SimpleCnn, NdArray, &device, |model| {
            manager.save_best(&model, &meta(ModelKind::SimpleCnn, 1, 0.4)).unwrap();
            manager.save_best(&model, &meta(ModelKind::SimpleCnn, 4, 0.6)).unwrap();
        });

        let ckpt = Checkpoint::open(&manager.best_stem(ModelKind::SimpleCnn)).unwrap();
        assert_eq!(ckpt.meta().epoch, 4);
    }

    #[test]
    fn test_requesting_other_architecture_is_shape_mismatch() {
        let dir     = tempfile::tempdir().unwrap();
        let device  = Default::default();
        let manager = CheckpointManager::new(dir.path()).unwrap();

        let model = SimpleCnnConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let stem  = manager.save_best(&model, &meta(ModelKind::SimpleCnn, 1, 0.1)).unwrap();
        let ckpt  = Checkpoint::open(&stem).unwrap();

        let err = ckpt.resolve_model(Some(ModelKind::Resnet)).unwrap_err();
        assert!(matches!(err, SignError::ShapeMismatch { .. }));

        let resnet = ResNetConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let err = ckpt.load_into(ModelKind::Resnet, resnet, &device).unwrap_err();
        assert!(matches!(err, SignError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_missing_checkpoint_is_io_error() {
        let err = Checkpoint::open(Path::new("nowhere/cnn_model_best")).unwrap_err();
        assert!(matches!(err, SignError::Io { .. }));
    }
}
