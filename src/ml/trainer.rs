// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Train + validation loop using Burn's DataLoader and SGD with
// momentum, stepped down by a fixed factor every few epochs.
//
// Per epoch:
//   1. train phase: augmented, shuffled batches on the autodiff
//      backend, prefetched by the loader's worker threads
//   2. validation: model.valid() on the inner backend, evaluated
//      through the same pass the evaluate command uses
//   3. metrics: one scalar row per quantity into the sink
//   4. checkpoint: weights saved only when validation accuracy
//      strictly beats every earlier epoch (first epoch always)
//
// Key Burn insight:
//   - model.valid() returns the model on B::InnerBackend, which
//     shares the device type with B, so one device serves both
//
// Reference: Burn Book §5, torch.optim.SGD / StepLR semantics

use std::path::PathBuf;

use burn::{
    data::dataloader::DataLoaderBuilder,
    lr_scheduler::{step::StepLrSchedulerConfig, LrScheduler},
    module::AutodiffModule,
    optim::{momentum::MomentumConfig, GradientsParams, Optimizer, SgdConfig},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::application::config::RunConfig;
use crate::data::{augment::Augmenter, batcher::SignBatcher, dataset::AugmentedDataset};
use crate::domain::error::{SignError, SignResult};
use crate::domain::sample::{Sample, NUM_CLASSES};
use crate::domain::traits::MetricsSink;
use crate::infra::checkpoint::{BestTracker, CheckpointManager, CheckpointMeta};
use crate::infra::metrics::EpochMetrics;
use crate::ml::evaluator::evaluate;
use crate::ml::model::{count_correct, cross_entropy, with_model, ModelKind, SignClassifier};

/// The epoch whose weights were kept.
#[derive(Debug, Clone, PartialEq)]
pub struct BestEpoch {
    pub epoch:        usize,
    pub val_accuracy: f64,
    /// None when saving was disabled in the config
    pub checkpoint:   Option<PathBuf>,
}

/// Everything a finished run reports back.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub model:   ModelKind,
    pub history: Vec<EpochMetrics>,
    pub best:    Option<BestEpoch>,
}

/// Train `kind` on any autodiff backend.
pub fn train_model<B: AutodiffBackend>(
    kind:   ModelKind,
    cfg:    &RunConfig,
    train:  Vec<Sample>,
    val:    Vec<Sample>,
    ckpt:   &CheckpointManager,
    sink:   &mut dyn MetricsSink,
    device: &B::Device,
) -> SignResult<TrainReport> {
    if train.is_empty() {
        return Err(SignError::config("training split is empty"));
    }
    with_model!(kind, B, device, |model| {
        train_loop(kind, model, cfg, train, val, ckpt, sink, device)
    })
}

#[allow(clippy::too_many_arguments)]
fn train_loop<B, M>(
    kind:      ModelKind,
    mut model: M,
    cfg:       &RunConfig,
    train:     Vec<Sample>,
    val:       Vec<Sample>,
    ckpt:      &CheckpointManager,
    sink:      &mut dyn MetricsSink,
    device:    &B::Device,
) -> SignResult<TrainReport>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + SignClassifier<B>,
    M::InnerModule: SignClassifier<B::InnerBackend>,
{
    let t = &cfg.train;
    tracing::info!(
        "Model ready: {} ({} parameters), {} train / {} val samples",
        kind,
        model.num_params(),
        train.len(),
        val.len(),
    );

    // ── SGD with momentum ─────────────────────────────────────────────────────
    // v = μ*v + g
    // θ = θ - lr * v
    // stepped once per epoch, so the period counts epochs
    let mut scheduler = StepLrSchedulerConfig::new(t.learning_rate, t.learning_rate_decay_period)
        .with_gamma(t.learning_rate_gamma)
        .init()
        .map_err(|e| SignError::config(format!("learning rate schedule: {e}")))?;
    let momentum = MomentumConfig::new()
        .with_momentum(t.momentum)
        .with_dampening(0.0);
    let mut optim = SgdConfig::new()
        .with_momentum(Some(momentum))
        .init::<B, M>();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let train_len = train.len();
    let augmenter = Augmenter::from_config(&cfg.augmentation);
    tracing::info!("Augmentation: {} active steps", augmenter.steps().len());
    let dataset   = AugmentedDataset::new(train, augmenter, cfg.seed);
    let epochs    = dataset.epoch_counter();

    let mut builder = DataLoaderBuilder::new(SignBatcher::<B>::new(device.clone()))
        .batch_size(t.batch_size)
        .shuffle(cfg.seed);
    if t.workers > 0 {
        builder = builder.num_workers(t.workers);
    }
    let train_loader = builder.build(dataset);

    let mut tracker = BestTracker::default();
    let mut history = Vec::with_capacity(t.epochs);
    let mut best    = None;

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=t.epochs {
        epochs.set(epoch);
        let lr = scheduler.step();

        // ── Training phase ────────────────────────────────────────────────────
        let mut loss_sum = 0.0f64;
        let mut correct  = 0usize;
        let mut seen     = 0usize;

        for batch in train_loader.iter() {
            let n      = batch.targets.dims()[0];
            let logits = model.forward(batch.images);

            correct += count_correct(logits.clone().detach(), batch.targets.clone());
            let loss = cross_entropy(logits, batch.targets);

            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            loss_sum += loss_val * n as f64;
            seen     += n;

            // Backward pass + SGD update
            let grads = loss.backward();
            let grads = GradientsParams::from_grads(grads, &model);
            model = optim.step(lr, model, grads);
        }

        if seen != train_len {
            tracing::warn!("Epoch {epoch}: saw {seen} of {train_len} training samples");
        }

        // ── Validation phase ──────────────────────────────────────────────────
        let model_valid = model.valid();
        let eval = evaluate::<B::InnerBackend, _>(&model_valid, &val, cfg.test.batch_size, device)?;

        let metrics = EpochMetrics {
            epoch,
            learning_rate:  lr,
            train_loss:     if seen > 0 { loss_sum / seen as f64 } else { f64::NAN },
            train_accuracy: if seen > 0 { correct as f64 / seen as f64 } else { 0.0 },
            val_loss:       eval.loss,
            val_accuracy:   eval.accuracy,
        };
        metrics.emit(sink)?;

        tracing::info!(
            "Epoch {:>3}/{} | lr={:.5} | train_loss={:.4} | train_acc={:.1}% | val_loss={:.4} | val_acc={:.1}%",
            epoch, t.epochs, lr,
            metrics.train_loss, metrics.train_accuracy * 100.0,
            metrics.val_loss, metrics.val_accuracy * 100.0,
        );

        // ── Best checkpoint ───────────────────────────────────────────────────
        if let Some(b) = record_epoch::<B::InnerBackend, _>(
            &mut tracker, ckpt, t.save, kind, epoch, eval.accuracy, &model_valid,
        )? {
            best = Some(b);
        }

        history.push(metrics);
    }

    if let Some(b) = &best {
        tracing::info!("Training complete! Best epoch {} with val acc {:.4}", b.epoch, b.val_accuracy);
    }
    Ok(TrainReport { model: kind, history, best })
}

/// Apply the best-model policy to one finished epoch: on a strict
/// improvement the weights are written (when `save` is on) and the
/// new best is returned.
#[allow(clippy::too_many_arguments)]
fn record_epoch<B: Backend, M: Module<B>>(
    tracker:  &mut BestTracker,
    ckpt:     &CheckpointManager,
    save:     bool,
    kind:     ModelKind,
    epoch:    usize,
    accuracy: f64,
    model:    &M,
) -> SignResult<Option<BestEpoch>> {
    if !tracker.observe(accuracy) {
        return Ok(None);
    }

    let checkpoint = if save {
        let meta = CheckpointMeta {
            model:        kind,
            epoch,
            val_accuracy: accuracy,
            num_classes:  NUM_CLASSES,
        };
        Some(ckpt.save_best::<B, _>(model, &meta)?)
    } else {
        None
    };
    tracing::info!("New best model at epoch {epoch} (val acc {accuracy:.4})");
    Ok(Some(BestEpoch { epoch, val_accuracy: accuracy, checkpoint }))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::augment::AugmentationConfig;
    use crate::domain::sample::{Image, Label, PIXEL_COUNT};
    use crate::infra::metrics::MemoryMetricsSink;
    use crate::infra::checkpoint::Checkpoint;
    use crate::ml::models::simple_cnn::SimpleCnnConfig;
    use burn::backend::{Autodiff, NdArray};

    type TestBackend = Autodiff<NdArray>;

    fn samples(count: usize) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                let label  = [0i64, 1, 2][i % 3];
                let pixels = (0..PIXEL_COUNT)
                    .map(|p| if p % 3 == label as usize { 0.9 } else { 0.1 })
                    .collect();
                Sample::new(Image::from_normalized(pixels).unwrap(), Label::from_dataset(label).unwrap())
            })
            .collect()
    }

    fn config(epochs: usize, save: bool) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.train.epochs                     = epochs;
        cfg.train.batch_size                 = 4;
        cfg.train.workers                    = 0;
        cfg.train.save                       = save;
        cfg.train.learning_rate              = 0.1;
        cfg.train.learning_rate_decay_period = 2;
        cfg.test.batch_size                  = 4;
        cfg.augmentation                     = AugmentationConfig::disabled();
        cfg
    }

    #[test]
    fn test_metrics_emitted_every_epoch() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();
        let device   = Default::default();

        let report = train_model::<TestBackend>(
            ModelKind::SimpleCnn, &config(3, true), samples(12), samples(6), &manager, &mut sink, &device,
        )
        .unwrap();

        assert_eq!(report.history.len(), 3);
        assert_eq!(sink.values("Accuracy/val").len(), 3);
        assert_eq!(sink.values("Loss/train").len(), 3);

        // lr = 0.1 for epochs 1-2, then 0.1 * 0.1
        let lrs = sink.values("LearningRate");
        assert!((lrs[0] - 0.1).abs() < 1e-12);
        assert!((lrs[1] - 0.1).abs() < 1e-12);
        assert!((lrs[2] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_best_epoch_matches_history() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();
        let device   = Default::default();

        let report = train_model::<TestBackend>(
            ModelKind::SimpleCnn, &config(3, true), samples(12), samples(6), &manager, &mut sink, &device,
        )
        .unwrap();

        let best = report.best.unwrap();
        let max  = report.history.iter().map(|m| m.val_accuracy).fold(f64::MIN, f64::max);
        assert_eq!(best.val_accuracy, max);

        // the kept epoch is the first one reaching the maximum
        let first = report.history.iter().find(|m| m.val_accuracy == max).unwrap();
        assert_eq!(best.epoch, first.epoch);
        assert!(best.checkpoint.unwrap().with_extension("mpk.gz").exists());
    }

    #[test]
    fn test_save_disabled_writes_nothing() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();
        let device   = Default::default();

        let report = train_model::<TestBackend>(
            ModelKind::SimpleCnn, &config(1, false), samples(6), samples(3), &manager, &mut sink, &device,
        )
        .unwrap();

        assert!(report.best.unwrap().checkpoint.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_empty_training_split_is_rejected() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();
        let device   = Default::default();

        let err = train_model::<TestBackend>(
            ModelKind::SimpleCnn, &config(1, true), Vec::new(), samples(3), &manager, &mut sink, &device,
        )
        .unwrap_err();
        assert!(matches!(err, SignError::Config(_)));
    }

    #[test]
    fn test_tied_accuracy_does_not_overwrite_checkpoint() {
        let dir     = tempfile::tempdir().unwrap();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let device  = Default::default();
        let model   = SimpleCnnConfig::new(NUM_CLASSES).init::<NdArray>(&device);
        let stem    = manager.best_stem(ModelKind::SimpleCnn);

        let mut tracker = BestTracker::default();
        let mut writes  = Vec::new();
        for (i, acc) in [0.70, 0.65, 0.80, 0.80, 0.75].into_iter().enumerate() {
            let epoch = i + 1;
            if let Some(best) = record_epoch::<NdArray, _>(
                &mut tracker, &manager, true, ModelKind::SimpleCnn, epoch, acc, &model,
            )
            .unwrap()
            {
                assert_eq!(best.checkpoint.as_deref(), Some(stem.as_path()));
                writes.push(epoch);
            }
            // the sidecar on disk always names the latest strict improvement
            let on_disk = Checkpoint::open(&stem).unwrap();
            assert_eq!(on_disk.meta().epoch, *writes.last().unwrap());
        }

        assert_eq!(writes, vec![1, 3]);
        let meta = Checkpoint::open(&stem).unwrap().meta().clone();
        assert_eq!(meta.epoch, 3);
        assert_eq!(meta.val_accuracy, 0.80);
    }

    #[test]
    fn test_zero_decay_period_is_config_error() {
        let dir      = tempfile::tempdir().unwrap();
        let manager  = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();
        let device   = Default::default();

        let mut cfg = config(1, false);
        cfg.train.learning_rate_decay_period = 0;
        let err = train_model::<TestBackend>(
            ModelKind::SimpleCnn, &cfg, samples(3), samples(3), &manager, &mut sink, &device,
        )
        .unwrap_err();
        assert!(matches!(err, SignError::Config(_)));
    }
}
