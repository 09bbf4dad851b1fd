// ============================================================
// Layer 5 — Evaluator
// ============================================================
// One inference-mode pass over a split:
//   - no augmentation, samples used exactly as loaded
//   - fixed chunking in dataset order, on the calling thread
//   - model on a plain (non-autodiff) backend, so dropout is
//     off and batch norm uses its running statistics
//
// The trainer's per-epoch validation calls the same function,
// which is what lets a reloaded checkpoint reproduce the
// accuracy recorded when it was saved.

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::batcher::SignBatcher;
use crate::domain::error::{SignError, SignResult};
use crate::domain::sample::{Label, Sample};
use crate::infra::checkpoint::Checkpoint;
use crate::ml::model::{cross_entropy, predicted_classes, with_model, ModelKind, SignClassifier};

/// Result of one evaluation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Fraction of samples whose prediction equals the label
    pub accuracy: f64,

    /// Mean cross-entropy per sample
    pub loss: f64,

    /// Predicted label of every sample, in input order
    pub predictions: Vec<Label>,
}

impl Evaluation {
    fn empty() -> Self {
        Self { accuracy: 0.0, loss: f64::NAN, predictions: Vec::new() }
    }
}

/// Fails if the model's output cannot be read back as one of the
/// letters for every sample.
pub fn evaluate<B: Backend, M: SignClassifier<B>>(
    model:      &M,
    samples:    &[Sample],
    batch_size: usize,
    device:     &B::Device,
) -> SignResult<Evaluation> {
    if samples.is_empty() {
        return Ok(Evaluation::empty());
    }

    let batcher = SignBatcher::<B>::new(device.clone());
    let mut loss_sum    = 0.0f64;
    let mut predictions = Vec::with_capacity(samples.len());

    for chunk in samples.chunks(batch_size.max(1)) {
        let batch  = batcher.batch(chunk.to_vec());
        let logits = model.forward(batch.images);

        let batch_loss: f64 = cross_entropy(logits.clone(), batch.targets)
            .into_scalar()
            .elem::<f64>();
        loss_sum += batch_loss * chunk.len() as f64;

        let classes: Vec<i64> = predicted_classes(logits)
            .into_data()
            .convert::<i64>()
            .to_vec()
            .map_err(|e| SignError::model_output(format!("{e:?}")))?;
        for class in classes {
            predictions.push(class_label(class)?);
        }
    }

    if predictions.len() != samples.len() {
        return Err(SignError::model_output(format!(
            "{} predictions for {} samples",
            predictions.len(),
            samples.len()
        )));
    }

    let correct = predictions
        .iter()
        .zip(samples)
        .filter(|(pred, sample)| **pred == sample.label)
        .count();

    Ok(Evaluation {
        accuracy: correct as f64 / samples.len() as f64,
        loss:     loss_sum / samples.len() as f64,
        predictions,
    })
}

/// Map an arg-max class id to its letter.
pub(crate) fn class_label(class: i64) -> SignResult<Label> {
    usize::try_from(class)
        .ok()
        .and_then(Label::from_class_index)
        .ok_or_else(|| SignError::model_output(format!("class {class} is out of range")))
}

/// Load a checkpoint and evaluate it on `samples`.
pub fn evaluate_checkpoint<B: Backend>(
    checkpoint: &Checkpoint,
    requested:  Option<ModelKind>,
    samples:    &[Sample],
    batch_size: usize,
    device:     &B::Device,
) -> SignResult<Evaluation> {
    let kind = checkpoint.resolve_model(requested)?;
    with_model!(kind, B, device, |model| {
        let model = checkpoint.load_into(kind, model, device)?;
        evaluate(&model, samples, batch_size, device)
    })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::config::RunConfig;
    use crate::data::augment::{load_eval_image, AugmentationConfig};
    use crate::domain::sample::{Image, IMAGE_SIDE, PIXEL_COUNT};
    use crate::infra::checkpoint::CheckpointManager;
    use crate::infra::metrics::MemoryMetricsSink;
    use crate::ml::inferencer::predict_checkpoint;
    use crate::ml::trainer::train_model;
    use burn::backend::{Autodiff, NdArray};

    /// Class 0 lights the left half, class 1 the right half,
    /// with a little per-sample variation. Built from bytes so a
    /// PNG written from a sample decodes to the identical image.
    fn toy_samples(count: usize) -> Vec<Sample> {
        (0..count)
            .map(|i| {
                let label = (i % 2) as i64;
                let level = 150 + 25 * ((i * 7) % 5) as u8;
                let bytes: Vec<u8> = (0..PIXEL_COUNT)
                    .map(|p| {
                        let left = p % IMAGE_SIDE < IMAGE_SIDE / 2;
                        if left == (label == 0) { level } else { 0 }
                    })
                    .collect();
                Sample::new(Image::from_bytes(&bytes).unwrap(), Label::from_dataset(label).unwrap())
            })
            .collect()
    }

    fn toy_config(output: &std::path::Path) -> RunConfig {
        let mut cfg = RunConfig::default();
        cfg.output_dir           = output.display().to_string();
        cfg.train.batch_size     = 8;
        cfg.train.workers        = 0;
        cfg.train.epochs         = 2;
        cfg.train.learning_rate  = 0.05;
        cfg.test.batch_size      = 5;
        cfg.augmentation         = AugmentationConfig::disabled();
        cfg
    }

    #[test]
    fn test_empty_split_has_zero_accuracy() {
        let device = Default::default();
        let model  = crate::ml::models::simple_cnn::SimpleCnnConfig::new(26).init::<NdArray>(&device);
        let eval   = evaluate(&model, &[], 4, &device).unwrap();
        assert_eq!(eval.accuracy, 0.0);
        assert!(eval.predictions.is_empty());
    }

    #[test]
    fn test_batch_size_does_not_change_result() {
        let device  = Default::default();
        let model   = crate::ml::models::simple_cnn::SimpleCnnConfig::new(26).init::<NdArray>(&device);
        let samples = toy_samples(11);

        let a = evaluate(&model, &samples, 3, &device).unwrap();
        let b = evaluate(&model, &samples, 11, &device).unwrap();
        assert_eq!(a.predictions, b.predictions);
        assert_eq!(a.accuracy, b.accuracy);
        assert_eq!(a.predictions.len(), 11);
    }

    /// Emits the same 30 logits for every image; the arg-max is
    /// class 28, which has no letter.
    #[derive(Module, Debug)]
    struct FixedLogits<B: Backend> {
        logits: burn::module::Param<Tensor<B, 1>>,
    }

    impl<B: Backend> FixedLogits<B> {
        fn new(device: &B::Device) -> Self {
            let values: Vec<f32> = (0..30).map(|c| if c == 28 { 5.0 } else { 0.0 }).collect();
            let logits = Tensor::<B, 1>::from_floats(&values[..], device);
            Self { logits: burn::module::Param::from_tensor(logits) }
        }
    }

    impl<B: Backend> SignClassifier<B> for FixedLogits<B> {
        fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
            let batch = images.dims()[0];
            self.logits.val().unsqueeze::<2>().repeat_dim(0, batch)
        }
    }

    #[test]
    fn test_class_without_letter_is_an_error() {
        let device = Default::default();
        let model  = FixedLogits::<NdArray>::new(&device);

        let err = evaluate(&model, &toy_samples(6), 4, &device).unwrap_err();
        assert!(matches!(err, SignError::ShapeMismatch { .. }));
        assert!(err.to_string().contains("class 28"));
    }

    #[test]
    fn test_out_of_range_class_is_rejected() {
        assert_eq!(class_label(25).unwrap().letter(), 'Z');
        assert!(matches!(class_label(26).unwrap_err(), SignError::ShapeMismatch { .. }));
        assert!(matches!(class_label(-1).unwrap_err(), SignError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_checkpoint_round_trip_reproduces_validation_accuracy() {
        let dir     = tempfile::tempdir().unwrap();
        let cfg     = toy_config(dir.path());
        let device  = Default::default();
        let manager = CheckpointManager::new(dir.path()).unwrap();
        let mut sink = MemoryMetricsSink::default();

        let val    = toy_samples(10);
        let report = train_model::<Autodiff<NdArray>>(
            ModelKind::SimpleCnn, &cfg, toy_samples(32), val.clone(), &manager, &mut sink, &device,
        )
        .unwrap();

        let best = report.best.expect("at least one epoch ran");
        let ckpt = Checkpoint::open(&manager.best_stem(ModelKind::SimpleCnn)).unwrap();
        assert_eq!(ckpt.meta().epoch, best.epoch);

        let eval = evaluate_checkpoint::<NdArray>(&ckpt, None, &val, cfg.test.batch_size, &device).unwrap();
        assert!((eval.accuracy - ckpt.meta().val_accuracy).abs() < 1e-9);
        assert!((eval.accuracy - best.val_accuracy).abs() < 1e-9);

        // single-image inference agrees with the per-sample prediction
        let png = dir.path().join("sample.png");
        image::GrayImage::from_raw(28, 28, val[3].image.to_bytes())
            .unwrap()
            .save(&png)
            .unwrap();
        let image = load_eval_image(&png).unwrap();
        let prediction = predict_checkpoint::<NdArray>(&ckpt, None, &image, &device).unwrap();
        assert_eq!(prediction.label, eval.predictions[3]);
    }
}
