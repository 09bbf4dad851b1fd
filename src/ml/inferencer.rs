// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Classifies a single image with a trained model. The image
// must already have gone through the evaluation transform
// (see data/augment.rs `load_eval_image`).
use std::marker::PhantomData;

use burn::{prelude::*, tensor::activation::softmax};

use crate::domain::error::{SignError, SignResult};
use crate::domain::sample::{Image, Label, IMAGE_SIDE};
use crate::infra::checkpoint::Checkpoint;
use crate::ml::evaluator::class_label;
use crate::ml::model::{predicted_classes, with_model, ModelKind, SignClassifier};

/// Predicted letter and its softmax probability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub label:      Label,
    pub confidence: f32,
}

pub struct Inferencer<B: Backend, M: SignClassifier<B>> {
    model:    M,
    device:   B::Device,
    _backend: PhantomData<B>,
}

impl<B: Backend, M: SignClassifier<B>> Inferencer<B, M> {
    pub fn new(model: M, device: B::Device) -> Self {
        Self { model, device, _backend: PhantomData }
    }

    /// Fails if the arg-max class has no letter.
    pub fn predict(&self, image: &Image) -> SignResult<Prediction> {
        let input = Tensor::<B, 1>::from_floats(image.pixels(), &self.device)
            .reshape([1, 1, IMAGE_SIDE, IMAGE_SIDE]);
        let logits = self.model.forward(input);

        // same arg-max op as the evaluator, so ties break identically
        let class: i64 = predicted_classes(logits.clone()).into_scalar().elem::<i64>();
        let probs: Vec<f32> = softmax(logits, 1)
            .into_data()
            .convert::<f32>()
            .to_vec()
            .map_err(|e| SignError::model_output(format!("{e:?}")))?;

        let label      = class_label(class)?;
        let index      = label.index();
        let confidence = probs.get(index).copied().ok_or_else(|| {
            SignError::model_output(format!("{} probabilities for class {index}", probs.len()))
        })?;

        tracing::debug!("Predicted '{}' (class {index}) conf={confidence:.4}", label.letter());
        Ok(Prediction { label, confidence })
    }
}

/// Load a checkpoint and classify one image with it.
pub fn predict_checkpoint<B: Backend>(
    checkpoint: &Checkpoint,
    requested:  Option<ModelKind>,
    image:      &Image,
    device:     &B::Device,
) -> SignResult<Prediction> {
    let kind = checkpoint.resolve_model(requested)?;
    with_model!(kind, B, device, |model| {
        let model = checkpoint.load_into(kind, model, device)?;
        Inferencer::<B, _>::new(model, device.clone()).predict(image)
    })
}
