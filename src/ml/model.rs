// ============================================================
// Layer 5 — Classifier Contract
// ============================================================
// What the rest of the crate knows about a model:
//   - SignClassifier: images [batch, 1, 28, 28] → logits [batch, 26]
//   - ModelKind: the name used on the CLI, in config and in the
//     checkpoint sidecar
//   - with_model!: builds the named architecture so generic code
//     can run against it
//   - loss and arg-max helpers shared by trainer and evaluator

use std::{fmt, str::FromStr};

use burn::{nn::loss::CrossEntropyLossConfig, prelude::*};
use serde::{Deserialize, Serialize};

use crate::domain::error::SignError;

/// Common contract of every architecture:
/// images [batch, 1, 28, 28] → logits [batch, 26].
pub trait SignClassifier<B: Backend>: Module<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2>;
}

/// The architectures that can be selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    CnnModel,
    SimpleCnn,
    Resnet,
    Squeezenet,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        ModelKind::CnnModel,
        ModelKind::SimpleCnn,
        ModelKind::Resnet,
        ModelKind::Squeezenet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::CnnModel   => "cnn_model",
            ModelKind::SimpleCnn  => "simple_cnn",
            ModelKind::Resnet     => "resnet",
            ModelKind::Squeezenet => "squeezenet",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = SignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = ModelKind::ALL.iter().map(|k| k.as_str()).collect();
                SignError::config(format!("unknown model '{s}', expected one of: {}", known.join(", ")))
            })
    }
}

/// Build the architecture named by `$kind` on `$backend`, bind it to
/// `$model` and evaluate `$body` with it. Each arm is monomorphized
/// separately, so `$body` may call generic functions over the model type.
macro_rules! with_model {
    ($kind:expr, $backend:ty, $device:expr, |$model:ident| $body:expr) => {{
        use $crate::domain::sample::NUM_CLASSES;
        use $crate::ml::model::ModelKind;
        use $crate::ml::models::{
            cnn::CnnModelConfig, resnet::ResNetConfig, simple_cnn::SimpleCnnConfig,
            squeezenet::SqueezeNetConfig,
        };
        match $kind {
            ModelKind::CnnModel => {
                let $model = CnnModelConfig::new(NUM_CLASSES).init::<$backend>($device);
                $body
            }
            ModelKind::SimpleCnn => {
                let $model = SimpleCnnConfig::new(NUM_CLASSES).init::<$backend>($device);
                $body
            }
            ModelKind::Resnet => {
                let $model = ResNetConfig::new(NUM_CLASSES).init::<$backend>($device);
                $body
            }
            ModelKind::Squeezenet => {
                let $model = SqueezeNetConfig::new(NUM_CLASSES).init::<$backend>($device);
                $body
            }
        }
    }};
}
pub(crate) use with_model;

/// Mean cross-entropy between logits [batch, classes] and class ids [batch].
pub fn cross_entropy<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> Tensor<B, 1> {
    CrossEntropyLossConfig::new()
        .init(&logits.device())
        .forward(logits, targets)
}

/// Arg-max class id per row: [batch, classes] → [batch].
pub fn predicted_classes<B: Backend>(logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
    // argmax(1) returns shape [batch, 1]
    logits.argmax(1).flatten::<1>(0, 1)
}

/// Number of rows whose arg-max equals the target.
pub fn count_correct<B: Backend>(logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) -> usize {
    let correct: i64 = predicted_classes(logits)
        .equal(targets)
        .int()
        .sum()
        .into_scalar()
        .elem::<i64>();
    correct as usize
}
