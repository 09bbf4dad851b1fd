// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Models, the training loop, evaluation and inference.
//
//   backend.rs    — which Burn backend the commands run on
//                   (Wgpu by default, NdArray behind a feature)
//
//   model.rs      — the SignClassifier contract shared by every
//                   architecture, model selection by name, and
//                   the loss / accuracy helpers
//
//   models/       — the four architectures:
//                   • cnn_model   three conv blocks + MLP head
//                   • simple_cnn  LeNet-style baseline
//                   • resnet      ResNet-18, single-channel stem
//                   • squeezenet  fire modules, conv classifier
//
//   trainer.rs    — the epoch loop: SGD with momentum and a
//                   step learning-rate schedule, validation,
//                   metrics, best checkpoint
//
//   evaluator.rs  — accuracy / loss over a split, in order
//
//   inferencer.rs — single-image prediction with confidence
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            He et al. (2016) Deep Residual Learning
//            Iandola et al. (2016) SqueezeNet

/// Backend aliases and device selection
pub mod backend;

/// Classifier trait, model names and shared tensor helpers
pub mod model;

/// The selectable architectures
pub mod models;

/// Full training loop with validation and best-checkpointing
pub mod trainer;

/// Inference-mode accuracy over a dataset split
pub mod evaluator;

/// Single-image prediction
pub mod inferencer;
