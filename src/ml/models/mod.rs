// ============================================================
// Layer 5 — Model architectures
// ============================================================
// Every architecture implements SignClassifier and is selected
// through ModelKind (see ml/model.rs). Swapping architectures
// only changes the layers in between, never the input
// [batch, 1, 28, 28] or output [batch, 26] shapes.

/// Three conv/BN/pool blocks and a two-layer dense head
pub mod cnn;

/// LeNet-style baseline
pub mod simple_cnn;

/// ResNet-18 with a 1-channel stem
pub mod resnet;

/// SqueezeNet-style fire modules
pub mod squeezenet;

#[cfg(test)]
mod tests {
    use burn::{backend::NdArray, prelude::*};

    use crate::domain::sample::NUM_CLASSES;
    use crate::ml::model::{with_model, ModelKind, SignClassifier};

    fn logits_shape(kind: ModelKind) -> [usize; 2] {
        let device = Default::default();
        let images = Tensor::<NdArray, 4>::zeros([2, 1, 28, 28], &device);
        with_model!(kind, NdArray, &device, |model| model.forward(images).dims())
    }

    #[test]
    fn test_every_architecture_outputs_class_logits() {
        for kind in ModelKind::ALL {
            assert_eq!(logits_shape(kind), [2, NUM_CLASSES], "{kind}");
        }
    }

    #[test]
    fn test_architectures_have_different_parameter_counts() {
        let device = Default::default();
        let counts: Vec<usize> = ModelKind::ALL
            .into_iter()
            .map(|kind| with_model!(kind, NdArray, &device, |model| model.num_params()))
            .collect();
        for (i, a) in counts.iter().enumerate() {
            for b in &counts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
