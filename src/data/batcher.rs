// ============================================================
// Layer 4 — Sample Batcher
// ============================================================
// Implements Burn's Batcher trait to stack a Vec<Sample> into
// tensors the model can consume:
//
//   Input:  N Samples, each 784 normalized pixels + a label
//   Output: SignBatch
//             images  [N, 1, 28, 28]  float
//             targets [N]             int (class id)
//
// All pixels are flattened into one Vec<f32> in sample order,
// turned into a 1D tensor and reshaped, same for the labels.
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
};

use crate::domain::sample::{Sample, IMAGE_SIDE};

// ─── SignBatch ────────────────────────────────────────────────────────────────
/// A batch of samples ready for the model forward pass.
#[derive(Debug, Clone)]
pub struct SignBatch<B: Backend> {
    /// Single-channel images — shape: [batch_size, 1, 28, 28]
    pub images: Tensor<B, 4>,

    /// Ground-truth class ids — shape: [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

// ─── SignBatcher ──────────────────────────────────────────────────────────────
/// Holds the target device so tensors are created on it directly.
#[derive(Clone, Debug)]
pub struct SignBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> SignBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

impl<B: Backend> Batcher<Sample, SignBatch<B>> for SignBatcher<B> {
    fn batch(&self, items: Vec<Sample>) -> SignBatch<B> {
        let batch_size = items.len();

        let pixels: Vec<f32> = items
            .iter()
            .flat_map(|s| s.image.pixels().iter().copied())
            .collect();

        let labels: Vec<i32> = items
            .iter()
            .map(|s| i32::from(s.label.id()))
            .collect();

        let images = Tensor::<B, 1>::from_floats(pixels.as_slice(), &self.device)
            .reshape([batch_size, 1, IMAGE_SIDE, IMAGE_SIDE]);

        let targets = Tensor::<B, 1, Int>::from_ints(labels.as_slice(), &self.device);

        SignBatch { images, targets }
    }
}
