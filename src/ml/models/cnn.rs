// ============================================================
// Layer 5 — CNN Model
// ============================================================
// Three conv blocks and a dense head.
//
//   block  conv 3×3 (pad 1), BN, relu, max pool 2×2   28 → 14 → 7 → 3
//   head   flatten 128·3·3, linear → 256, relu, dropout, linear → classes

use burn::{
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
    },
    prelude::*,
    tensor::activation::relu,
};

use crate::ml::model::SignClassifier;

// 28 → 14 → 7 → 3 after three 2×2 pools
const CHANNELS: [usize; 4] = [1, 32, 64, 128];
const FINAL_SIDE: usize = 3;

#[derive(Config, Debug)]
pub struct CnnModelConfig {
    pub num_classes: usize,
    #[config(default = 256)]
    pub hidden: usize,
    #[config(default = 0.3)]
    pub dropout: f64,
}

impl CnnModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CnnModel<B> {
        let blocks = CHANNELS
            .windows(2)
            .map(|w| ConvBlock::new(w[0], w[1], device))
            .collect();
        let flat = CHANNELS[3] * FINAL_SIDE * FINAL_SIDE;
        CnnModel {
            blocks,
            fc1:     LinearConfig::new(flat, self.hidden).init(device),
            dropout: DropoutConfig::new(self.dropout).init(),
            fc2:     LinearConfig::new(self.hidden, self.num_classes).init(device),
        }
    }
}

/// conv 3×3 → batch norm → relu → max pool 2×2
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    norm: BatchNorm<B, 2>,
    pool: MaxPool2d,
}

impl<B: Backend> ConvBlock<B> {
    fn new(channels_in: usize, channels_out: usize, device: &B::Device) -> Self {
        Self {
            conv: Conv2dConfig::new([channels_in, channels_out], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            norm: BatchNormConfig::new(channels_out).init(device),
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.norm.forward(self.conv.forward(x));
        self.pool.forward(relu(x))
    }
}

#[derive(Module, Debug)]
pub struct CnnModel<B: Backend> {
    blocks:  Vec<ConvBlock<B>>,
    fc1:     Linear<B>,
    dropout: Dropout,
    fc2:     Linear<B>,
}

impl<B: Backend> SignClassifier<B> for CnnModel<B> {
    fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let mut x = images;
        for block in &self.blocks {
            x = block.forward(x);
        }
        let x = x.flatten::<2>(1, 3);
        let x = self.dropout.forward(relu(self.fc1.forward(x)));
        self.fc2.forward(x)
    }
}
